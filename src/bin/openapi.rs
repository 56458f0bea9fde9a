//! Writes the OpenAPI document of the REST API to a file.
//!
//! Usage: `cargo run --bin openapi [path]` (default `openapi.json`).

use flashcard_vault::ApiDoc;
use utoipa::OpenApi;

fn generate_spec(api_doc: utoipa::openapi::OpenApi, path: &str) -> anyhow::Result<()> {
    let spec_json = api_doc.to_pretty_json()?;
    std::fs::write(path, spec_json)?;
    println!("✅ OpenAPI document generated at {}", path);
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    generate_spec(ApiDoc::openapi(), &path)
}
