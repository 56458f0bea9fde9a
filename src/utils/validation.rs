//! Input checks shared by the handlers: blank-text rejection and the
//! reference PDF pipeline.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;

/// Declared media type every reference file must carry
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Envelope every uploaded reference file must start with
pub const PDF_DATA_URL_PREFIX: &str = "data:application/pdf;base64,";

const PDF_MAGIC: &[u8] = b"%PDF-";

const DEFAULT_PDF_NAME: &str = "reference.pdf";

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// A reference file that passed every check and is ready to be stored
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedPdf {
    pub name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Used as a `validator` custom rule and for optional update fields.
pub fn not_blank(value: &str) -> Result<(), validator::ValidationError> {
    if value.trim().is_empty() {
        let mut err = validator::ValidationError::new("blank");
        err.message = Some("must not be empty".into());
        return Err(err);
    }
    Ok(())
}

pub fn ensure_not_blank(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError {
            code: "BLANK_FIELD",
            message: format!("{} must not be empty", field),
        });
    }
    Ok(())
}

/// Media type of a `data:` URL, lower-cased, without parameters
fn data_url_media_type(data: &str) -> Option<String> {
    let rest = data.strip_prefix("data:")?;
    let header = rest.split(',').next()?;
    let media_type = header.split(';').next()?.trim().to_lowercase();
    Some(media_type)
}

/// Upper bound of the decoded length of a base64 body
fn decoded_len_estimate(encoded: &str) -> usize {
    let padding = encoded
        .as_bytes()
        .iter()
        .rev()
        .take(2)
        .filter(|&&b| b == b'=')
        .count();
    (encoded.len() / 4 * 3 + (encoded.len() % 4) * 3 / 4).saturating_sub(padding)
}

/// Full validation pipeline for an uploaded reference file.
///
/// The order is fixed: declared type, size ceiling, envelope prefix, decode,
/// content sniffing. Every failure is a `ValidationError`.
pub fn decode_pdf_upload(
    name: Option<&str>,
    declared_type: Option<&str>,
    data: &str,
    max_size: usize,
) -> Result<DecodedPdf, ValidationError> {
    let data = data.trim();

    // 1. Declared type
    let declared = declared_type
        .map(|t| t.split(';').next().unwrap_or("").trim().to_lowercase())
        .or_else(|| data_url_media_type(data));
    if declared.as_deref() != Some(PDF_MIME_TYPE) {
        return Err(ValidationError {
            code: "INVALID_MIME_TYPE",
            message: format!(
                "Reference file must be a PDF, got '{}'",
                declared.unwrap_or_else(|| "unknown".to_string())
            ),
        });
    }

    // 2. Size ceiling, before decoding anything
    let encoded = data.split_once(',').map(|(_, body)| body).unwrap_or(data);
    let estimated = decoded_len_estimate(encoded);
    if estimated > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "Reference file of {} bytes exceeds maximum allowed {} bytes ({} MB)",
                estimated,
                max_size,
                max_size / 1024 / 1024
            ),
        });
    }

    // 3. Envelope
    let Some(body) = data.strip_prefix(PDF_DATA_URL_PREFIX) else {
        return Err(ValidationError {
            code: "INVALID_ENVELOPE",
            message: format!("Reference file data must start with '{}'", PDF_DATA_URL_PREFIX),
        });
    };

    // 4. Decode
    let bytes = STANDARD.decode(body).map_err(|e| ValidationError {
        code: "INVALID_ENCODING",
        message: format!("Reference file is not valid base64: {}", e),
    })?;

    // 5. Content
    if bytes.is_empty() {
        return Err(ValidationError {
            code: "EMPTY_FILE",
            message: "Reference file appears to be empty".to_string(),
        });
    }
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(ValidationError {
            code: "INVALID_PDF",
            message: "Reference file content is not PDF data".to_string(),
        });
    }
    if bytes.len() > max_size {
        return Err(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "Reference file of {} bytes exceeds maximum allowed {} bytes",
                bytes.len(),
                max_size
            ),
        });
    }

    Ok(DecodedPdf {
        name: sanitize_pdf_name(name.unwrap_or(DEFAULT_PDF_NAME)),
        content_type: PDF_MIME_TYPE.to_string(),
        data: bytes,
    })
}

/// Reduces a client-supplied name to a bare `*.pdf` file name
pub fn sanitize_pdf_name(filename: &str) -> String {
    // Get only the filename component (remove any path)
    let base = filename.rsplit(['/', '\\']).next().unwrap_or("");

    if base != filename {
        tracing::warn!("Path components stripped from upload name: {}", filename);
    }

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_control() || matches!(c, ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';') {
                '_'
            } else {
                c
            }
        })
        .collect();
    let sanitized = sanitized.trim().trim_start_matches('.').to_string();

    if sanitized.is_empty() {
        return DEFAULT_PDF_NAME.to_string();
    }

    // Limit length safely for UTF-8
    let mut sanitized = if sanitized.len() > 200 {
        let mut end = 200;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    let has_pdf_ext = Path::new(&sanitized)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !has_pdf_ext {
        sanitized.push_str(".pdf");
    }

    sanitized
}
