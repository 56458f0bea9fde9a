pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::flashcard_service::FlashcardService;
use crate::services::workspace_service::WorkspaceService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::verify,
        api::handlers::auth::delete_account,
        api::handlers::workspaces::list_workspaces,
        api::handlers::workspaces::create_workspace,
        api::handlers::workspaces::update_workspace,
        api::handlers::workspaces::delete_workspace,
        api::handlers::workspaces::get_workspace_pdf,
        api::handlers::flashcards::list_flashcards,
        api::handlers::flashcards::create_flashcard,
        api::handlers::flashcards::update_flashcard,
        api::handlers::flashcards::delete_flashcard,
        api::handlers::health::health_check,
    ),
    components(
        schemas(
            api::handlers::auth::RegisterRequest,
            api::handlers::auth::LoginRequest,
            api::handlers::auth::UserResponse,
            api::handlers::auth::RegisterResponse,
            api::handlers::auth::AuthResponse,
            api::handlers::auth::VerifyResponse,
            api::handlers::auth::MessageResponse,
            api::handlers::workspaces::PdfUpload,
            api::handlers::workspaces::CreateWorkspaceRequest,
            api::handlers::workspaces::UpdateWorkspaceRequest,
            api::handlers::workspaces::PdfSummary,
            api::handlers::workspaces::WorkspaceResponse,
            api::handlers::flashcards::CreateFlashcardRequest,
            api::handlers::flashcards::UpdateFlashcardRequest,
            api::handlers::flashcards::FlashcardResponse,
            api::handlers::health::HealthResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Registration and session endpoints"),
        (name = "workspaces", description = "Workspace and reference PDF endpoints"),
        (name = "flashcards", description = "Flashcard endpoints"),
        (name = "system", description = "Health checks")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub workspace_service: Arc<WorkspaceService>,
    pub flashcard_service: Arc<FlashcardService>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: AppConfig) -> Self {
        Self {
            workspace_service: Arc::new(WorkspaceService::new(db.clone(), config.clone())),
            flashcard_service: Arc::new(FlashcardService::new(db.clone())),
            db,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origin = if config.allowed_origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!("Ignoring invalid CORS origin: {}", o);
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route("/auth/verify", get(api::handlers::auth::verify))
        .route("/auth/delete", delete(api::handlers::auth::delete_account))
        .route(
            "/workspaces",
            get(api::handlers::workspaces::list_workspaces)
                .post(api::handlers::workspaces::create_workspace),
        )
        .route(
            "/workspaces/:id",
            put(api::handlers::workspaces::update_workspace)
                .delete(api::handlers::workspaces::delete_workspace),
        )
        .route(
            "/workspaces/:id/pdf",
            get(api::handlers::workspaces::get_workspace_pdf),
        )
        .route(
            "/flashcards",
            post(api::handlers::flashcards::create_flashcard),
        )
        // GET takes a workspace id, PUT and DELETE a flashcard id
        .route(
            "/flashcards/:id",
            get(api::handlers::flashcards::list_flashcards)
                .put(api::handlers::flashcards::update_flashcard)
                .delete(api::handlers::flashcards::delete_flashcard),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .merge(protected)
        .layer(cors_layer(&state.config))
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_request_body(),
        ))
        .with_state(state)
}
