use axum::Json;
use migration::MigratorTrait;
use sea_orm::Database;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config;
use crate::task::api::{TaskState, create_task_router};

/// OpenAPI documentation for the service.
#[derive(OpenApi)]
#[openapi(
    paths(
        health_check_handler,
        crate::task::api::list_tasks_handler,
        crate::task::api::create_task_handler,
        crate::task::api::get_task_handler,
        crate::task::api::replace_task_handler,
        crate::task::api::patch_task_handler,
        crate::task::api::delete_task_handler,
    ),
    tags(
        (name = "Tasks", description = "Task management endpoints"),
        (name = "Health", description = "Service health endpoint")
    )
)]
struct ApiDoc;

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: config::Config) -> anyhow::Result<()> {
    use axum::Router;

    let server_address = format!("0.0.0.0:{}", &config.port);
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    let db = Database::connect(&config.db_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::info!("Database migrations applied successfully");

    let task_state = TaskState { db: Arc::new(db) };
    let task_router = create_task_router(task_state);

    let app = Router::new()
        .merge(task_router)
        .route("/health", axum::routing::get(health_check_handler))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    axum::serve(listener, app).await?;
    Ok(())
}

/// JSON response for the health endpoint.
#[derive(Debug, serde::Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    /// Always "OK" while the service is up
    pub status: String,
    /// Current server time, RFC 3339
    pub timestamp: String,
}

/// Handler for GET /health - Reports service liveness. Does not touch the store.
#[tracing::instrument]
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy", body = HealthResponse)),
    tag = "Health"
)]
pub async fn health_check_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
