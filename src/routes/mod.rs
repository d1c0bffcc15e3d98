use axum::http::HeaderValue;
use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get},
    Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::ingest::PREVIEW_MOUNT;
use crate::state::AppState;

pub mod design_versions;
pub mod designs;
pub mod health;
pub mod product_versions;
pub mod projects;

/// Uploaded archives are capped at 100 MB.
pub const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

pub fn create_router(state: AppState) -> Router<()> {
    let cors = if let Some(origins) = state.config.cors_allowed_origin.as_ref() {
        let headers: Vec<HeaderValue> = origins
            .split(',')
            .filter_map(|value| {
                let trimmed = value.trim();
                (!trimmed.is_empty()).then(|| {
                    trimmed
                        .parse::<HeaderValue>()
                        .expect("invalid CORS allowed origin")
                })
            })
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(headers))
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::mirror_request())
            .allow_methods(tower_http::cors::AllowMethods::mirror_request())
            .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
            .allow_credentials(true)
    };

    let projects_routes = Router::new()
        .route(
            "/",
            get(projects::list_projects).post(projects::create_project),
        )
        .route(
            "/:id",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/:id/versions",
            get(product_versions::list_product_versions)
                .post(product_versions::create_product_version),
        );

    let product_versions_routes = Router::new()
        .route(
            "/:id",
            get(product_versions::get_product_version)
                .patch(product_versions::update_product_version)
                .delete(product_versions::delete_product_version),
        )
        .route(
            "/:id/designs",
            get(designs::list_designs).post(designs::create_design),
        );

    let designs_routes = Router::new()
        .route(
            "/:id",
            get(designs::get_design)
                .patch(designs::update_design)
                .delete(designs::delete_design),
        )
        .route(
            "/:id/versions",
            get(design_versions::list_design_versions)
                .post(design_versions::create_design_version),
        );

    let design_versions_routes =
        Router::new().route("/:id", delete(design_versions::remove_design_version));

    // Extracted bundles are public by design: previews are shared by link.
    let previews = ServeDir::new(&state.config.upload_dir);

    Router::new()
        .nest("/api/projects", projects_routes)
        .nest("/api/product-versions", product_versions_routes)
        .nest("/api/designs", designs_routes)
        .nest("/api/design-versions", design_versions_routes)
        .route("/api/health", get(health::health_check))
        .nest_service(PREVIEW_MOUNT, previews)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
