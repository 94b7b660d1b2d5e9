use axum::{
    extract::DefaultBodyLimit,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use wisteria_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    routes, AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let admin_api = Router::new()
        .route(
            "/api/applicants",
            get(routes::applicants::list_applicants).post(routes::applicants::create_applicant),
        )
        .route(
            "/api/applicants/:id",
            get(routes::applicants::get_applicant)
                .patch(routes::applicants::patch_applicant)
                .delete(routes::applicants::delete_applicant),
        )
        .route(
            "/api/admin/applicants/:id/interview-booking",
            get(routes::interview_booking::get_booking)
                .post(routes::interview_booking::set_booking)
                .delete(routes::interview_booking::clear_booking),
        )
        .layer(axum::middleware::from_fn(
            wisteria_backend::middleware::auth::require_admin,
        ))
        .layer(axum::middleware::from_fn_with_state(
            wisteria_backend::middleware::rate_limit::new_rpm_state(config.admin_rpm),
            wisteria_backend::middleware::rate_limit::rate_limit_middleware,
        ));

    // Search and export serve both roles; company scoping happens in
    // the handlers from the decoded claims.
    let shared_api = Router::new()
        .route(
            "/api/applicants/search",
            get(routes::applicants::search_applicants),
        )
        .route(
            "/api/applicants/export",
            get(routes::export::export_applicants),
        )
        .layer(axum::middleware::from_fn(
            wisteria_backend::middleware::auth::require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            wisteria_backend::middleware::rate_limit::new_rpm_state(config.admin_rpm),
            wisteria_backend::middleware::rate_limit::rate_limit_middleware,
        ));

    let client_api = Router::new()
        .route(
            "/api/client/interview-availability",
            get(routes::availability::list_availability)
                .post(routes::availability::create_availability)
                .put(routes::availability::update_availability)
                .delete(routes::availability::delete_availability),
        )
        .route(
            "/api/client/applicants/:id/interview-booking",
            get(routes::interview_booking::client_get_booking),
        )
        .layer(axum::middleware::from_fn(
            wisteria_backend::middleware::auth::require_client,
        ))
        .layer(axum::middleware::from_fn_with_state(
            wisteria_backend::middleware::rate_limit::new_rpm_state(config.client_rpm),
            wisteria_backend::middleware::rate_limit::rate_limit_middleware,
        ));

    let app = base_routes
        .merge(admin_api)
        .merge(shared_api)
        .merge(client_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
