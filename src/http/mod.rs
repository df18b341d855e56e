pub mod handlers;
pub mod state;

use axum::Router;
use axum::routing::{get, post};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use state::AppState;

pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/api/user/register", post(handlers::auth::register))
        .route("/api/user/login", post(handlers::auth::login))
        .route("/healthz", get(handlers::health::healthz));

    let authenticated = Router::new()
        .route(
            "/api/user/orders",
            post(handlers::orders::upload).get(handlers::orders::list),
        )
        .route("/api/user/balance", get(handlers::balance::get))
        .route("/api/user/balance/withdraw", post(handlers::balance::withdraw))
        .route("/api/user/withdrawals", get(handlers::withdrawals::list));

    public
        .merge(authenticated)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
}
