use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::handlers::{protected, public};
use crate::middleware::session_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .merge(public_routes())
        // Protected API
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/version", get(public::version))
        .route("/auth/login", post(public::login_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::{auth, metrics, transactions};

    Router::new()
        .route("/api/auth/whoami", get(auth::session_whoami))
        .route("/api/auth/session", delete(auth::session_logout))
        .route(
            "/api/transactions",
            get(transactions::list_get)
                .put(transactions::upsert_put)
                .delete(transactions::delete),
        )
        .route("/api/transactions/find", post(transactions::find_post))
        .route("/api/metrics", get(metrics::metrics_get))
        .route("/api/filters", get(metrics::filters_get))
        .route_layer(from_fn_with_state(state, session_auth_middleware))
}
