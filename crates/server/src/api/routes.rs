use axum::{
    middleware,
    routing::{get, patch, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use super::{audit, auth, dashboard, handlers, tickets, users};
use super::middleware::{auth_middleware, metrics_middleware};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let public_routes = Router::new()
        // Health, config and metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        // Credentials
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login));

    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me))
        // Tickets
        .route(
            "/tickets",
            post(tickets::create_ticket).get(tickets::list_tickets),
        )
        .route("/tickets/my-tickets", get(tickets::my_tickets))
        .route("/tickets/assigned", get(tickets::assigned_tickets))
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket)
                .put(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route(
            "/tickets/{id}/status",
            put(tickets::update_status).patch(tickets::update_status),
        )
        .route("/tickets/{id}/assign", patch(tickets::assign_ticket))
        .route(
            "/tickets/{id}/comments",
            post(tickets::add_comment).get(tickets::list_comments),
        )
        // Users
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}/role", patch(users::update_role))
        // Dashboard
        .route("/dashboard/stats", get(dashboard::stats))
        .route("/dashboard/ticket-status", get(dashboard::ticket_status))
        .route("/dashboard/ticket-priority", get(dashboard::ticket_priority))
        .route("/dashboard/recent-tickets", get(dashboard::recent_tickets))
        .route("/dashboard/activity-log", get(dashboard::activity_log))
        // Audit
        .route("/audit", get(audit::query_audit))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = public_routes.merge(protected_routes).with_state(state.clone());

    let mut router = Router::new().nest("/api", api_routes);

    // Serve the front-end with SPA fallback
    if let Some(ref web_dir) = state.config().server.web_dir {
        let index_path = web_dir.join("index.html");
        let serve_dir = ServeDir::new(web_dir).fallback(ServeFile::new(index_path));
        router = router.fallback_service(serve_dir);
    }

    router
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
