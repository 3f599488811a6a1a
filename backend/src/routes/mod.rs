//! Route definitions for the pharmacy ledger API

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes. Everything except `/login` needs a bearer token.
pub fn api_routes(state: AppState) -> Router<AppState> {
    let max_restore_bytes = state.config.server.max_restore_bytes;

    let protected = Router::new()
        .nest("/medicines", medicine_routes())
        .nest("/customers", customer_routes())
        .nest("/suppliers", supplier_routes())
        .nest("/users", user_routes())
        .nest("/search", search_routes())
        .nest("/inbounds", inbound_routes())
        .nest("/sales", sale_routes())
        .nest("/stock", stock_routes())
        .nest("/returns", return_routes())
        .route("/dashboard/stats", get(handlers::get_dashboard_stats))
        .nest("/reports", report_routes())
        .nest("/analysis", analysis_routes())
        .nest("/system", system_routes(max_restore_bytes))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/login", post(handlers::login))
        .merge(protected)
}

fn medicine_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_medicines).post(handlers::create_medicine),
        )
        .route(
            "/:id",
            get(handlers::get_medicine)
                .put(handlers::update_medicine)
                .delete(handlers::delete_medicine),
        )
        .route("/:id/movements", get(handlers::get_medicine_movements))
}

fn customer_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_customers).post(handlers::create_customer),
        )
        .route(
            "/:id",
            put(handlers::update_customer).delete(handlers::delete_customer),
        )
}

fn supplier_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_suppliers).post(handlers::create_supplier),
        )
        .route(
            "/:id",
            put(handlers::update_supplier).delete(handlers::delete_supplier),
        )
}

/// Admin only; checked in the handlers
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/:id",
            put(handlers::update_user).delete(handlers::delete_user),
        )
}

fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(handlers::search_users))
        .route("/customers", get(handlers::search_customers))
        .route("/suppliers", get(handlers::search_suppliers))
}

fn inbound_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_inbounds).post(handlers::create_inbound),
        )
        .route(
            "/:id",
            get(handlers::get_inbound)
                .put(handlers::update_inbound)
                .delete(handlers::delete_inbound),
        )
}

fn sale_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_sales).post(handlers::create_sale))
        .route(
            "/:id",
            get(handlers::get_sale)
                .put(handlers::update_sale)
                .delete(handlers::delete_sale),
        )
}

fn stock_routes() -> Router<AppState> {
    Router::new()
        .route("/adjust", post(handlers::adjust_stock))
        .route("/adjustments", get(handlers::list_adjustments))
}

fn return_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchase",
            get(handlers::list_purchase_returns).post(handlers::return_purchase),
        )
        .route(
            "/sales",
            get(handlers::list_sales_returns).post(handlers::return_sale),
        )
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/financial", get(handlers::get_financial_report))
        .route("/inventory", get(handlers::get_inventory_report))
        .route("/sales", get(handlers::get_sales_report))
        .route("/inbound", get(handlers::get_inbound_report))
}

fn analysis_routes() -> Router<AppState> {
    Router::new()
        .route("/top-selling", get(handlers::get_top_selling))
        .route("/trend", get(handlers::get_sales_trend))
}

/// Admin only; checked in the handlers
fn system_routes(max_restore_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/backup", get(handlers::backup_database))
        .route(
            "/restore",
            post(handlers::restore_database).layer(DefaultBodyLimit::max(max_restore_bytes)),
        )
        .route("/database/status", get(handlers::database_status))
}
