use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    response::Redirect,
    routing::{any, get, patch, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::SecurityConfig;
use crate::handlers::{protected, public};
use crate::middleware::require_session;
use crate::state::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn app(state: AppState) -> Router {
    let site = Router::new()
        .merge(public_routes())
        .merge(session_routes(&state))
        .merge(api_routes(&state))
        .layer(cors_layer(&state.config.security));

    Router::new()
        .merge(site)
        // The forwarder answers CORS itself, so it stays outside the CORS layer
        .merge(proxy_routes())
        .fallback(public::pages::not_found)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use public::{auth, debug, handbook, health, pages, webhook};

    Router::new()
        .route("/", get(pages::root))
        .route("/about", get(pages::about))
        .route("/terms", get(pages::terms))
        .route("/privacy", get(pages::privacy))
        .route("/h/:slug", get(handbook::handbook_by_path))
        .route("/login", get(auth::login_form).post(auth::login_submit))
        .route("/signup", get(auth::signup_form).post(auth::signup_submit))
        .route("/logout", post(auth::logout))
        .route("/health", get(health::health))
        .route("/api/debug", get(debug::debug))
        .route("/api/stripe/webhook", post(webhook::stripe_webhook))
}

/// Browser pages that redirect to /login without a session
fn session_routes(state: &AppState) -> Router<AppState> {
    use protected::{admin, dashboard};

    Router::new()
        .route("/dashboard", get(dashboard::dashboard).post(dashboard::create_organization))
        .route("/dashboard/:slug", get(dashboard::organization))
        .route("/admin", get(|| async { Redirect::to("/dashboard") }))
        .route("/admin/:slug", get(admin::admin))
        .route("/admin/:slug/settings", post(admin::update_settings))
        .route("/admin/:slug/members", post(admin::add_member))
        .route("/admin/:slug/members/:user_id/role", post(admin::change_role))
        .route("/admin/:slug/members/:user_id/remove", post(admin::remove_member))
        .route("/admin/:slug/billing/checkout", post(admin::checkout))
        .route("/admin/:slug/billing/portal", post(admin::portal))
        .route_layer(from_fn_with_state(state.clone(), require_session))
}

fn api_routes(state: &AppState) -> Router<AppState> {
    use protected::api::{billing, documents, handbook, me, members, organizations};

    let upload_limit = state.config.server.max_upload_bytes + MULTIPART_OVERHEAD;
    let org = "/api/organizations/:slug";

    Router::new()
        .route("/api/me", get(me::me))
        .route("/api/organizations", post(organizations::create))
        .route(org, get(organizations::show).patch(organizations::update))
        .route(&format!("{org}/members"), get(members::list).post(members::add))
        .route(
            &format!("{org}/members/:user_id"),
            patch(members::update_role).delete(members::remove),
        )
        .route(&format!("{org}/handbook"), get(handbook::show).patch(handbook::update))
        .route(&format!("{org}/handbook/sections"), post(handbook::create_section))
        .route(&format!("{org}/handbook/sections/order"), put(handbook::reorder_sections))
        .route(
            &format!("{org}/handbook/sections/:section_id"),
            patch(handbook::update_section).delete(handbook::delete_section),
        )
        .route(&format!("{org}/handbook/sections/:section_id/pages"), post(handbook::create_page))
        .route(
            &format!("{org}/handbook/sections/:section_id/pages/order"),
            put(handbook::reorder_pages),
        )
        .route(
            &format!("{org}/handbook/pages/:page_id"),
            patch(handbook::update_page).delete(handbook::delete_page),
        )
        .route(
            &format!("{org}/documents"),
            get(documents::list)
                .post(documents::upload)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            &format!("{org}/documents/:document_id"),
            get(documents::download).delete(documents::delete),
        )
        .route(&format!("{org}/billing/checkout"), post(billing::checkout))
        .route(&format!("{org}/billing/portal"), post(billing::portal))
}

fn proxy_routes() -> Router<AppState> {
    Router::new()
        .route("/api/proxy", any(public::proxy::forward))
        .route("/api/proxy/*path", any(public::proxy::forward))
}

/// Configured origins get credentialed CORS; none configured means permissive.
fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = security
        .cors_origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin.trim()).ok())
        .collect();

    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true)
}
