// handlers/public/pages.rs - GET /, /about, /terms, /privacy and the 404 fallback

use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::middleware::{request_host, subdomain_from_host, MaybeUser};
use crate::state::AppState;
use crate::views::{self, NotFoundDiagnostics, PageError};

use super::handbook::render_handbook;

/// GET / - the landing page on the apex domain, the handbook on `{slug}.{domain}`
pub async fn root(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let host = request_host(&headers).unwrap_or_default();
    if let Some(slug) = subdomain_from_host(&host, &state.config.server.base_domain) {
        return render_handbook(&state, user.as_ref(), &slug, &host, "/").await;
    }

    let ctx = views::context("Digitala handböcker för bostadsrättsföreningar", user.is_some());
    Ok(views::render("landing.html", &ctx)?.into_response())
}

pub async fn about(MaybeUser(user): MaybeUser) -> Result<Response, PageError> {
    let ctx = views::context("Om Handbok.org", user.is_some());
    Ok(views::render("about.html", &ctx)?.into_response())
}

pub async fn terms(MaybeUser(user): MaybeUser) -> Result<Response, PageError> {
    let ctx = views::context("Användarvillkor", user.is_some());
    Ok(views::render("terms.html", &ctx)?.into_response())
}

pub async fn privacy(MaybeUser(user): MaybeUser) -> Result<Response, PageError> {
    let ctx = views::context("Integritetspolicy", user.is_some());
    Ok(views::render("privacy.html", &ctx)?.into_response())
}

/// Router fallback: JSON under /api, otherwise the 404 page. Staging shows
/// what host and path were resolved.
pub async fn not_found(State(state): State<AppState>, headers: HeaderMap, uri: Uri) -> Response {
    if uri.path().starts_with("/api/") {
        return ApiError::not_found(format!("No route for {}", uri.path())).into_response();
    }

    let diagnostics = state.config.is_staging().then(|| {
        let host = request_host(&headers).unwrap_or_default();
        NotFoundDiagnostics {
            slug: subdomain_from_host(&host, &state.config.server.base_domain),
            host,
            path: uri.path().to_string(),
        }
    });
    tracing::debug!("No route for {}", uri.path());
    PageError::NotFound { diagnostics }.into_response()
}
