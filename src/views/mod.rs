use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use once_cell::sync::Lazy;
use serde::Serialize;
use tera::{Context, Tera};

use crate::auth::redirect::login_redirect_target;
use crate::database::DatabaseError;

macro_rules! template {
    ($name:literal) => {
        ($name, include_str!(concat!("../../templates/", $name)))
    };
}

static TEMPLATES: Lazy<Tera> = Lazy::new(|| {
    let mut tera = Tera::default();
    if let Err(e) = tera.add_raw_templates(vec![
        template!("base.html"),
        template!("landing.html"),
        template!("about.html"),
        template!("terms.html"),
        template!("privacy.html"),
        template!("login.html"),
        template!("signup.html"),
        template!("dashboard.html"),
        template!("organization.html"),
        template!("admin.html"),
        template!("handbook.html"),
        template!("not_found.html"),
        template!("error.html"),
    ]) {
        tracing::error!("Failed to compile templates: {}", e);
    }
    tera
});

/// Render a template to HTML, logging and degrading to a plain error on failure.
pub fn render(name: &str, context: &Context) -> Result<Html<String>, PageError> {
    TEMPLATES.render(name, context).map(Html).map_err(|e| {
        tracing::error!("Template {} failed to render: {:?}", name, e);
        PageError::Internal(format!("template {}", name))
    })
}

/// Context pre-filled with what `base.html` expects
pub fn context(title: &str, signed_in: bool) -> Context {
    let mut ctx = Context::new();
    ctx.insert("title", title);
    ctx.insert("signed_in", &signed_in);
    ctx.insert("year", &chrono::Utc::now().format("%Y").to_string());
    ctx
}

/// Diagnostics shown on the staging 404 page
#[derive(Debug, Clone, Serialize)]
pub struct NotFoundDiagnostics {
    pub host: String,
    pub slug: Option<String>,
    pub path: String,
}

/// Failure of a server-rendered page route
#[derive(Debug)]
pub enum PageError {
    /// Not signed in; carries the path to come back to
    Unauthenticated { next: String },
    /// Signed in but lacking the role
    Forbidden,
    NotFound { diagnostics: Option<NotFoundDiagnostics> },
    /// Redirect back to the dashboard with a message
    Flash(String),
    Internal(String),
}

impl PageError {
    pub fn not_found() -> Self {
        PageError::NotFound { diagnostics: None }
    }
}

impl From<DatabaseError> for PageError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound(_) => PageError::not_found(),
            DatabaseError::Conflict(msg) => PageError::Flash(msg),
            DatabaseError::Invalid(e) => PageError::Flash(e.message),
            other => PageError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::Unauthenticated { next } => Redirect::to(&login_redirect_target(&next)).into_response(),
            PageError::Forbidden => Redirect::to("/dashboard?error=forbidden").into_response(),
            PageError::Flash(message) => {
                let encoded: String = url::form_urlencoded::byte_serialize(message.as_bytes()).collect();
                Redirect::to(&format!("/dashboard?error={}", encoded)).into_response()
            }
            PageError::NotFound { diagnostics } => {
                let mut ctx = context("Sidan hittades inte", false);
                ctx.insert("diagnostics", &diagnostics);
                page_with_status(StatusCode::NOT_FOUND, "not_found.html", &ctx)
            }
            PageError::Internal(cause) => {
                tracing::error!("Page failed: {}", cause);
                let ctx = context("Något gick fel", false);
                page_with_status(StatusCode::INTERNAL_SERVER_ERROR, "error.html", &ctx)
            }
        }
    }
}

fn page_with_status(status: StatusCode, name: &str, ctx: &Context) -> Response {
    match TEMPLATES.render(name, ctx) {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!("Template {} failed to render: {:?}", name, e);
            (status, Html("<h1>Något gick fel</h1>".to_string())).into_response()
        }
    }
}
