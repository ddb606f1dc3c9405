use url::form_urlencoded;

pub const DEFAULT_AFTER_LOGIN: &str = "/dashboard";

/// `/login?next=...` for a page the visitor tried to open
pub fn login_redirect_target(next: &str) -> String {
    let next = safe_next(Some(next));
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("/login?next={}", encoded)
}

/// Only local absolute paths are followed after login; anything that could
/// leave the site falls back to the dashboard.
pub fn safe_next(next: Option<&str>) -> String {
    match next.map(str::trim) {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && !path.chars().any(char::is_control) =>
        {
            path.to_string()
        }
        _ => DEFAULT_AFTER_LOGIN.to_string(),
    }
}
