use axum::http::{header, HeaderMap};

use crate::database::models::organization::RESERVED_SLUGS;

/// Host the visitor asked for; the hosting platform sets `x-forwarded-host`.
pub fn request_host(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-host")
        .or_else(|| headers.get(header::HOST))
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty())
}

/// Organization slug from `{slug}.{base_domain}`. The apex domain, `www`
/// and nested subdomains do not name an organization.
pub fn subdomain_from_host(host: &str, base_domain: &str) -> Option<String> {
    let host = strip_port(host).trim_end_matches('.').to_ascii_lowercase();
    let base = base_domain.trim_end_matches('.').to_ascii_lowercase();

    let label = host.strip_suffix(&base)?.strip_suffix('.')?;
    if label.is_empty() || label.contains('.') || RESERVED_SLUGS.contains(&label) {
        return None;
    }
    Some(label.to_string())
}

fn strip_port(host: &str) -> &str {
    // IPv6 literals never carry an organization
    if host.starts_with('[') {
        return host;
    }
    host.rsplit_once(':').map_or(host, |(name, _)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_organization_subdomain() {
        assert_eq!(subdomain_from_host("brf-eken.handbok.org", "handbok.org").as_deref(), Some("brf-eken"));
        assert_eq!(subdomain_from_host("BRF-Eken.Handbok.org:443", "handbok.org").as_deref(), Some("brf-eken"));
        assert_eq!(subdomain_from_host("brf-eken.localhost:3000", "localhost").as_deref(), Some("brf-eken"));
    }

    #[test]
    fn ignores_apex_www_and_foreign_hosts() {
        assert_eq!(subdomain_from_host("handbok.org", "handbok.org"), None);
        assert_eq!(subdomain_from_host("www.handbok.org", "handbok.org"), None);
        assert_eq!(subdomain_from_host("a.b.handbok.org", "handbok.org"), None);
        assert_eq!(subdomain_from_host("evilhandbok.org", "handbok.org"), None);
        assert_eq!(subdomain_from_host("brf.example.com", "handbok.org"), None);
    }

    #[test]
    fn forwarded_host_takes_precedence() {
        let mut headers = HeaderMap::new();
        headers.insert(header::HOST, HeaderValue::from_static("internal:8080"));
        headers.insert("x-forwarded-host", HeaderValue::from_static("BRF-Eken.handbok.org, proxy"));
        assert_eq!(request_host(&headers).as_deref(), Some("brf-eken.handbok.org"));
    }
}
