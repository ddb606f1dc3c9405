use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::ValidationError;

/// Subdomains that belong to the service itself
pub const RESERVED_SLUGS: &[&str] = &["www", "api", "app", "admin", "staging", "mail"];

/// A tenant: one housing cooperative, served from `{slug}.{base_domain}`
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub org_number: Option<String>,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewOrganization {
    pub name: String,
    pub slug: String,
    #[serde(default)]
    pub org_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrganizationUpdate {
    pub name: Option<String>,
    pub org_number: Option<String>,
    pub address: Option<String>,
}

impl NewOrganization {
    /// Trim inputs, lowercase the slug and check both name and slug.
    pub fn normalized(mut self) -> Result<Self, ValidationError> {
        self.name = self.name.trim().to_string();
        self.slug = self.slug.trim().to_ascii_lowercase();
        self.org_number = self.org_number.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        self.address = self.address.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        validate_name(&self.name)?;
        validate_slug(&self.slug)?;
        Ok(self)
    }
}

pub fn validate_name(name: &str) -> Result<(), ValidationError> {
    let len = name.chars().count();
    if len < 2 {
        return Err(ValidationError::new("name", "Name must be at least 2 characters"));
    }
    if len > 200 {
        return Err(ValidationError::new("name", "Name must be at most 200 characters"));
    }
    Ok(())
}

/// 3-63 chars of `[a-z0-9-]`, no leading or trailing hyphen, not reserved.
pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if slug.len() < 3 || slug.len() > 63 {
        return Err(ValidationError::new("slug", "Slug must be between 3 and 63 characters"));
    }
    if !slug
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ValidationError::new(
            "slug",
            "Slug may only contain lowercase letters, digits and hyphens",
        ));
    }
    if slug.starts_with('-') || slug.ends_with('-') {
        return Err(ValidationError::new("slug", "Slug cannot start or end with a hyphen"));
    }
    if RESERVED_SLUGS.contains(&slug) {
        return Err(ValidationError::new("slug", "Slug is reserved"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_slugs() {
        assert!(validate_slug("brf-solgarden").is_ok());
        assert!(validate_slug("hsb-42").is_ok());
        assert!(validate_slug("abc").is_ok());
    }

    #[test]
    fn rejects_bad_slugs() {
        assert!(validate_slug("ab").is_err());
        assert!(validate_slug("BRF").is_err());
        assert!(validate_slug("brf_solgarden").is_err());
        assert!(validate_slug("-brf").is_err());
        assert!(validate_slug("brf-").is_err());
        assert!(validate_slug("brf.solgarden").is_err());
        assert!(validate_slug("www").is_err());
        assert!(validate_slug(&"a".repeat(64)).is_err());
    }

    #[test]
    fn normalizes_new_organization() {
        let org = NewOrganization {
            name: "  BRF Solgården ".into(),
            slug: " BRF-Solgarden ".into(),
            org_number: Some("  ".into()),
            address: Some(" Storgatan 1 ".into()),
        }
        .normalized()
        .unwrap();

        assert_eq!(org.name, "BRF Solgården");
        assert_eq!(org.slug, "brf-solgarden");
        assert_eq!(org.org_number, None);
        assert_eq!(org.address.as_deref(), Some("Storgatan 1"));
    }

    #[test]
    fn short_name_is_rejected() {
        let err = NewOrganization {
            name: "B".into(),
            slug: "brf-b".into(),
            org_number: None,
            address: None,
        }
        .normalized()
        .unwrap_err();
        assert_eq!(err.field, "name");
    }
}
