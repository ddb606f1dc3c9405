use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::ValidationError;

/// Sections every new handbook starts with: (title, description)
pub const DEFAULT_SECTIONS: &[(&str, &str)] = &[
    ("Välkommen", "Introduktion till föreningen och handboken"),
    ("Kontaktuppgifter", "Styrelse, förvaltare och viktiga telefonnummer"),
    ("Stadgar och regler", "Föreningens stadgar och ordningsregler"),
    ("Ekonomi", "Avgifter, budget och årsredovisningar"),
    ("Underhåll och skötsel", "Felanmälan, underhållsplan och skötselråd"),
    ("Gemensamma utrymmen", "Tvättstuga, förråd, cykelrum och bokning"),
];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Handbook {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Section {
    pub id: Uuid,
    pub handbook_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Page {
    pub id: Uuid,
    pub section_id: Uuid,
    pub title: String,
    pub content: String,
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionWithPages {
    #[serde(flatten)]
    pub section: Section,
    pub pages: Vec<Page>,
}

/// A handbook with its sections and pages, both sorted by `sort_order`
#[derive(Debug, Clone, Serialize)]
pub struct HandbookTree {
    #[serde(flatten)]
    pub handbook: Handbook,
    pub sections: Vec<SectionWithPages>,
}

impl HandbookTree {
    /// Group pages under their sections. Inputs may come in any order.
    pub fn assemble(handbook: Handbook, mut sections: Vec<Section>, mut pages: Vec<Page>) -> Self {
        sections.sort_by_key(|s| (s.sort_order, s.created_at));
        pages.sort_by_key(|p| (p.sort_order, p.created_at));

        let sections = sections
            .into_iter()
            .map(|section| {
                let section_pages = pages
                    .iter()
                    .filter(|p| p.section_id == section.id)
                    .cloned()
                    .collect();
                SectionWithPages {
                    section,
                    pages: section_pages,
                }
            })
            .collect();

        Self { handbook, sections }
    }

    pub fn page_count(&self) -> usize {
        self.sections.iter().map(|s| s.pages.len()).sum()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HandbookUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSection {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SectionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewPage {
    pub title: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageUpdate {
    pub title: Option<String>,
    pub content: Option<String>,
}

pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::new("title", "Title is required"));
    }
    if title.chars().count() > 200 {
        return Err(ValidationError::new("title", "Title must be at most 200 characters"));
    }
    Ok(title.to_string())
}

/// A reorder request must name every child of the parent exactly once.
pub fn validate_reorder(existing: &[Uuid], requested: &[Uuid]) -> Result<(), ValidationError> {
    let existing: HashSet<&Uuid> = existing.iter().collect();
    let mut seen = HashSet::with_capacity(requested.len());

    for id in requested {
        if !seen.insert(id) {
            return Err(ValidationError::new("ids", format!("Duplicate id {}", id)));
        }
        if !existing.contains(id) {
            return Err(ValidationError::new("ids", format!("Unknown id {}", id)));
        }
    }
    if seen.len() != existing.len() {
        return Err(ValidationError::new("ids", "Every item must be included exactly once"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn handbook() -> Handbook {
        let now = Utc::now();
        Handbook {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            title: "Handbok".into(),
            description: None,
            is_public: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn section(handbook_id: Uuid, order: i32) -> Section {
        let now = Utc::now();
        Section {
            id: Uuid::new_v4(),
            handbook_id,
            title: format!("Sektion {}", order),
            description: None,
            sort_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    fn page(section_id: Uuid, order: i32, offset: i64) -> Page {
        let now = Utc::now() + Duration::seconds(offset);
        Page {
            id: Uuid::new_v4(),
            section_id,
            title: format!("Sida {}", order),
            content: String::new(),
            sort_order: order,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn assembles_sorted_tree() {
        let hb = handbook();
        let first = section(hb.id, 0);
        let second = section(hb.id, 1);
        let pages = vec![
            page(second.id, 1, 0),
            page(first.id, 0, 0),
            page(second.id, 0, 0),
        ];

        let tree = HandbookTree::assemble(hb, vec![second.clone(), first.clone()], pages);

        assert_eq!(tree.sections.len(), 2);
        assert_eq!(tree.sections[0].section.id, first.id);
        assert_eq!(tree.sections[0].pages.len(), 1);
        assert_eq!(tree.sections[1].pages[0].sort_order, 0);
        assert_eq!(tree.sections[1].pages[1].sort_order, 1);
        assert_eq!(tree.page_count(), 3);
    }

    #[test]
    fn tree_serializes_flat_handbook_fields() {
        let hb = handbook();
        let tree = HandbookTree::assemble(hb.clone(), vec![], vec![]);
        let value = serde_json::to_value(&tree).unwrap();
        assert_eq!(value["id"], hb.id.to_string());
        assert!(value["sections"].as_array().unwrap().is_empty());
    }

    #[test]
    fn reorder_requires_exact_permutation() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let c = Uuid::new_v4();
        assert!(validate_reorder(&[a, b, c], &[c, a, b]).is_ok());
        assert!(validate_reorder(&[a, b, c], &[a, b]).is_err());
        assert!(validate_reorder(&[a, b], &[a, a]).is_err());
        assert!(validate_reorder(&[a, b], &[a, Uuid::new_v4()]).is_err());
    }

    #[test]
    fn titles_are_trimmed_and_required() {
        assert_eq!(validate_title("  Ekonomi ").unwrap(), "Ekonomi");
        assert!(validate_title("   ").is_err());
    }

    #[test]
    fn default_sections_are_present() {
        assert!(DEFAULT_SECTIONS.len() >= 3);
        assert_eq!(DEFAULT_SECTIONS[0].0, "Välkommen");
    }
}
