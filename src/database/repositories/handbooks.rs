use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::handbook::{
    validate_reorder, validate_title, HandbookUpdate, NewPage, NewSection, PageUpdate, SectionUpdate,
};
use crate::database::models::{Handbook, HandbookTree, Page, Section};

/// Appends and reorders of a handbook's sections serialize on this row lock.
const LOCK_HANDBOOK: &str = "SELECT id FROM handbooks WHERE id = $1 FOR UPDATE";

/// Appends and reorders of a section's pages serialize on this row lock.
const LOCK_SECTION: &str = "SELECT id FROM sections WHERE id = $1 AND handbook_id = $2 FOR UPDATE";

async fn lock_handbook(conn: &mut PgConnection, handbook_id: Uuid) -> Result<(), DatabaseError> {
    sqlx::query_as::<_, (Uuid,)>(LOCK_HANDBOOK)
        .bind(handbook_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| DatabaseError::NotFound("Handbook not found".to_string()))
}

async fn lock_section(conn: &mut PgConnection, handbook_id: Uuid, section_id: Uuid) -> Result<(), DatabaseError> {
    sqlx::query_as::<_, (Uuid,)>(LOCK_SECTION)
        .bind(section_id)
        .bind(handbook_id)
        .fetch_optional(conn)
        .await?
        .map(|_| ())
        .ok_or_else(|| DatabaseError::NotFound("Section not found".to_string()))
}

/// Sections and pages are always addressed through their handbook so one
/// organization can never touch another organization's content.
#[derive(Clone)]
pub struct HandbookRepository {
    pool: PgPool,
}

impl HandbookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_organization(&self, organization_id: Uuid) -> Result<Handbook, DatabaseError> {
        sqlx::query_as::<_, Handbook>("SELECT * FROM handbooks WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Handbook not found".to_string()))
    }

    pub async fn tree(&self, organization_id: Uuid) -> Result<HandbookTree, DatabaseError> {
        let handbook = self.for_organization(organization_id).await?;

        let sections = sqlx::query_as::<_, Section>(
            "SELECT * FROM sections WHERE handbook_id = $1 ORDER BY sort_order, created_at",
        )
        .bind(handbook.id)
        .fetch_all(&self.pool)
        .await?;

        let pages = sqlx::query_as::<_, Page>(
            r#"
            SELECT p.* FROM pages p
            JOIN sections s ON s.id = p.section_id
            WHERE s.handbook_id = $1
            ORDER BY p.sort_order, p.created_at
            "#,
        )
        .bind(handbook.id)
        .fetch_all(&self.pool)
        .await?;

        Ok(HandbookTree::assemble(handbook, sections, pages))
    }

    pub async fn update(&self, handbook_id: Uuid, update: HandbookUpdate) -> Result<Handbook, DatabaseError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;

        sqlx::query_as::<_, Handbook>(
            r#"
            UPDATE handbooks
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                is_public = COALESCE($4, is_public),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(handbook_id)
        .bind(title)
        .bind(update.description)
        .bind(update.is_public)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Handbook not found".to_string()))
    }

    pub async fn create_section(&self, handbook_id: Uuid, new: NewSection) -> Result<Section, DatabaseError> {
        let title = validate_title(&new.title)?;

        let mut tx = self.pool.begin().await?;
        lock_handbook(&mut tx, handbook_id).await?;

        let section = sqlx::query_as::<_, Section>(
            r#"
            INSERT INTO sections (id, handbook_id, title, description, sort_order)
            SELECT $1, $2, $3, $4, COALESCE(MAX(sort_order), -1) + 1
            FROM sections WHERE handbook_id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(handbook_id)
        .bind(title)
        .bind(new.description)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(section)
    }

    pub async fn update_section(
        &self,
        handbook_id: Uuid,
        section_id: Uuid,
        update: SectionUpdate,
    ) -> Result<Section, DatabaseError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;

        sqlx::query_as::<_, Section>(
            r#"
            UPDATE sections
            SET title = COALESCE($3, title),
                description = COALESCE($4, description),
                updated_at = now()
            WHERE id = $2 AND handbook_id = $1
            RETURNING *
            "#,
        )
        .bind(handbook_id)
        .bind(section_id)
        .bind(title)
        .bind(update.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Section not found".to_string()))
    }

    /// Deleting a section deletes its pages (ON DELETE CASCADE).
    pub async fn delete_section(&self, handbook_id: Uuid, section_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM sections WHERE id = $2 AND handbook_id = $1")
            .bind(handbook_id)
            .bind(section_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Section not found".to_string()));
        }
        Ok(())
    }

    pub async fn reorder_sections(&self, handbook_id: Uuid, ids: &[Uuid]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        lock_handbook(&mut tx, handbook_id).await?;

        let existing: Vec<(Uuid,)> =
            sqlx::query_as("SELECT id FROM sections WHERE handbook_id = $1 FOR UPDATE")
                .bind(handbook_id)
                .fetch_all(&mut *tx)
                .await?;
        let existing: Vec<Uuid> = existing.into_iter().map(|(id,)| id).collect();
        validate_reorder(&existing, ids)?;

        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE sections SET sort_order = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(index as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn create_page(
        &self,
        handbook_id: Uuid,
        section_id: Uuid,
        new: NewPage,
    ) -> Result<Page, DatabaseError> {
        let title = validate_title(&new.title)?;

        let mut tx = self.pool.begin().await?;
        lock_section(&mut tx, handbook_id, section_id).await?;

        let page = sqlx::query_as::<_, Page>(
            r#"
            INSERT INTO pages (id, section_id, title, content, sort_order)
            SELECT $1, $2, $3, $4, COALESCE(MAX(sort_order), -1) + 1
            FROM pages WHERE section_id = $2
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(section_id)
        .bind(title)
        .bind(new.content)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(page)
    }

    pub async fn update_page(
        &self,
        handbook_id: Uuid,
        page_id: Uuid,
        update: PageUpdate,
    ) -> Result<Page, DatabaseError> {
        let title = update.title.as_deref().map(validate_title).transpose()?;

        sqlx::query_as::<_, Page>(
            r#"
            UPDATE pages p
            SET title = COALESCE($3, p.title),
                content = COALESCE($4, p.content),
                updated_at = now()
            FROM sections s
            WHERE p.id = $2 AND s.id = p.section_id AND s.handbook_id = $1
            RETURNING p.*
            "#,
        )
        .bind(handbook_id)
        .bind(page_id)
        .bind(title)
        .bind(update.content)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Page not found".to_string()))
    }

    pub async fn delete_page(&self, handbook_id: Uuid, page_id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query(
            r#"
            DELETE FROM pages p
            USING sections s
            WHERE p.id = $2 AND s.id = p.section_id AND s.handbook_id = $1
            "#,
        )
        .bind(handbook_id)
        .bind(page_id)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Page not found".to_string()));
        }
        Ok(())
    }

    pub async fn reorder_pages(
        &self,
        handbook_id: Uuid,
        section_id: Uuid,
        ids: &[Uuid],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;

        lock_section(&mut tx, handbook_id, section_id).await?;

        let existing: Vec<(Uuid,)> = sqlx::query_as("SELECT id FROM pages WHERE section_id = $1 FOR UPDATE")
            .bind(section_id)
            .fetch_all(&mut *tx)
            .await?;
        let existing: Vec<Uuid> = existing.into_iter().map(|(id,)| id).collect();
        validate_reorder(&existing, ids)?;

        for (index, id) in ids.iter().enumerate() {
            sqlx::query("UPDATE pages SET sort_order = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(index as i32)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
