use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Document;

#[derive(Clone)]
pub struct DocumentRepository {
    pool: PgPool,
}

impl DocumentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, organization_id: Uuid) -> Result<Vec<Document>, DatabaseError> {
        let docs = sqlx::query_as::<_, Document>(
            "SELECT * FROM documents WHERE organization_id = $1 ORDER BY created_at DESC",
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(docs)
    }

    pub async fn find(&self, organization_id: Uuid, id: Uuid) -> Result<Document, DatabaseError> {
        sqlx::query_as::<_, Document>("SELECT * FROM documents WHERE id = $1 AND organization_id = $2")
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }

    pub async fn create(&self, doc: &Document) -> Result<Document, DatabaseError> {
        let created = sqlx::query_as::<_, Document>(
            r#"
            INSERT INTO documents (id, organization_id, uploaded_by, file_name, content_type, size_bytes, storage_path)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(doc.id)
        .bind(doc.organization_id)
        .bind(doc.uploaded_by)
        .bind(&doc.file_name)
        .bind(&doc.content_type)
        .bind(doc.size_bytes)
        .bind(&doc.storage_path)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn delete(&self, organization_id: Uuid, id: Uuid) -> Result<Document, DatabaseError> {
        sqlx::query_as::<_, Document>("DELETE FROM documents WHERE id = $1 AND organization_id = $2 RETURNING *")
            .bind(id)
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::NotFound("Document not found".to_string()))
    }
}
