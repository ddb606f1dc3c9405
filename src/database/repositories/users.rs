use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::models::{OrganizationMembership, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE lower(email) = lower($1)")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Insert or refresh the local copy of a Supabase user.
    /// An existing full name is kept when the provider sends none.
    pub async fn upsert(
        &self,
        id: Uuid,
        email: &str,
        full_name: Option<&str>,
    ) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, full_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE
                SET email = EXCLUDED.email,
                    full_name = COALESCE(EXCLUDED.full_name, users.full_name),
                    updated_at = now()
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(email.trim())
        .bind(full_name.map(str::trim).filter(|n| !n.is_empty()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| DatabaseError::unique_as_conflict(e, "Email is already registered"))
    }

    pub async fn organizations(&self, user_id: Uuid) -> Result<Vec<OrganizationMembership>, DatabaseError> {
        let rows = sqlx::query_as::<_, OrganizationMembership>(
            r#"
            SELECT o.id AS organization_id, o.name, o.slug, uo.role
            FROM user_organizations uo
            JOIN organizations o ON o.id = uo.organization_id
            WHERE uo.user_id = $1
            ORDER BY o.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// The user's role in an organization; `None` when not a member
    /// or when the stored role is not one we recognise.
    pub async fn role_in(&self, user_id: Uuid, organization_id: Uuid) -> Result<Option<Role>, DatabaseError> {
        let role: Option<(String,)> = sqlx::query_as(
            "SELECT role FROM user_organizations WHERE user_id = $1 AND organization_id = $2",
        )
        .bind(user_id)
        .bind(organization_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(role.and_then(|(role,)| role.parse().ok()))
    }
}
