use chrono::{Duration, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::auth::Role;
use crate::database::manager::DatabaseError;
use crate::database::models::handbook::DEFAULT_SECTIONS;
use crate::database::models::organization::validate_name;
use crate::database::models::{Member, NewOrganization, Organization, OrganizationUpdate, Plan};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<Organization>, DatabaseError> {
        let org = sqlx::query_as::<_, Organization>("SELECT * FROM organizations WHERE slug = $1")
            .bind(slug.to_ascii_lowercase())
            .fetch_optional(&self.pool)
            .await?;
        Ok(org)
    }

    pub async fn get_by_slug(&self, slug: &str) -> Result<Organization, DatabaseError> {
        self.find_by_slug(slug)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Organization '{}' not found", slug)))
    }

    /// Create an organization with its creator as ADMIN, a handbook with the
    /// default sections and a trial subscription, all in one transaction.
    pub async fn create_with_defaults(
        &self,
        new: NewOrganization,
        creator_id: Uuid,
        trial_days: i64,
    ) -> Result<Organization, DatabaseError> {
        let new = new.normalized()?;
        let mut tx = self.pool.begin().await?;

        let org = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (id, name, slug, org_number, address)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.org_number)
        .bind(&new.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DatabaseError::unique_as_conflict(e, format!("Slug '{}' is already taken", new.slug)))?;

        sqlx::query("INSERT INTO user_organizations (user_id, organization_id, role) VALUES ($1, $2, $3)")
            .bind(creator_id)
            .bind(org.id)
            .bind(Role::Admin.as_str())
            .execute(&mut *tx)
            .await?;

        Self::insert_default_handbook(&mut tx, &org).await?;

        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, organization_id, plan, status, trial_ends_at)
            VALUES ($1, $2, $3, 'trialing', $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(org.id)
        .bind(Plan::Trial.as_str())
        .bind(Utc::now() + Duration::days(trial_days))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::info!("Created organization {} ({})", org.slug, org.id);
        Ok(org)
    }

    async fn insert_default_handbook(
        tx: &mut Transaction<'_, Postgres>,
        org: &Organization,
    ) -> Result<(), DatabaseError> {
        let handbook_id = Uuid::new_v4();
        sqlx::query("INSERT INTO handbooks (id, organization_id, title, description) VALUES ($1, $2, $3, $4)")
            .bind(handbook_id)
            .bind(org.id)
            .bind(format!("{} – handbok", org.name))
            .bind("Digital handbok för föreningens medlemmar")
            .execute(&mut **tx)
            .await?;

        for (index, (title, description)) in DEFAULT_SECTIONS.iter().enumerate() {
            sqlx::query(
                "INSERT INTO sections (id, handbook_id, title, description, sort_order) VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(Uuid::new_v4())
            .bind(handbook_id)
            .bind(*title)
            .bind(*description)
            .bind(index as i32)
            .execute(&mut **tx)
            .await?;
        }
        Ok(())
    }

    pub async fn update(&self, id: Uuid, update: OrganizationUpdate) -> Result<Organization, DatabaseError> {
        let name = update.name.map(|n| n.trim().to_string());
        if let Some(name) = &name {
            validate_name(name)?;
        }

        sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                org_number = COALESCE($3, org_number),
                address = COALESCE($4, address),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(update.org_number.map(|v| v.trim().to_string()))
        .bind(update.address.map(|v| v.trim().to_string()))
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::NotFound("Organization not found".to_string()))
    }

    pub async fn members(&self, organization_id: Uuid) -> Result<Vec<Member>, DatabaseError> {
        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT u.id AS user_id, u.email, u.full_name, uo.role, uo.created_at
            FROM user_organizations uo
            JOIN users u ON u.id = uo.user_id
            WHERE uo.organization_id = $1
            ORDER BY uo.role, u.email
            "#,
        )
        .bind(organization_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(members)
    }

    /// Add a user to the organization, or change the role of an existing member.
    pub async fn add_member(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let roles = Self::lock_roles(&mut tx, organization_id).await?;
        ensure_admin_remains(&roles, user_id, Some(role))?;

        sqlx::query(
            r#"
            INSERT INTO user_organizations (user_id, organization_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, organization_id) DO UPDATE SET role = EXCLUDED.role
            "#,
        )
        .bind(user_id)
        .bind(organization_id)
        .bind(role.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn set_member_role(
        &self,
        organization_id: Uuid,
        user_id: Uuid,
        role: Role,
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let roles = Self::lock_roles(&mut tx, organization_id).await?;
        if !roles.iter().any(|(id, _)| *id == user_id) {
            return Err(DatabaseError::NotFound("Member not found".to_string()));
        }
        ensure_admin_remains(&roles, user_id, Some(role))?;

        sqlx::query("UPDATE user_organizations SET role = $3 WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn remove_member(&self, organization_id: Uuid, user_id: Uuid) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let roles = Self::lock_roles(&mut tx, organization_id).await?;
        ensure_admin_remains(&roles, user_id, None)?;

        let result = sqlx::query("DELETE FROM user_organizations WHERE user_id = $1 AND organization_id = $2")
            .bind(user_id)
            .bind(organization_id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("Member not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lock the organization's membership rows for the rest of the transaction.
    async fn lock_roles(
        tx: &mut Transaction<'_, Postgres>,
        organization_id: Uuid,
    ) -> Result<Vec<(Uuid, Option<Role>)>, DatabaseError> {
        let rows: Vec<(Uuid, String)> = sqlx::query_as(
            "SELECT user_id, role FROM user_organizations WHERE organization_id = $1 FOR UPDATE",
        )
        .bind(organization_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, role)| (id, role.parse().ok()))
            .collect())
    }
}

/// Reject a change that would leave the organization without any ADMIN.
/// `new_role` is `None` when the member is being removed.
pub fn ensure_admin_remains(
    roles: &[(Uuid, Option<Role>)],
    user_id: Uuid,
    new_role: Option<Role>,
) -> Result<(), DatabaseError> {
    let currently_admin = roles
        .iter()
        .any(|(id, role)| *id == user_id && *role == Some(Role::Admin));
    if !currently_admin || new_role == Some(Role::Admin) {
        return Ok(());
    }

    let other_admins = roles
        .iter()
        .filter(|(id, role)| *id != user_id && *role == Some(Role::Admin))
        .count();
    if other_admins == 0 {
        return Err(DatabaseError::Conflict(
            "An organization must keep at least one administrator".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_admin_cannot_leave_or_be_demoted() {
        let admin = Uuid::new_v4();
        let member = Uuid::new_v4();
        let roles = vec![(admin, Some(Role::Admin)), (member, Some(Role::Member))];

        assert!(matches!(
            ensure_admin_remains(&roles, admin, None),
            Err(DatabaseError::Conflict(_))
        ));
        assert!(matches!(
            ensure_admin_remains(&roles, admin, Some(Role::Editor)),
            Err(DatabaseError::Conflict(_))
        ));
        assert!(ensure_admin_remains(&roles, admin, Some(Role::Admin)).is_ok());
    }

    #[test]
    fn admin_can_leave_when_another_admin_exists() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let roles = vec![(first, Some(Role::Admin)), (second, Some(Role::Admin))];
        assert!(ensure_admin_remains(&roles, first, None).is_ok());
    }

    #[test]
    fn non_admin_changes_are_unrestricted() {
        let admin = Uuid::new_v4();
        let editor = Uuid::new_v4();
        let newcomer = Uuid::new_v4();
        let roles = vec![(admin, Some(Role::Admin)), (editor, Some(Role::Editor))];
        assert!(ensure_admin_remains(&roles, editor, None).is_ok());
        assert!(ensure_admin_remains(&roles, newcomer, Some(Role::Member)).is_ok());
    }
}
