use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::Subscription;

#[derive(Clone)]
pub struct SubscriptionRepository {
    pool: PgPool,
}

impl SubscriptionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn for_organization(&self, organization_id: Uuid) -> Result<Option<Subscription>, DatabaseError> {
        let sub = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE organization_id = $1")
            .bind(organization_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(sub)
    }

    pub async fn set_customer(&self, organization_id: Uuid, customer_id: &str) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, organization_id, plan, status, stripe_customer_id)
            VALUES ($1, $2, 'trial', 'incomplete', $3)
            ON CONFLICT (organization_id) DO UPDATE
                SET stripe_customer_id = EXCLUDED.stripe_customer_id, updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(customer_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Record a completed Checkout session
    pub async fn activate(
        &self,
        organization_id: Uuid,
        plan: &str,
        customer_id: Option<&str>,
        subscription_id: Option<&str>,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO subscriptions (id, organization_id, plan, status, stripe_customer_id, stripe_subscription_id)
            VALUES ($1, $2, $3, 'active', $4, $5)
            ON CONFLICT (organization_id) DO UPDATE
                SET plan = EXCLUDED.plan,
                    status = 'active',
                    stripe_customer_id = COALESCE(EXCLUDED.stripe_customer_id, subscriptions.stripe_customer_id),
                    stripe_subscription_id = COALESCE(EXCLUDED.stripe_subscription_id, subscriptions.stripe_subscription_id),
                    updated_at = now()
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(organization_id)
        .bind(plan)
        .bind(customer_id)
        .bind(subscription_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Apply a subscription lifecycle event. Returns false when the Stripe
    /// subscription is not linked to any organization.
    pub async fn update_from_stripe(
        &self,
        stripe_subscription_id: &str,
        status: &str,
        plan: Option<&str>,
        current_period_end: Option<DateTime<Utc>>,
    ) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = $2,
                plan = COALESCE($3, plan),
                current_period_end = COALESCE($4, current_period_end),
                updated_at = now()
            WHERE stripe_subscription_id = $1
            "#,
        )
        .bind(stripe_subscription_id)
        .bind(status)
        .bind(plan)
        .bind(current_period_end)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
