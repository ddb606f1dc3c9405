use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub plan: String,
    pub status: String,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// Whether the organization currently has access to paid features
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        match self.status.as_str() {
            "active" => true,
            "trialing" => self.trial_ends_at.map_or(true, |end| end > now),
            "past_due" => self.current_period_end.map_or(false, |end| end > now),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Trial,
    Basic,
    Premium,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Trial => "trial",
            Plan::Basic => "basic",
            Plan::Premium => "premium",
        }
    }
}

impl FromStr for Plan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trial" => Ok(Plan::Trial),
            "basic" => Ok(Plan::Basic),
            "premium" => Ok(Plan::Premium),
            other => Err(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn subscription(status: &str) -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            plan: "basic".into(),
            status: status.into(),
            stripe_customer_id: None,
            stripe_subscription_id: None,
            trial_ends_at: None,
            current_period_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn trial_expires() {
        let now = Utc::now();
        let mut sub = subscription("trialing");
        sub.trial_ends_at = Some(now + Duration::days(3));
        assert!(sub.is_active(now));
        sub.trial_ends_at = Some(now - Duration::days(1));
        assert!(!sub.is_active(now));
    }

    #[test]
    fn canceled_is_inactive() {
        assert!(subscription("active").is_active(Utc::now()));
        assert!(!subscription("canceled").is_active(Utc::now()));
        assert!(!subscription("past_due").is_active(Utc::now()));
    }

    #[test]
    fn plans_parse_case_insensitively() {
        assert_eq!("Premium".parse::<Plan>(), Ok(Plan::Premium));
        assert!("gold".parse::<Plan>().is_err());
    }
}
