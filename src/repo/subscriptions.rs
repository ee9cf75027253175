use uuid::Uuid;

use chrono::{DateTime, Utc};

use serde::Serialize;

use sqlx::PgPool;

use crate::domain::{Frequency, SubscriptionToken};

/// New Subscription request
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub email: String,
    pub city: String,
    pub frequency: Frequency,
}

/// Stored subscription record
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub email: String,
    pub city: String,
    /// Either `hourly` or `daily`
    pub frequency: String,
    pub token: Uuid,
    pub confirmed: bool,
    pub created_at: DateTime<Utc>,
}

/// Subscription store, implemented once per backing database.
/// Every operation is a single statement; callers get no atomicity across calls.
/// TODO: Swap async-trait for std async traits once they support `dyn` dispatch
#[async_trait::async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Whether a subscription exists for this exact email and city
    async fn exists(&self, email: &str, city: &str) -> sqlx::Result<bool>;

    /// Insert a new unconfirmed subscription, returning its token
    async fn insert(&self, new_subscription: &NewSubscription) -> sqlx::Result<SubscriptionToken>;

    /// Mark the subscription with this token as confirmed, returning rows affected
    async fn confirm(&self, token: &SubscriptionToken) -> sqlx::Result<u64>;

    /// Remove the subscription with this token, returning rows affected
    async fn delete(&self, token: &SubscriptionToken) -> sqlx::Result<u64>;
}

/// Postgres Subscription Repositiory
#[derive(Debug, Clone)]
pub struct PgSubscriptionRepo {
    pool: PgPool,
}

impl PgSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[tracing::instrument(name = "Fetch subscription by token", skip(self))]
    pub async fn fetch_by_token(
        &self,
        token: &SubscriptionToken,
    ) -> sqlx::Result<Option<Subscription>> {
        sqlx::query_as::<_, Subscription>(
            "select id, email, city, frequency, token, confirmed, created_at \
             from subscriptions where token=$1",
        )
        .bind(token.as_ref())
        .fetch_optional(&self.pool)
        .await
    }
}

#[async_trait::async_trait]
impl SubscriptionStore for PgSubscriptionRepo {
    #[tracing::instrument(name = "Check for existing subscription", skip(self))]
    async fn exists(&self, email: &str, city: &str) -> sqlx::Result<bool> {
        sqlx::query_scalar::<_, bool>(
            "select exists(select 1 from subscriptions where email=$1 and city=$2)",
        )
        .bind(email)
        .bind(city)
        .fetch_one(&self.pool)
        .await
    }

    #[tracing::instrument(name = "Insert subscription", skip(self))]
    async fn insert(&self, new_subscription: &NewSubscription) -> sqlx::Result<SubscriptionToken> {
        let id = Uuid::new_v4();
        let token = SubscriptionToken::generate();

        sqlx::query(
            "insert into subscriptions(id, email, city, frequency, token, confirmed, created_at) \
             values ($1, $2, $3, $4, $5, false, $6)",
        )
        .bind(id)
        .bind(&new_subscription.email)
        .bind(&new_subscription.city)
        .bind(new_subscription.frequency.as_str())
        .bind(token.as_ref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(token)
    }

    #[tracing::instrument(name = "Confirm a subscription by token", skip(self))]
    async fn confirm(&self, token: &SubscriptionToken) -> sqlx::Result<u64> {
        let result = sqlx::query("update subscriptions set confirmed=true where token=$1")
            .bind(token.as_ref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    #[tracing::instrument(name = "Delete a subscription by token", skip(self))]
    async fn delete(&self, token: &SubscriptionToken) -> sqlx::Result<u64> {
        let result = sqlx::query("delete from subscriptions where token=$1")
            .bind(token.as_ref())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
