mod subscriptions;

pub use subscriptions::{NewSubscription, PgSubscriptionRepo, Subscription, SubscriptionStore};
