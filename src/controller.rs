/// Subscription workflow endpoints
pub mod subscriptions;
/// Weather lookup endpoints
pub mod weather;
