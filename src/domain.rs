mod frequency;
mod subscription_token;

pub use frequency::Frequency;
pub use subscription_token::SubscriptionToken;
