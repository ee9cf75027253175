use std::fmt;
use std::str::FromStr;

use regex::Regex;

use uuid::Uuid;

/// A confirmation/unsubscribe token in canonical UUID text form
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct SubscriptionToken(Uuid);

impl SubscriptionToken {
    /// Generate a new random token
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl FromStr for SubscriptionToken {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        lazy_static::lazy_static! {
            static ref TOKEN_REGEX: Regex = Regex::new(
                r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
            )
            .unwrap();
        }

        if value.is_empty() {
            return Err("Token cannot be empty".into());
        }
        if !TOKEN_REGEX.is_match(value) {
            return Err("Token of incorrect format".into());
        }

        Uuid::parse_str(value)
            .map(Self)
            .map_err(|e| format!("Token of incorrect format: {}", e))
    }
}

impl From<Uuid> for SubscriptionToken {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl AsRef<Uuid> for SubscriptionToken {
    fn as_ref(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for SubscriptionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}
