use std::fmt;
use std::str::FromStr;

/// How often a subscriber receives weather updates
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Frequency {
    Hourly,
    Daily,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Hourly => "hourly",
            Frequency::Daily => "daily",
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    // Exact match only, stored values are always lowercase
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hourly" => Ok(Self::Hourly),
            "daily" => Ok(Self::Daily),
            _ => Err("frequency must be hourly or daily".into()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.as_str().fmt(f)
    }
}
