//! Membership plans.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Subscription plan assigned to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Free,
    Vip,
    Pro,
}

impl Plan {
    pub fn as_str(&self) -> &'static str {
        match self {
            Plan::Free => "free",
            Plan::Vip => "vip",
            Plan::Pro => "pro",
        }
    }

    /// Only paid plans have a checkout.
    pub fn is_purchasable(&self) -> bool {
        !matches!(self, Plan::Free)
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Plan {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "free" => Ok(Plan::Free),
            "vip" => Ok(Plan::Vip),
            "pro" => Ok(Plan::Pro),
            other => Err(ValidationError::invalid_format(
                "plan",
                format!("unknown plan '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_cannot_be_purchased() {
        assert!(!Plan::Free.is_purchasable());
        assert!(Plan::Vip.is_purchasable());
        assert!(Plan::Pro.is_purchasable());
    }

    #[test]
    fn plan_parses_case_insensitively() {
        assert_eq!("VIP".parse::<Plan>().unwrap(), Plan::Vip);
        assert!("gold".parse::<Plan>().is_err());
    }
}
