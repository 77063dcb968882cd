//! Bidder identity.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// Name of a bidding partner as configured by the operator.
///
/// Names are case-sensitive and used as keys in the vendor-id table and in
/// per-purpose exception lists. A bidder may appear under an alias name in a
/// request while its vendor id is registered under its core name.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BidderName(String);

impl BidderName {
    /// Create a bidder name from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BidderName {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bidder_name_is_case_sensitive() {
        assert_ne!(BidderName::from("appnexus"), BidderName::from("AppNexus"));
    }

    #[test]
    fn test_bidder_name_display() {
        assert_eq!(BidderName::from("rubicon").to_string(), "rubicon");
    }
}
