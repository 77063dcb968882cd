//! Vendor capabilities from the Global Vendor List.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::Report;
use serde::Deserialize;

use crate::consent::Purpose;
use crate::error::GdprError;

/// What a vendor has registered to do, per the Global Vendor List.
///
/// Implemented by [`Vendor`] (a real GVL entry) and [`VendorTrue`] (the
/// synthetic capability substituted under weak enforcement). Evaluation code
/// depends only on this trait and never inspects which variant it received.
pub trait VendorCapability: Send + Sync {
    /// Whether the vendor declares the purpose on a consent basis.
    fn purpose(&self, purpose: Purpose) -> bool;

    /// Whether the vendor declares the purpose on a legitimate-interest
    /// basis.
    fn legitimate_interest(&self, purpose: Purpose) -> bool;

    /// Whether the vendor declares the special feature.
    fn special_feature(&self, feature_id: u8) -> bool;
}

/// A single vendor entry from a fetched Global Vendor List.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vendor {
    pub id: u16,
    #[serde(default)]
    purposes: HashSet<u8>,
    #[serde(default, rename = "legIntPurposes")]
    leg_int_purposes: HashSet<u8>,
    #[serde(default)]
    special_features: HashSet<u8>,
}

impl Vendor {
    /// Build a vendor entry directly, mainly for tests and static lists.
    pub fn new(
        id: u16,
        purposes: impl IntoIterator<Item = u8>,
        leg_int_purposes: impl IntoIterator<Item = u8>,
        special_features: impl IntoIterator<Item = u8>,
    ) -> Self {
        Self {
            id,
            purposes: purposes.into_iter().collect(),
            leg_int_purposes: leg_int_purposes.into_iter().collect(),
            special_features: special_features.into_iter().collect(),
        }
    }
}

impl VendorCapability for Vendor {
    fn purpose(&self, purpose: Purpose) -> bool {
        self.purposes.contains(&purpose.id())
    }

    fn legitimate_interest(&self, purpose: Purpose) -> bool {
        self.leg_int_purposes.contains(&purpose.id())
    }

    fn special_feature(&self, feature_id: u8) -> bool {
        self.special_features.contains(&feature_id)
    }
}

/// Synthetic capability that claims everything.
///
/// Substituted for an unregistered vendor when a basic-enforcement bidder
/// presents a valid TCF2 consent string, so that purpose-level consent alone
/// decides the outcome.
#[derive(Debug, Clone, Copy, Default)]
pub struct VendorTrue;

impl VendorCapability for VendorTrue {
    fn purpose(&self, _purpose: Purpose) -> bool {
        true
    }

    fn legitimate_interest(&self, _purpose: Purpose) -> bool {
        true
    }

    fn special_feature(&self, _feature_id: u8) -> bool {
        true
    }
}

/// An immutable Global Vendor List snapshot for one list version.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VendorList {
    pub vendor_list_version: u16,
    #[serde(deserialize_with = "vendors_by_id")]
    vendors: HashMap<u16, Vendor>,
}

impl VendorList {
    /// Build a list from vendor entries, keyed by their ids.
    pub fn new(vendor_list_version: u16, vendors: impl IntoIterator<Item = Vendor>) -> Self {
        Self {
            vendor_list_version,
            vendors: vendors.into_iter().map(|v| (v.id, v)).collect(),
        }
    }

    /// Look up a vendor by GVL id.
    pub fn vendor(&self, vendor_id: u16) -> Option<&Vendor> {
        self.vendors.get(&vendor_id)
    }
}

// GVL JSON keys vendors by their stringified id; re-key by the numeric id
// from the entry itself.
fn vendors_by_id<'de, D>(deserializer: D) -> Result<HashMap<u16, Vendor>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw: HashMap<String, Vendor> = HashMap::deserialize(deserializer)?;
    Ok(raw.into_values().map(|v| (v.id, v)).collect())
}

/// Boundary to the external vendor-list fetcher.
///
/// Implementations own caching, network retries, and fallback lists. The
/// fetch is the engine's only suspension point; dropping the future cancels
/// the evaluation.
#[async_trait]
pub trait VendorListFetcher: Send + Sync {
    /// Fetch the Global Vendor List for the given list version.
    ///
    /// # Errors
    ///
    /// Returns [`GdprError::VendorListFetch`] when the list cannot be
    /// retrieved.
    async fn fetch(&self, vendor_list_version: u16) -> Result<Arc<VendorList>, Report<GdprError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_capability_lookups() {
        let vendor = Vendor::new(32, [1, 2], [2, 7], [1]);

        assert!(vendor.purpose(Purpose::INFO_STORAGE_ACCESS));
        assert!(vendor.purpose(Purpose::BASIC_ADS));
        assert!(!vendor.purpose(Purpose::new(3).unwrap()));
        assert!(vendor.legitimate_interest(Purpose::BASIC_ADS));
        assert!(!vendor.legitimate_interest(Purpose::INFO_STORAGE_ACCESS));
        assert!(vendor.special_feature(1));
        assert!(!vendor.special_feature(2));
    }

    #[test]
    fn test_vendor_true_claims_everything() {
        for purpose in Purpose::ALL {
            assert!(VendorTrue.purpose(purpose));
            assert!(VendorTrue.legitimate_interest(purpose));
        }
        assert!(VendorTrue.special_feature(1));
    }

    #[test]
    fn test_vendor_list_lookup() {
        let list = VendorList::new(72, [Vendor::new(8, [1], [], [])]);

        assert_eq!(list.vendor_list_version, 72);
        assert!(list.vendor(8).is_some());
        assert!(list.vendor(9).is_none());
    }

    #[test]
    fn test_vendor_list_from_gvl_json() {
        let json = r#"{
            "vendorListVersion": 28,
            "vendors": {
                "8": {
                    "id": 8,
                    "purposes": [1, 2, 3, 4],
                    "legIntPurposes": [7, 9, 10],
                    "specialFeatures": [1]
                },
                "80": {
                    "id": 80,
                    "purposes": [2]
                }
            }
        }"#;

        let list: VendorList = serde_json::from_str(json).unwrap();
        assert_eq!(list.vendor_list_version, 28);

        let vendor = list.vendor(8).unwrap();
        assert!(vendor.purpose(Purpose::INFO_STORAGE_ACCESS));
        assert!(vendor.legitimate_interest(Purpose::new(7).unwrap()));
        assert!(vendor.special_feature(1));

        let sparse = list.vendor(80).unwrap();
        assert!(sparse.purpose(Purpose::BASIC_ADS));
        assert!(!sparse.legitimate_interest(Purpose::BASIC_ADS));
        assert!(!sparse.special_feature(1));
    }
}
