//! Bidder-to-vendor-id resolution.

use std::collections::HashMap;
use std::sync::Arc;

use crate::bidder::BidderName;

/// Maps bidder identities to Global Vendor List ids.
///
/// The core table is operator configuration fixed at construction. Alias
/// overrides arrive with each request (a bidder may present under an alias
/// that is registered under a different GVL id) and take precedence over the
/// core table.
#[derive(Debug, Clone)]
pub struct VendorIdResolver {
    vendor_ids: Arc<HashMap<BidderName, u16>>,
}

impl VendorIdResolver {
    pub fn new(vendor_ids: Arc<HashMap<BidderName, u16>>) -> Self {
        Self { vendor_ids }
    }

    /// Resolve the GVL id for a bidder, preferring the alias table.
    pub fn resolve(
        &self,
        bidder_core_name: &BidderName,
        bidder: &BidderName,
        alias_gvl_ids: &HashMap<BidderName, u16>,
    ) -> Option<u16> {
        if let Some(id) = alias_gvl_ids.get(bidder) {
            return Some(*id);
        }

        self.vendor_ids.get(bidder_core_name).copied()
    }

    /// Look up a bidder in the core table only, ignoring aliases. Used for
    /// cookie-sync checks, where the bidder always appears under its core
    /// name.
    pub fn core(&self, bidder: &BidderName) -> Option<u16> {
        self.vendor_ids.get(bidder).copied()
    }
}
