//! GDPR/TCF2 permission checks for ad auction requests.
//!
//! This crate decides, per auction request, whether privacy-regulated
//! actions are permitted for an advertising vendor: syncing cookies,
//! passing device/user identifiers, passing precise geolocation, or sending
//! a bid request at all. Decisions combine the user's decoded TCF2 consent
//! string, the vendor's Global Vendor List entry, and the operator's
//! enforcement settings.
//!
//! Consent-string decoding and vendor-list fetching are external concerns,
//! injected behind the [`consent::ConsentDecoder`] and
//! [`vendor::VendorListFetcher`] traits.
//!
//! # Modules
//!
//! - [`bidder`]: Bidder identity newtype
//! - [`consent`]: Contracts over decoded consent strings
//! - [`error`]: Error types
//! - [`permissions`]: The permission engine and its public trait
//! - [`resolver`]: Bidder-to-vendor-id resolution
//! - [`settings`]: Enforcement configuration
//! - [`signal`]: GDPR applicability signal
//! - [`vendor`]: Vendor capabilities and the Global Vendor List
//! - [`test_support`]: Testing utilities and mocks

pub mod bidder;
pub mod consent;
pub mod error;
pub mod permissions;
pub mod resolver;
pub mod settings;
pub mod signal;
pub mod test_support;
pub mod vendor;

pub use bidder::BidderName;
pub use error::GdprError;
pub use permissions::{AuctionPermissions, Permissions, PermissionsBuilder, PermissionsEngine};
pub use settings::GdprSettings;
pub use signal::Signal;
