//! Error types for GDPR permission evaluation.

use derive_more::{Display, Error};

/// Errors surfaced by consent decoding, vendor-list lookup, and permission
/// evaluation.
///
/// Every variant is non-retryable from the engine's point of view; retry
/// policy for vendor-list fetches belongs to the fetcher.
#[derive(Debug, Display, Error)]
pub enum GdprError {
    /// The consent string failed structural decoding. Callers should treat
    /// this the same as an absent consent string and fall back to default
    /// permissions.
    #[display("malformed consent string {consent:?}")]
    MalformedConsent {
        /// The raw consent string that failed to decode.
        consent: String,
    },

    /// The vendor-list fetcher failed for the list version declared by the
    /// consent string.
    #[display("failed to fetch vendor list version {vendor_list_version}")]
    VendorListFetch {
        /// Declared GVL version that could not be retrieved.
        vendor_list_version: u16,
    },

    /// The decoded consent claims TCF format version 2 but does not expose
    /// the per-purpose/per-vendor query surface. This indicates a broken
    /// decoder implementation, not bad user input.
    #[display("unable to access TCF2 parsed consent")]
    MetadataContract,

    /// The raw GDPR applicability signal was neither empty, "0", nor "1".
    #[display("invalid GDPR signal {value:?}")]
    InvalidSignal {
        /// The raw signal value from the request.
        value: String,
    },

    /// Settings could not be loaded or failed validation.
    #[display("configuration error: {message}")]
    Configuration {
        /// Human-readable description of what went wrong.
        message: String,
    },
}
