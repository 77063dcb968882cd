//! Contracts over decoded TCF consent strings.
//!
//! The engine never decodes consent strings itself; it consumes a read-only
//! view produced by an external codec behind [`ConsentDecoder`]. The split
//! between [`VendorConsents`] and [`ConsentMetadata`] mirrors the TCF
//! format-version gate: every decodable string exposes its version, but only
//! format version 2 exposes the per-purpose/per-vendor query surface.

use error_stack::Report;

use crate::error::GdprError;

/// One of the ten standardized TCF2 processing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Purpose(u8);

impl Purpose {
    /// Purpose 1: storage and device-information access. Governs cookie
    /// syncing.
    pub const INFO_STORAGE_ACCESS: Self = Self(1);

    /// Purpose 2: basic ad selection. Gates sending the bid request.
    pub const BASIC_ADS: Self = Self(2);

    /// All ten purposes in ascending order.
    pub const ALL: [Self; 10] = [
        Self(1),
        Self(2),
        Self(3),
        Self(4),
        Self(5),
        Self(6),
        Self(7),
        Self(8),
        Self(9),
        Self(10),
    ];

    /// Create a purpose from its TCF id. Returns `None` outside 1..=10.
    pub const fn new(id: u8) -> Option<Self> {
        if id >= 1 && id <= 10 {
            Some(Self(id))
        } else {
            None
        }
    }

    /// The numeric TCF purpose id.
    pub const fn id(self) -> u8 {
        self.0
    }
}

/// Publisher override for a (purpose, vendor) pair, carried in the consent
/// string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PublisherRestriction {
    /// No restriction declared.
    #[default]
    None,
    /// The vendor may only rely on explicit consent for this purpose.
    RequireConsent,
    /// The vendor may only rely on legitimate interest for this purpose.
    RequireLegitInterest,
    /// The purpose is flatly denied for this vendor, overriding every other
    /// consent bit.
    NotAllowed,
}

/// A decoded consent string of any TCF format version.
pub trait VendorConsents: Send + Sync {
    /// TCF format version the string was encoded with.
    fn version(&self) -> u8;

    /// Global Vendor List version the string was built against.
    fn vendor_list_version(&self) -> u16;

    /// The TCF2 query surface, if this string is format version 2.
    ///
    /// Returning `None` while [`version`](Self::version) claims 2 is a
    /// contract violation on the decoder's side and surfaces as
    /// [`GdprError::MetadataContract`].
    fn tcf2_metadata(&self) -> Option<&dyn ConsentMetadata>;
}

/// Per-purpose and per-vendor bits of a TCF2 consent string.
pub trait ConsentMetadata: Send + Sync {
    /// Whether the user consented to the purpose.
    fn purpose_allowed(&self, purpose: Purpose) -> bool;

    /// Whether legitimate-interest transparency was established for the
    /// purpose.
    fn purpose_li_transparency(&self, purpose: Purpose) -> bool;

    /// Whether the user consented to the vendor.
    fn vendor_consent(&self, vendor_id: u16) -> bool;

    /// Whether the user accepted the vendor's legitimate-interest claim.
    fn vendor_legit_interest(&self, vendor_id: u16) -> bool;

    /// Whether the user opted in to the special feature.
    fn special_feature_opt_in(&self, feature_id: u8) -> bool;

    /// Whether the string signals purpose-one treatment (purpose 1 handled
    /// outside the consent string, e.g. by national law).
    fn purpose_one_treatment(&self) -> bool;

    /// The publisher restriction declared for the (purpose, vendor) pair.
    fn publisher_restriction(&self, purpose: Purpose, vendor_id: u16) -> PublisherRestriction;
}

/// Boundary to the external consent-string codec.
pub trait ConsentDecoder: Send + Sync {
    /// Decode a raw consent string.
    ///
    /// # Errors
    ///
    /// Returns [`GdprError::MalformedConsent`] when the string is
    /// structurally invalid.
    fn decode(&self, consent: &str) -> Result<Box<dyn VendorConsents>, Report<GdprError>>;
}
