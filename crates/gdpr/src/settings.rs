//! GDPR enforcement settings.
//!
//! Settings are loaded from TOML with environment overrides (prefix
//! `CONSENT_GATE`, separator `__`) and frozen at startup. The defaults are
//! the conservative posture: TCF2 enabled, every purpose enforced at both
//! purpose and vendor level, no exceptions.

use std::collections::HashSet;

use config::{Config, Environment, File, FileFormat};
use error_stack::{Report, ResultExt};
use serde::Deserialize;
use validator::{Validate, ValidationError};

use crate::bidder::BidderName;
use crate::consent::Purpose;
use crate::error::GdprError;
use crate::signal::Signal;

/// Top-level GDPR settings.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct GdprSettings {
    /// Signal assumed when a request does not state whether GDPR applies.
    /// Must be "0" (assume it does not apply) or "1" (assume it applies).
    #[serde(default = "default_default_value")]
    #[validate(custom(function = validate_default_value))]
    pub default_value: String,

    /// GVL id of the host/operator, used for host cookie-sync checks.
    #[serde(default)]
    pub host_vendor_id: u16,

    /// Publisher ids exempt from GDPR evaluation entirely.
    #[serde(default)]
    pub non_standard_publishers: HashSet<String>,

    /// TCF2 enforcement toggles.
    #[serde(default)]
    #[validate(nested)]
    pub tcf2: Tcf2Settings,
}

/// TCF2 enforcement toggles and exception lists.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(default)]
pub struct Tcf2Settings {
    /// Global toggle. When false, a valid vendor/consent pair yields
    /// bid-request-only permissions without any purpose evaluation.
    pub enabled: bool,

    pub purpose1: PurposeSettings,
    pub purpose2: PurposeSettings,
    pub purpose3: PurposeSettings,
    pub purpose4: PurposeSettings,
    pub purpose5: PurposeSettings,
    pub purpose6: PurposeSettings,
    pub purpose7: PurposeSettings,
    pub purpose8: PurposeSettings,
    pub purpose9: PurposeSettings,
    pub purpose10: PurposeSettings,

    pub special_feature1: SpecialFeatureSettings,
    pub purpose_one_treatment: PurposeOneTreatmentSettings,

    /// Bidders evaluated under weak/basic vendor enforcement: purpose-level
    /// consent alone satisfies the vendor checks.
    pub basic_enforcement_vendors: HashSet<BidderName>,
}

/// Per-purpose enforcement toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PurposeSettings {
    /// Whether the purpose is enforced at all.
    pub enforce_purpose: bool,

    /// Whether vendor-level consent is required in addition to
    /// purpose-level consent.
    pub enforce_vendors: bool,

    /// Bidders that bypass consent and legitimate-interest checks for this
    /// purpose.
    pub vendor_exceptions: HashSet<BidderName>,
}

/// Special feature 1 (precise geolocation) toggles.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecialFeatureSettings {
    pub enforce: bool,
    pub vendor_exceptions: HashSet<BidderName>,
}

/// Purpose-one-treatment handling.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PurposeOneTreatmentSettings {
    /// Whether the purpose-one-treatment signal in consent strings is
    /// honored.
    pub enabled: bool,

    /// The access decision applied when the signal is honored and present.
    pub access_allowed: bool,
}

fn default_default_value() -> String {
    "1".to_string()
}

fn validate_default_value(value: &str) -> Result<(), ValidationError> {
    match value {
        "0" | "1" => Ok(()),
        _ => Err(ValidationError::new("default_value")),
    }
}

impl Default for Tcf2Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            purpose1: PurposeSettings::default(),
            purpose2: PurposeSettings::default(),
            purpose3: PurposeSettings::default(),
            purpose4: PurposeSettings::default(),
            purpose5: PurposeSettings::default(),
            purpose6: PurposeSettings::default(),
            purpose7: PurposeSettings::default(),
            purpose8: PurposeSettings::default(),
            purpose9: PurposeSettings::default(),
            purpose10: PurposeSettings::default(),
            special_feature1: SpecialFeatureSettings::default(),
            purpose_one_treatment: PurposeOneTreatmentSettings::default(),
            basic_enforcement_vendors: HashSet::new(),
        }
    }
}

impl Default for PurposeSettings {
    fn default() -> Self {
        Self {
            enforce_purpose: true,
            enforce_vendors: true,
            vendor_exceptions: HashSet::new(),
        }
    }
}

impl Default for SpecialFeatureSettings {
    fn default() -> Self {
        Self {
            enforce: true,
            vendor_exceptions: HashSet::new(),
        }
    }
}

impl Default for PurposeOneTreatmentSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            access_allowed: false,
        }
    }
}

impl Default for GdprSettings {
    fn default() -> Self {
        Self {
            default_value: default_default_value(),
            host_vendor_id: 0,
            non_standard_publishers: HashSet::new(),
            tcf2: Tcf2Settings::default(),
        }
    }
}

impl GdprSettings {
    /// Load settings from a TOML string, applying `CONSENT_GATE`-prefixed
    /// environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`GdprError::Configuration`] when the TOML cannot be parsed
    /// or the result fails validation.
    pub fn from_toml(toml_str: &str) -> Result<Self, Report<GdprError>> {
        let environment = Environment::default().prefix("CONSENT_GATE").separator("__");

        let toml = File::from_str(toml_str, FileFormat::Toml);
        let config = Config::builder()
            .add_source(toml)
            .add_source(environment)
            .build()
            .change_context(GdprError::Configuration {
                message: "failed to read GDPR settings".to_string(),
            })?;

        let settings: Self =
            config
                .try_deserialize()
                .change_context(GdprError::Configuration {
                    message: "failed to deserialize GDPR settings".to_string(),
                })?;

        settings
            .validate()
            .change_context(GdprError::Configuration {
                message: "GDPR settings validation failed".to_string(),
            })?;

        Ok(settings)
    }

    /// The signal assumed when a request's signal is ambiguous.
    pub fn default_signal(&self) -> Signal {
        if self.default_value == "0" {
            Signal::No
        } else {
            Signal::Yes
        }
    }
}

impl Tcf2Settings {
    /// Whether TCF2 enforcement is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn purpose(&self, purpose: Purpose) -> &PurposeSettings {
        match purpose.id() {
            1 => &self.purpose1,
            2 => &self.purpose2,
            3 => &self.purpose3,
            4 => &self.purpose4,
            5 => &self.purpose5,
            6 => &self.purpose6,
            7 => &self.purpose7,
            8 => &self.purpose8,
            9 => &self.purpose9,
            _ => &self.purpose10,
        }
    }

    /// Whether the purpose is enforced.
    pub fn purpose_enforced(&self, purpose: Purpose) -> bool {
        self.purpose(purpose).enforce_purpose
    }

    /// Whether vendor-level consent is required for the purpose.
    pub fn purpose_enforcing_vendors(&self, purpose: Purpose) -> bool {
        self.purpose(purpose).enforce_vendors
    }

    /// Whether the bidder is configured as an exception for the purpose.
    pub fn purpose_vendor_exception(&self, purpose: Purpose, bidder: &BidderName) -> bool {
        self.purpose(purpose).vendor_exceptions.contains(bidder)
    }

    /// Whether special feature 1 (precise geolocation) is enforced.
    pub fn feature_one_enforced(&self) -> bool {
        self.special_feature1.enforce
    }

    /// Whether the bidder is configured as a special-feature-1 exception.
    pub fn feature_one_vendor_exception(&self, bidder: &BidderName) -> bool {
        self.special_feature1.vendor_exceptions.contains(bidder)
    }

    /// Whether purpose-one-treatment signals are honored.
    pub fn purpose_one_treatment_enabled(&self) -> bool {
        self.purpose_one_treatment.enabled
    }

    /// The access decision applied under purpose-one treatment.
    pub fn purpose_one_treatment_access_allowed(&self) -> bool {
        self.purpose_one_treatment.access_allowed
    }

    /// Whether the bidder is evaluated under weak/basic vendor enforcement.
    pub fn basic_enforcement_vendor(&self, bidder: &BidderName) -> bool {
        self.basic_enforcement_vendors.contains(bidder)
    }
}
