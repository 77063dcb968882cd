//! GDPR permission checks for cookie syncing and auction activities.
//!
//! [`PermissionsEngine`] answers three questions per request: may the host
//! sync its own cookies, may a given bidder sync cookies, and which auction
//! activities (sending the bid request, passing geolocation, passing user
//! ids) are permitted for a bidder. The answers combine the decoded consent
//! string, the vendor's Global Vendor List entry, and the operator's
//! enforcement settings.
//!
//! The engine holds no mutable state; one instance is built per request and
//! may be evaluated concurrently with any number of others. The only await
//! point is the vendor-list fetch, so dropping the future cancels the
//! evaluation cleanly.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use error_stack::Report;

use crate::bidder::BidderName;
use crate::consent::{
    ConsentDecoder, ConsentMetadata, PublisherRestriction, Purpose, VendorConsents,
};
use crate::error::GdprError;
use crate::resolver::VendorIdResolver;
use crate::settings::GdprSettings;
use crate::signal::Signal;
use crate::vendor::{VendorCapability, VendorList, VendorListFetcher, VendorTrue};

/// What a bidder is allowed to do with an auction request.
///
/// Every field defaults to deny.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuctionPermissions {
    /// The bid request may be sent to the bidder.
    pub allow_bid_request: bool,
    /// Precise geolocation may be passed along.
    pub pass_geo: bool,
    /// Device/user identifiers may be passed along.
    pub pass_id: bool,
}

impl AuctionPermissions {
    pub const ALLOW_ALL: Self = Self {
        allow_bid_request: true,
        pass_geo: true,
        pass_id: true,
    };

    pub const DENY_ALL: Self = Self {
        allow_bid_request: false,
        pass_geo: false,
        pass_id: false,
    };

    /// Returned when TCF2 enforcement is globally disabled but the request
    /// carries a valid vendor/consent pair.
    pub const ALLOW_BID_REQUEST_ONLY: Self = Self {
        allow_bid_request: true,
        pass_geo: false,
        pass_id: false,
    };

    /// Recover the fail-closed permissions attached to an evaluation error.
    ///
    /// Every error returned by
    /// [`Permissions::auction_activities_allowed`] carries the conservative
    /// default permissions as an attachment; callers that only care about
    /// the outcome can use this instead of inspecting the error. Falls back
    /// to [`Self::DENY_ALL`] when no attachment is present.
    pub fn from_report(report: &Report<GdprError>) -> Self {
        report
            .downcast_ref::<Self>()
            .copied()
            .unwrap_or(Self::DENY_ALL)
    }
}

/// Per-request GDPR permission checks.
#[async_trait]
pub trait Permissions: Send + Sync {
    /// Whether the host may sync its own cookies.
    async fn host_cookies_allowed(&self) -> Result<bool, Report<GdprError>>;

    /// Whether the bidder may sync cookies. A bidder with no known vendor
    /// id is denied without error.
    async fn bidder_sync_allowed(&self, bidder: &BidderName) -> Result<bool, Report<GdprError>>;

    /// Which auction activities are permitted for the bidder. The bidder
    /// may appear under an alias; its vendor id resolves through the
    /// request's alias table first, then the core table.
    async fn auction_activities_allowed(
        &self,
        bidder_core_name: &BidderName,
        bidder: &BidderName,
    ) -> Result<AuctionPermissions, Report<GdprError>>;
}

/// Construction-time dependencies for [`PermissionsEngine`].
///
/// Built once at startup and shared; [`Self::for_request`] stamps out a
/// per-request engine.
#[derive(Clone)]
pub struct PermissionsBuilder {
    settings: Arc<GdprSettings>,
    decoder: Arc<dyn ConsentDecoder>,
    fetcher: Arc<dyn VendorListFetcher>,
    resolver: VendorIdResolver,
}

impl PermissionsBuilder {
    pub fn new(
        settings: Arc<GdprSettings>,
        decoder: Arc<dyn ConsentDecoder>,
        fetcher: Arc<dyn VendorListFetcher>,
        vendor_ids: Arc<HashMap<BidderName, u16>>,
    ) -> Self {
        Self {
            settings,
            decoder,
            fetcher,
            resolver: VendorIdResolver::new(vendor_ids),
        }
    }

    /// Build the engine for one request. An ambiguous signal resolves to
    /// the configured default.
    pub fn for_request(
        &self,
        signal: Signal,
        consent: impl Into<String>,
        publisher_id: impl Into<String>,
        alias_gvl_ids: HashMap<BidderName, u16>,
    ) -> PermissionsEngine {
        PermissionsEngine {
            settings: Arc::clone(&self.settings),
            decoder: Arc::clone(&self.decoder),
            fetcher: Arc::clone(&self.fetcher),
            resolver: self.resolver.clone(),
            signal: signal.normalize(self.settings.default_signal()),
            consent: consent.into(),
            publisher_id: publisher_id.into(),
            alias_gvl_ids,
        }
    }
}

/// The consent-to-permission decision engine for one request.
pub struct PermissionsEngine {
    settings: Arc<GdprSettings>,
    decoder: Arc<dyn ConsentDecoder>,
    fetcher: Arc<dyn VendorListFetcher>,
    resolver: VendorIdResolver,
    signal: Signal,
    consent: String,
    publisher_id: String,
    alias_gvl_ids: HashMap<BidderName, u16>,
}

#[async_trait]
impl Permissions for PermissionsEngine {
    async fn host_cookies_allowed(&self) -> Result<bool, Report<GdprError>> {
        if self.signal != Signal::Yes {
            return Ok(true);
        }

        self.allow_sync(self.settings.host_vendor_id, false).await
    }

    async fn bidder_sync_allowed(&self, bidder: &BidderName) -> Result<bool, Report<GdprError>> {
        if self.signal != Signal::Yes {
            return Ok(true);
        }

        match self.resolver.core(bidder) {
            Some(vendor_id) => {
                let vendor_exception = self
                    .settings
                    .tcf2
                    .purpose_vendor_exception(Purpose::INFO_STORAGE_ACCESS, bidder);
                self.allow_sync(vendor_id, vendor_exception).await
            }
            None => Ok(false),
        }
    }

    async fn auction_activities_allowed(
        &self,
        bidder_core_name: &BidderName,
        bidder: &BidderName,
    ) -> Result<AuctionPermissions, Report<GdprError>> {
        if self.settings.non_standard_publishers.contains(&self.publisher_id) {
            return Ok(AuctionPermissions::ALLOW_ALL);
        }

        if self.signal != Signal::Yes {
            return Ok(AuctionPermissions::ALLOW_ALL);
        }

        if self.consent.is_empty() {
            return Ok(self.default_permissions());
        }

        let weak_vendor_enforcement = self.settings.tcf2.basic_enforcement_vendor(bidder);

        match self
            .resolver
            .resolve(bidder_core_name, bidder, &self.alias_gvl_ids)
        {
            Some(vendor_id) => {
                self.allow_activities(vendor_id, bidder_core_name, weak_vendor_enforcement)
                    .await
            }
            // An unregistered vendor still gets a purpose-level evaluation
            // under basic enforcement.
            None if weak_vendor_enforcement => {
                self.allow_activities(0, bidder_core_name, weak_vendor_enforcement)
                    .await
            }
            None => {
                log::debug!("no vendor id for bidder {bidder}, denying all auction activities");
                Ok(AuctionPermissions::DENY_ALL)
            }
        }
    }
}

impl PermissionsEngine {
    /// Permissions used when consent is absent or cannot be evaluated:
    /// never pass ids, pass geo and send bid requests only if the operator
    /// does not enforce the corresponding purpose/feature.
    fn default_permissions(&self) -> AuctionPermissions {
        AuctionPermissions {
            allow_bid_request: !self.settings.tcf2.purpose_enforced(Purpose::BASIC_ADS),
            pass_geo: !self.settings.tcf2.feature_one_enforced(),
            pass_id: false,
        }
    }

    async fn allow_sync(
        &self,
        vendor_id: u16,
        vendor_exception: bool,
    ) -> Result<bool, Report<GdprError>> {
        if self.consent.is_empty() {
            return Ok(false);
        }

        let (parsed, vendor_list) = self.parse_consent().await?;

        let Some(vendor) = vendor_list.as_deref().and_then(|list| list.vendor(vendor_id)) else {
            // Not a TCF2 string, or the vendor is not in the list.
            return Ok(false);
        };

        let tcf2 = &self.settings.tcf2;
        if !tcf2.purpose_enforced(Purpose::INFO_STORAGE_ACCESS) {
            return Ok(true);
        }

        let metadata = tcf2_metadata(parsed.as_ref())?;

        if tcf2.purpose_one_treatment_enabled() && metadata.purpose_one_treatment() {
            return Ok(tcf2.purpose_one_treatment_access_allowed());
        }

        let enforce_vendors = tcf2.purpose_enforcing_vendors(Purpose::INFO_STORAGE_ACCESS);
        Ok(self.check_purpose(
            metadata,
            vendor,
            vendor_id,
            Purpose::INFO_STORAGE_ACCESS,
            enforce_vendors,
            vendor_exception,
            false,
        ))
    }

    async fn allow_activities(
        &self,
        vendor_id: u16,
        bidder: &BidderName,
        weak_vendor_enforcement: bool,
    ) -> Result<AuctionPermissions, Report<GdprError>> {
        let (parsed, vendor_list) = match self.parse_consent().await {
            Ok(result) => result,
            Err(report) => return Err(report.attach_opaque(self.default_permissions())),
        };

        let vendor: &dyn VendorCapability = match vendor_list
            .as_deref()
            .and_then(|list| list.vendor(vendor_id))
        {
            Some(vendor) => vendor,
            None if weak_vendor_enforcement && parsed.version() == 2 => {
                log::debug!(
                    "bidder {bidder} has no vendor list entry, \
                     substituting synthetic capability under basic enforcement"
                );
                &VendorTrue
            }
            None => return Ok(self.default_permissions()),
        };

        let tcf2 = &self.settings.tcf2;
        if !tcf2.is_enabled() {
            return Ok(AuctionPermissions::ALLOW_BID_REQUEST_ONLY);
        }

        let metadata = match tcf2_metadata(parsed.as_ref()) {
            Ok(metadata) => metadata,
            Err(report) => return Err(report.attach_opaque(self.default_permissions())),
        };

        let pass_geo = if tcf2.feature_one_enforced() {
            tcf2.feature_one_vendor_exception(bidder)
                || (metadata.special_feature_opt_in(1)
                    && (vendor.special_feature(1) || weak_vendor_enforcement))
        } else {
            true
        };

        let allow_bid_request = if tcf2.purpose_enforced(Purpose::BASIC_ADS) {
            self.check_purpose(
                metadata,
                vendor,
                vendor_id,
                Purpose::BASIC_ADS,
                tcf2.purpose_enforcing_vendors(Purpose::BASIC_ADS),
                tcf2.purpose_vendor_exception(Purpose::BASIC_ADS, bidder),
                weak_vendor_enforcement,
            )
        } else {
            true
        };

        // Passing ids is an existence check over purposes 2..=10.
        let pass_id = Purpose::ALL[1..].iter().any(|&purpose| {
            self.check_purpose(
                metadata,
                vendor,
                vendor_id,
                purpose,
                tcf2.purpose_enforcing_vendors(purpose),
                tcf2.purpose_vendor_exception(purpose, bidder),
                weak_vendor_enforcement,
            )
        });

        Ok(AuctionPermissions {
            allow_bid_request,
            pass_geo,
            pass_id,
        })
    }

    /// Decode the consent string and, for TCF2 strings, fetch the Global
    /// Vendor List version it was built against. Non-TCF2 strings return no
    /// list; callers fall back to default permissions.
    async fn parse_consent(
        &self,
    ) -> Result<(Box<dyn VendorConsents>, Option<Arc<VendorList>>), Report<GdprError>> {
        let parsed = self.decoder.decode(&self.consent)?;

        if parsed.version() != 2 {
            return Ok((parsed, None));
        }

        let vendor_list = self.fetcher.fetch(parsed.vendor_list_version()).await?;
        Ok((parsed, Some(vendor_list)))
    }

    /// The purpose cascade. Precedence, in order: a `NotAllowed` publisher
    /// restriction denies unconditionally; a configured vendor exception
    /// allows; a `RequireConsent`/`RequireLegitInterest` restriction pins
    /// the legal basis; otherwise either basis suffices.
    #[allow(clippy::too_many_arguments)]
    fn check_purpose(
        &self,
        metadata: &dyn ConsentMetadata,
        vendor: &dyn VendorCapability,
        vendor_id: u16,
        purpose: Purpose,
        enforce_vendors: bool,
        vendor_exception: bool,
        weak_vendor_enforcement: bool,
    ) -> bool {
        let restriction = metadata.publisher_restriction(purpose, vendor_id);
        if restriction == PublisherRestriction::NotAllowed {
            return false;
        }

        if vendor_exception {
            return true;
        }

        let purpose_allowed = consent_established(
            metadata,
            vendor,
            vendor_id,
            purpose,
            enforce_vendors,
            weak_vendor_enforcement,
        );
        let legit_interest = legit_interest_established(
            metadata,
            vendor,
            vendor_id,
            purpose,
            enforce_vendors,
            weak_vendor_enforcement,
        );

        match restriction {
            PublisherRestriction::RequireConsent => purpose_allowed,
            PublisherRestriction::RequireLegitInterest => legit_interest,
            _ => purpose_allowed || legit_interest,
        }
    }
}

fn tcf2_metadata(parsed: &dyn VendorConsents) -> Result<&dyn ConsentMetadata, Report<GdprError>> {
    parsed
        .tcf2_metadata()
        .ok_or_else(|| Report::new(GdprError::MetadataContract))
}

fn consent_established(
    metadata: &dyn ConsentMetadata,
    vendor: &dyn VendorCapability,
    vendor_id: u16,
    purpose: Purpose,
    enforce_vendors: bool,
    weak_vendor_enforcement: bool,
) -> bool {
    if !metadata.purpose_allowed(purpose) {
        return false;
    }
    if weak_vendor_enforcement {
        return true;
    }
    if !enforce_vendors {
        return true;
    }
    vendor.purpose(purpose) && metadata.vendor_consent(vendor_id)
}

fn legit_interest_established(
    metadata: &dyn ConsentMetadata,
    vendor: &dyn VendorCapability,
    vendor_id: u16,
    purpose: Purpose,
    enforce_vendors: bool,
    weak_vendor_enforcement: bool,
) -> bool {
    if !metadata.purpose_li_transparency(purpose) {
        return false;
    }
    if weak_vendor_enforcement {
        return true;
    }
    if !enforce_vendors {
        return true;
    }
    vendor.legitimate_interest(purpose) && metadata.vendor_legit_interest(vendor_id)
}

/// A permissions wrapper with host cookie syncing always allowed.
///
/// Used when the operator's deployment handles host-cookie consent outside
/// the TCF flow; everything else delegates to the wrapped engine.
pub struct AllowHostCookies<P>(pub P);

#[async_trait]
impl<P: Permissions> Permissions for AllowHostCookies<P> {
    async fn host_cookies_allowed(&self) -> Result<bool, Report<GdprError>> {
        Ok(true)
    }

    async fn bidder_sync_allowed(&self, bidder: &BidderName) -> Result<bool, Report<GdprError>> {
        self.0.bidder_sync_allowed(bidder).await
    }

    async fn auction_activities_allowed(
        &self,
        bidder_core_name: &BidderName,
        bidder: &BidderName,
    ) -> Result<AuctionPermissions, Report<GdprError>> {
        self.0
            .auction_activities_allowed(bidder_core_name, bidder)
            .await
    }
}

/// Permissions that allow everything. Used when GDPR is disabled host-wide
/// and as a bypass in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

#[async_trait]
impl Permissions for AlwaysAllow {
    async fn host_cookies_allowed(&self) -> Result<bool, Report<GdprError>> {
        Ok(true)
    }

    async fn bidder_sync_allowed(&self, _bidder: &BidderName) -> Result<bool, Report<GdprError>> {
        Ok(true)
    }

    async fn auction_activities_allowed(
        &self,
        _bidder_core_name: &BidderName,
        _bidder: &BidderName,
    ) -> Result<AuctionPermissions, Report<GdprError>> {
        Ok(AuctionPermissions::ALLOW_ALL)
    }
}
