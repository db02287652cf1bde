//! Result data structures.
//!
//! Everything returned to callers is plain, JSON-serialisable data. Optional
//! information is modelled with `Option`/empty collections so a result is
//! always well-formed, including on failure.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::MigrationPlan;
use crate::error_handling::ErrorKind;

/// Whether a signature identifies a tag-management platform or a tag that
/// is embedded directly in the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SignatureCategory {
    TagManager,
    DirectTag,
}

/// Every platform the signature catalog can recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Platform {
    // Tag managers
    TealiumIq,
    GoogleTagManager,
    AdobeLaunch,
    Ensighten,
    // Direct tags
    GoogleAnalytics,
    GoogleAds,
    MetaPixel,
    LinkedInInsight,
    MicrosoftUet,
    TikTokPixel,
    Hotjar,
    AdobeAnalytics,
    GoogleAdSense,
}

impl Platform {
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::TealiumIq => "Tealium iQ",
            Platform::GoogleTagManager => "Google Tag Manager",
            Platform::AdobeLaunch => "Adobe Experience Platform Launch",
            Platform::Ensighten => "Ensighten",
            Platform::GoogleAnalytics => "Google Analytics",
            Platform::GoogleAds => "Google Ads",
            Platform::MetaPixel => "Meta Pixel",
            Platform::LinkedInInsight => "LinkedIn Insight Tag",
            Platform::MicrosoftUet => "Microsoft UET",
            Platform::TikTokPixel => "TikTok Pixel",
            Platform::Hotjar => "Hotjar",
            Platform::AdobeAnalytics => "Adobe Analytics",
            Platform::GoogleAdSense => "Google AdSense",
        }
    }

    pub fn category(&self) -> SignatureCategory {
        match self {
            Platform::TealiumIq
            | Platform::GoogleTagManager
            | Platform::AdobeLaunch
            | Platform::Ensighten => SignatureCategory::TagManager,
            _ => SignatureCategory::DirectTag,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Which retrieval strategy produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchTier {
    Lightweight,
    Rendered,
}

/// Where in the document a signature matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceLocation {
    ExternalScript,
    InlineScript,
    Noscript,
}

/// Loading attributes present on a `<script>` element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadAttribute {
    Async,
    Defer,
    None,
}

/// How a tag-management platform is wired into the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImplementationType {
    /// Referenced only by an external `<script src>`
    Static,
    /// Injected only by inline script code
    DynamicLoading,
    /// Both an external reference and an inline loader
    Hybrid,
    /// Seen only inside `<noscript>` fallbacks
    NoscriptOnly,
}

/// How the platform's script is loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingPattern {
    Synchronous,
    Async,
    Deferred,
    Dynamic,
}

/// How a page's tags are organised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Methodology {
    #[default]
    None,
    SingleManaged,
    DualManaged,
}

/// One tag-management platform found on a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagManagerFinding {
    pub platform: Platform,
    /// Every distinct identifier captured for this platform
    pub container_ids: Vec<String>,
    pub account: Option<String>,
    pub profile: Option<String>,
    pub environment: Option<String>,
    pub implementation: ImplementationType,
    pub loading: LoadingPattern,
    /// `None` when the target does not constrain anything
    pub target_match: Option<bool>,
}

/// A marketing/analytics tag embedded without a tag manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectTagFinding {
    pub platform: Platform,
    pub ids: Vec<String>,
    pub locations: Vec<SourceLocation>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Two or more tag managers on one page: events are likely to fire twice
    DuplicateTracking,
    /// The same tag manager loaded with different containers
    MultipleContainers,
    /// Tags loaded outside the page's tag manager
    DirectAndManaged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conflict {
    pub kind: ConflictKind,
    pub platforms: Vec<Platform>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationPriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub priority: RecommendationPriority,
    pub message: String,
}

/// Classification of one document, independent of when or how it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detection {
    pub tag_managers: Vec<TagManagerFinding>,
    pub direct_tags: Vec<DirectTagFinding>,
    pub methodology: Methodology,
    pub conflicts: Vec<Conflict>,
    pub recommendations: Vec<Recommendation>,
    pub target_match: Option<bool>,
    /// Number of raw matches the classification was built from
    pub match_count: usize,
}

impl Detection {
    pub fn has_platform(&self, platform: Platform) -> bool {
        self.tag_managers.iter().any(|tm| tm.platform == platform)
    }
}

/// Scripts seen on the page, kept for transparency.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptSummary {
    pub external: Vec<String>,
    pub inline_count: usize,
    pub noscript_count: usize,
}

/// Why the lightweight result was escalated to the render tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", rename_all_fields = "camelCase", tag = "type")]
pub enum EscalationReason {
    NetworkFailure { kind: ErrorKind },
    BlockingStatus { status: u16 },
    SuspiciouslyEmpty { script_count: usize },
    ForcedHost { host: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationInfo {
    pub attempted: bool,
    pub reason: Option<EscalationReason>,
    pub succeeded: bool,
    /// The render tier ran and failed; the lightweight result was returned
    pub failed: bool,
    pub render_error: Option<String>,
}

/// Classified failure attached to a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FindingError {
    pub kind: ErrorKind,
    pub status: Option<u16>,
    pub summary: String,
    pub troubleshooting: String,
}

impl FindingError {
    pub fn new(kind: ErrorKind, status: Option<u16>, detail: impl std::fmt::Display) -> Self {
        Self {
            kind,
            status,
            summary: format!("{}: {}", kind.as_str(), detail),
            troubleshooting: kind.troubleshooting().to_string(),
        }
    }
}

/// The per-URL result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageFinding {
    pub url: String,
    pub final_url: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub success: bool,
    pub fetch_tier: FetchTier,
    pub http_status: Option<u16>,
    pub title: Option<String>,
    #[serde(flatten)]
    pub detection: Detection,
    pub scripts: ScriptSummary,
    pub parse_degraded: bool,
    pub escalation: EscalationInfo,
    pub error: Option<FindingError>,
}

impl PageFinding {
    /// A well-formed result for a page that could not be retrieved.
    pub fn failed(url: &str, tier: FetchTier, error: FindingError) -> Self {
        Self {
            url: url.to_string(),
            final_url: None,
            timestamp: Utc::now(),
            success: false,
            fetch_tier: tier,
            http_status: error.status,
            title: None,
            detection: Detection::default(),
            scripts: ScriptSummary::default(),
            parse_degraded: false,
            escalation: EscalationInfo::default(),
            error: Some(error),
        }
    }

    pub fn tag_managers(&self) -> &[TagManagerFinding] {
        &self.detection.tag_managers
    }

    pub fn methodology(&self) -> Methodology {
        self.detection.methodology
    }
}

/// A page visited during a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawledPage {
    pub depth: usize,
    #[serde(flatten)]
    pub finding: PageFinding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetLimit {
    Pages,
    Depth,
}

/// How a crawl ended. Running out of budget is not an error, but it is
/// reported distinctly from a crawl that exhausted the link graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "status")]
pub enum CrawlCompletion {
    Completed,
    BudgetExhausted { limit: BudgetLimit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodologyCounts {
    pub none: usize,
    pub single_managed: usize,
    pub dual_managed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlatformCoverage {
    pub platform: Platform,
    pub pages_with_platform: usize,
    pub coverage_pct: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MigrationProgress {
    #[serde(flatten)]
    pub plan: MigrationPlan,
    pub score: u32,
    pub pages_migrated: usize,
    pub pages_dual: usize,
    pub pages_legacy_only: usize,
    pub pages_unmanaged: usize,
}

/// Page-priority tier used to order the missing-page report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PagePriority {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingPage {
    pub url: String,
    pub depth: usize,
    pub priority: PagePriority,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingPlatformPages {
    pub platform: Platform,
    pub pages: Vec<MissingPage>,
}

/// Site-wide aggregation of a crawl.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlReport {
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// The seed page was retrieved
    pub success: bool,
    /// Why the seed page could not be retrieved
    pub error: Option<FindingError>,
    pub pages: Vec<CrawledPage>,
    pub pages_scanned: usize,
    pub pages_successful: usize,
    pub pages_failed: usize,
    pub completion: CrawlCompletion,
    pub methodology_counts: MethodologyCounts,
    pub coverage: Vec<PlatformCoverage>,
    pub migration: MigrationProgress,
    pub missing_pages: Vec<MissingPlatformPages>,
    /// Successful pages whose detection matched the target (0 when unconstrained)
    pub pages_matching_target: usize,
    pub error_summary: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStrategy {
    Comprehensive,
    Balanced,
    Sampled,
    Conservative,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTier {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavigationComplexity {
    Low,
    Medium,
    High,
}

/// What the estimator learned about the site before recommending a budget.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStructureEstimate {
    pub sitemap_page_count: Option<usize>,
    pub link_sample_depth: usize,
    pub navigation_complexity: NavigationComplexity,
    pub sampled_links: usize,
}

/// Recommended crawl budget for a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteEstimate {
    pub url: String,
    pub max_pages: usize,
    pub max_depth: usize,
    pub strategy: CrawlStrategy,
    pub size_tier: Option<SizeTier>,
    pub structure: SiteStructureEstimate,
    pub reasoning: Vec<String>,
}
