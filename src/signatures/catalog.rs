//! Built-in signature catalog.
//!
//! Each signature is a regex with optional named groups `id`, `account`,
//! `profile` and `env`. Patterns are matched against script `src` values,
//! inline script bodies and `<noscript>` blocks separately, never against the
//! whole document, so the source location of every match is known.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::models::{Platform, SignatureCategory};
use crate::utils::compile_regex_unsafe;

/// How a platform encodes its identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdFormat {
    /// Account/profile/environment encoded as path segments
    PathTriple,
    /// Fixed-length alphanumeric container code (e.g. `GTM-XXXXXXX`)
    ContainerCode,
    /// Digits-only account or pixel id
    NumericId,
    /// Opaque hash or no id at all (loader URL only)
    Opaque,
}

/// One recognizable pattern. Immutable once the catalog is built.
#[derive(Debug, Clone)]
pub struct TagSignature {
    pub name: &'static str,
    pub platform: Platform,
    pub category: SignatureCategory,
    pub matcher: Regex,
    pub id_format: IdFormat,
    /// The signature is only evaluated on text containing one of these
    /// substrings. Empty means no precondition.
    pub context: &'static [&'static str],
    /// Hostnames and loader keywords whose presence in raw page text suggests
    /// this platform is on the page.
    pub hints: &'static [&'static str],
}

impl TagSignature {
    /// Whether the context precondition holds for `text`.
    pub fn applies_to(&self, text: &str) -> bool {
        self.context.is_empty() || self.context.iter().any(|c| text.contains(c))
    }
}

/// Declarative form of a signature, compiled into a `TagSignature`.
struct SignatureSpec {
    name: &'static str,
    platform: Platform,
    pattern: &'static str,
    id_format: IdFormat,
    context: &'static [&'static str],
    hints: &'static [&'static str],
}

const TEALIUM_HINTS: &[&str] = &["tiqcdn.com", "/utag/", "utag.js"];
const GTM_HINTS: &[&str] = &["googletagmanager.com/gtm.js", "googletagmanager.com/ns.html", "GTM-"];
const ADOBE_LAUNCH_HINTS: &[&str] = &["assets.adobedtm.com"];
const ENSIGHTEN_HINTS: &[&str] = &["nexus.ensighten.com"];

const BUILTIN_SPECS: &[SignatureSpec] = &[
    // Tag managers
    SignatureSpec {
        name: "tealium-utag",
        platform: Platform::TealiumIq,
        pattern: r"\\?/utag\\?/(?P<account>[\w.-]+)\\?/(?P<profile>[\w.-]+)\\?/(?P<env>[\w.-]+)\\?/utag(?:\.sync)?\.js",
        id_format: IdFormat::PathTriple,
        context: &[],
        hints: TEALIUM_HINTS,
    },
    SignatureSpec {
        name: "gtm-container",
        platform: Platform::GoogleTagManager,
        pattern: r"\b(?P<id>GTM-[A-Z0-9]{7})\b",
        id_format: IdFormat::ContainerCode,
        context: &[],
        hints: GTM_HINTS,
    },
    SignatureSpec {
        name: "adobe-launch",
        platform: Platform::AdobeLaunch,
        pattern: r"assets\.adobedtm\.com\\?/(?P<account>[\w-]+)\\?/(?P<profile>[\w-]+)\\?/launch-(?P<id>[0-9A-Za-z]+)(?:-(?P<env>development|staging))?(?:\.min)?\.js",
        id_format: IdFormat::Opaque,
        context: &[],
        hints: ADOBE_LAUNCH_HINTS,
    },
    SignatureSpec {
        name: "ensighten-bootstrap",
        platform: Platform::Ensighten,
        pattern: r"nexus\.ensighten\.com\\?/(?P<account>[\w-]+)\\?/(?P<profile>[\w-]+)\\?/Bootstrap\.js",
        id_format: IdFormat::PathTriple,
        context: &[],
        hints: ENSIGHTEN_HINTS,
    },
    // Direct tags
    SignatureSpec {
        name: "ga4-gtag",
        platform: Platform::GoogleAnalytics,
        pattern: r#"(?:gtag/js\?id=|gtag\s*\(\s*['"]config['"]\s*,\s*['"])(?P<id>G-[A-Z0-9]{6,12})\b"#,
        id_format: IdFormat::ContainerCode,
        context: &[],
        hints: &["googletagmanager.com/gtag/js"],
    },
    SignatureSpec {
        name: "universal-analytics",
        platform: Platform::GoogleAnalytics,
        pattern: r"\b(?P<id>UA-\d{4,10}-\d{1,4})\b",
        id_format: IdFormat::NumericId,
        context: &[],
        hints: &["google-analytics.com/analytics.js", "google-analytics.com/ga.js"],
    },
    SignatureSpec {
        name: "google-ads",
        platform: Platform::GoogleAds,
        pattern: r"\b(?P<id>AW-\d{6,12})\b",
        id_format: IdFormat::NumericId,
        context: &[],
        hints: &["googleadservices.com", "AW-"],
    },
    SignatureSpec {
        name: "meta-pixel-init",
        platform: Platform::MetaPixel,
        pattern: r#"fbq\s*\(\s*['"]init['"]\s*,\s*['"](?P<id>\d{10,20})['"]"#,
        id_format: IdFormat::NumericId,
        context: &[],
        hints: &["connect.facebook.net", "fbq("],
    },
    SignatureSpec {
        name: "meta-pixel-loader",
        platform: Platform::MetaPixel,
        pattern: r"connect\.facebook\.net\\?/[\w_]+\\?/fbevents\.js",
        id_format: IdFormat::Opaque,
        context: &[],
        hints: &["connect.facebook.net"],
    },
    SignatureSpec {
        name: "linkedin-insight",
        platform: Platform::LinkedInInsight,
        pattern: r#"_linkedin_partner_id\s*=\s*['"]?(?P<id>\d{4,12})"#,
        id_format: IdFormat::NumericId,
        context: &[],
        hints: &["snap.licdn.com", "_linkedin_partner_id"],
    },
    SignatureSpec {
        name: "linkedin-insight-loader",
        platform: Platform::LinkedInInsight,
        pattern: r"snap\.licdn\.com\\?/li\.lms-analytics\\?/insight\.min\.js",
        id_format: IdFormat::Opaque,
        context: &[],
        hints: &["snap.licdn.com"],
    },
    SignatureSpec {
        name: "microsoft-uet",
        platform: Platform::MicrosoftUet,
        pattern: r#"(?:bat\.bing\.com/action/0\?ti=|\bti\s*:\s*['"]?)(?P<id>\d{5,12})"#,
        id_format: IdFormat::NumericId,
        context: &["bat.bing.com", "uetq"],
        hints: &["bat.bing.com"],
    },
    SignatureSpec {
        name: "microsoft-uet-loader",
        platform: Platform::MicrosoftUet,
        pattern: r"bat\.bing\.com\\?/bat\.js",
        id_format: IdFormat::Opaque,
        context: &[],
        hints: &["bat.bing.com"],
    },
    SignatureSpec {
        name: "tiktok-pixel",
        platform: Platform::TikTokPixel,
        pattern: r#"ttq\.load\s*\(\s*['"](?P<id>[A-Z0-9]{15,25})['"]"#,
        id_format: IdFormat::ContainerCode,
        context: &[],
        hints: &["analytics.tiktok.com", "ttq.load"],
    },
    SignatureSpec {
        name: "hotjar",
        platform: Platform::Hotjar,
        pattern: r"(?:\bhjid\s*:\s*|static\.hotjar\.com/c/hotjar-)(?P<id>\d{5,10})",
        id_format: IdFormat::NumericId,
        context: &["hotjar"],
        hints: &["static.hotjar.com"],
    },
    SignatureSpec {
        name: "adobe-appmeasurement",
        platform: Platform::AdobeAnalytics,
        pattern: r#"(?:\b(?:AppMeasurement|s_code)(?:\.min)?\.js|s_gi\s*\(\s*['"](?P<id>[\w,.-]+)['"])"#,
        id_format: IdFormat::Opaque,
        context: &[],
        hints: &["AppMeasurement", "s_code.js", "s_gi("],
    },
    SignatureSpec {
        name: "google-adsense",
        platform: Platform::GoogleAdSense,
        pattern: r"\b(?P<id>(?:ca-)?pub-\d{10,20})\b",
        id_format: IdFormat::NumericId,
        context: &["adsbygoogle", "googlesyndication", "data-ad-client"],
        hints: &["pagead2.googlesyndication.com", "adsbygoogle"],
    },
];

/// A read-only set of signatures.
///
/// The built-in catalog is process-wide and shared by every invocation.
#[derive(Debug, Clone)]
pub struct SignatureCatalog {
    signatures: Vec<TagSignature>,
}

static BUILTIN_CATALOG: LazyLock<SignatureCatalog> = LazyLock::new(|| {
    let signatures = BUILTIN_SPECS
        .iter()
        .map(|spec| TagSignature {
            name: spec.name,
            platform: spec.platform,
            category: spec.platform.category(),
            matcher: compile_regex_unsafe(spec.pattern, spec.name),
            id_format: spec.id_format,
            context: spec.context,
            hints: spec.hints,
        })
        .collect();
    SignatureCatalog { signatures }
});

impl SignatureCatalog {
    pub fn builtin() -> &'static SignatureCatalog {
        &BUILTIN_CATALOG
    }

    pub fn signatures(&self) -> &[TagSignature] {
        &self.signatures
    }

    pub fn find(&self, name: &str) -> Option<&TagSignature> {
        self.signatures.iter().find(|s| s.name == name)
    }

    /// Every raw-text hint of every signature, deduplicated.
    pub fn all_hints(&self) -> Vec<&'static str> {
        let mut hints: Vec<&'static str> = self
            .signatures
            .iter()
            .flat_map(|s| s.hints.iter().copied())
            .collect();
        hints.sort_unstable();
        hints.dedup();
        hints
    }

    /// Whether raw text mentions any platform this catalog knows.
    pub fn mentions_known_platform(&self, text: &str) -> bool {
        self.all_hints().into_iter().any(|hint| text.contains(hint))
    }
}
