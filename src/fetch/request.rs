//! Browser-mimicking request construction.
//!
//! The lightweight tier cannot execute scripts, so the only thing it can do to
//! look like a browser is send the headers a browser would. Each retry uses a
//! different identity so a single blocked fingerprint does not fail the page.

use crate::config::{DESKTOP_CHROME_USER_AGENT, DESKTOP_FIREFOX_USER_AGENT, MOBILE_SAFARI_USER_AGENT};

/// A simulated browser: User-Agent plus the headers that browser sends with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientIdentity {
    pub name: &'static str,
    pub user_agent: &'static str,
    pub accept: &'static str,
    pub accept_language: &'static str,
    /// Sends `Sec-CH-UA*` client hints (Chromium browsers only)
    pub client_hints: Option<&'static str>,
    pub mobile: bool,
}

/// Identities in retry order: desktop browser, alternate desktop browser, mobile browser.
pub const CLIENT_IDENTITIES: [ClientIdentity; 3] = [
    ClientIdentity {
        name: "desktop-chrome",
        user_agent: DESKTOP_CHROME_USER_AGENT,
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        accept_language: "en-US,en;q=0.9",
        client_hints: Some("\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\""),
        mobile: false,
    },
    ClientIdentity {
        name: "desktop-firefox",
        user_agent: DESKTOP_FIREFOX_USER_AGENT,
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-US,en;q=0.5",
        client_hints: None,
        mobile: false,
    },
    ClientIdentity {
        name: "mobile-safari",
        user_agent: MOBILE_SAFARI_USER_AGENT,
        accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
        accept_language: "en-US,en;q=0.9",
        client_hints: None,
        mobile: true,
    },
];

impl ClientIdentity {
    /// Identity used for the zero-based `attempt`, cycling when attempts exceed
    /// the number of identities.
    pub fn for_attempt(attempt: usize) -> &'static ClientIdentity {
        &CLIENT_IDENTITIES[attempt % CLIENT_IDENTITIES.len()]
    }
}

/// Realistic browser request headers to reduce bot detection.
///
/// Modern bot detection analyzes header order and consistency: a Chrome
/// User-Agent without client hints, or a Firefox one with them, is a tell.
/// The header set is therefore derived from the identity rather than fixed.
pub(crate) struct RequestHeaders;

impl RequestHeaders {
    pub(crate) fn apply_to_request_builder(
        builder: reqwest::RequestBuilder,
        identity: &ClientIdentity,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder
            .header(reqwest::header::USER_AGENT, identity.user_agent)
            .header(reqwest::header::ACCEPT, identity.accept)
            .header(reqwest::header::ACCEPT_LANGUAGE, identity.accept_language)
            .header(reqwest::header::REFERER, "https://www.google.com/")
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-dest"),
                "document",
            )
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-mode"),
                "navigate",
            )
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-site"),
                "cross-site",
            )
            .header(
                reqwest::header::HeaderName::from_static("sec-fetch-user"),
                "?1",
            )
            .header(reqwest::header::UPGRADE_INSECURE_REQUESTS, "1");

        if let Some(hints) = identity.client_hints {
            builder = builder
                .header(reqwest::header::HeaderName::from_static("sec-ch-ua"), hints)
                .header(
                    reqwest::header::HeaderName::from_static("sec-ch-ua-mobile"),
                    if identity.mobile { "?1" } else { "?0" },
                )
                .header(
                    reqwest::header::HeaderName::from_static("sec-ch-ua-platform"),
                    "\"Windows\"",
                );
        }

        builder
    }
}
