//! Sitemap discovery and page counting.

use log::debug;
use quick_xml::events::Event;
use quick_xml::Reader;
use url::Url;

use crate::config::{MAX_CHILD_SITEMAPS, SITEMAP_PATHS};
use crate::fetch::HttpFetcher;

/// A parsed sitemap file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct SitemapDocument {
    /// `<url><loc>` entries of a urlset
    pub pages: Vec<String>,
    /// `<sitemap><loc>` entries of a sitemap index
    pub children: Vec<String>,
}

impl SitemapDocument {
    fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.children.is_empty()
    }
}

/// What sitemap discovery found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SitemapCount {
    pub source: String,
    pub page_count: usize,
    /// Notes for the estimate's reasoning
    pub notes: Vec<String>,
}

/// Parses a urlset or sitemap index. Namespace prefixes are ignored.
pub(crate) fn parse_sitemap(xml: &str) -> Result<SitemapDocument, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut document = SitemapDocument::default();
    let mut in_url = false;
    let mut in_sitemap = false;
    let mut in_loc = false;
    let mut loc = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"url" => in_url = true,
                b"sitemap" => in_sitemap = true,
                b"loc" if in_url || in_sitemap => {
                    in_loc = true;
                    loc.clear();
                }
                _ => {}
            },
            Event::Text(e) if in_loc => loc.push_str(&e.unescape()?),
            Event::CData(e) if in_loc => loc.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::End(e) => match e.local_name().as_ref() {
                b"loc" if in_loc => {
                    in_loc = false;
                    let value = loc.trim().to_string();
                    if value.is_empty() {
                        continue;
                    }
                    if in_url {
                        document.pages.push(value);
                    } else if in_sitemap {
                        document.children.push(value);
                    }
                }
                b"url" => in_url = false,
                b"sitemap" => in_sitemap = false,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(document)
}

/// `Sitemap:` lines of a robots.txt file, resolved against `base`.
pub(crate) fn sitemaps_from_robots(robots: &str, base: &Url) -> Vec<String> {
    robots
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (key, value) = line.split_once(':')?;
            if !key.trim().eq_ignore_ascii_case("sitemap") {
                return None;
            }
            base.join(value.trim()).ok().map(|u| u.to_string())
        })
        .collect()
}

/// Candidate sitemap URLs: robots.txt declarations first, then the
/// conventional locations.
pub(crate) async fn candidate_urls(fetcher: &HttpFetcher, base: &Url) -> Vec<String> {
    let mut candidates = Vec::new();
    if let Ok(robots_url) = base.join("/robots.txt") {
        match fetcher.fetch(robots_url.as_str()).await {
            Ok(response) => candidates.extend(sitemaps_from_robots(&response.body, base)),
            Err(e) => debug!("No robots.txt at {robots_url}: {e}"),
        }
    }
    for path in SITEMAP_PATHS {
        if let Ok(url) = base.join(path) {
            candidates.push(url.to_string());
        }
    }
    let mut seen = std::collections::HashSet::new();
    candidates.retain(|c| seen.insert(c.clone()));
    candidates
}

/// Finds the first usable sitemap and counts its pages.
///
/// For a sitemap index at most `MAX_CHILD_SITEMAPS` children are fetched;
/// the count is extrapolated from their average when there are more.
pub(crate) async fn count_pages(fetcher: &HttpFetcher, base: &Url) -> Option<SitemapCount> {
    for candidate in candidate_urls(fetcher, base).await {
        let Some(document) = fetch_sitemap(fetcher, &candidate).await else {
            continue;
        };

        if !document.pages.is_empty() {
            return Some(SitemapCount {
                notes: vec![format!(
                    "Sitemap {candidate} lists {} pages",
                    document.pages.len()
                )],
                page_count: document.pages.len(),
                source: candidate,
            });
        }

        let total_children = document.children.len();
        let mut fetched = 0usize;
        let mut counted = 0usize;
        for child in document.children.iter().take(MAX_CHILD_SITEMAPS) {
            if let Some(child_doc) = fetch_sitemap(fetcher, child).await {
                fetched += 1;
                counted += child_doc.pages.len();
            }
        }
        if fetched == 0 || counted == 0 {
            continue;
        }

        let mut notes = vec![format!(
            "Sitemap index {candidate} references {total_children} sitemaps"
        )];
        let page_count = if total_children > fetched {
            let estimate = counted * total_children / fetched;
            notes.push(format!(
                "Extrapolated {estimate} pages from {fetched} of {total_children} child sitemaps"
            ));
            estimate
        } else {
            notes.push(format!("Child sitemaps list {counted} pages"));
            counted
        };
        return Some(SitemapCount {
            source: candidate,
            page_count,
            notes,
        });
    }
    None
}

async fn fetch_sitemap(fetcher: &HttpFetcher, url: &str) -> Option<SitemapDocument> {
    let response = match fetcher.fetch(url).await {
        Ok(response) => response,
        Err(e) => {
            debug!("Sitemap candidate {url} unavailable: {e}");
            return None;
        }
    };
    match parse_sitemap(&response.body) {
        Ok(document) if !document.is_empty() => Some(document),
        Ok(_) => None,
        Err(e) => {
            debug!("{url} is not a sitemap: {e}");
            None
        }
    }
}
