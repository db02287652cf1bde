//! Same-site link discovery.

use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use crate::utils::{is_same_site, parse_selector_unsafe};

static LINK_SELECTOR: LazyLock<Selector> =
    LazyLock::new(|| parse_selector_unsafe("a[href]", "LINK_SELECTOR"));

/// Links to these are downloads, not pages.
const NON_PAGE_EXTENSIONS: &[&str] = &[
    ".pdf", ".zip", ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".mp4", ".mp3", ".css",
    ".js", ".xml", ".ico", ".doc", ".docx", ".xls", ".xlsx",
];

/// Same-site page links in document order, deduplicated, fragments removed.
///
/// Paths under any of `exclude_paths` are dropped.
pub(crate) fn discover_links(html: &str, base: &Url, exclude_paths: &[String]) -> Vec<Url> {
    let document = Html::parse_document(html);
    let mut links: Vec<Url> = Vec::new();

    for element in document.select(&LINK_SELECTOR) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        let Some(url) = resolve(base, href) else {
            continue;
        };
        if !is_same_site(base, &url) || is_excluded(&url, exclude_paths) || !looks_like_page(&url)
        {
            continue;
        }
        if !links.contains(&url) {
            links.push(url);
        }
    }

    links
}

fn resolve(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Whether the URL's path lies under one of the excluded prefixes.
pub(crate) fn is_excluded(url: &Url, exclude_paths: &[String]) -> bool {
    let path = url.path();
    exclude_paths.iter().any(|prefix| {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return false;
        }
        let prefix = prefix.trim_end_matches('/');
        let prefix = if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{prefix}")
        };
        path == prefix || path.starts_with(&format!("{prefix}/")) || prefix == "/"
    })
}

fn looks_like_page(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    !NON_PAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.test/section/index.html").expect("valid")
    }

    #[test]
    fn test_discovers_same_site_links_in_order() {
        let html = r##"<html><body>
            <a href="/about">About</a>
            <a href="contact#form">Contact</a>
            <a href="https://www.example.test/shop">Shop</a>
            <a href="https://other.test/">Elsewhere</a>
            <a href="/about#team">About again</a>
            <a href="mailto:hi@example.test">Mail</a>
            <a href="#top">Top</a>
            <a href="/files/brochure.pdf">PDF</a>
        </body></html>"##;

        let links: Vec<String> = discover_links(html, &base(), &[])
            .into_iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.test/about",
                "https://example.test/section/contact",
                "https://www.example.test/shop",
            ]
        );
    }

    #[test]
    fn test_excluded_prefixes() {
        let html = r#"<a href="/admin">A</a><a href="/admin/users">B</a>
            <a href="/administrator-guide">C</a><a href="/blog">D</a>"#;
        let links: Vec<String> = discover_links(html, &base(), &["admin/".to_string()])
            .into_iter()
            .map(|u| u.path().to_string())
            .collect();
        assert_eq!(links, vec!["/administrator-guide", "/blog"]);
    }

    #[test]
    fn test_malformed_markup_yields_best_effort_links() {
        let html = r#"<a href="/one">one<a href=/two>two<div><a href="">empty</a>"#;
        let links = discover_links(html, &base(), &[]);
        assert_eq!(links.len(), 2);
    }
}
