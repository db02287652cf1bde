//! Homepage link-graph sampling.

use url::Url;

use crate::models::NavigationComplexity;

/// Shape of the homepage's same-site links.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LinkSample {
    pub link_count: usize,
    /// Mean number of path segments per link
    pub average_depth: f64,
}

impl LinkSample {
    pub(crate) fn from_links(links: &[Url]) -> Self {
        let total_depth: usize = links.iter().map(path_depth).sum();
        let average_depth = if links.is_empty() {
            0.0
        } else {
            total_depth as f64 / links.len() as f64
        };
        Self {
            link_count: links.len(),
            average_depth,
        }
    }

    /// Typical path depth, rounded to a whole number of segments.
    pub(crate) fn typical_depth(&self) -> usize {
        self.average_depth.round() as usize
    }

    pub(crate) fn complexity(&self) -> NavigationComplexity {
        if self.link_count > 100 || self.average_depth > 3.0 {
            NavigationComplexity::High
        } else if self.link_count > 30 || self.average_depth > 2.0 {
            NavigationComplexity::Medium
        } else {
            NavigationComplexity::Low
        }
    }
}

fn path_depth(url: &Url) -> usize {
    url.path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).count())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(paths: &[&str]) -> Vec<Url> {
        paths
            .iter()
            .map(|p| Url::parse(&format!("https://example.test{p}")).expect("valid"))
            .collect()
    }

    #[test]
    fn test_sample_depth_and_complexity() {
        let sample = LinkSample::from_links(&urls(&["/", "/a", "/a/b", "/a/b/c/"]));
        assert_eq!(sample.link_count, 4);
        assert!((sample.average_depth - 1.5).abs() < f64::EPSILON);
        assert_eq!(sample.typical_depth(), 2);
        assert_eq!(sample.complexity(), NavigationComplexity::Low);

        let deep = LinkSample::from_links(&urls(&["/a/b/c/d", "/a/b/c/e"]));
        assert_eq!(deep.complexity(), NavigationComplexity::High);
    }

    #[test]
    fn test_empty_sample() {
        let sample = LinkSample::from_links(&[]);
        assert_eq!(sample.link_count, 0);
        assert_eq!(sample.typical_depth(), 0);
    }
}
