//! Pre-crawl site-structure estimation.
//!
//! Sitemaps are the primary signal. Without one, the homepage's same-site
//! links stand in for the site's size; when the homepage yields no links at
//! all (typically a bot wall) the render tier gets one try before the
//! estimator settles on conservative defaults.

mod sampling;
mod sitemap;

use log::{debug, info};
use url::Url;

use crate::config::{
    CONSERVATIVE_MAX_DEPTH, CONSERVATIVE_MAX_PAGES, FLAT_SITE_MAX_DEPTH, LARGE_SITE_PAGE_BUDGET,
    MAX_ESTIMATED_DEPTH, MEDIUM_SITE_MAX_PAGES, SMALL_SITE_MAX_PAGES,
};
use crate::crawl::discover_links;
use crate::engine::DetectionEngine;
use crate::fetch::HttpFetcher;
use crate::models::{CrawlStrategy, NavigationComplexity, SiteEstimate, SiteStructureEstimate, SizeTier};

use sampling::LinkSample;

/// Recommends a crawl budget for the site at `base`.
pub async fn estimate(
    fetcher: &HttpFetcher,
    renderer: Option<&dyn DetectionEngine>,
    base: &Url,
) -> SiteEstimate {
    let mut reasoning = Vec::new();

    let sitemap = sitemap::count_pages(fetcher, base).await;
    let sample = match &sitemap {
        Some(_) => homepage_sample(fetcher, None, base, &mut reasoning).await,
        None => {
            reasoning.push("No sitemap found; sampling homepage links instead".to_string());
            homepage_sample(fetcher, renderer, base, &mut reasoning).await
        }
    };

    let estimated_pages = match &sitemap {
        Some(count) => {
            reasoning.extend(count.notes.iter().cloned());
            Some(count.page_count)
        }
        None if sample.link_count > 0 => {
            reasoning.push(format!(
                "Homepage links to {} same-site pages (typical path depth {})",
                sample.link_count,
                sample.typical_depth()
            ));
            Some(sample.link_count)
        }
        None => None,
    };

    let structure = SiteStructureEstimate {
        sitemap_page_count: sitemap.as_ref().map(|c| c.page_count),
        link_sample_depth: sample.typical_depth(),
        navigation_complexity: sample.complexity(),
        sampled_links: sample.link_count,
    };

    let Some(pages) = estimated_pages else {
        reasoning.push(format!(
            "Site structure could not be determined; using conservative defaults \
             ({CONSERVATIVE_MAX_PAGES} pages, depth {CONSERVATIVE_MAX_DEPTH})"
        ));
        return SiteEstimate {
            url: base.to_string(),
            max_pages: CONSERVATIVE_MAX_PAGES,
            max_depth: CONSERVATIVE_MAX_DEPTH,
            strategy: CrawlStrategy::Conservative,
            size_tier: None,
            structure,
            reasoning,
        };
    };

    let tier = size_tier(pages);
    let (max_pages, tier_depth, strategy) = budget_for(tier);
    let max_depth = depth_for(tier_depth, &sample);
    if max_depth != tier_depth {
        reasoning.push(format!(
            "Homepage links are typically {} segments deep; depth budget adjusted from {tier_depth} to {max_depth}",
            sample.typical_depth()
        ));
    }
    reasoning.push(format!(
        "{} site (~{pages} pages): {strategy:?} crawl of up to {max_pages} pages, depth {max_depth}",
        match tier {
            SizeTier::Small => "Small",
            SizeTier::Medium => "Medium",
            SizeTier::Large => "Large",
        }
    ));
    if structure.navigation_complexity == NavigationComplexity::High {
        reasoning.push("Navigation is deep or wide; coverage will be sampled".to_string());
    }

    info!("Estimated {base}: {max_pages} pages, depth {max_depth}");
    SiteEstimate {
        url: base.to_string(),
        max_pages,
        max_depth,
        strategy,
        size_tier: Some(tier),
        structure,
        reasoning,
    }
}

pub(crate) fn size_tier(pages: usize) -> SizeTier {
    if pages <= SMALL_SITE_MAX_PAGES {
        SizeTier::Small
    } else if pages <= MEDIUM_SITE_MAX_PAGES {
        SizeTier::Medium
    } else {
        SizeTier::Large
    }
}

fn budget_for(tier: SizeTier) -> (usize, usize, CrawlStrategy) {
    match tier {
        SizeTier::Small => (SMALL_SITE_MAX_PAGES, 2, CrawlStrategy::Comprehensive),
        SizeTier::Medium => (MEDIUM_SITE_MAX_PAGES, 3, CrawlStrategy::Balanced),
        SizeTier::Large => (LARGE_SITE_PAGE_BUDGET, 3, CrawlStrategy::Sampled),
    }
}

/// Adjusts the tier's depth budget to the sampled link depth: nested sites
/// get up to `MAX_ESTIMATED_DEPTH`, flat simple sites at most
/// `FLAT_SITE_MAX_DEPTH`. Without a sample the tier's depth stands.
fn depth_for(tier_depth: usize, sample: &LinkSample) -> usize {
    if sample.link_count == 0 {
        return tier_depth;
    }
    let typical = sample.typical_depth();
    if typical <= 1 && sample.complexity() == NavigationComplexity::Low {
        return tier_depth.min(FLAT_SITE_MAX_DEPTH);
    }
    tier_depth.max(typical.min(MAX_ESTIMATED_DEPTH))
}

/// Samples the homepage's links, rendering once if the plain fetch yields none.
async fn homepage_sample(
    fetcher: &HttpFetcher,
    renderer: Option<&dyn DetectionEngine>,
    base: &Url,
    reasoning: &mut Vec<String>,
) -> LinkSample {
    let links = match fetcher.fetch(base.as_str()).await {
        Ok(response) => {
            let page_url = Url::parse(&response.final_url).unwrap_or_else(|_| base.clone());
            discover_links(&response.body, &page_url, &[])
        }
        Err(e) => {
            debug!("Homepage fetch failed for {base}: {e}");
            reasoning.push(format!("Homepage could not be fetched: {e}"));
            Vec::new()
        }
    };
    if !links.is_empty() {
        return LinkSample::from_links(&links);
    }

    let Some(renderer) = renderer else {
        return LinkSample::from_links(&links);
    };
    reasoning.push("Homepage yielded no links; retrying with the render tier".to_string());
    match renderer.retrieve(base.as_str()).await {
        Ok(document) => {
            let page_url = Url::parse(&document.final_url).unwrap_or_else(|_| base.clone());
            LinkSample::from_links(&discover_links(&document.body, &page_url, &[]))
        }
        Err(e) => {
            reasoning.push(format!("Render tier could not load the homepage: {e}"));
            LinkSample::from_links(&[])
        }
    }
}
