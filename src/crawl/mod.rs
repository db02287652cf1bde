//! Bounded breadth-first site crawl.
//!
//! One URL is processed at a time with a courtesy delay between requests.
//! A page that fails is recorded and traversal continues with the rest of
//! the frontier.

mod frontier;
mod links;
mod priority;
mod report;

use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use url::Url;

use crate::config::CrawlOptions;
use crate::error_handling::{ErrorKind, ProcessingStats};
use crate::escalation::EscalationController;
use crate::models::{BudgetLimit, CrawlCompletion, CrawlReport, CrawledPage, PageFinding};
use crate::utils::is_same_site;

use frontier::CrawlState;
use report::{build_report, CrawlOutcome};

pub(crate) use links::discover_links;

/// Crawls from `seed` within the page and depth budgets of `options`.
pub async fn crawl(
    controller: &EscalationController,
    seed: &Url,
    options: &CrawlOptions,
    courtesy_delay: Duration,
) -> CrawlReport {
    let started_at = Utc::now();
    let stats = ProcessingStats::new();
    let mut state = CrawlState::new(seed.clone());
    let mut pages: Vec<CrawledPage> = Vec::new();
    let mut depth_limited = false;

    info!(
        "Crawling {seed} (max {} pages, depth {})",
        options.max_pages, options.max_depth
    );

    while pages.len() < options.max_pages {
        let Some(entry) = state.next_entry() else {
            break;
        };
        if entry.depth > options.max_depth {
            continue;
        }
        if !pages.is_empty() && !courtesy_delay.is_zero() {
            tokio::time::sleep(courtesy_delay).await;
        }

        let outcome = controller.detect(entry.url.as_str(), &options.target).await;
        record_stats(&stats, &outcome.finding);

        let final_url = outcome
            .finding
            .final_url
            .as_deref()
            .and_then(|u| Url::parse(u).ok());
        if let Some(final_url) = &final_url {
            if state.mark_visited(final_url) {
                debug!("{} redirected to {final_url}", entry.url);
            }
        }

        if let (true, Some(document)) = (outcome.finding.success, outcome.document.as_deref()) {
            let base = final_url.unwrap_or_else(|| entry.url.clone());
            let discovered: Vec<Url> = discover_links(document, &base, &options.exclude_paths)
                .into_iter()
                .filter(|link| is_same_site(seed, link))
                .collect();

            if entry.depth < options.max_depth {
                let added = discovered
                    .into_iter()
                    .filter(|link| state.enqueue(link.clone(), entry.depth + 1))
                    .count();
                debug!("{}: {added} new links at depth {}", entry.url, entry.depth + 1);
            } else if discovered.iter().any(|link| !state.is_known(link)) {
                depth_limited = true;
            }
        }

        pages.push(CrawledPage {
            depth: entry.depth,
            finding: outcome.finding,
        });
    }

    let completion = if pages.len() >= options.max_pages && state.has_pending() {
        CrawlCompletion::BudgetExhausted {
            limit: BudgetLimit::Pages,
        }
    } else if depth_limited {
        CrawlCompletion::BudgetExhausted {
            limit: BudgetLimit::Depth,
        }
    } else {
        CrawlCompletion::Completed
    };
    if matches!(completion, CrawlCompletion::BudgetExhausted { .. }) {
        stats.increment(ErrorKind::BudgetExhausted);
    }

    let report = build_report(CrawlOutcome {
        seed_url: seed.to_string(),
        started_at,
        pages,
        completion,
        migration: options.migration,
        stats: &stats,
    });
    info!(
        "Crawl of {seed} finished: {} pages scanned, {} successful, {:?}",
        report.pages_scanned, report.pages_successful, report.completion
    );
    report
}

fn record_stats(stats: &ProcessingStats, finding: &PageFinding) {
    if let Some(error) = &finding.error {
        stats.increment(error.kind);
    }
    if finding.parse_degraded {
        stats.increment(ErrorKind::ParseDegraded);
    }
    if finding.escalation.failed {
        stats.increment(ErrorKind::RenderFailed);
    }
}
