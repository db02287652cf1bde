//! Site-wide aggregation of crawled pages.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use url::Url;

use super::priority::page_priority;
use crate::config::MigrationPlan;
use crate::error_handling::ProcessingStats;
use crate::models::{
    CrawlCompletion, CrawlReport, CrawledPage, MethodologyCounts, Methodology, MigrationProgress,
    MissingPage, MissingPlatformPages, Platform, PlatformCoverage,
};

/// Everything the crawl loop hands over for aggregation.
pub(crate) struct CrawlOutcome<'a> {
    pub seed_url: String,
    pub started_at: DateTime<Utc>,
    pub pages: Vec<CrawledPage>,
    pub completion: CrawlCompletion,
    pub migration: MigrationPlan,
    pub stats: &'a ProcessingStats,
}

pub(crate) fn build_report(outcome: CrawlOutcome<'_>) -> CrawlReport {
    let successful: Vec<&CrawledPage> = outcome
        .pages
        .iter()
        .filter(|p| p.finding.success)
        .collect();
    let successful_count = successful.len();

    let mut methodology_counts = MethodologyCounts::default();
    for page in &successful {
        match page.finding.methodology() {
            Methodology::None => methodology_counts.none += 1,
            Methodology::SingleManaged => methodology_counts.single_managed += 1,
            Methodology::DualManaged => methodology_counts.dual_managed += 1,
        }
    }

    // Every tag manager seen, plus both ends of the migration
    let mut platforms: BTreeSet<Platform> = successful
        .iter()
        .flat_map(|p| p.finding.tag_managers().iter().map(|tm| tm.platform))
        .collect();
    platforms.insert(outcome.migration.from);
    platforms.insert(outcome.migration.to);

    let coverage = platforms
        .iter()
        .map(|&platform| {
            let pages_with_platform = successful
                .iter()
                .filter(|p| p.finding.detection.has_platform(platform))
                .count();
            PlatformCoverage {
                platform,
                pages_with_platform,
                coverage_pct: percentage(pages_with_platform as f64, successful_count),
            }
        })
        .collect();

    let missing_pages = platforms
        .iter()
        .filter_map(|&platform| {
            let pages = missing_for(&successful, platform);
            (!pages.is_empty()).then_some(MissingPlatformPages { platform, pages })
        })
        .collect();

    let migration = migration_progress(&successful, outcome.migration);
    let pages_matching_target = successful
        .iter()
        .filter(|p| p.finding.detection.target_match == Some(true))
        .count();

    let seed = outcome.pages.first().map(|p| &p.finding);
    let success = seed.is_some_and(|f| f.success);
    let error = seed.and_then(|f| f.error.clone());

    CrawlReport {
        seed_url: outcome.seed_url,
        started_at: outcome.started_at,
        finished_at: Utc::now(),
        success,
        error,
        pages_scanned: outcome.pages.len(),
        pages_successful: successful_count,
        pages_failed: outcome.pages.len() - successful_count,
        completion: outcome.completion,
        methodology_counts,
        coverage,
        migration,
        missing_pages,
        pages_matching_target,
        error_summary: outcome.stats.summary(),
        pages: outcome.pages,
    }
}

/// `round(100 * part / whole)`, 0 when `whole` is 0.
pub(crate) fn percentage(part: f64, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part / whole as f64).round() as u32
}

fn migration_progress(successful: &[&CrawledPage], plan: MigrationPlan) -> MigrationProgress {
    let mut progress = MigrationProgress {
        plan,
        score: 0,
        pages_migrated: 0,
        pages_dual: 0,
        pages_legacy_only: 0,
        pages_unmanaged: 0,
    };
    for page in successful {
        let detection = &page.finding.detection;
        match (detection.has_platform(plan.to), detection.has_platform(plan.from)) {
            (true, true) => progress.pages_dual += 1,
            (true, false) => progress.pages_migrated += 1,
            (false, true) => progress.pages_legacy_only += 1,
            (false, false) => progress.pages_unmanaged += 1,
        }
    }
    // Dual-tagged pages count as half migrated
    let weighted = progress.pages_migrated as f64 + 0.5 * progress.pages_dual as f64;
    progress.score = percentage(weighted, successful.len());
    progress
}

/// Successful pages lacking `platform`, by priority tier then crawl depth.
fn missing_for(successful: &[&CrawledPage], platform: Platform) -> Vec<MissingPage> {
    let mut missing: Vec<MissingPage> = successful
        .iter()
        .filter(|p| !p.finding.detection.has_platform(platform))
        .map(|p| MissingPage {
            url: p.finding.url.clone(),
            depth: p.depth,
            priority: Url::parse(&p.finding.url)
                .map(|u| page_priority(&u))
                .unwrap_or(crate::models::PagePriority::Low),
        })
        .collect();
    missing.sort_by_key(|m| (m.priority, m.depth));
    missing
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_handling::ErrorKind;
    use crate::models::{
        Detection, FetchTier, FindingError, ImplementationType, LoadingPattern, PagePriority,
        PageFinding, TagManagerFinding,
    };

    fn tag_manager(platform: Platform) -> TagManagerFinding {
        TagManagerFinding {
            platform,
            container_ids: vec![],
            account: None,
            profile: None,
            environment: None,
            implementation: ImplementationType::Static,
            loading: LoadingPattern::Async,
            target_match: None,
        }
    }

    fn page(path: &str, depth: usize, platforms: &[Platform]) -> CrawledPage {
        let url = format!("https://example.test{path}");
        let mut finding = PageFinding::failed(
            &url,
            FetchTier::Lightweight,
            FindingError::new(ErrorKind::Timeout, None, "placeholder"),
        );
        finding.success = true;
        finding.error = None;
        finding.http_status = Some(200);
        let tag_managers: Vec<_> = platforms.iter().map(|&p| tag_manager(p)).collect();
        finding.detection = Detection {
            methodology: match tag_managers.len() {
                0 => Methodology::None,
                1 => Methodology::SingleManaged,
                _ => Methodology::DualManaged,
            },
            tag_managers,
            ..Detection::default()
        };
        CrawledPage { depth, finding }
    }

    fn failed_page(path: &str) -> CrawledPage {
        CrawledPage {
            depth: 1,
            finding: PageFinding::failed(
                &format!("https://example.test{path}"),
                FetchTier::Lightweight,
                FindingError::new(ErrorKind::HttpError, Some(404), "not found"),
            ),
        }
    }

    fn report(pages: Vec<CrawledPage>, stats: &ProcessingStats) -> CrawlReport {
        build_report(CrawlOutcome {
            seed_url: "https://example.test/".to_string(),
            started_at: Utc::now(),
            pages,
            completion: CrawlCompletion::Completed,
            migration: MigrationPlan::default(),
            stats,
        })
    }

    #[test]
    fn test_coverage_and_migration_arithmetic() {
        let stats = ProcessingStats::new();
        stats.increment(ErrorKind::HttpError);
        let gtm = Platform::GoogleTagManager;
        let tealium = Platform::TealiumIq;
        let pages = vec![
            page("/", 0, &[tealium]),
            page("/blog", 1, &[tealium, gtm]),
            page("/careers", 1, &[gtm]),
            failed_page("/gone"),
        ];

        let report = report(pages, &stats);
        assert_eq!(report.pages_scanned, 4);
        assert_eq!(report.pages_successful, 3);
        assert_eq!(report.pages_failed, 1);
        assert!(report.success);
        assert!(report.error.is_none());
        assert_eq!(report.methodology_counts.single_managed, 2);
        assert_eq!(report.methodology_counts.dual_managed, 1);

        let tealium_coverage = report
            .coverage
            .iter()
            .find(|c| c.platform == tealium)
            .expect("tealium coverage");
        assert_eq!(tealium_coverage.pages_with_platform, 2);
        assert_eq!(tealium_coverage.coverage_pct, 67);

        // (1 migrated + 0.5 * 1 dual) / 3
        assert_eq!(report.migration.pages_migrated, 1);
        assert_eq!(report.migration.pages_dual, 1);
        assert_eq!(report.migration.pages_legacy_only, 1);
        assert_eq!(report.migration.score, 50);
        assert_eq!(report.error_summary.get("http-error"), Some(&1));
    }

    #[test]
    fn test_no_successful_pages_means_zero_coverage() {
        let stats = ProcessingStats::new();
        let report = report(vec![failed_page("/a"), failed_page("/b")], &stats);
        assert_eq!(report.pages_successful, 0);
        assert!(!report.success);
        let error = report.error.as_ref().expect("seed error carried");
        assert_eq!(error.kind, ErrorKind::HttpError);
        assert!(!error.troubleshooting.is_empty());
        assert!(report.coverage.iter().all(|c| c.coverage_pct == 0));
        assert_eq!(report.migration.score, 0);
        assert!(report.missing_pages.is_empty());
    }

    #[test]
    fn test_missing_pages_ordered_by_priority_then_depth() {
        let stats = ProcessingStats::new();
        let pages = vec![
            page("/", 0, &[Platform::TealiumIq]),
            page("/careers", 1, &[]),
            page("/blog/deep", 2, &[]),
            page("/contact", 2, &[]),
            page("/news", 1, &[]),
        ];
        let report = report(pages, &stats);
        let missing = report
            .missing_pages
            .iter()
            .find(|m| m.platform == Platform::TealiumIq)
            .expect("tealium missing list");
        let order: Vec<(&str, PagePriority)> = missing
            .pages
            .iter()
            .map(|p| (p.url.trim_start_matches("https://example.test"), p.priority))
            .collect();
        assert_eq!(
            order,
            vec![
                ("/contact", PagePriority::High),
                ("/news", PagePriority::Medium),
                ("/blog/deep", PagePriority::Medium),
                ("/careers", PagePriority::Low),
            ]
        );
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1.0, 3), 33);
        assert_eq!(percentage(2.0, 3), 67);
        assert_eq!(percentage(0.0, 0), 0);
        assert_eq!(percentage(5.0, 5), 100);
    }
}
