// Site crawls against a mock server.

mod helpers;

use httptest::{matchers::*, responders::*, Expectation, Server};

use helpers::{page_with_links, test_inspector};
use tag_inspector::models::BudgetLimit;
use tag_inspector::{CrawlCompletion, CrawlOptions, ErrorKind, Platform};

const GTM_SNIPPET: &str =
    r#"<script async src="https://www.googletagmanager.com/gtm.js?id=GTM-AB12CD3"></script>"#;
const TEALIUM_SNIPPET: &str =
    r#"<script async src="//tags.tiqcdn.com/utag/acme/main/prod/utag.js"></script>"#;

fn tagged_page(snippets: &[&str]) -> String {
    format!(
        "<html><head>{}</head><body>content</body></html>",
        snippets.concat()
    )
}

#[tokio::test]
async fn test_crawl_stops_at_page_budget_and_reports_migration() {
    let server = Server::run();
    let children: Vec<String> = (0..10).map(|i| format!("/page-{i}")).collect();
    let home = page_with_links("Home", &children).replace(
        "</head>",
        &format!("{GTM_SNIPPET}{TEALIUM_SNIPPET}</head>"),
    );

    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(1)
            .respond_with(status_code(200).body(home)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/page-0"))
            .times(1)
            .respond_with(status_code(200).body(tagged_page(&[TEALIUM_SNIPPET]))),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/page-1"))
            .times(1)
            .respond_with(status_code(200).body(tagged_page(&[GTM_SNIPPET]))),
    );
    for child in &children[2..] {
        server.expect(
            Expectation::matching(request::method_path("GET", child.clone()))
                .times(0)
                .respond_with(status_code(200)),
        );
    }

    let options = CrawlOptions {
        max_pages: 3,
        max_depth: 2,
        ..CrawlOptions::default()
    };
    let report = test_inspector()
        .crawl_site(&server.url_str("/"), &options)
        .await
        .expect("valid crawl");

    assert_eq!(report.pages_scanned, 3);
    assert_eq!(report.pages_successful, 3);
    assert!(report.success);
    assert!(report.error.is_none());
    assert_eq!(
        report.completion,
        CrawlCompletion::BudgetExhausted {
            limit: BudgetLimit::Pages
        }
    );
    assert_eq!(report.error_summary.get("budget-exhausted"), Some(&1));

    assert_eq!(report.methodology_counts.dual_managed, 1);
    assert_eq!(report.methodology_counts.single_managed, 2);

    // Default plan: Google Tag Manager -> Tealium iQ
    assert_eq!(report.migration.pages_dual, 1);
    assert_eq!(report.migration.pages_migrated, 1);
    assert_eq!(report.migration.pages_legacy_only, 1);
    assert_eq!(report.migration.score, 50);

    let tealium = report
        .coverage
        .iter()
        .find(|c| c.platform == Platform::TealiumIq)
        .expect("coverage for the migration target");
    assert_eq!(tealium.pages_with_platform, 2);
    assert_eq!(tealium.coverage_pct, 67);

    let missing_tealium = report
        .missing_pages
        .iter()
        .find(|m| m.platform == Platform::TealiumIq)
        .expect("one page lacks Tealium");
    assert_eq!(missing_tealium.pages.len(), 1);
    assert!(missing_tealium.pages[0].url.ends_with("/page-1"));
}

#[tokio::test]
async fn test_crawl_skips_excluded_and_offsite_links() {
    let server = Server::run();
    let home = page_with_links(
        "Home",
        &[
            "/admin/login".to_string(),
            "/shop/".to_string(),
            "https://elsewhere.example.test/".to_string(),
            "mailto:team@example.test".to_string(),
        ],
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(1)
            .respond_with(status_code(200).body(home)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/shop/"))
            .times(1)
            .respond_with(status_code(200).body(tagged_page(&[GTM_SNIPPET]))),
    );

    let options = CrawlOptions {
        exclude_paths: vec!["/admin".to_string()],
        ..CrawlOptions::default()
    };
    let report = test_inspector()
        .crawl_site(&server.url_str("/"), &options)
        .await
        .expect("valid crawl");

    assert_eq!(report.pages_scanned, 2);
    assert_eq!(report.completion, CrawlCompletion::Completed);
    assert_eq!(report.pages[1].depth, 1);
}

#[tokio::test]
async fn test_crawl_with_unreachable_seed_reports_failure() {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(1)
            .respond_with(status_code(404)),
    );

    let report = test_inspector()
        .crawl_site(&server.url_str("/"), &CrawlOptions::default())
        .await
        .expect("valid crawl");

    assert!(!report.success);
    assert_eq!(report.pages_scanned, 1);
    assert_eq!(report.pages_successful, 0);
    let error = report.error.as_ref().expect("seed failure is reported");
    assert_eq!(error.kind, ErrorKind::HttpError);
    assert_eq!(error.status, Some(404));
    assert!(!error.troubleshooting.is_empty());
}
