// Tests for report generation functionality

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use wikihop_core::query::NOT_FOUND_MESSAGE;
use wikihop_core::report::{
    SearchReport, generate_cache_report, generate_json_report, generate_text_report, render,
    save_report,
};
use wikihop_core::{CacheStats, FinderError, QueryResponse, ReportFormat, SearchResult};
use wikihop_scanner::{PageId, SiteScope};

fn wiki(title: &str) -> PageId {
    SiteScope::default()
        .page(&format!("https://en.wikipedia.org/wiki/{}", title))
        .unwrap()
}

fn found_report(titles: &[&str], expanded: usize) -> SearchReport {
    let path: Vec<PageId> = titles.iter().map(|t| wiki(t)).collect();
    let start = path.first().unwrap().to_string();
    let end = path.last().unwrap().to_string();
    let response = QueryResponse::from_result(SearchResult::found(path, expanded));
    SearchReport::new(&start, &end, &response, Duration::from_millis(12))
}

fn not_found_report(expanded: usize) -> SearchReport {
    let response = QueryResponse::from_result(SearchResult::not_found(expanded));
    SearchReport::new(
        wiki("A").as_str(),
        wiki("Z").as_str(),
        &response,
        Duration::from_millis(3),
    )
}

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert_eq!("text".parse::<ReportFormat>(), Ok(ReportFormat::Text));
    assert_eq!("JSON".parse::<ReportFormat>(), Ok(ReportFormat::Json));
    assert!("csv".parse::<ReportFormat>().is_err());
}

// ============================================================================
// Search Report Tests
// ============================================================================

#[test]
fn test_search_report_from_found_response() {
    let report = found_report(&["A", "B", "C"], 2);

    assert_eq!(report.status, "found");
    assert_eq!(report.hops, Some(2));
    assert_eq!(report.nodes_expanded, Some(2));
    assert_eq!(report.path.as_ref().map(Vec::len), Some(3));
    assert!(report.message.is_none());
}

#[test]
fn test_search_report_from_error_response() {
    let err = FinderError::InvalidArgument("page URL cannot be empty".to_string());
    let response = QueryResponse::from_error(&err);
    let report = SearchReport::new("", wiki("B").as_str(), &response, Duration::ZERO);

    assert_eq!(report.status, "bad_request");
    assert!(report.path.is_none());
    assert!(report.nodes_expanded.is_none());
    assert_eq!(report.message.as_deref(), Some("page URL cannot be empty"));
}

#[test]
fn test_text_report_lists_path() {
    let text = generate_text_report(&found_report(&["A", "B", "C"], 2));

    assert!(text.contains("Path found: 2 hops"));
    assert!(text.contains(&format!(" 1. {}", wiki("A"))));
    assert!(text.contains(&format!(" 3. {}", wiki("C"))));
    assert!(text.contains("Pages expanded: 2"));
}

#[test]
fn test_text_report_single_hop_wording() {
    let text = generate_text_report(&found_report(&["A", "B"], 1));
    assert!(text.contains("Path found: 1 hop"));
    assert!(!text.contains("1 hops"));
}

#[test]
fn test_text_report_not_found_message() {
    let text = generate_text_report(&not_found_report(1000));

    assert!(text.contains(NOT_FOUND_MESSAGE));
    assert!(text.contains("Pages expanded: 1000"));
    assert!(!text.contains("Path found"));
}

#[test]
fn test_json_report_structure() {
    let json = generate_json_report(&found_report(&["A", "B"], 1)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["metadata"]["generator"], "wikihop");
    assert!(value["metadata"]["generated_at"].is_string());
    assert_eq!(value["search"]["status"], "found");
    assert_eq!(value["search"]["hops"], 1);
    assert_eq!(value["search"]["nodes_expanded"], 1);
    assert_eq!(
        value["search"]["path"],
        serde_json::json!([wiki("A").as_str(), wiki("B").as_str()])
    );
}

#[test]
fn test_json_report_not_found_omits_path() {
    let json = generate_json_report(&not_found_report(4)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["search"]["status"], "not_found");
    assert!(value["search"].get("path").is_none());
    assert_eq!(value["search"]["message"], NOT_FOUND_MESSAGE);
}

#[test]
fn test_render_dispatches_on_format() {
    let report = found_report(&["A", "B"], 1);
    assert!(render(&report, ReportFormat::Text).unwrap().contains("Path found"));
    assert!(
        render(&report, ReportFormat::Json)
            .unwrap()
            .trim_start()
            .starts_with('{')
    );
}

// ============================================================================
// Cache Report Tests
// ============================================================================

#[test]
fn test_cache_report_with_ttl() {
    let stats = CacheStats {
        entries: 12,
        expired: 3,
        oldest: Some(0),
        newest: Some(86_400),
    };
    let report = generate_cache_report(
        &stats,
        Path::new("/tmp/links.db"),
        Some(Duration::from_secs(24 * 3600)),
    );

    assert!(report.contains("/tmp/links.db"));
    assert!(report.contains("Entries:  12"));
    assert!(report.contains("Expired:  3 (ttl 24h)"));
    assert!(report.contains("1970-01-01 00:00:00 UTC"));
    assert!(report.contains("1970-01-02 00:00:00 UTC"));
}

#[test]
fn test_cache_report_without_ttl() {
    let stats = CacheStats {
        entries: 0,
        expired: 0,
        oldest: None,
        newest: None,
    };
    let report = generate_cache_report(&stats, Path::new("links.db"), None);

    assert!(report.contains("no ttl"));
    assert!(!report.contains("Oldest"));
}

// ============================================================================
// Saving
// ============================================================================

#[test]
fn test_save_report() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("report.json");
    let content = generate_json_report(&found_report(&["A", "B"], 1)).unwrap();

    save_report(&content, &path).unwrap();
    assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
}
