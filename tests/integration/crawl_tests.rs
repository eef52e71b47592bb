//! Integration tests for the crawler
//!
//! These tests use wiremock to stand in for the registry and run the page
//! loop, the import pass and the scheduled job body end-to-end.

use std::sync::Arc;
use std::time::Duration;
use wanted_sync::config::Config;
use wanted_sync::crawler::{
    crawl_and_import, read_status_file, trigger_scrape, Crawler, JobKind, JobOutcome,
    RunOutcome, ScheduleCoordinator,
};
use wanted_sync::storage::{open_in_memory, open_storage, SharedStorage, Storage};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One listing row as (name, birth year cell, crime, decision number)
type Row<'a> = (&'a str, &'a str, &'a str, &'a str);

/// Renders a listing page with a header row followed by `rows`
fn listing_html(rows: &[Row<'_>]) -> String {
    let mut body = String::from(
        "<table><tbody><tr><th>STT</th><th>Họ tên</th><th>Năm sinh</th><th>Nơi ĐKTT</th>\
         <th>Họ tên bố mẹ</th><th>Tội danh</th><th>Số QĐ</th><th>Đơn vị ra QĐ</th></tr>",
    );
    for (i, (name, born, crime, decision)) in rows.iter().enumerate() {
        body.push_str(&format!(
            "<tr><td>{}</td><td><a href=\"/p/{}\">{}</a></td><td>{}</td><td>Hà Nội</td>\
             <td></td><td>{}</td><td>{}</td><td>Công an Hà Nội</td></tr>",
            i + 1,
            i + 1,
            name,
            born,
            crime,
            decision
        ));
    }
    body.push_str("</tbody></table>");
    format!("<html><body>{}</body></html>", body)
}

/// Rows with distinct names and decision numbers
fn numbered_rows(count: usize) -> Vec<(String, String)> {
    (1..=count)
        .map(|i| (format!("Người {}", i), format!("{}/QĐ", i)))
        .collect()
}

fn render_numbered(rows: &[(String, String)]) -> String {
    let rows: Vec<Row<'_>> = rows
        .iter()
        .map(|(name, decision)| (name.as_str(), "1985", "Trộm cắp", decision.as_str()))
        .collect();
    listing_html(&rows)
}

/// Creates a test configuration pointed at the mock server
fn create_test_config(base_url: &str) -> Config {
    let mut config = Config::default();
    config.source.base_url = base_url.to_string();
    config.source.first_page_path = "/list".to_string();
    config.source.page_path = "/list/more".to_string();
    config.source.timeout_secs = 5;
    config.crawler.politeness_min_ms = 0;
    config.crawler.politeness_max_ms = 0;
    config.schedule.daily_pages = 2;
    config
}

fn create_crawler(server: &MockServer, storage: SharedStorage) -> Crawler {
    Crawler::new(&create_test_config(&server.uri()), storage).expect("Failed to create crawler")
}

async fn mount_page(server: &MockServer, page: u32, html: String) {
    let mock = if page <= 1 {
        Mock::given(method("GET")).and(path("/list"))
    } else {
        Mock::given(method("GET"))
            .and(path("/list/more"))
            .and(query_param("page", page.to_string()))
    };
    mock.respond_with(ResponseTemplate::new(200).set_body_string(html))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_unreached_page(server: &MockServer, page: u32) {
    Mock::given(method("GET"))
        .and(path("/list/more"))
        .and(query_param("page", page.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(0)
        .mount(server)
        .await;
}

fn stored_count(storage: &SharedStorage) -> u64 {
    storage.lock().unwrap().count().unwrap()
}

#[tokio::test]
async fn test_empty_page_ends_run_before_page_cap() {
    let server = MockServer::start().await;
    let page_one = numbered_rows(3);

    mount_page(&server, 1, render_numbered(&page_one)).await;
    mount_page(&server, 2, listing_html(&[])).await;
    mount_unreached_page(&server, 3).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(3, None).await.expect("Run failed");

    assert_eq!(run.outcome, RunOutcome::PagesExhausted);
    assert_eq!(run.pages_fetched, 2);
    let names: Vec<&str> = run.records.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["NGƯỜI 1", "NGƯỜI 2", "NGƯỜI 3"]);
    assert_eq!(stored_count(&storage), 3);
}

#[tokio::test]
async fn test_page_cap_stops_run() {
    let server = MockServer::start().await;

    mount_page(&server, 1, render_numbered(&numbered_rows(2))).await;
    mount_unreached_page(&server, 2).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(1, None).await.unwrap();

    assert_eq!(run.pages_fetched, 1);
    assert_eq!(run.records.len(), 2);
}

#[tokio::test]
async fn test_record_limit_truncates_page_in_order() {
    let server = MockServer::start().await;
    let rows = numbered_rows(8);

    mount_page(&server, 1, render_numbered(&rows)).await;
    mount_unreached_page(&server, 2).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    // Page cap is ignored once a limit is given
    let run = crawler.run(1, Some(5)).await.unwrap();

    assert_eq!(run.outcome, RunOutcome::LimitReached);
    assert_eq!(run.records.len(), 5);
    let decisions: Vec<&str> = run
        .records
        .iter()
        .map(|p| p.decision_number.as_deref().unwrap())
        .collect();
    assert_eq!(decisions, vec!["1/QĐ", "2/QĐ", "3/QĐ", "4/QĐ", "5/QĐ"]);
    assert_eq!(stored_count(&storage), 5);
}

#[tokio::test]
async fn test_record_limit_spans_pages() {
    let server = MockServer::start().await;
    let rows = numbered_rows(6);

    mount_page(&server, 1, render_numbered(&rows[..4])).await;
    mount_page(&server, 2, render_numbered(&rows[4..])).await;
    mount_unreached_page(&server, 3).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(1, Some(5)).await.unwrap();

    assert_eq!(run.outcome, RunOutcome::LimitReached);
    assert_eq!(run.pages_fetched, 2);
    assert_eq!(run.records.len(), 5);
    assert_eq!(run.records[4].decision_number.as_deref(), Some("5/QĐ"));
}

#[tokio::test]
async fn test_server_error_treated_as_end_of_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    mount_unreached_page(&server, 2).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(5, None).await.expect("Fetch failure must not abort the run");

    assert!(run.records.is_empty());
    assert_eq!(run.pages_fetched, 1);
    assert_eq!(stored_count(&storage), 0);
}

#[tokio::test]
async fn test_decision_number_merges_across_pages() {
    let server = MockServer::start().await;

    let first = listing_html(&[("Lê Văn C", "1970", "Lừa đảo", "123/2025")]);
    let second = listing_html(&[("Lê Văn C", "không rõ", "Lừa đảo chiếm đoạt", "123/2025")]);
    mount_page(&server, 1, first).await;
    mount_page(&server, 2, second).await;
    mount_page(&server, 3, listing_html(&[])).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(3, None).await.unwrap();

    assert_eq!(run.records.len(), 2);
    assert_eq!(run.records[0].id, run.records[1].id);
    assert_eq!(stored_count(&storage), 1);

    let stored = storage.lock().unwrap().find_all().unwrap();
    assert_eq!(stored[0].crime, "Lừa đảo chiếm đoạt");
    // Unknown birth year on page 2 does not erase the known one
    assert_eq!(stored[0].birth_year, Some(1970));
}

#[tokio::test]
async fn test_requests_carry_browser_headers() {
    let server = MockServer::start().await;
    let mut config = create_test_config(&server.uri());
    config.source.user_agent = "wanted-sync-test/1.0".to_string();
    config.source.accept_language = "vi-VN".to_string();

    Mock::given(method("GET"))
        .and(path("/list"))
        .and(header("user-agent", "wanted-sync-test/1.0"))
        .and(header("accept-language", "vi-VN"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let crawler = Crawler::new(&config, open_in_memory().unwrap()).unwrap();
    let run = crawler.run(1, None).await.unwrap();

    assert!(run.records.is_empty());
}

#[tokio::test]
async fn test_trigger_reports_scraped_records() {
    let server = MockServer::start().await;

    mount_page(&server, 1, render_numbered(&numbered_rows(4))).await;

    let crawler = create_crawler(&server, open_in_memory().unwrap());
    let response = trigger_scrape(&crawler, Some(3), Some(2)).await.unwrap();

    assert!(response.success);
    assert_eq!(response.count, 2);
    assert_eq!(response.records.len(), 2);
    assert_eq!(response.message, "Successfully scraped 2 records");

    let json = serde_json::to_value(&response).unwrap();
    assert_eq!(json["records"][0]["birthYear"], 1985);
    assert_eq!(json["records"][0]["decisionNumber"], "1/QĐ");
    assert!(json["records"][0].get("parents").is_none());
}

#[tokio::test]
async fn test_crawl_and_import_counts_existing_records_as_duplicates() {
    let server = MockServer::start().await;

    mount_page(&server, 1, render_numbered(&numbered_rows(3))).await;
    mount_page(&server, 2, listing_html(&[])).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let summary = crawl_and_import(&crawler, 5).await.unwrap();

    assert_eq!(summary.scraped, 3);
    assert_eq!(summary.imported, 0);
    assert_eq!(summary.duplicates, 3);
    assert_eq!(summary.errors, 0);
    assert_eq!(stored_count(&storage), 3);
}

#[tokio::test]
async fn test_scheduled_job_runs_and_releases_guard() {
    let server = MockServer::start().await;

    mount_page(&server, 1, render_numbered(&numbered_rows(2))).await;
    mount_page(&server, 2, render_numbered(&[("Người 9".to_string(), "9/QĐ".to_string())])).await;
    mount_unreached_page(&server, 3).await;

    let config = create_test_config(&server.uri());
    let crawler = Crawler::new(&config, open_in_memory().unwrap()).unwrap();
    let coordinator = ScheduleCoordinator::new(Arc::new(crawler), config.schedule.clone());

    let outcome = coordinator.run_job(JobKind::Daily).await;

    match outcome {
        JobOutcome::Completed(summary) => assert_eq!(summary.scraped, 3),
        other => panic!("Expected a completed job, got {:?}", other),
    }
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_scheduled_job_skipped_while_guard_held() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(listing_html(&[])))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&server.uri());
    let crawler = Crawler::new(&config, open_in_memory().unwrap()).unwrap();
    let coordinator = ScheduleCoordinator::new(Arc::new(crawler), config.schedule.clone());

    let guard = coordinator.try_begin().expect("Guard should be free");

    assert_eq!(coordinator.run_job(JobKind::Weekly).await, JobOutcome::Skipped);
    assert!(coordinator.is_running());

    drop(guard);
    assert!(!coordinator.is_running());
}

#[tokio::test]
async fn test_records_persist_to_database_file() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let db_path = temp_dir.path().join("wanted.db");

    mount_page(&server, 1, render_numbered(&numbered_rows(2))).await;
    mount_page(&server, 2, listing_html(&[])).await;

    {
        let storage = open_storage(&db_path).unwrap();
        let crawler = create_crawler(&server, storage);
        crawler.run(2, None).await.unwrap();
    }

    let reopened = open_storage(&db_path).unwrap();
    assert_eq!(stored_count(&reopened), 2);
}

#[tokio::test]
async fn test_fetch_timeout_treated_as_end_of_listing() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/list"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(render_numbered(&numbered_rows(2)))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_unreached_page(&server, 2).await;

    let mut config = create_test_config(&server.uri());
    config.source.timeout_secs = 1;
    let storage = open_in_memory().unwrap();
    let crawler = Crawler::new(&config, storage.clone()).unwrap();

    let run = crawler.run(3, None).await.expect("Timeout must not abort the run");

    assert_eq!(run.outcome, RunOutcome::PagesExhausted);
    assert_eq!(run.pages_fetched, 1);
    assert!(run.records.is_empty());
    assert_eq!(stored_count(&storage), 0);
}

#[tokio::test]
async fn test_invalid_record_skipped_inside_batch() {
    let server = MockServer::start().await;

    let rows = listing_html(&[
        ("Ngô Văn G", "1980", "Trộm cắp", "7/QĐ"),
        ("Phan Văn H", "1981", "", "8/QĐ"),
        ("Vũ Thị I", "1982", "Cướp giật", "9/QĐ"),
    ]);
    mount_page(&server, 1, rows).await;
    mount_page(&server, 2, listing_html(&[])).await;

    let storage = open_in_memory().unwrap();
    let crawler = create_crawler(&server, storage.clone());

    let run = crawler.run(3, None).await.unwrap();

    assert_eq!(run.persist_failures, 1);
    let names: Vec<&str> = run.records.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["NGÔ VĂN G", "VŨ THỊ I"]);
    assert_eq!(stored_count(&storage), 2);
}

#[tokio::test]
async fn test_failed_job_releases_guard() {
    let server = MockServer::start().await;
    let temp_dir = tempfile::tempdir().unwrap();
    let status_path = temp_dir.path().join("status.json");

    mount_page(&server, 1, render_numbered(&numbered_rows(2))).await;
    mount_unreached_page(&server, 2).await;

    let storage = open_in_memory().unwrap();
    let poisoned = storage.clone();
    let _ = std::thread::spawn(move || {
        let _lock = poisoned.lock().unwrap();
        panic!("poisoning the store lock");
    })
    .join();

    let config = create_test_config(&server.uri());
    let crawler = Crawler::new(&config, storage).unwrap();
    let coordinator = ScheduleCoordinator::new(Arc::new(crawler), config.schedule.clone())
        .with_status_file(&status_path);

    let outcome = coordinator.run_job(JobKind::Daily).await;

    match outcome {
        JobOutcome::Failed(message) => assert!(message.contains("aborted after 0 page(s)")),
        other => panic!("Expected a failed job, got {:?}", other),
    }
    assert!(!coordinator.is_running());
    assert!(coordinator.try_begin().is_some());

    let published = read_status_file(&status_path).unwrap().unwrap();
    assert!(!published.is_running);
}
