//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use tidewalk::config::Config;
use tidewalk::crawler::{crawl, CrawlReport, Crawler};
use tidewalk::PolicyHandle;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing into `output_dir`, with instant retries
fn create_test_config(output_dir: &Path, max_depth: u32) -> Config {
    let mut config = Config::default();
    config.crawler.max_depth = max_depth;
    config.crawler.max_workers = 4;
    config.crawler.user_agent = "TestBot/1.0".to_string();
    config.crawler.output_dir = output_dir.display().to_string();
    config.retry.total = 2;
    config.retry.backoff_factor = 0.0;
    config.retry.timeout_secs = 5;
    config
}

/// An HTML page linking to each of `links`
fn html_page(links: &[String]) -> ResponseTemplate {
    let anchors: String = links
        .iter()
        .map(|l| format!(r#"<a href="{}">link</a>"#, l))
        .collect();
    ResponseTemplate::new(200)
        .set_body_string(format!(
            "<html><head><title>Test</title></head><body>{}</body></html>",
            anchors
        ))
        .insert_header("content-type", "text/html")
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_page(server: &MockServer, route: &str, links: &[&str]) {
    let links: Vec<String> = links.iter().map(|l| l.to_string()).collect();
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html_page(&links))
        .mount(server)
        .await;
}

fn url(server: &MockServer, route: &str) -> String {
    format!("{}{}", server.uri(), route)
}

fn visited(report: &CrawlReport) -> Vec<&str> {
    report.visited.iter().map(String::as_str).collect()
}

/// Paths of every request the server received, in arrival order
async fn request_paths(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|r| r.url.path().to_string())
        .collect()
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /private").await;
    mount_page(&server, "/", &["/page1", "page2"]).await;
    mount_page(&server, "/page1", &["/page3", "/"]).await;
    mount_page(&server, "/page2", &["/page1", "/page3"]).await;
    mount_page(&server, "/page3", &[]).await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    let expected = vec![
        url(&server, "/"),
        url(&server, "/page1"),
        url(&server, "/page2"),
        url(&server, "/page3"),
    ];
    assert_eq!(visited(&report), expected);
    assert!(report.robots_loaded);
    assert_eq!(report.total_failed(), 0);

    // The result file holds the same URLs, sorted, one per line
    let output_path = report.output.clone().unwrap();
    assert_eq!(output_path.parent(), Some(output.path()));
    let file_name = output_path.file_name().unwrap().to_string_lossy().to_string();
    assert!(file_name.starts_with("urls_"));
    assert!(file_name.ends_with(".txt"));

    let content = std::fs::read_to_string(&output_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, expected);
}

#[tokio::test]
async fn test_each_url_fetched_once() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow:").await;
    mount_page(&server, "/", &["/a", "/b", "/a#top"]).await;
    mount_page(&server, "/a", &["/shared", "/b"]).await;
    mount_page(&server, "/b", &["/shared", "/a"]).await;

    Mock::given(method("GET"))
        .and(path("/shared"))
        .respond_with(html_page(&["/".to_string(), "/a".to_string()]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 5);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert!(report.visited.contains(&url(&server, "/shared")));
    // A fragment is a distinct URL
    assert!(report.visited.contains(&url(&server, "/a#top")));

    let paths = request_paths(&server).await;
    for route in ["/", "/a", "/b", "/shared"] {
        assert_eq!(
            paths.iter().filter(|p| p.as_str() == route).count(),
            if route == "/a" { 2 } else { 1 },
            "unexpected request count for {}",
            route
        );
    }
}

#[tokio::test]
async fn test_breadth_first_levels() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/a", "/b"]).await;
    mount_page(&server, "/a", &["/c", "/b"]).await;
    mount_page(&server, "/c", &[]).await;

    // /b is slow; /c must still wait for the whole first level
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html_page(&[]).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(report.levels.len(), 3);
    assert_eq!(report.level_of(&url(&server, "/")), Some(0));
    assert_eq!(report.level_of(&url(&server, "/a")), Some(1));
    assert_eq!(report.level_of(&url(&server, "/b")), Some(1));
    assert_eq!(report.level_of(&url(&server, "/c")), Some(2));

    // /b was linked again from level 1 but stays at its shortest depth
    assert_eq!(report.levels[1].dispatched.len(), 2);
    assert_eq!(report.levels[2].dispatched, vec![url(&server, "/c")]);

    let paths = request_paths(&server).await;
    let pos = |route: &str| paths.iter().position(|p| p == route).unwrap();
    assert!(pos("/a") < pos("/c"));
    assert!(pos("/b") < pos("/c"));
}

#[tokio::test]
async fn test_failed_pages_do_not_stop_crawl() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/ok", "/missing", "/broken"]).await;
    mount_page(&server, "/ok", &["/deeper"]).await;
    mount_page(&server, "/deeper", &[]).await;

    // Error pages carry links; they must not be followed
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_string(r#"<a href="/only-via-missing">child</a>"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    // Retried twice after the first attempt
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_string(r#"<a href="/only-via-broken">child</a>"#),
        )
        .expect(3)
        .mount(&server)
        .await;

    for orphan in ["/only-via-missing", "/only-via-broken"] {
        Mock::given(method("GET"))
            .and(path(orphan))
            .respond_with(html_page(&[]))
            .expect(0)
            .mount(&server)
            .await;
    }

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(
        visited(&report),
        vec![
            url(&server, "/"),
            url(&server, "/deeper"),
            url(&server, "/ok"),
        ]
    );
    assert_eq!(report.total_failed(), 2);
    assert!(!report.visited.contains(&url(&server, "/only-via-missing")));
    assert!(!report.visited.contains(&url(&server, "/only-via-broken")));
}

#[tokio::test]
async fn test_transient_errors_are_retried() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/flaky"]).await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(html_page(&[]))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 2);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert!(report.visited.contains(&url(&server, "/flaky")));
    assert_eq!(report.total_failed(), 0);
}

#[tokio::test]
async fn test_robots_disallowed_pages_are_not_requested() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(
        &server,
        "User-agent: *\nDisallow: /private\n\nUser-agent: OtherBot\nDisallow: /",
    )
    .await;
    mount_page(&server, "/", &["/private/secret", "/public"]).await;
    mount_page(&server, "/public", &[]).await;

    Mock::given(method("GET"))
        .and(path("/private/secret"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(
        visited(&report),
        vec![url(&server, "/"), url(&server, "/public")]
    );
    assert_eq!(report.total_blocked(), 1);
    assert_eq!(report.total_failed(), 0);
}

#[tokio::test]
async fn test_missing_robots_allows_everything() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    // No robots.txt mock: the server answers 404
    mount_page(&server, "/", &["/admin"]).await;
    mount_page(&server, "/admin", &[]).await;

    let config = create_test_config(output.path(), 3);
    let mut crawler = Crawler::new(&url(&server, "/"), &config).unwrap();
    assert_eq!(crawler.robots_url(), url(&server, "/robots.txt"));

    let policy = crawler.load_robots().await;
    assert!(matches!(policy, PolicyHandle::Disabled { .. }));

    let report = crawler.run().await.unwrap();
    assert!(!report.robots_loaded);
    assert_eq!(
        visited(&report),
        vec![url(&server, "/"), url(&server, "/admin")]
    );
}

#[tokio::test]
async fn test_load_robots_installs_policy() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow: /tmp/ # scratch space").await;

    let config = create_test_config(output.path(), 1);
    let mut crawler = Crawler::new(&url(&server, "/"), &config).unwrap();
    let policy = crawler.load_robots().await;

    assert!(policy.is_loaded());
    assert!(!policy.is_allowed(&url(&server, "/tmp/file"), "*"));
    assert!(policy.is_allowed(&url(&server, "/index.html"), "*"));
}

#[tokio::test]
async fn test_depth_limit() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/1"]).await;
    mount_page(&server, "/1", &["/2"]).await;

    Mock::given(method("GET"))
        .and(path("/2"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 1);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(visited(&report), vec![url(&server, "/"), url(&server, "/1")]);
    assert_eq!(report.levels.len(), 2);
}

#[tokio::test]
async fn test_depth_zero_fetches_only_seed() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/a"]).await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 0);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(visited(&report), vec![url(&server, "/")]);
}

#[tokio::test]
async fn test_other_domains_are_not_crawled() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    let elsewhere = url(&other, "/elsewhere");
    mount_page(&server, "/", &[elsewhere.as_str(), "/local"]).await;
    mount_page(&server, "/local", &["https://example.org/page"]).await;

    // Same host, different port: a different domain
    Mock::given(method("GET"))
        .respond_with(html_page(&[]))
        .expect(0)
        .mount(&other)
        .await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert_eq!(
        visited(&report),
        vec![url(&server, "/"), url(&server, "/local")]
    );
}

#[tokio::test]
async fn test_failing_seed_writes_empty_result() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    assert!(report.visited.is_empty());
    assert_eq!(report.total_failed(), 1);

    let content = std::fs::read_to_string(report.output.unwrap()).unwrap();
    assert!(content.is_empty());
}

#[tokio::test]
async fn test_empty_and_malformed_pages_are_still_visited() {
    let server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_robots(&server, "").await;
    mount_page(&server, "/", &["/empty", "/broken-link", "/text"]).await;

    Mock::given(method("GET"))
        .and(path("/empty"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken-link"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="http://[::1">bad</a><a href="/after">good</a>"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("plain text, no markup")
                .insert_header("content-type", "text/plain"),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/after", &[]).await;

    let config = create_test_config(output.path(), 3);
    let report = crawl(&url(&server, "/"), &config).await.unwrap();

    for route in ["/", "/empty", "/broken-link", "/text", "/after"] {
        assert!(
            report.visited.contains(&url(&server, route)),
            "{} was not visited",
            route
        );
    }
}

#[tokio::test]
async fn test_invalid_seed_is_rejected() {
    let config = Config::default();
    assert!(crawl("not a url", &config).await.is_err());
    assert!(crawl("ftp://example.com/", &config).await.is_err());
}
