//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use price_sweep::config::{Config, CrawlerConfig, PriceConfig, ScannerConfig, UserAgentConfig};
use price_sweep::crawler::crawl;
use price_sweep::output::{Finding, MemorySink};
use price_sweep::SweepError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration rooted at the mock server
fn create_test_config(root_url: &str, pool_size: usize) -> Config {
    Config {
        crawler: CrawlerConfig {
            root_url: root_url.to_string(),
            host: None,
            pool_size,
            max_fetch_retries: 3,
            fetch_timeout_millis: 2000,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestSweep".to_string(),
            crawler_version: "1.0.0".to_string(),
        },
        scanner: ScannerConfig::default(),
        price: PriceConfig {
            min: 20.0,
            max: 2000.0,
            product_suffix: ".html".to_string(),
        },
    }
}

fn html_page(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(format!("<html><body>{}</body></html>", body))
        .insert_header("content-type", "text/html")
}

fn price_markup(amount: &str) -> String {
    format!(
        r#"<span class="rfloat prd-price"><span property="gr:hasCurrencyValue">{}</span> <span property="gr:hasCurrency">SGD</span></span>"#,
        amount
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: &str, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html_page(body))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_full_crawl_single_host() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Index page links to two sections, one of them twice
    mount_page(
        &mock_server,
        "/",
        &format!(
            r#"<a href="{base}/shoes">Shoes</a>
               <a href="/bags/">Bags</a>
               <a href="/shoes#top">Shoes again</a>
               <a href="https://elsewhere.example.net/">Elsewhere</a>"#,
            base = base_url
        ),
        1,
    )
    .await;

    // Sections link back to the index and to each other
    mount_page(
        &mock_server,
        "/shoes",
        r#"<a href="/">Home</a><a href="/bags">Bags</a><a href="/shoes/boot.html">Boot</a>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/bags",
        r#"<a href="/">Home</a><a href="/shoes/">Shoes</a>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/shoes/boot.html",
        &price_markup("88.00"),
        1,
    )
    .await;

    let config = create_test_config(&base_url, 4);
    let sink = Arc::new(MemorySink::new());

    let summary = crawl(&config, sink.clone()).await.expect("Crawl failed");

    assert_eq!(summary.discovered, 4);
    assert_eq!(summary.visited, 4);
    assert_eq!(summary.fetched, 4);
    assert_eq!(summary.unvisited, 0);
    assert_eq!(summary.abandoned(), 0);
    assert_eq!(summary.findings.prices_checked, 1);
    assert_eq!(summary.findings.out_of_range, 0);
    assert!(sink.out_of_range().is_empty());
}

#[tokio::test]
async fn test_denied_and_filter_links_never_fetched() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/sendfriend/product/send/id/42">Tell a friend</a>
           <a href="/customer/wishlist/add/p/42">Wishlist</a>
           <a href="/?sort=price&dir=asc">Sorted</a>
           <a href="/catalog">Catalog</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/catalog", "", 1).await;
    mount_page(&mock_server, "/sendfriend/product/send/id/42", "", 0).await;
    mount_page(&mock_server, "/customer/wishlist/add/p/42", "", 0).await;

    let config = create_test_config(&mock_server.uri(), 2);
    let summary = crawl(&config, Arc::new(MemorySink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.discovered, 2);
    assert_eq!(summary.fetched, 2);
}

#[tokio::test]
async fn test_listing_behind_filter_link_discovered() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/sale?page=2">More deals</a>"#, 1).await;
    mount_page(
        &mock_server,
        "/sale",
        r#"<a href="/sale?page=3">Next</a><a href="/sale/belt.html">Belt</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/sale/belt.html", &price_markup("45.00"), 1).await;

    let config = create_test_config(&mock_server.uri(), 2);
    let summary = crawl(&config, Arc::new(MemorySink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.findings.prices_checked, 1);
}

#[tokio::test]
async fn test_not_found_page_abandoned() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/missing">Missing</a><a href="/present">Present</a>"#,
        1,
    )
    .await;
    mount_page(&mock_server, "/present", "", 1).await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2);
    let summary = crawl(&config, Arc::new(MemorySink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.discovered, 3);
    assert_eq!(summary.fetched, 2);
    assert_eq!(summary.abandoned_permanent, 1);
    assert_eq!(summary.unvisited, 0);
}

#[tokio::test]
async fn test_server_error_not_retried() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/broken">Broken</a>"#, 1).await;

    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 2);
    let summary = crawl(&config, Arc::new(MemorySink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.abandoned_unclassified, 1);
    assert_eq!(summary.abandoned_after_retries, 0);
}

#[tokio::test]
async fn test_timeout_retried_then_abandoned() {
    let mock_server = MockServer::start().await;

    mount_page(&mock_server, "/", r#"<a href="/slow">Slow</a>"#, 1).await;

    // Every attempt takes longer than the fetch timeout
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html_page("").set_delay(Duration::from_millis(1500)))
        .expect(3)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 1);
    config.crawler.fetch_timeout_millis = 200;

    let summary = crawl(&config, Arc::new(MemorySink::new()))
        .await
        .expect("Crawl failed");

    assert_eq!(summary.fetched, 1);
    assert_eq!(summary.abandoned_after_retries, 1);
    assert_eq!(summary.unvisited, 0);
}

#[tokio::test]
async fn test_out_of_range_price_detected() {
    let mock_server = MockServer::start().await;

    mount_page(
        &mock_server,
        "/",
        r#"<a href="/shoe1.html">Shoe 1</a><a href="/shoe2.html">Shoe 2</a><a href="/shoe3.html">Shoe 3</a>"#,
        1,
    )
    .await;
    mount_page(
        &mock_server,
        "/shoe1.html",
        &format!(
            "{}{}{}",
            price_markup("2,000,900.00"),
            price_markup("10.00 "),
            price_markup("20.00 ")
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/shoe2.html", &price_markup("88.00"), 1).await;
    mount_page(&mock_server, "/shoe3.html", "Sold out", 1).await;

    let config = create_test_config(&mock_server.uri(), 3);
    let sink = Arc::new(MemorySink::new());

    let summary = crawl(&config, sink.clone()).await.expect("Crawl failed");

    assert_eq!(summary.findings.prices_checked, 4);
    assert_eq!(summary.findings.out_of_range, 2);
    assert_eq!(summary.findings.pages_without_price, 1);

    let mut reported: Vec<String> = sink
        .out_of_range()
        .iter()
        .filter_map(|finding| match finding {
            Finding::Price { page, price, .. } => Some(format!("{} {}", price, page.path())),
            _ => None,
        })
        .collect();
    reported.sort();

    assert_eq!(
        reported,
        vec!["10.00 SGD /shoe1.html", "2000900.00 SGD /shoe1.html"]
    );
}

#[tokio::test]
async fn test_invalid_root_rejected() {
    let mut config = create_test_config("http://127.0.0.1:1", 2);
    config.crawler.root_url = "not a url".to_string();

    let result = crawl(&config, Arc::new(MemorySink::new())).await;

    assert!(matches!(result, Err(SweepError::InvalidRoot { .. })));
}
