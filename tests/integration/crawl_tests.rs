//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test the full
//! crawl cycle end-to-end through the HTTP render host. Scenarios that need
//! precise control over in-flight navigations use a scripted render host.

use async_trait::async_trait;
use site_crawl::config::{CrawlerConfig, SitemapSeeding};
use site_crawl::crawler::{
    crawl, Navigation, RenderContext, RenderHost, RequestInterceptor, StopHandle,
};
use site_crawl::{CrawlError, Crawler, NavigationError};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration without inter-batch or startup pauses
fn create_test_config() -> CrawlerConfig {
    CrawlerConfig {
        batch_delay_ms: Some(0),
        startup_delay_ms: 0,
        ..CrawlerConfig::default()
    }
}

async fn mount_page(server: &MockServer, at: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn page_with_links(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{}">link</a>"#, href))
        .collect();
    format!("<html><head><title>Test</title></head><body>{}</body></html>", anchors)
}

fn result_urls(result: &site_crawl::CrawlResult) -> Vec<String> {
    result.results.iter().map(|r| r.url().to_string()).collect()
}

#[tokio::test]
async fn test_single_page_without_links() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links(&[])).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    assert_eq!(result.results.len(), 1);
    assert!(!result.stopped);

    let page = &result.results[0];
    assert_eq!(page.url(), format!("{}/", server.uri()));
    assert_eq!(page.status_code(), 200);
    assert!(page.error().is_none());
    assert!(page.html().contains("<title>Test</title>"));
    assert_eq!(result.stats.base_url, format!("{}/", server.uri()));
}

#[tokio::test]
async fn test_full_crawl_visits_each_page_once() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page_with_links(&["/page1", "/page2/", "page1#top"])).await;
    mount_page(&server, "/page1", page_with_links(&["/", "/page2", "/page3"])).await;
    mount_page(&server, "/page2", page_with_links(&["/page1/"])).await;
    mount_page(&server, "/page3", page_with_links(&["/page1", "/page2"])).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&base, 10).await.unwrap();

    let urls = result_urls(&result);
    let unique: HashSet<&String> = urls.iter().collect();
    assert_eq!(unique.len(), urls.len(), "no URL may be fetched twice");
    assert_eq!(urls.len(), 4);
    assert_eq!(result.stats.visited_pages, urls.len());
    assert!(urls.contains(&format!("{}/page3", base)));

    let home = &result.results[0];
    assert_eq!(
        home.links(),
        &[
            format!("{}/page1", base),
            format!("{}/page2", base),
            format!("{}/page1", base)
        ]
    );
}

#[tokio::test]
async fn test_other_hosts_are_not_followed() {
    let server = MockServer::start().await;
    let port = server.address().port();

    // Same server, different hostname
    let other_host = format!("http://localhost:{}/other", port);
    mount_page(
        &server,
        "/",
        page_with_links(&[other_host.as_str(), "https://b.example/elsewhere", "/inside"]),
    )
    .await;
    mount_page(&server, "/inside", page_with_links(&[])).await;
    Mock::given(method("GET"))
        .and(path("/other"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    assert_eq!(result.results.len(), 2);
    assert_eq!(result.results[0].links(), &[format!("{}/inside", server.uri())]);
}

#[tokio::test]
async fn test_page_cap_is_respected() {
    let server = MockServer::start().await;

    let links: Vec<String> = (0..30).map(|i| format!("/p{}", i)).collect();
    let link_refs: Vec<&str> = links.iter().map(String::as_str).collect();
    mount_page(&server, "/", page_with_links(&link_refs)).await;

    // Every child links to more children
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_with_links(&["/deeper/a", "/deeper/b"]))
                .insert_header("content-type", "text/html"),
        )
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    assert_eq!(result.results.len(), 10);
    assert_eq!(result.stats.visited_pages, 10);
    assert_eq!(result.stats.found_urls, 10);
    assert!(!result.stopped);
}

#[tokio::test]
async fn test_non_success_status_is_recorded_without_error() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links(&["/missing"])).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    assert_eq!(result.results.len(), 2);
    let missing = &result.results[1];
    assert_eq!(missing.status_code(), 404);
    assert!(missing.error().is_none());
}

#[tokio::test]
async fn test_navigation_timeout_is_recorded_and_crawl_continues() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links(&["/slow", "/fast"])).await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page_with_links(&["/never"]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/fast", page_with_links(&[])).await;

    // One context, so the slow page and the fast page run in separate batches
    let config = CrawlerConfig {
        pool_size: 1,
        navigation_timeout_ms: 200,
        ..create_test_config()
    };
    let crawler = Crawler::new(config).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    let urls = result_urls(&result);
    assert_eq!(
        urls,
        vec![
            format!("{}/", server.uri()),
            format!("{}/slow", server.uri()),
            format!("{}/fast", server.uri())
        ]
    );

    let slow = &result.results[1];
    assert_eq!(slow.status_code(), 0);
    assert!(slow.error().is_some_and(|e| !e.is_empty()));
    assert!(slow.links().is_empty());
    assert!(slow.html().is_empty());

    assert_eq!(result.results[2].status_code(), 200);
}

#[tokio::test]
async fn test_heavy_subresources_are_counted_as_blocked() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head>
            <link rel="stylesheet" href="/style.css">
            <script src="/app.js"></script>
        </head><body>
            <img src="/logo.png">
            <video src="/intro.mp4"></video>
        </body></html>"#
            .to_string(),
    )
    .await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();

    // Document and script go through; stylesheet, image and video do not
    assert_eq!(result.stats.total_requests, 5);
    assert_eq!(result.stats.blocked_requests, 3);
}

#[tokio::test]
async fn test_invalid_input_fails_fast() {
    assert!(matches!(
        crawl("https://example.com/", 5).await,
        Err(CrawlError::InvalidPageCap { value: 5 })
    ));
    assert!(matches!(
        crawl("https://example.com/", 20_000).await,
        Err(CrawlError::InvalidPageCap { .. })
    ));
    assert!(matches!(
        crawl("not a url", 10).await,
        Err(CrawlError::InvalidStartUrl { .. })
    ));
}

#[tokio::test]
async fn test_sitemap_prefetch_seeds_frontier() {
    let server = MockServer::start().await;
    let base = server.uri();

    mount_page(&server, "/", page_with_links(&[])).await;
    mount_page(&server, "/from-sitemap", page_with_links(&[])).await;
    Mock::given(method("HEAD"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{0}/</loc></url>
  <url><loc>{0}/from-sitemap/</loc></url>
  <url><loc>https://b.example/not-ours</loc></url>
</urlset>"#,
            base
        )))
        .mount(&server)
        .await;

    let config = CrawlerConfig {
        sitemap: SitemapSeeding::Prefetch,
        ..create_test_config()
    };
    let crawler = Crawler::new(config).unwrap();
    let result = crawler.crawl(&base, 10).await.unwrap();

    assert_eq!(
        result_urls(&result),
        vec![format!("{}/", base), format!("{}/from-sitemap", base)]
    );
}

#[tokio::test]
async fn test_sitemap_disabled_by_default() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links(&[])).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let result = crawler.crawl(&server.uri(), 10).await.unwrap();
    assert_eq!(result.results.len(), 1);
}

#[tokio::test]
async fn test_final_progress_sample() {
    let server = MockServer::start().await;
    mount_page(&server, "/", page_with_links(&["/a"])).await;
    mount_page(&server, "/a", page_with_links(&[])).await;

    let crawler = Crawler::new(create_test_config()).unwrap();
    let mut rx = crawler.subscribe();
    crawler.crawl(&server.uri(), 10).await.unwrap();

    let mut last = None;
    while let Ok(sample) = rx.try_recv() {
        last = Some(sample);
    }
    let last = last.unwrap();
    assert_eq!(last.current_url, "Done");
    assert_eq!(last.percent, 100);
    assert_eq!(last.visited, 2);
    assert_eq!(last.total, 2);
}

/// Scripted host: the start page links to three pages, each of which links
/// to three more. Navigating any of the first three requests a stop.
struct StoppingHost {
    visited: Arc<Mutex<Vec<String>>>,
    stop: Arc<OnceLock<StopHandle>>,
}

struct StoppingContext {
    visited: Arc<Mutex<Vec<String>>>,
    stop: Arc<OnceLock<StopHandle>>,
}

#[async_trait]
impl RenderContext for StoppingContext {
    async fn navigate(
        &self,
        url: &str,
        _interceptor: &RequestInterceptor,
    ) -> Result<Navigation, NavigationError> {
        self.visited.lock().unwrap().push(url.to_string());

        let anchors = if url == "https://site.test/" {
            vec![
                "https://site.test/a".to_string(),
                "https://site.test/b".to_string(),
                "https://site.test/c".to_string(),
            ]
        } else {
            if let Some(stop) = self.stop.get() {
                stop.stop();
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            (0..3).map(|i| format!("{}/child{}", url, i)).collect()
        };

        Ok(Navigation {
            status: 200,
            final_url: url.to_string(),
            html: "<html></html>".to_string(),
            anchors,
        })
    }

    async fn close(&self) {}
}

#[async_trait]
impl RenderHost for StoppingHost {
    async fn open_context(&self, _id: usize) -> Result<Box<dyn RenderContext>, CrawlError> {
        Ok(Box::new(StoppingContext {
            visited: self.visited.clone(),
            stop: self.stop.clone(),
        }))
    }

    async fn close(&self) {}
}

#[tokio::test]
async fn test_stop_lets_in_flight_batch_finish() {
    let visited = Arc::new(Mutex::new(Vec::new()));
    let stop = Arc::new(OnceLock::new());
    let host = Arc::new(StoppingHost {
        visited: visited.clone(),
        stop: stop.clone(),
    });

    let crawler = Crawler::with_render_host(create_test_config(), host).unwrap();
    let _ = stop.set(crawler.stop_handle());

    let result = crawler.crawl("https://site.test/", 100).await.unwrap();

    assert!(result.stopped);
    assert_eq!(result.results.len(), 4);

    let mut urls = result_urls(&result);
    urls.sort();
    assert_eq!(
        urls,
        vec![
            "https://site.test/",
            "https://site.test/a",
            "https://site.test/b",
            "https://site.test/c"
        ]
    );
    assert_eq!(visited.lock().unwrap().len(), 4, "no batch may start after stop");
    assert!(result.results.iter().all(|r| r.status_code() == 200));

    // Children were discovered but never fetched
    assert_eq!(result.stats.found_urls, 13);
}
