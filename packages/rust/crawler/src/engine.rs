//! Paginated schedule crawler.
//!
//! A term's schedule is a chain of pages linked by `rel="next"`. Each page
//! URL is only known once the previous page is parsed, so pages are fetched
//! one at a time with a fixed delay between requests.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use schedkit_shared::{CrawlConfig, CrawlSettings, RawSection, Result, SchedKitError};

use crate::parser::{parse_schedule_page, parse_term_title};

/// User-Agent string for crawl requests.
const USER_AGENT: &str = concat!("schedkit/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Summary of one term crawl.
#[derive(Debug, Clone)]
pub struct CrawlResult {
    /// Raw rows in page order.
    pub sections: Vec<RawSection>,
    /// Number of pages fetched.
    pub pages_fetched: usize,
    /// Total duration of the crawl.
    pub duration: Duration,
    /// Term words from the first page's heading, if it has one.
    pub term_title: Option<Vec<String>>,
}

/// One configured term and its crawl.
#[derive(Debug, Clone)]
pub struct TermCrawl {
    pub term: String,
    pub result: CrawlResult,
}

/// Term metadata read from the schedule heading.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct TermMeta {
    pub title: Vec<String>,
}

/// Progress callback for page-level crawl status.
pub trait CrawlProgress: Send + Sync {
    /// Called after each page is parsed.
    fn page_fetched(&self, url: &str, page: usize, rows_so_far: usize);
}

/// No-op progress reporter.
pub struct SilentCrawl;

impl CrawlProgress for SilentCrawl {
    fn page_fetched(&self, _url: &str, _page: usize, _rows_so_far: usize) {}
}

// ---------------------------------------------------------------------------
// Crawler
// ---------------------------------------------------------------------------

/// Sequential crawler over a paginated schedule.
pub struct Crawler {
    config: CrawlConfig,
    client: Client,
}

impl Crawler {
    /// Create a new crawler with the given configuration.
    pub fn new(config: CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| SchedKitError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Crawl one term, following next-page links from `start_url`.
    ///
    /// Stops when a page has no next link or links back to a page already
    /// seen. Exceeding `max_pages` is an error rather than a silent
    /// truncation.
    #[instrument(skip_all, fields(start_url = %start_url))]
    pub async fn crawl_term(
        &self,
        start_url: &Url,
        progress: &dyn CrawlProgress,
    ) -> Result<CrawlResult> {
        let start_time = Instant::now();
        let mut visited = HashSet::<String>::new();
        let mut sections: Vec<RawSection> = Vec::new();
        let mut next = Some(start_url.clone());
        let mut pages_fetched = 0usize;
        let mut term_title = None;

        info!(
            rate_limit_ms = self.config.rate_limit_ms,
            max_pages = self.config.max_pages,
            "starting term crawl"
        );

        while let Some(url) = next.take() {
            if !visited.insert(normalize_url(&url)) {
                warn!(%url, "pagination links back to a visited page, stopping");
                break;
            }

            if pages_fetched >= self.config.max_pages as usize {
                return Err(SchedKitError::Network(format!(
                    "pagination from {start_url} exceeded {} pages",
                    self.config.max_pages
                )));
            }

            if pages_fetched > 0 && self.config.rate_limit_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.rate_limit_ms)).await;
            }

            let body = self.fetch(&url).await?;
            let page = parse_schedule_page(&body, &url)?;
            if pages_fetched == 0 {
                term_title = parse_term_title(&body);
            }
            pages_fetched += 1;

            debug!(%url, rows = page.sections.len(), has_next = page.next.is_some(), "page parsed");

            sections.extend(page.sections);
            progress.page_fetched(url.as_str(), pages_fetched, sections.len());
            next = page.next;
        }

        let result = CrawlResult {
            sections,
            pages_fetched,
            duration: start_time.elapsed(),
            term_title,
        };

        info!(
            pages = result.pages_fetched,
            sections = result.sections.len(),
            duration_ms = result.duration.as_millis(),
            "term crawl completed"
        );

        Ok(result)
    }

    /// Crawl every term in `settings.terms`, in order, from
    /// `<base_url>/<term>`.
    #[instrument(skip_all, fields(terms = settings.terms.len()))]
    pub async fn crawl_terms(
        &self,
        settings: &CrawlSettings,
        progress: &dyn CrawlProgress,
    ) -> Result<Vec<TermCrawl>> {
        let mut crawls = Vec::with_capacity(settings.terms.len());

        for (i, term) in settings.terms.iter().enumerate() {
            if i > 0 && self.config.rate_limit_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.config.rate_limit_ms)).await;
            }

            let url = settings.term_url(term)?;
            let result = self.crawl_term(&url, progress).await?;
            info!(term = %term, sections = result.sections.len(), "term crawled");

            crawls.push(TermCrawl {
                term: term.clone(),
                result,
            });
        }

        Ok(crawls)
    }

    /// Read the term title from a schedule page heading.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch_term_meta(&self, url: &Url) -> Result<TermMeta> {
        let body = self.fetch(url).await?;
        let title = parse_term_title(&body)
            .ok_or_else(|| SchedKitError::parse(format!("{url}: schedule heading not found")))?;
        debug!(?title, "term title parsed");
        Ok(TermMeta { title })
    }

    async fn fetch(&self, url: &Url) -> Result<String> {
        debug!(%url, "fetching page");

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| SchedKitError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SchedKitError::Network(format!("{url}: HTTP {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| SchedKitError::Network(format!("{url}: body read failed: {e}")))
    }
}

/// Normalize a URL for loop detection (strip fragment and trailing slash).
fn normalize_url(url: &Url) -> String {
    let mut normalized = url.clone();
    normalized.set_fragment(None);
    let mut s = normalized.to_string();
    if s.ends_with('/') && s.matches('/').count() > 3 {
        s.pop();
    }
    s
}

#[cfg(test)]
mod crawler_tests {
    use super::*;
    use std::sync::Mutex;

    fn config() -> CrawlConfig {
        CrawlConfig {
            rate_limit_ms: 0,
            timeout_secs: 5,
            max_pages: 10,
        }
    }

    fn row(crn: u32, code: &str) -> String {
        format!(
            "<tr><td>{crn}</td><td>{code}</td><td>01</td><td>3</td>\
             <td><span data-content=\"\">Title</span></td><td></td><td>MW</td>\
             <td>0800-0915</td><td>OLS 128</td><td><a>Doe, J</a></td>\
             <td><strong>1</strong>/20</td></tr>"
        )
    }

    fn page(rows: &[String], next: Option<&str>) -> String {
        let pager = next
            .map(|href| format!(r#"<a class="icon item" rel="next" href="{href}">next</a>"#))
            .unwrap_or_default();
        format!(
            r#"<html><body><table id="course-table"><tbody>{}</tbody></table>{pager}</body></html>"#,
            rows.concat()
        )
    }

    fn titled_page(heading: &str, rows: &[String]) -> String {
        format!(
            r#"<html><body><div></div><div></div><div></div>
            <div><div></div><div><h2>{heading}</h2></div></div>
            <table id="course-table"><tbody>{}</tbody></table></body></html>"#,
            rows.concat()
        )
    }

    #[test]
    fn test_normalize_url() {
        let url = Url::parse("https://schedule.example.edu/main/spring/#top").unwrap();
        assert_eq!(normalize_url(&url), "https://schedule.example.edu/main/spring");
    }

    #[tokio::test]
    async fn test_follows_pagination() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/spring"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page(
                &[row(10001, "CSE 1001"), row(10002, "CSE 1001")],
                Some("/spring/page/2"),
            )))
            .mount(&server)
            .await;

        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/spring/page/2"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(page(&[row(10003, "MTH 1001")], None)),
            )
            .mount(&server)
            .await;

        struct Recorder(Mutex<Vec<(usize, usize)>>);
        impl CrawlProgress for Recorder {
            fn page_fetched(&self, _url: &str, page: usize, rows_so_far: usize) {
                self.0.lock().unwrap().push((page, rows_so_far));
            }
        }
        let recorder = Recorder(Mutex::new(Vec::new()));

        let crawler = Crawler::new(config()).unwrap();
        let start = Url::parse(&format!("{}/spring", server.uri())).unwrap();
        let result = crawler.crawl_term(&start, &recorder).await.unwrap();

        assert_eq!(result.pages_fetched, 2);
        let crns: Vec<&str> = result.sections.iter().map(|s| s.crn.as_str()).collect();
        assert_eq!(crns, vec!["10001", "10002", "10003"]);
        assert_eq!(result.sections[2].subject, "MTH");
        assert_eq!(recorder.0.into_inner().unwrap(), vec![(1, 2), (2, 3)]);
        assert_eq!(result.term_title, None);
    }

    #[tokio::test]
    async fn test_term_title_read_from_first_page() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/spring"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(titled_page(
                "Class Schedule - Main Campus Spring 2020",
                &[row(10001, "CSE 1001")],
            )))
            .expect(1)
            .mount(&server)
            .await;

        let crawler = Crawler::new(config()).unwrap();
        let start = Url::parse(&format!("{}/spring", server.uri())).unwrap();
        let result = crawler.crawl_term(&start, &SilentCrawl).await.unwrap();

        assert_eq!(result.pages_fetched, 1);
        assert_eq!(
            result.term_title,
            Some(vec!["Spring".to_string(), "2020".to_string()])
        );
    }

    #[tokio::test]
    async fn test_crawls_every_configured_term() {
        let server = wiremock::MockServer::start().await;

        for (term, crn, heading) in [
            ("spring", 10001, "Class Schedule - Main Campus Spring 2021"),
            ("fall", 20001, "Class Schedule - Main Campus Fall 2021"),
        ] {
            wiremock::Mock::given(wiremock::matchers::path(format!("/{term}")))
                .respond_with(
                    wiremock::ResponseTemplate::new(200)
                        .set_body_string(titled_page(heading, &[row(crn, "CSE 1001")])),
                )
                .expect(1)
                .mount(&server)
                .await;
        }

        let settings = CrawlSettings {
            base_url: server.uri(),
            terms: vec!["spring".into(), "fall".into()],
            ..CrawlSettings::default()
        };
        let crawler = Crawler::new(config()).unwrap();
        let crawls = crawler.crawl_terms(&settings, &SilentCrawl).await.unwrap();

        let terms: Vec<&str> = crawls.iter().map(|c| c.term.as_str()).collect();
        assert_eq!(terms, vec!["spring", "fall"]);
        assert_eq!(crawls[0].result.sections[0].crn, "10001");
        assert_eq!(crawls[1].result.sections[0].crn, "20001");
        assert_eq!(
            crawls[1].result.term_title,
            Some(vec!["Fall".to_string(), "2021".to_string()])
        );
    }

    #[tokio::test]
    async fn test_stops_on_pagination_loop() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/fall"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page(
                &[row(20001, "PHY 1001")],
                Some("/fall#again"),
            )))
            .mount(&server)
            .await;

        let crawler = Crawler::new(config()).unwrap();
        let start = Url::parse(&format!("{}/fall", server.uri())).unwrap();
        let result = crawler.crawl_term(&start, &SilentCrawl).await.unwrap();

        assert_eq!(result.pages_fetched, 1);
        assert_eq!(result.sections.len(), 1);
    }

    #[tokio::test]
    async fn test_max_pages_is_an_error() {
        let server = wiremock::MockServer::start().await;

        for n in 1..=3 {
            wiremock::Mock::given(wiremock::matchers::path(format!("/summer/{n}")))
                .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(page(
                    &[row(30000 + n, "BIO 1010")],
                    Some(&format!("/summer/{}", n + 1)),
                )))
                .mount(&server)
                .await;
        }

        let mut cfg = config();
        cfg.max_pages = 2;
        let crawler = Crawler::new(cfg).unwrap();
        let start = Url::parse(&format!("{}/summer/1", server.uri())).unwrap();
        let err = crawler.crawl_term(&start, &SilentCrawl).await.unwrap_err();

        assert!(err.to_string().contains("exceeded 2 pages"));
    }

    #[tokio::test]
    async fn test_http_error_fails_crawl() {
        let server = wiremock::MockServer::start().await;

        wiremock::Mock::given(wiremock::matchers::path("/spring"))
            .respond_with(wiremock::ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let crawler = Crawler::new(config()).unwrap();
        let start = Url::parse(&format!("{}/spring", server.uri())).unwrap();
        let err = crawler.crawl_term(&start, &SilentCrawl).await.unwrap_err();

        assert!(matches!(err, SchedKitError::Network(_)));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_fetch_term_meta() {
        let server = wiremock::MockServer::start().await;
        let html = r#"<html><body><div></div><div></div><div></div>
            <div><div></div><div><h2>Class Schedule - Main Campus Fall 2021</h2></div></div>
            </body></html>"#;

        wiremock::Mock::given(wiremock::matchers::path("/fall"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(html))
            .mount(&server)
            .await;

        let crawler = Crawler::new(config()).unwrap();
        let url = Url::parse(&format!("{}/fall", server.uri())).unwrap();
        let meta = crawler.fetch_term_meta(&url).await.unwrap();

        assert_eq!(meta.title, vec!["Fall", "2021"]);
    }
}
