//! Integration tests for the crawler
//!
//! These tests use wiremock to serve synthetic listing and detail pages and
//! run the full crawl cycle end-to-end against a temporary database.

use bulletin_harvester::config::Config;
use bulletin_harvester::crawler::{run_crawl, Coordinator};
use bulletin_harvester::state::{CrawlOutcome, StopReason};
use bulletin_harvester::storage::{
    ArticleRecord, NewArticle, RunRecord, RunStatus, SqliteStorage, Storage, StorageError,
    StorageResult,
};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ROOT_PATH: &str = "/notices/list-1.html";

/// Creates a test configuration rooted at the mock server's first listing page
fn create_test_config(server: &MockServer, db_path: &Path) -> Config {
    let root = format!("{}{}", server.uri(), ROOT_PATH);
    let mut config = Config::default_for(&root);
    config.crawler = config.crawler.without_delays();
    config.crawler.request_timeout_secs = 5;
    config.output.database_path = db_path.to_string_lossy().into_owned();
    config
}

/// Builds a listing page; each item is (href, title, date printed in the row)
fn listing_page(items: &[(&str, &str, Option<&str>)], next_href: Option<&str>) -> String {
    let mut rows = String::new();
    for (href, title, date) in items {
        rows.push_str(&format!(
            r#"<tr><td><a href="{}">{}</a></td><td>{}</td></tr>"#,
            href,
            title,
            date.unwrap_or("")
        ));
    }

    let pager = match next_href {
        Some(href) => format!(r#"<a href="list-1.html">首页</a><a href="{}">下一页</a>"#, href),
        None => r#"<a href="list-1.html">首页</a>"#.to_string(),
    };

    format!(
        r#"<html><body>
            <div class="nav"><a href="/index.html">网站首页</a></div>
            <table class="list">{}</table>
            <div class="pager">{}</div>
            <div class="footer"><a href="/about/index.html">关于我们网站介绍页面</a></div>
        </body></html>"#,
        rows, pager
    )
}

fn detail_page(inner: &str) -> String {
    format!(
        r#"<html><head><script>var track = 1;</script></head><body>
            <div class="header">中国人民银行</div>
            {}
        </body></html>"#,
        inner
    )
}

async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .mount(server)
        .await;
}

/// Mounts a page and verifies, when the server drops, how often it was requested
async fn mount_page_times(server: &MockServer, route: &str, body: String, times: u64) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.into_bytes(), "text/html"))
        .expect(times)
        .mount(server)
        .await;
}

fn stored(server: &MockServer, route: &str) -> NewArticle {
    NewArticle {
        title: "已经保存的公告标题".to_string(),
        link: format!("{}{}", server.uri(), route),
        content: "已保存的正文".to_string(),
        publish_date: "2024-01-01".to_string(),
        crawled_at: "2024-01-02 08:00:00".to_string(),
    }
}

fn open_temp_storage(dir: &TempDir) -> SqliteStorage {
    SqliteStorage::new(&dir.path().join("data.db")).expect("Failed to open storage")
}

/// SQLite storage with scripted misbehaviour
///
/// `fail_on_insert` makes the n-th insert call (1-based) fail with a database
/// error. Links in `hidden` are reported as absent by `exists` even when they
/// are stored, so their insert runs into the unique link.
struct ScriptedStorage {
    inner: SqliteStorage,
    inserts: usize,
    fail_on_insert: Option<usize>,
    hidden: Vec<String>,
}

impl ScriptedStorage {
    fn new(inner: SqliteStorage) -> Self {
        Self {
            inner,
            inserts: 0,
            fail_on_insert: None,
            hidden: Vec::new(),
        }
    }
}

impl Storage for ScriptedStorage {
    fn exists(&self, link: &str) -> StorageResult<bool> {
        if self.hidden.iter().any(|hidden| hidden == link) {
            return Ok(false);
        }
        self.inner.exists(link)
    }

    fn insert(&mut self, article: &NewArticle) -> StorageResult<i64> {
        self.inserts += 1;
        if self.fail_on_insert == Some(self.inserts) {
            return Err(StorageError::Database("disk full".to_string()));
        }
        self.inner.insert(article)
    }

    fn count(&self) -> StorageResult<u64> {
        self.inner.count()
    }

    fn list_all(&self) -> StorageResult<Vec<ArticleRecord>> {
        self.inner.list_all()
    }

    fn latest_crawled_at(&self) -> StorageResult<Option<String>> {
        self.inner.latest_crawled_at()
    }

    fn create_run(&mut self) -> StorageResult<i64> {
        self.inner.create_run()
    }

    fn finish_run(&mut self, run_id: i64, outcome: &CrawlOutcome) -> StorageResult<()> {
        self.inner.finish_run(run_id, outcome)
    }

    fn fail_run(&mut self, run_id: i64, message: &str) -> StorageResult<()> {
        self.inner.fail_run(run_id, message)
    }

    fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.inner.get_run(run_id)
    }

    fn last_crawl_time(&self) -> StorageResult<Option<String>> {
        self.inner.last_crawl_time()
    }
}

#[tokio::test]
async fn test_two_page_crawl_then_rerun() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data.db");
    let config = create_test_config(&server, &db_path);

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("/notices/a1/index.html", "关于开展公开市场操作的公告", Some("2024-06-01")),
                ("a2/index.html", "公开市场业务交易公告第二号", None),
            ],
            Some("list-2.html"),
        ),
    )
    .await;
    mount_page(
        &server,
        "/notices/list-2.html",
        listing_page(&[("/notices/a3/index.html", "关于调整存款准备金率的通知", None)], None),
    )
    .await;

    // Each detail page must be fetched exactly once across both runs
    mount_page_times(
        &server,
        "/notices/a1/index.html",
        detail_page(
            r#"<span id="shijian">2024-06-02</span>
               <div id="zoom"><p>第一篇正文。</p></div>"#,
        ),
        1,
    )
    .await;

    // Declared charset is wrong on purpose; the body is UTF-8
    Mock::given(method("GET"))
        .and(path("/notices/a2/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            detail_page(
                r#"<div class="content">
                    <p>第二篇正文。</p>
                    <table>
                        <tr><td>期限</td><td>利率</td></tr>
                        <tr><td>7天</td><td>1.80%</td></tr>
                    </table>
                    <p>中国人民银行</p>
                    <p>2024年5月20日</p>
                </div>"#,
            )
            .into_bytes(),
            "text/html; charset=gbk",
        ))
        .expect(1)
        .mount(&server)
        .await;

    mount_page_times(
        &server,
        "/notices/a3/index.html",
        detail_page(r#"<div id="zoom"><p>第三篇正文，没有日期。</p></div>"#),
        1,
    )
    .await;

    let report = run_crawl(&config).await.expect("crawl failed");
    assert_eq!(report.status, "success");
    assert_eq!(report.new_count, 3);
    assert_eq!(report.total_count, 3);
    assert_eq!(report.pages_visited, 2);
    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert!(report.latest_crawl_time.is_some());

    let storage = open_temp_storage(&dir);
    let articles = storage.list_all().unwrap();
    assert_eq!(articles.len(), 3);
    assert!(articles.iter().all(|a| !a.content.is_empty()));

    let by_link = |route: &str| {
        let link = format!("{}{}", server.uri(), route);
        articles
            .iter()
            .find(|a| a.link == link)
            .unwrap_or_else(|| panic!("{} not stored", link))
            .clone()
    };

    // The listing date wins over the page's own time marker
    let a1 = by_link("/notices/a1/index.html");
    assert_eq!(a1.title, "关于开展公开市场操作的公告");
    assert_eq!(a1.publish_date, "2024-06-01");
    assert_eq!(a1.content, "第一篇正文。");

    let a2 = by_link("/notices/a2/index.html");
    assert_eq!(a2.publish_date, "2024年5月20日");
    assert_eq!(
        a2.content,
        "第二篇正文。\n期限    利率\n7天     1.80%\n中国人民银行\n2024年5月20日"
    );

    let a3 = by_link("/notices/a3/index.html");
    assert_eq!(a3.publish_date, "Unknown");

    // Stamps never go backwards in insertion order
    let mut in_order = articles.clone();
    in_order.sort_by_key(|a| a.id);
    assert!(in_order
        .windows(2)
        .all(|pair| pair[0].crawled_at <= pair[1].crawled_at));

    // Nothing changed upstream: the rerun stores nothing and stops on duplicates
    let rerun = run_crawl(&config).await.expect("rerun failed");
    assert_eq!(rerun.new_count, 0);
    assert_eq!(rerun.total_count, 3);
    assert_eq!(rerun.stop_reason, StopReason::DuplicateThreshold);
}

#[tokio::test]
async fn test_duplicate_threshold_stops_before_fourth_detail() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    let mut storage = open_temp_storage(&dir);
    for route in [
        "/notices/c1/index.html",
        "/notices/c2/index.html",
        "/notices/c3/index.html",
    ] {
        storage.insert(&stored(&server, route)).unwrap();
    }

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("c1/index.html", "第一篇已保存的公告", None),
                ("c2/index.html", "第二篇已保存的公告", None),
                ("c3/index.html", "第三篇已保存的公告", None),
                ("c4/index.html", "第四篇尚未保存的公告", None),
            ],
            Some("list-2.html"),
        ),
    )
    .await;
    mount_page_times(
        &server,
        "/notices/c4/index.html",
        detail_page(r#"<div id="zoom">正文</div>"#),
        0,
    )
    .await;
    mount_page_times(&server, "/notices/list-2.html", listing_page(&[], None), 0).await;

    let mut coordinator = Coordinator::new(config, storage).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.stop_reason, StopReason::DuplicateThreshold);
    assert_eq!(outcome.new_count, 0);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(coordinator.storage().count().unwrap(), 3);
}

#[tokio::test]
async fn test_new_item_resets_duplicate_counter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    let mut storage = open_temp_storage(&dir);
    for route in [
        "/notices/d1/index.html",
        "/notices/d2/index.html",
        "/notices/d3/index.html",
        "/notices/d4/index.html",
    ] {
        storage.insert(&stored(&server, route)).unwrap();
    }

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("d1/index.html", "第一篇已保存的公告", None),
                ("d2/index.html", "第二篇已保存的公告", None),
                ("n1/index.html", "一篇新发布的公告通知", None),
                ("d3/index.html", "第三篇已保存的公告", None),
                ("d4/index.html", "第四篇已保存的公告", None),
            ],
            None,
        ),
    )
    .await;
    mount_page_times(
        &server,
        "/notices/n1/index.html",
        detail_page(r#"<div id="zoom"><p>新公告正文</p><p>2024-07-01</p></div>"#),
        1,
    )
    .await;

    let mut coordinator = Coordinator::new(config, storage).unwrap();
    let outcome = coordinator.run().await;

    // Two duplicates, a new one, then two more: never three in a row
    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.new_count, 1);
    assert_eq!(coordinator.storage().count().unwrap(), 5);
}

#[tokio::test]
async fn test_content_miss_is_skipped() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("m1/index.html", "没有正文区域的公告页面", None),
                ("g1/index.html", "正常的公告页面标题", None),
            ],
            None,
        ),
    )
    .await;
    mount_page(
        &server,
        "/notices/m1/index.html",
        detail_page(r#"<div class="main"><p>不在正文区域</p></div>"#),
    )
    .await;
    mount_page(
        &server,
        "/notices/g1/index.html",
        detail_page(r#"<div id="zoom"><p>正文</p></div>"#),
    )
    .await;

    let mut coordinator = Coordinator::new(config, open_temp_storage(&dir)).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.new_count, 1);
    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);

    let storage = coordinator.into_storage();
    assert!(!storage
        .exists(&format!("{}/notices/m1/index.html", server.uri()))
        .unwrap());
    assert!(storage
        .exists(&format!("{}/notices/g1/index.html", server.uri()))
        .unwrap());
}

#[tokio::test]
async fn test_detail_fetch_failure_skips_article() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("gone/index.html", "已经被删除的公告页面", None),
                ("ok/index.html", "仍然可以访问的公告", None),
            ],
            None,
        ),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/notices/gone/index.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/notices/ok/index.html",
        detail_page(r#"<div id="zoom">正文</div>"#),
    )
    .await;

    let mut coordinator = Coordinator::new(config, open_temp_storage(&dir)).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.new_count, 1);
    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
}

#[tokio::test]
async fn test_hash_next_page_ends_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    mount_page_times(
        &server,
        ROOT_PATH,
        listing_page(&[("e1/index.html", "最后一页上的公告", None)], Some("#")),
        1,
    )
    .await;
    mount_page(
        &server,
        "/notices/e1/index.html",
        detail_page(r#"<div id="zoom">正文</div>"#),
    )
    .await;

    let mut coordinator = Coordinator::new(config, open_temp_storage(&dir)).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 1);
    assert_eq!(outcome.new_count, 1);
}

#[tokio::test]
async fn test_next_page_pointing_to_itself_ends_run() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    mount_page_times(
        &server,
        ROOT_PATH,
        listing_page(&[], Some("list-1.html")),
        1,
    )
    .await;

    let mut coordinator = Coordinator::new(config, open_temp_storage(&dir)).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.stop_reason, StopReason::NoNextPage);
    assert_eq!(outcome.pages_visited, 1);
}

#[tokio::test]
async fn test_listing_fetch_failure_keeps_partial_results() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("data.db");
    let config = create_test_config(&server, &db_path);

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(&[("f1/index.html", "第一页上的一篇公告", None)], Some("list-2.html")),
    )
    .await;
    mount_page(
        &server,
        "/notices/f1/index.html",
        detail_page(r#"<div id="zoom">正文</div>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/notices/list-2.html"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = run_crawl(&config).await.expect("crawl failed");
    assert_eq!(report.stop_reason, StopReason::FetchFailure);
    assert_eq!(report.new_count, 1);
    assert_eq!(report.total_count, 1);
    assert_eq!(report.pages_visited, 1);
}

#[tokio::test]
async fn test_root_fetch_failure() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    Mock::given(method("GET"))
        .and(path(ROOT_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let report = run_crawl(&config).await.expect("crawl failed");
    assert_eq!(report.stop_reason, StopReason::FetchFailure);
    assert_eq!(report.new_count, 0);
    assert_eq!(report.pages_visited, 0);
}

#[tokio::test]
async fn test_page_limit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let mut config = create_test_config(&server, &dir.path().join("data.db"));
    config.crawler.max_pages = 2;

    mount_page_times(&server, ROOT_PATH, listing_page(&[], Some("list-2.html")), 1).await;
    mount_page_times(
        &server,
        "/notices/list-2.html",
        listing_page(&[], Some("list-3.html")),
        1,
    )
    .await;
    mount_page_times(&server, "/notices/list-3.html", listing_page(&[], None), 0).await;

    let mut coordinator = Coordinator::new(config, open_temp_storage(&dir)).unwrap();
    let outcome = coordinator.run().await;

    assert_eq!(outcome.stop_reason, StopReason::PageLimit);
    assert_eq!(outcome.pages_visited, 2);
}

#[tokio::test]
async fn test_unusable_database_path_is_an_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    // A directory cannot be opened as a database file
    let config = create_test_config(&server, dir.path());

    assert!(run_crawl(&config).await.is_err());
}

#[tokio::test]
async fn test_storage_error_mid_run_keeps_partial_results() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("e1/index.html", "第一篇能够保存的公告", None),
                ("e2/index.html", "第二篇保存失败的公告", None),
                ("e3/index.html", "第三篇不再抓取的公告", None),
            ],
            Some("list-2.html"),
        ),
    )
    .await;
    mount_page_times(
        &server,
        "/notices/e1/index.html",
        detail_page(r#"<div id="zoom">第一篇正文</div>"#),
        1,
    )
    .await;
    mount_page_times(
        &server,
        "/notices/e2/index.html",
        detail_page(r#"<div id="zoom">第二篇正文</div>"#),
        1,
    )
    .await;
    mount_page_times(
        &server,
        "/notices/e3/index.html",
        detail_page(r#"<div id="zoom">第三篇正文</div>"#),
        0,
    )
    .await;
    mount_page_times(&server, "/notices/list-2.html", listing_page(&[], None), 0).await;

    let mut storage = ScriptedStorage::new(open_temp_storage(&dir));
    storage.fail_on_insert = Some(2);

    let mut coordinator = Coordinator::new(config, storage).unwrap();
    let report = coordinator.run_recorded().await.expect("run should be reported");

    assert_eq!(report.status, "error");
    assert_eq!(report.stop_reason, StopReason::InternalError);
    assert!(report
        .error_message
        .as_deref()
        .is_some_and(|message| message.contains("disk full")));
    assert_eq!(report.new_count, 1);
    assert_eq!(report.total_count, 1);
    assert_eq!(report.pages_visited, 1);
    // A failed run is not a completed crawl
    assert_eq!(report.latest_crawl_time, None);

    let payload = serde_json::to_value(&report).unwrap();
    assert_eq!(payload["status"], "error");
    assert_eq!(payload["new_count"], 1);
    assert!(payload["message"].as_str().unwrap().contains("disk full"));

    let storage = coordinator.into_storage();
    let stored = storage.list_all().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].link, format!("{}/notices/e1/index.html", server.uri()));

    let run = storage.get_run(1).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run
        .error_message
        .as_deref()
        .is_some_and(|message| message.contains("disk full")));
}

#[tokio::test]
async fn test_duplicate_link_on_insert_is_ignored() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let config = create_test_config(&server, &dir.path().join("data.db"));

    // Stored already, but the existence check misses it
    let mut inner = open_temp_storage(&dir);
    inner.insert(&stored(&server, "/notices/k2/index.html")).unwrap();
    let mut storage = ScriptedStorage::new(inner);
    storage.hidden.push(format!("{}/notices/k2/index.html", server.uri()));

    mount_page(
        &server,
        ROOT_PATH,
        listing_page(
            &[
                ("k1/index.html", "第一篇新发布的公告", None),
                ("k2/index.html", "第二篇其实已经保存", None),
                ("k3/index.html", "第三篇新发布的公告", None),
            ],
            None,
        ),
    )
    .await;
    for route in [
        "/notices/k1/index.html",
        "/notices/k2/index.html",
        "/notices/k3/index.html",
    ] {
        mount_page_times(
            &server,
            route,
            detail_page(r#"<div id="zoom">新的正文</div>"#),
            1,
        )
        .await;
    }

    let mut coordinator = Coordinator::new(config, storage).unwrap();
    let report = coordinator.run_recorded().await.expect("crawl failed");

    assert_eq!(report.status, "success");
    assert_eq!(report.error_message, None);
    assert_eq!(report.stop_reason, StopReason::NoNextPage);
    assert_eq!(report.new_count, 2);
    assert_eq!(report.total_count, 3);

    // The earlier record is left untouched
    let storage = coordinator.into_storage();
    let k2_link = format!("{}/notices/k2/index.html", server.uri());
    let k2 = storage
        .list_all()
        .unwrap()
        .into_iter()
        .find(|a| a.link == k2_link)
        .unwrap();
    assert_eq!(k2.content, "已保存的正文");
}
