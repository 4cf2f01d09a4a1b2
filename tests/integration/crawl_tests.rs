//! Integration tests for the archiver
//!
//! These tests use wiremock to stand in for the journal site and run the
//! full archive cycle end-to-end: discovery, post fetching, comment feeds,
//! stitching and storage.

use journal_archiver::config::{
    Config, CrawlerConfig, JournalConfig, OutputConfig, SiteConfig, UserAgentConfig,
};
use journal_archiver::crawler::{
    discover_first_post, fetch_profile, fetch_url, CrawlDriver, CrawlOptions,
};
use journal_archiver::output::load_statistics;
use journal_archiver::storage::{
    ArchiveStorage, JsonDirectoryStorage, RunStatus, SqliteStorage, ARCHIVE_FILE_NAME,
};
use journal_archiver::{
    ArchiveError, CrawlStage, CrawlState, Credentials, JournalArchive, JournalType, Privacy,
    Session,
};
use serde_json::json;
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const JOURNAL: &str = "test";
const FEED_PATH: &str = "/test/__rpc_get_thread";

/// Creates a test configuration pointing every site URL at the mock server
fn create_test_config(base_url: &str, output_dir: &str) -> Config {
    Config {
        journal: JournalConfig {
            name: JOURNAL.to_string(),
        },
        site: SiteConfig {
            root: format!("{}/", base_url),
            journal_url: format!("{}/", base_url),
            userpic_host: format!("{}/userpic", base_url),
        },
        crawler: CrawlerConfig {
            post_delay: 0,
            request_timeout: 5,
            max_redirects: 3,
            capture_source: false,
        },
        user_agent: UserAgentConfig {
            crawler_name: "TestArchiver".to_string(),
            crawler_version: "1.0.0".to_string(),
            contact_url: "https://example.com/contact".to_string(),
            contact_email: "test@example.com".to_string(),
        },
        output: OutputConfig {
            directory: output_dir.to_string(),
            database_path: None,
        },
    }
}

fn options() -> CrawlOptions {
    CrawlOptions {
        post_delay: Duration::ZERO,
        capture_source: false,
    }
}

fn post_page(base_url: &str, id: u32, next: Option<u32>) -> String {
    let next_link = next
        .map(|n| format!(r#"<a class="b-controls-next" href="{}/{}.html">Next</a>"#, base_url, n))
        .unwrap_or_default();
    format!(
        r#"<html><body>
        <img src="{base}/userpic/1/2">
        <span class="ljuser" data-ljuser="{journal}"></span>
        <time>2016-0{id}-01 12:00:00</time>
        <h1 class="b-singlepost-title">Entry {id}</h1>
        <div class="b-singlepost-bodywrapper"><p>Text of entry {id}</p></div>
        {next}
        </body></html>"#,
        base = base_url,
        journal = JOURNAL,
        id = id,
        next = next_link
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_feed(
    server: &MockServer,
    post_id: &str,
    flat: &str,
    page: &str,
    body: serde_json::Value,
) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("itemid", post_id))
        .and(query_param("flat", flat))
        .and(query_param("page", page))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Answers every feed request not mounted before with an empty listing
async fn mount_empty_feeds(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "replycount": 0, "comments": [] })),
        )
        .mount(server)
        .await;
}

/// Mounts profile, calendar and a three post chain; post 2 has three comments
async fn mount_journal(server: &MockServer) {
    let base_url = server.uri();

    mount_page(
        server,
        "/userinfo.bml",
        r#"<html><img class="i-ljuser-userhead" src="/img/userinfo.gif">
        <div class="l-profile"> Old computers and older jokes </div></html>"#
            .to_string(),
    )
    .await;

    mount_page(
        server,
        "/calendar",
        format!(
            r#"<html><a href="{b}/2017/">2017</a><a href="{b}/2016/">2016</a>
            <a href="{b}/2015/">2015</a><a href="{b}/profile">profile</a></html>"#,
            b = base_url
        ),
    )
    .await;

    mount_page(
        server,
        "/2015/",
        format!(
            r#"<html><a href="{b}/calendar">back</a><a href="{b}/1.html">first</a>
            <a href="{b}/2.html">second</a></html>"#,
            b = base_url
        ),
    )
    .await;

    mount_page(server, "/1.html", post_page(&base_url, 1, Some(2))).await;
    mount_page(server, "/2.html", post_page(&base_url, 2, Some(3))).await;
    mount_page(server, "/3.html", post_page(&base_url, 3, None)).await;

    mount_feed(
        server,
        "2",
        "1",
        "1",
        json!({ "replycount": 3, "comments": [
            { "dtalkid": 101, "poster": "alice", "userpic": "", "ctime_ts": 1483228800, "article": "Nice" },
            { "dtalkid": 102, "poster": "test", "userpic": "", "ctime_ts": 1483232400, "article": "Thanks" }
        ]}),
    )
    .await;
    mount_feed(
        server,
        "2",
        "1",
        "2",
        json!({ "replycount": 3, "comments": [
            { "dtalkid": 103, "poster": "bob", "ctime_ts": 1483236000, "article": "Late" }
        ]}),
    )
    .await;
    mount_feed(
        server,
        "2",
        "0",
        "1",
        json!({ "replycount": 3, "comments": [
            { "dtalkid": 101, "above": 0, "below": 102, "parent": 0 },
            { "dtalkid": 102, "above": 101, "below": 103, "parent": 101 },
            { "dtalkid": 103, "above": 102, "below": 0, "parent": 0 }
        ]}),
    )
    .await;
}

#[tokio::test]
async fn test_full_archive_of_post_chain() {
    let mock_server = MockServer::start().await;
    mount_journal(&mock_server).await;
    mount_empty_feeds(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path().to_str().unwrap());
    let session = Session::anonymous(&config).unwrap();
    let urls = session.urls().clone();

    let profile = fetch_profile(&session, &urls).await.unwrap();
    assert_eq!(profile.journal_type, JournalType::Journal);
    assert_eq!(profile.profile.as_deref(), Some("Old computers and older jokes"));

    let first_post = discover_first_post(&session, &urls).await.unwrap();
    assert_eq!(first_post, format!("{}/1.html", mock_server.uri()));

    let mut archive = JournalArchive::new(session.operator(), JOURNAL, profile.journal_type);
    archive.profile = profile.profile;

    let json = JsonDirectoryStorage::new(dir.path(), JOURNAL).unwrap();
    let mut sqlite = SqliteStorage::new(&dir.path().join("archive.db")).unwrap();
    sqlite.create_run(JOURNAL, session.operator(), "hash").unwrap();
    let mut storage = ArchiveStorage::new(json, Some(sqlite));

    let mut driver = CrawlDriver::new(&session, &mut storage, urls, archive, options());
    driver.start(first_post).unwrap();
    driver.run(&CancellationToken::new()).await.unwrap();
    assert_eq!(driver.state(), &CrawlState::Done);
    let archive = driver.finish().unwrap();

    assert_eq!(archive.meta.archived_by, "anonymous");
    let ids: Vec<&str> = archive.posts.iter().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3"]);

    let post = &archive.posts[1];
    assert_eq!(post.author, JOURNAL);
    assert_eq!(post.subject, "Entry 2");
    assert_eq!(post.privacy, Privacy::Public);
    assert_eq!(post.userpic, format!("{}/userpic/1/2", mock_server.uri()));
    assert!(post.content.contains("Text of entry 2"));

    let comment_ids: Vec<i64> = post.comments.iter().map(|c| c.id).collect();
    assert_eq!(comment_ids, vec![101, 102, 103]);
    assert_eq!(post.comments[0].time, "2017-01-01 00:00:00");
    assert_eq!(post.comments[1].parent, 101);
    assert_eq!(post.comments[1].above, 101);
    assert_eq!(post.comments[1].below, 103);
    assert_eq!(post.comments[2].author, "bob");

    // Every post is on disk, plus the complete archive
    let journal_dir = dir.path().join(JOURNAL);
    for id in &ids {
        assert!(journal_dir.join(format!("{}.json", id)).exists());
    }
    let complete = std::fs::read_to_string(journal_dir.join(ARCHIVE_FILE_NAME)).unwrap();
    let reloaded: JournalArchive = serde_json::from_str(&complete).unwrap();
    assert_eq!(reloaded, archive);

    let stats = load_statistics(storage.sqlite().unwrap()).unwrap();
    assert_eq!(stats.status, Some(RunStatus::Completed));
    assert_eq!(stats.total_posts, 3);
    assert_eq!(stats.total_comments, 3);
    assert_eq!(stats.distinct_commenters, 3);
}

#[tokio::test]
async fn test_thread_mismatch_aborts_archive() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/1.html", post_page(&base_url, 1, Some(2))).await;
    mount_page(&mock_server, "/2.html", post_page(&base_url, 2, None)).await;
    mount_feed(
        &mock_server,
        "2",
        "1",
        "1",
        json!({ "replycount": 1, "comments": [{ "dtalkid": 7, "poster": "a", "article": "hi" }] }),
    )
    .await;
    mount_feed(
        &mock_server,
        "2",
        "0",
        "1",
        json!({ "replycount": 1, "comments": [{ "dtalkid": 8, "above": 0, "below": 0, "parent": 0 }] }),
    )
    .await;
    mount_empty_feeds(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path().to_str().unwrap());
    let session = Session::anonymous(&config).unwrap();

    let json = JsonDirectoryStorage::new(dir.path(), JOURNAL).unwrap();
    let mut sqlite = SqliteStorage::new(&dir.path().join("archive.db")).unwrap();
    let run_id = sqlite.create_run(JOURNAL, "anonymous", "hash").unwrap();
    let mut storage = ArchiveStorage::new(json, Some(sqlite));

    let archive = JournalArchive::new("anonymous", JOURNAL, JournalType::Journal);
    let mut driver =
        CrawlDriver::new(&session, &mut storage, session.urls().clone(), archive, options());
    driver.start(format!("{}/1.html", base_url)).unwrap();

    let error = driver.run(&CancellationToken::new()).await.unwrap_err();
    match &error {
        ArchiveError::Stage { stage, url, source } => {
            assert_eq!(*stage, CrawlStage::Stitch);
            assert_eq!(url, &format!("{}/2.html", base_url));
            assert!(matches!(
                **source,
                ArchiveError::ThreadMismatch { comment_id: 7, .. }
            ));
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!driver.state().is_done());
    drop(driver);

    let journal_dir = dir.path().join(JOURNAL);
    assert!(journal_dir.join("1.json").exists());
    assert!(!journal_dir.join("2.json").exists());
    assert!(!journal_dir.join(ARCHIVE_FILE_NAME).exists());

    let run = storage.sqlite().unwrap().get_run(run_id).unwrap();
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.failure.unwrap_or_default().contains("stitch"));
}

#[tokio::test]
async fn test_redirected_post_keeps_requested_url() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    // Final page, served only once the adult content check has been passed
    Mock::given(method("GET"))
        .and(path("/200.html"))
        .and(query_param("skip", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(post_page(&base_url, 2, None)))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/200.html"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", "/misc/adult_check"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/misc/adult_check"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/200.html?skip=1"))
        .mount(&mock_server)
        .await;
    mount_empty_feeds(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path().to_str().unwrap());
    let session = Session::anonymous(&config).unwrap();

    let requested = format!("{}/200.html", base_url);
    let page = fetch_url(&session, &requested).await.unwrap();
    assert_eq!(
        page.history,
        vec![requested.clone(), format!("{}/misc/adult_check", base_url)]
    );
    assert_eq!(page.final_url, format!("{}/200.html?skip=1", base_url));

    let json = JsonDirectoryStorage::new(dir.path(), JOURNAL).unwrap();
    let mut storage = ArchiveStorage::new(json, None);
    let archive = JournalArchive::new("anonymous", JOURNAL, JournalType::Journal);
    let mut driver =
        CrawlDriver::new(&session, &mut storage, session.urls().clone(), archive, options());
    driver.start(requested.clone()).unwrap();
    driver.run(&CancellationToken::new()).await.unwrap();

    let archive = driver.finish().unwrap();
    assert_eq!(archive.posts[0].id, "200");
    assert_eq!(archive.posts[0].url, requested);
}

#[tokio::test]
async fn test_redirect_loop_is_fatal() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/a.html"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/b.html"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b.html"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a.html"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused");
    let session = Session::anonymous(&config).unwrap();

    let result = fetch_url(&session, &format!("{}/a.html", mock_server.uri())).await;
    assert!(matches!(result, Err(ArchiveError::RedirectLoop { .. })));
}

#[tokio::test]
async fn test_redirect_limit_is_fatal() {
    let mock_server = MockServer::start().await;

    for hop in 0..5 {
        let next = format!("/hop{}", hop + 1);
        Mock::given(method("GET"))
            .and(path(format!("/hop{}", hop)))
            .respond_with(ResponseTemplate::new(301).insert_header("location", next.as_str()))
            .mount(&mock_server)
            .await;
    }

    let config = create_test_config(&mock_server.uri(), "unused");
    let session = Session::anonymous(&config).unwrap();

    let result = fetch_url(&session, &format!("{}/hop0", mock_server.uri())).await;
    assert!(matches!(result, Err(ArchiveError::RedirectLimit { .. })));
}

#[tokio::test]
async fn test_missing_post_is_fetch_failure() {
    let mock_server = MockServer::start().await;
    mount_empty_feeds(&mock_server).await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&mock_server.uri(), dir.path().to_str().unwrap());
    let session = Session::anonymous(&config).unwrap();

    let json = JsonDirectoryStorage::new(dir.path(), JOURNAL).unwrap();
    let mut storage = ArchiveStorage::new(json, None);
    let archive = JournalArchive::new("anonymous", JOURNAL, JournalType::Journal);
    let mut driver =
        CrawlDriver::new(&session, &mut storage, session.urls().clone(), archive, options());
    driver.start(format!("{}/404.html", mock_server.uri())).unwrap();

    let state = driver.step().await.unwrap().clone();
    match state {
        CrawlState::Failed { stage, reason, .. } => {
            assert_eq!(stage, CrawlStage::Fetch);
            assert!(reason.contains("404"));
        }
        other => panic!("unexpected state {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_feed_is_comment_collect_failure() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(&mock_server, "/1.html", post_page(&base_url, 1, None)).await;
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let config = create_test_config(&base_url, dir.path().to_str().unwrap());
    let session = Session::anonymous(&config).unwrap();

    let json = JsonDirectoryStorage::new(dir.path(), JOURNAL).unwrap();
    let mut storage = ArchiveStorage::new(json, None);
    let archive = JournalArchive::new("anonymous", JOURNAL, JournalType::Journal);
    let mut driver =
        CrawlDriver::new(&session, &mut storage, session.urls().clone(), archive, options());
    driver.start(format!("{}/1.html", base_url)).unwrap();

    let error = driver.run(&CancellationToken::new()).await.unwrap_err();
    match error {
        ArchiveError::Stage { stage, source, .. } => {
            assert_eq!(stage, CrawlStage::CommentCollect);
            assert!(matches!(*source, ArchiveError::FeedDecode { .. }));
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/1.html"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("late")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), "unused");
    config.crawler.request_timeout = 1;
    let session = Session::anonymous(&config).unwrap();

    let result = fetch_url(&session, &format!("{}/1.html", mock_server.uri())).await;
    assert!(matches!(result, Err(ArchiveError::Timeout { .. })));
}

#[tokio::test]
async fn test_login_sets_operator() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.bml"))
        .and(body_string_contains("user=tester"))
        .and(body_string_contains("password=secret"))
        .respond_with(
            ResponseTemplate::new(302)
                .insert_header("location", "/")
                .insert_header("set-cookie", "ljsession=abc; Path=/"),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused");
    let session = Session::login(&config, &Credentials::new("tester", "secret"))
        .await
        .unwrap();

    assert!(session.is_logged_in());
    assert_eq!(session.operator(), "tester");
}

#[tokio::test]
async fn test_rejected_login() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/login.bml"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), "unused");
    let result = Session::login(&config, &Credentials::new("tester", "wrong")).await;

    assert!(matches!(
        result,
        Err(ArchiveError::Login { status: 403, .. })
    ));
}
