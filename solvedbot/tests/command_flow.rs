//! End-to-end command flows: router, file store and a solved.ac client
//! talking to a local mock API.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use serde_json::json;
use solvedac::{SolvedAcClient, SolvedAcConfig, UserStats};
use solvedbot::commands::{CommandRouter, render};
use solvedbot::domain::{Handle, Snapshot};
use solvedbot::store::{FileSnapshotStore, SnapshotStore};
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Mock solved.ac: live stats per handle plus a request log.
#[derive(Clone, Default)]
struct MockApi {
    users: Arc<Mutex<HashMap<String, (u64, i64)>>>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockApi {
    fn set(&self, handle: &str, solved_count: u64, rating: i64) {
        self.users
            .lock()
            .unwrap()
            .insert(handle.to_string(), (solved_count, rating));
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

async fn user_show(
    State(api): State<MockApi>,
    Query(params): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let handle = params.get("handle").cloned().unwrap_or_default();
    api.requests.lock().unwrap().push(handle.clone());

    match api.users.lock().unwrap().get(&handle) {
        Some((solved_count, rating)) => (
            StatusCode::OK,
            json!({ "handle": handle, "solvedCount": solved_count, "rating": rating }).to_string(),
        ),
        None => (StatusCode::NOT_FOUND, "Not Found".to_string()),
    }
}

struct Bot {
    api: MockApi,
    dir: TempDir,
    store: Arc<FileSnapshotStore>,
    router: CommandRouter,
}

impl Bot {
    async fn start() -> Self {
        let api = MockApi::default();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new()
            .route("/api/v3/user/show", get(user_show))
            .with_state(api.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let client =
            SolvedAcClient::new(SolvedAcConfig::with_base_url(format!("http://{addr}/api/v3")))
                .unwrap();
        let dir = TempDir::new().unwrap();
        let store = Arc::new(FileSnapshotStore::open(dir.path()).await.unwrap());
        let router = CommandRouter::new(Arc::new(client), store.clone());

        Self {
            api,
            dir,
            store,
            router,
        }
    }

    async fn say(&self, content: &str) -> String {
        self.router
            .handle(content)
            .await
            .unwrap_or_else(|| panic!("no reply to {content:?}"))
    }

    fn snapshot_file(&self, handle: &str) -> std::path::PathBuf {
        self.dir.path().join(format!("{handle}_info.json"))
    }
}

fn handle(s: &str) -> Handle {
    Handle::new(s).unwrap()
}

fn read(path: &Path) -> String {
    std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn save_then_load_round_trips_through_the_store() {
    let bot = Bot::start().await;
    let abc = handle("abc");
    let snapshot = Snapshot::new(&abc, UserStats::new(7, 1234));

    bot.store.save(&snapshot).await.unwrap();
    assert!(bot.store.exists(&abc).await.unwrap());
    assert_eq!(bot.store.load(&abc).await.unwrap(), Some(snapshot));
}

#[tokio::test]
async fn registering_twice_leaves_the_file_unchanged() {
    let bot = Bot::start().await;
    bot.api.set("abc", 100, 1500);

    let first = bot.say("!r abc").await;
    assert_eq!(first, render::registered(&handle("abc"), UserStats::new(100, 1500)));
    let before = read(&bot.snapshot_file("abc"));

    bot.api.set("abc", 150, 1700);
    let second = bot.say("!r abc").await;

    assert_eq!(second, render::already_registered(&handle("abc")));
    assert_eq!(read(&bot.snapshot_file("abc")), before);
    assert_eq!(bot.api.request_count(), 1);
}

#[tokio::test]
async fn compare_without_registration_does_not_fetch() {
    let bot = Bot::start().await;
    bot.api.set("abc", 100, 1500);

    let reply = bot.say("!c abc").await;

    assert_eq!(reply, render::not_registered(&handle("abc")));
    assert_eq!(bot.api.request_count(), 0);
}

#[tokio::test]
async fn compare_with_unchanged_stats_reports_zero_deltas() {
    let bot = Bot::start().await;
    bot.api.set("abc", 100, 1500);
    bot.say("!r abc").await;

    let reply = bot.say("!c abc").await;

    assert!(reply.contains("일요일 이후 증가량:\n풀린 문제 수: 0\n"), "{reply}");
    assert!(reply.ends_with("레이팅 증가량: 0, 0.00%"), "{reply}");
}

#[tokio::test]
async fn update_on_empty_store_is_header_only() {
    let bot = Bot::start().await;

    let reply = bot.say("!update").await;

    assert_eq!(reply, format!("{}\n", render::UPDATE_HEADER));
    assert_eq!(bot.api.request_count(), 0);
}

#[tokio::test]
async fn update_with_missing_data_dir_is_header_only() {
    let bot = Bot::start().await;
    std::fs::remove_dir(bot.dir.path()).unwrap();

    let reply = bot.say("!update").await;
    assert_eq!(reply, format!("{}\n", render::UPDATE_HEADER));
}

#[tokio::test]
async fn compare_reports_progress_since_snapshot() {
    let bot = Bot::start().await;
    std::fs::write(
        bot.snapshot_file("abc"),
        r#"{"boj_id": "abc", "solvedCount": 100, "rating": 1500}"#,
    )
    .unwrap();
    bot.api.set("abc", 120, 1600);

    let reply = bot.say("!c abc").await;

    assert_eq!(
        reply,
        "백준 ID abc의 현재 통계입니다:\n\
         총 풀린 문제 수: 120\n\
         현재 레이팅: 1600\n\n\
         일요일 이후 증가량:\n\
         풀린 문제 수: 20\n\
         레이팅 증가량: 100, 6.67%"
    );
}

#[tokio::test]
async fn compare_with_zero_stored_rating_reports_not_available() {
    let bot = Bot::start().await;
    bot.say("!r newbie").await;
    assert_eq!(
        bot.store.load(&handle("newbie")).await.unwrap().unwrap().stats(),
        UserStats::new(0, 0)
    );

    bot.api.set("newbie", 3, 250);
    let reply = bot.say("!c newbie").await;

    assert!(reply.ends_with("레이팅 증가량: 250, N/A"), "{reply}");
}

#[tokio::test]
async fn missing_argument_is_reported() {
    let bot = Bot::start().await;

    for content in ["!n", "!c   "] {
        let reply = bot.say(content).await;
        assert!(reply.starts_with("백준 ID를 입력해 주세요."), "{reply}");
    }
    assert_eq!(bot.api.request_count(), 0);
}

#[tokio::test]
async fn update_refreshes_and_reports_every_handle() {
    let bot = Bot::start().await;
    bot.api.set("alpha", 10, 100);
    bot.api.set("beta", 20, 200);
    bot.say("!r beta").await;
    bot.say("!r alpha").await;

    bot.api.set("alpha", 11, 110);
    bot.api.set("beta", 22, 220);
    let reply = bot.say("!update").await;

    assert_eq!(
        reply,
        format!(
            "{}\nalpha:\n총 풀린 문제 수: 11\n현재 레이팅: 110\n\n\
             beta:\n총 풀린 문제 수: 22\n현재 레이팅: 220\n\n",
            render::UPDATE_HEADER
        )
    );
    assert_eq!(
        read(&bot.snapshot_file("beta")),
        "{\n    \"boj_id\": \"beta\",\n    \"solvedCount\": 22,\n    \"rating\": 220\n}"
    );
}

#[tokio::test]
async fn lookup_of_unknown_handle_reports_zero_stats() {
    let bot = Bot::start().await;

    let reply = bot.say("!n ghost").await;

    assert_eq!(reply, render::lookup(&handle("ghost"), UserStats::default()));
    assert!(!bot.snapshot_file("ghost").exists());
}

#[tokio::test]
async fn concurrent_registrations_fetch_once() {
    let bot = Arc::new(Bot::start().await);
    bot.api.set("abc", 1, 2);

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let bot = bot.clone();
        tasks.push(tokio::spawn(async move { bot.say("!r abc").await }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert_eq!(bot.api.request_count(), 1);
}
