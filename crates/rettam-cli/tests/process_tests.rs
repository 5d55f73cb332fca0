//! Processing against a live API served from in-process fakes

use std::sync::Arc;

use rettam_api::{create_router, state::AppState};
use rettam_cli::{commands, ApiClient, GraphFormat};
use rettam_core::config::AppConfig;
use rettam_extractor::testing::FakeCapabilities;
use rettam_store::Session;
use tempfile::TempDir;

async fn spawn_api(fakes: &FakeCapabilities) -> String {
    let state = Arc::new(AppState::new(
        AppConfig::default(),
        Arc::new(fakes.extractor(512)),
    ));
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn test_process_stores_metadata_and_graph() {
    let fakes = FakeCapabilities::new();
    let client = ApiClient::new(spawn_api(&fakes).await);
    let dir = TempDir::new().unwrap();
    let store = dir.path().join("explorations.json");

    let mut session = Session::open(&store);
    session.create_exploration(None).unwrap();

    let mut out = Vec::new();
    commands::process(
        &mut session,
        &client,
        "Exploration 1",
        "Anna met Bob.",
        &mut out,
    )
    .await
    .unwrap();
    assert!(String::from_utf8(out)
        .unwrap()
        .starts_with("Processed Exploration 1: 2 entities"));

    // Reload from disk
    let mut session = Session::open(&store);
    let exploration = session.store().get("Exploration 1").unwrap();
    assert_eq!(exploration.text, "Anna met Bob.");
    let metadata = exploration.metadata.as_ref().unwrap();
    assert!(metadata.human_tags.is_empty());
    assert_eq!(metadata.extraction.sentiment.len(), 1);

    let json = commands::render_graph(&mut session, "Exploration 1", GraphFormat::Json).unwrap();
    let view: serde_json::Value = serde_json::from_str(&json).unwrap();
    let ids: Vec<&str> = view["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert!(ids.contains(&"USERINPUT"));
    assert!(ids.contains(&"Anna"));
    assert!(ids.contains(&"met"));
}

#[tokio::test]
async fn test_rejected_text_leaves_exploration_untouched() {
    let fakes = FakeCapabilities::new();
    let client = ApiClient::new(spawn_api(&fakes).await);
    let dir = TempDir::new().unwrap();

    let mut session = Session::open(dir.path().join("explorations.json"));
    session.create_exploration(Some("blank")).unwrap();

    let mut out = Vec::new();
    let err = commands::process(&mut session, &client, "blank", "   ", &mut out)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("No text provided"));
    assert!(session.current().unwrap().metadata.is_none());
    assert_eq!(fakes.total_calls(), 0);
}
