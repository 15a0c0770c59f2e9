//! Status endpoint through the engine to the rendered view.

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use islistening_core::config::STATUS_PATH;
use islistening_core::view::render;
use islistening_core::{
    ColorTinter, ControllerConfig, NowPlayingEngine, NowPlayingView, PageConfig, Phase,
    StatusFetcher,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

async fn serve(router: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    Url::parse(&format!("http://{addr}{STATUS_PATH}")).unwrap()
}

fn status_router(is_playing: bool) -> Router {
    Router::new().route(
        STATUS_PATH,
        get(move || async move {
            Json(json!({
                "isPlaying": is_playing,
                "name": "Roygbiv",
                "artist": "Boards of Canada",
                "image": "https://i.scdn.co/image/ab67616d0000b273roygbiv",
                "url": "https://open.spotify.com/track/0ZR7dVUDWULkTKlBYnoqqL",
                "id": "0ZR7dVUDWULkTKlBYnoqqL",
                "duration_ms": 151_000,
                "progress_ms": 30_000,
                "timestamp": Utc::now().timestamp_millis() - 2_000,
            }))
        }),
    )
}

async fn render_after_first_load(url: Url) -> (Phase, NowPlayingView) {
    let fetcher = StatusFetcher::new(url, Duration::from_secs(5)).unwrap();
    let first_load = fetcher.fetch().await;

    let engine = NowPlayingEngine::new(Arc::new(fetcher), ControllerConfig::default(), None);
    engine.seed(first_load).await;

    let snapshot = engine.snapshot().await;
    let view = render(
        &snapshot.view,
        snapshot.status.as_ref(),
        snapshot.progress,
        &ColorTinter::default(),
        &PageConfig::default(),
    );
    (snapshot.phase, view)
}

#[tokio::test]
async fn test_playing_track_renders_progress() {
    let url = serve(status_router(true)).await;
    let (phase, view) = render_after_first_load(url).await;

    assert_eq!(phase, Phase::Counting);
    let NowPlayingView::Track(track) = view else {
        panic!("expected a track, got {view:?}");
    };
    assert!(track.is_live());
    assert_eq!(track.artist, "Boards of Canada");
    let progress = track.progress.unwrap();
    assert_eq!(progress.total, "2:31");
    assert!(progress.percent > 20.0 && progress.percent < 25.0);
}

#[tokio::test]
async fn test_not_playing_track_renders_without_progress() {
    let url = serve(status_router(false)).await;
    let (phase, view) = render_after_first_load(url).await;

    assert_eq!(phase, Phase::Idle);
    let NowPlayingView::Track(track) = view else {
        panic!("expected a track, got {view:?}");
    };
    assert_eq!(track.name, "Roygbiv");
    assert!(!track.is_live());
    assert!(track.progress.is_none());
}

#[tokio::test]
async fn test_endpoint_failure_renders_apology() {
    let url = serve(Router::new().route(
        STATUS_PATH,
        get(|| async { StatusCode::BAD_GATEWAY }),
    ))
    .await;
    let (phase, view) = render_after_first_load(url).await;

    assert_eq!(phase, Phase::Idle);
    let NowPlayingView::Error(error) = view else {
        panic!("expected the apology, got {view:?}");
    };
    assert_eq!(error.title, "Sorry");
    assert_eq!(error.link_url, PageConfig::default().profile_url);
}

#[tokio::test]
async fn test_unreachable_endpoint_renders_apology() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let url = Url::parse(&format!("http://{addr}{STATUS_PATH}")).unwrap();
    let (_, view) = render_after_first_load(url).await;

    assert!(matches!(view, NowPlayingView::Error(_)));
}
