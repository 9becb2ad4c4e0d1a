//! # Read-only status and log-tail API.
//!
//! Two endpoints over the registry:
//!
//! - `GET /servers` lists every instance with its name, version, running
//!   flag, and stream path.
//! - `GET /stream?server=<name>` replays the instance's buffered console
//!   lines and then tails live output for as long as the client stays
//!   connected.
//!
//! No authentication and no mutation; starting and stopping servers is the
//! registry's business.

use std::convert::Infallible;

use axum::body::{Body, Bytes};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::command::LINE_ENDING;
use crate::events::{Event, EventKind};
use crate::registry::Registry;

/// One row of the `/servers` listing.
#[derive(Debug, Serialize)]
pub struct ServerStatus {
    pub name: String,
    pub version: String,
    pub running: bool,
    pub stream: String,
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    server: String,
}

/// Builds the API router over the given registry.
pub fn router(registry: Registry) -> Router {
    Router::new()
        .route("/servers", get(list_servers))
        .route("/stream", get(stream_server))
        .with_state(registry)
}

async fn list_servers(State(registry): State<Registry>) -> Json<Vec<ServerStatus>> {
    let mut statuses = Vec::new();
    for sup in registry.list().await {
        statuses.push(ServerStatus {
            name: sup.name().to_string(),
            version: sup.version().to_string(),
            running: sup.is_running().await,
            stream: format!("/stream?server={}", sup.name()),
        });
    }
    Json(statuses)
}

async fn stream_server(
    State(registry): State<Registry>,
    Query(query): Query<StreamQuery>,
) -> Response {
    let Some(sup) = registry.get(&query.server).await else {
        return (StatusCode::NOT_FOUND, "undefined server").into_response();
    };

    // Subscribe before snapshotting: lines are buffered before they are
    // published, so everything missing from the snapshot is still in the
    // receiver, and the seq comparison drops the overlap.
    let rx = sup.subscribe();
    let replay = sup.buffered_lines().await;
    let last_seq = replay.last().map(|(seq, _)| *seq).unwrap_or(0);

    let mut head = String::new();
    for (_, line) in &replay {
        head.push_str(line);
        head.push_str(LINE_ENDING);
    }

    let tail = futures::stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(Event {
                    seq,
                    kind: EventKind::Line { line, .. },
                    ..
                }) if seq > last_seq => {
                    let chunk = Bytes::from(format!("{line}{LINE_ENDING}"));
                    return Some((Ok::<_, Infallible>(chunk), rx));
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });

    let body = Body::from_stream(
        futures::stream::iter([Ok::<_, Infallible>(Bytes::from(head))]).chain(tail),
    );
    (
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_with_stream_path() {
        let status = ServerStatus {
            name: "lobby".to_string(),
            version: "1.10.2".to_string(),
            running: true,
            stream: "/stream?server=lobby".to_string(),
        };
        let json = serde_json::to_string(&status).expect("serializable");
        assert_eq!(
            json,
            r#"{"name":"lobby","version":"1.10.2","running":true,"stream":"/stream?server=lobby"}"#
        );
    }

    #[tokio::test]
    async fn router_builds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = crate::registry::Registry::load(dir.path().join("manager.json"))
            .await
            .expect("empty registry");
        let _router = router(registry);
    }
}
