// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! HTTP+SSE transport.
//!
//! A GET on the subscribe endpoint opens the event stream and announces the
//! message endpoint for that session; clients POST JSON-RPC frames there and
//! read the answers off the stream.

use std::collections::HashMap;
use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::Router;
use futures::{Stream, StreamExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;

use super::session::SessionRegistry;
use super::ServerFactory;
use crate::shutdown::ShutdownCoordinator;

/// Where clients post their frames, advertised via the `endpoint` event.
const MESSAGE_PATH: &str = "/messages";

#[derive(Clone)]
struct SseState {
    factory: ServerFactory,
    registry: Arc<SessionRegistry>,
}

/// Serves the SSE transport on the listener until shutdown. The subscribe
/// route lives at `endpoint`; the message route is fixed.
pub fn serve(
    listener: TcpListener,
    endpoint: String,
    factory: ServerFactory,
    coordinator: &ShutdownCoordinator,
) -> JoinHandle<io::Result<()>> {
    let registry = SessionRegistry::new();
    let token = CancellationToken::new();

    coordinator.register("sse sessions", {
        let registry = Arc::clone(&registry);
        move || async move {
            registry.clear();
            Ok(())
        }
    });
    coordinator.register("sse listener", {
        let token = token.clone();
        move || async move {
            token.cancel();
            Ok(())
        }
    });

    let app = router(SseState { factory, registry }, &endpoint);

    tokio::spawn(async move {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, endpoint, "sse transport listening"),
            Err(_) => tracing::info!(endpoint, "sse transport listening"),
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
    })
}

fn router(state: SseState, endpoint: &str) -> Router {
    Router::new()
        .route(endpoint, get(subscribe))
        .route(MESSAGE_PATH, post(message))
        .with_state(state)
        .merge(super::base_router())
        .layer(axum::middleware::from_fn(super::cors))
}

/// GET on the subscribe endpoint. Registers a session and opens its event
/// stream; the first event names the message endpoint to post to.
async fn subscribe(
    State(state): State<SseState>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, &'static str)> {
    let server = match (state.factory)() {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(error = %error, "failed to build server for sse connection");
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to establish SSE connection",
            ));
        }
    };

    let (session, rx, guard) = state.registry.create(server);
    tracing::info!(session_id = %session.id(), "sse client connected");

    let endpoint_event = Event::default()
        .event("endpoint")
        .data(format!("{MESSAGE_PATH}?sessionId={}", session.id()));

    let frames = ReceiverStream::new(rx).map(move |payload| {
        // The guard lives in the stream, so the registry entry dies with it
        // on any disconnect path.
        let _ = &guard;
        Ok::<_, Infallible>(Event::default().event("message").data(payload))
    });
    let stream = tokio_stream::once(Ok(endpoint_event)).chain(frames);

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

/// POST on the message endpoint. The frame is handled before the 202 goes
/// out; the response itself travels over the event stream.
async fn message(
    State(state): State<SseState>,
    Query(params): Query<HashMap<String, String>>,
    body: String,
) -> (StatusCode, &'static str) {
    let Some(session_id) = params.get("sessionId") else {
        return (StatusCode::BAD_REQUEST, "Missing sessionId query parameter");
    };
    let Some(session) = state.registry.lookup(session_id) else {
        tracing::debug!(session_id = %session_id, "message for unknown session");
        return (StatusCode::NOT_FOUND, "Session not found");
    };

    let Ok(frame) = serde_json::from_str::<serde_json::Value>(&body) else {
        return (StatusCode::BAD_REQUEST, "Invalid message body");
    };

    if let Some(response) = session.server().handle_message(frame).await {
        let payload = match serde_json::to_string(&response) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::error!(error = %error, "failed to serialize response frame");
                return (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
            }
        };
        if session.push(payload).await.is_err() {
            // Subscriber went away between lookup and push. The post itself
            // still succeeded.
            tracing::debug!(session_id = %session.id(), "dropping response for closed stream");
        }
    }

    (StatusCode::ACCEPTED, "Accepted")
}
