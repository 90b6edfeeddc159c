// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Stateless streamable HTTP transport.
//!
//! Every POST is answered by a fresh server instance. There is no session to
//! resume, so GET and DELETE on the endpoint are refused outright.

use std::io;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response as HttpResponse};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::ServerFactory;
use crate::rpc::{Response, RpcError, INTERNAL_ERROR, SERVER_ERROR};
use crate::shutdown::ShutdownCoordinator;

#[derive(Clone)]
struct StreamableState {
    factory: ServerFactory,
}

/// Serves the streamable HTTP transport on the listener until shutdown.
pub fn serve(
    listener: TcpListener,
    endpoint: String,
    factory: ServerFactory,
    coordinator: &ShutdownCoordinator,
) -> JoinHandle<io::Result<()>> {
    let token = CancellationToken::new();
    coordinator.register("streamable http listener", {
        let token = token.clone();
        move || async move {
            token.cancel();
            Ok(())
        }
    });

    let app = router(StreamableState { factory }, &endpoint);

    tokio::spawn(async move {
        match listener.local_addr() {
            Ok(addr) => tracing::info!(%addr, endpoint, "streamable http transport listening"),
            Err(_) => tracing::info!(endpoint, "streamable http transport listening"),
        }
        axum::serve(listener, app)
            .with_graceful_shutdown(token.cancelled_owned())
            .await
    })
}

fn router(state: StreamableState, endpoint: &str) -> Router {
    Router::new()
        .route(
            endpoint,
            post(message).get(refuse_session_channel).delete(refuse_session_channel),
        )
        .with_state(state)
        .merge(super::base_router())
        .layer(axum::middleware::from_fn(super::cors))
}

/// POST on the MCP endpoint. Requests are answered in the HTTP response
/// body; notifications are acknowledged with 202 and no body.
async fn message(State(state): State<StreamableState>, body: String) -> HttpResponse {
    let server = match (state.factory)() {
        Ok(server) => server,
        Err(error) => {
            tracing::error!(error = %error, "failed to build server for request");
            let body = Response::failure(Value::Null, RpcError::new(INTERNAL_ERROR, "Internal server error"));
            return (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response();
        }
    };

    let Ok(frame) = serde_json::from_str::<Value>(&body) else {
        return (StatusCode::BAD_REQUEST, Json(Response::parse_error())).into_response();
    };

    match server.handle_message(frame).await {
        Some(response) => (StatusCode::OK, Json(response)).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

/// GET and DELETE both land here: the transport is stateless, so there is no
/// standalone event stream to open and no session to terminate.
async fn refuse_session_channel() -> HttpResponse {
    let body = Response::failure(Value::Null, RpcError::new(SERVER_ERROR, "Method not allowed"));
    (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response()
}
