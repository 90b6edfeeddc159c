// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::ink::{self, HostedVariant};
use crate::render::Renderer;
use crate::rpc::{Request, Response, RpcError};

use super::types::*;

pub const SERVER_NAME: &str = "siren";
pub const TOOL_NAME: &str = "generate_mermaid_diagram";

/// Latest protocol revision this server speaks. `initialize` echoes the
/// client's revision when it is one of [`SUPPORTED_PROTOCOL_VERSIONS`].
pub const PROTOCOL_VERSION: &str = "2025-03-26";
const SUPPORTED_PROTOCOL_VERSIONS: &[&str] = &["2025-03-26", "2024-11-05"];

const TOOL_DESCRIPTION: &str =
    "Render a Mermaid diagram and return it as a PNG image, SVG markup, a saved \
     file, or a shareable mermaid.ink link.";

/// Dependencies shared by every invocation: the reusable render-engine handle
/// and the directory `savedFile` outputs land in. Constructed once by the
/// entry point and threaded into each transport binding.
pub struct ServerContext {
    renderer: Arc<dyn Renderer>,
    output_dir: PathBuf,
}

impl ServerContext {
    /// Saved files go to the process working directory.
    pub fn new(renderer: Arc<dyn Renderer>) -> io::Result<Self> {
        let output_dir = std::env::current_dir()?;
        Ok(Self { renderer, output_dir })
    }

    pub fn with_output_dir(renderer: Arc<dyn Renderer>, output_dir: PathBuf) -> Self {
        Self { renderer, output_dir }
    }
}

/// One MCP server instance: the shared request handler every transport binds
/// to. Cloning is cheap and shares the context.
#[derive(Clone)]
pub struct McpServer {
    ctx: Arc<ServerContext>,
}

impl McpServer {
    pub fn new(ctx: Arc<ServerContext>) -> Self {
        Self { ctx }
    }

    /// Handles one decoded JSON-RPC message. Returns `None` for notifications
    /// and for frames that cannot be answered (no recoverable id).
    pub async fn handle_message(&self, message: Value) -> Option<Response> {
        let fallback_id = message.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(message) {
            Ok(request) => request,
            Err(err) => {
                tracing::debug!(error = %err, "malformed rpc frame");
                return Some(Response::invalid_request(fallback_id));
            }
        };

        let Some(method) = request.method.clone() else {
            // A frame with an id but no method is answerable; anything else
            // (e.g. a stray client response) is dropped.
            return request.id.map(Response::invalid_request);
        };

        if request.is_notification() {
            self.handle_notification(&method);
            return None;
        }

        let id = request.id.unwrap_or(Value::Null);
        Some(self.handle_request(&method, id, request.params).await)
    }

    async fn handle_request(&self, method: &str, id: Value, params: Option<Value>) -> Response {
        tracing::debug!(method, "handling request");
        match method {
            "initialize" => Response::success(id, self.handle_initialize(params.as_ref())),
            "ping" => Response::success(id, json!({})),
            "tools/list" => Response::success(id, json!({ "tools": [tool_descriptor()] })),
            "tools/call" => match self.handle_tools_call(params).await {
                Ok(result) => Response::success(id, result),
                Err(err) => {
                    tracing::debug!(error = %err, "tool call failed");
                    Response::failure(id, RpcError::from(err))
                }
            },
            other => Response::failure(id, RpcError::method_not_found(other)),
        }
    }

    fn handle_notification(&self, method: &str) {
        match method {
            "notifications/initialized" => tracing::debug!("client initialized"),
            other => tracing::debug!(method = other, "ignoring notification"),
        }
    }

    fn handle_initialize(&self, params: Option<&Value>) -> Value {
        let requested = params
            .and_then(|params| params.get("protocolVersion"))
            .and_then(Value::as_str);
        let negotiated = requested
            .filter(|version| SUPPORTED_PROTOCOL_VERSIONS.contains(version))
            .unwrap_or(PROTOCOL_VERSION);

        json!({
            "protocolVersion": negotiated,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": SERVER_NAME,
                "version": env!("CARGO_PKG_VERSION"),
            },
        })
    }

    async fn handle_tools_call(&self, params: Option<Value>) -> Result<Value, ToolError> {
        let params = params.unwrap_or(Value::Null);
        let name = params.get("name").and_then(Value::as_str).ok_or_else(|| {
            ToolError::InvalidParams("tools/call requires a string `name`".to_owned())
        })?;

        if name != TOOL_NAME {
            return Err(ToolError::MethodNotFound(format!("Unknown tool: {name}")));
        }

        let arguments = params.get("arguments").and_then(Value::as_object);
        let request = normalize(arguments)?;
        let content = produce_response(&self.ctx, &request).await?;
        Ok(json!({ "content": [content] }))
    }
}

pub(crate) fn tool_descriptor() -> Value {
    json!({
        "name": TOOL_NAME,
        "description": TOOL_DESCRIPTION,
        "inputSchema": input_schema(),
    })
}

/// Output dispatcher: runs the render collaborator, then shapes the payload
/// for the requested output kind.
///
/// The render runs for every output kind, `sourceText` included: a malformed
/// diagram fails with the render error even when only the source would be
/// echoed back.
async fn produce_response(
    ctx: &ServerContext,
    request: &ToolRequest,
) -> Result<ToolContent, ToolError> {
    let outcome = ctx
        .renderer
        .render(&request.mermaid_code, request.theme.as_str(), &request.background_color)
        .await
        .map_err(|err| ToolError::RenderFailed(err.message_or("Unknown error")))?;

    match request.output_kind {
        OutputKind::SourceText => Ok(ToolContent::text(request.mermaid_code.clone())),
        OutputKind::MarkupText => Ok(ToolContent::text(outcome.markup)),
        OutputKind::HostedSvgUrl => hosted_url(request, HostedVariant::Svg),
        OutputKind::HostedRasterUrl => hosted_url(request, HostedVariant::Img),
        OutputKind::SavedFile => {
            let Some(raster) = outcome.raster else {
                return Err(ToolError::Internal(
                    "Failed to generate screenshot for file output.".to_owned(),
                ));
            };
            let path = ctx.output_dir.join(timestamped_png_name());
            tokio::fs::write(&path, &raster).await.map_err(|err| {
                ToolError::Internal(format!(
                    "Failed to save file: {}",
                    message_or(&err, "Unknown file error")
                ))
            })?;
            tracing::info!(path = %path.display(), bytes = raster.len(), "diagram saved");
            Ok(ToolContent::text(path.display().to_string()))
        }
        OutputKind::RasterBase64 => {
            let Some(raster) = outcome.raster else {
                return Err(ToolError::Internal("Failed to generate screenshot.".to_owned()));
            };
            let encoded = {
                use base64::engine::general_purpose::STANDARD;
                use base64::Engine as _;
                STANDARD.encode(&raster)
            };
            Ok(ToolContent::image(encoded, "image/png"))
        }
    }
}

fn hosted_url(request: &ToolRequest, variant: HostedVariant) -> Result<ToolContent, ToolError> {
    ink::hosted_viewer_url(
        &request.mermaid_code,
        variant,
        request.theme.as_str(),
        &request.background_color,
    )
    .map(ToolContent::text)
    .map_err(|err| {
        ToolError::Internal(format!(
            "Failed to generate mermaid: {}",
            message_or(&err, "Unknown error.")
        ))
    })
}

// Filename synthesis and error-message fallbacks for the dispatcher.
include!("server/helpers.rs");

#[cfg(test)]
mod e2e;
