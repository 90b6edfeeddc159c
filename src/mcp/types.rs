// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::rpc::{self, RpcError};

/// Mermaid theme applied by the render engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Default,
    Base,
    Forest,
    Dark,
    Neutral,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Default => "default",
            Theme::Base => "base",
            Theme::Forest => "forest",
            Theme::Dark => "dark",
            Theme::Neutral => "neutral",
        }
    }
}

/// Shape of the payload returned for one tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub enum OutputKind {
    /// Base64-encoded PNG image payload.
    #[default]
    RasterBase64,
    /// SVG markup as plain text.
    MarkupText,
    /// The original Mermaid source echoed back.
    SourceText,
    /// PNG written to disk; the response carries the absolute path.
    SavedFile,
    /// mermaid.ink URL for the SVG rendering of the source.
    HostedSvgUrl,
    /// mermaid.ink URL for the PNG rendering of the source.
    HostedRasterUrl,
}

/// Wire-level arguments of `generate_mermaid_diagram`. The tool's
/// `inputSchema` is generated from this struct; unknown keys are ignored.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GenerateDiagramParams {
    /// Mermaid diagram source to render.
    pub mermaid_code: String,
    /// Mermaid theme. Defaults to `default`.
    #[serde(default)]
    pub theme: Theme,
    /// Background color for the rendered diagram, e.g. `white` or `#F0F0F0`.
    /// Defaults to `white`.
    #[serde(default = "default_background_color")]
    pub background_color: String,
    /// Requested output shape. Defaults to `rasterBase64`.
    #[serde(default)]
    pub output_kind: OutputKind,
}

fn default_background_color() -> String {
    "white".to_owned()
}

/// A validated invocation. Only ever produced by [`normalize`]; downstream
/// code never sees the untyped argument bag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRequest {
    pub mermaid_code: String,
    pub theme: Theme,
    pub background_color: String,
    pub output_kind: OutputKind,
}

/// One content block of a tool-call result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text {
        text: String,
    },
    Image {
        data: String,
        #[serde(rename = "mimeType")]
        mime_type: String,
    },
}

impl ToolContent {
    pub fn text(text: impl Into<String>) -> Self {
        ToolContent::Text { text: text.into() }
    }

    pub fn image(data: impl Into<String>, mime_type: impl Into<String>) -> Self {
        ToolContent::Image { data: data.into(), mime_type: mime_type.into() }
    }
}

/// Failure taxonomy surfaced to callers as structured JSON-RPC errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// Malformed or missing caller input. Never retried.
    InvalidParams(String),
    /// Unknown tool or method name.
    MethodNotFound(String),
    /// The render collaborator rejected the diagram (e.g. syntax error).
    RenderFailed(String),
    /// File I/O failure, missing raster bytes, or other unclassified failure.
    Internal(String),
}

impl ToolError {
    pub fn message(&self) -> &str {
        match self {
            ToolError::InvalidParams(message)
            | ToolError::MethodNotFound(message)
            | ToolError::RenderFailed(message)
            | ToolError::Internal(message) => message,
        }
    }

    fn code(&self) -> i64 {
        match self {
            ToolError::InvalidParams(_) => rpc::INVALID_PARAMS,
            ToolError::MethodNotFound(_) => rpc::METHOD_NOT_FOUND,
            ToolError::RenderFailed(_) => rpc::SERVER_ERROR,
            ToolError::Internal(_) => rpc::INTERNAL_ERROR,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

impl std::error::Error for ToolError {}

impl From<ToolError> for RpcError {
    fn from(err: ToolError) -> Self {
        let code = err.code();
        let message = match err {
            ToolError::InvalidParams(message)
            | ToolError::MethodNotFound(message)
            | ToolError::RenderFailed(message)
            | ToolError::Internal(message) => message,
        };
        RpcError::new(code, message)
    }
}

/// Applies the recognized-options contract to a raw argument bag.
///
/// Absent arguments are treated as an empty mapping, so the required-field
/// diagnostic comes from the schema rather than a special case. Pure.
pub fn normalize(raw: Option<&Map<String, Value>>) -> Result<ToolRequest, ToolError> {
    let arguments = raw.cloned().unwrap_or_default();
    let params: GenerateDiagramParams = serde_json::from_value(Value::Object(arguments))
        .map_err(|err| ToolError::InvalidParams(err.to_string()))?;

    if params.mermaid_code.trim().is_empty() {
        return Err(ToolError::InvalidParams(
            "mermaidCode must be a non-empty string".to_owned(),
        ));
    }

    Ok(ToolRequest {
        mermaid_code: params.mermaid_code,
        theme: params.theme,
        background_color: params.background_color,
        output_kind: params.output_kind,
    })
}

/// JSON Schema for the tool's arguments, derived from the validator contract.
pub(crate) fn input_schema() -> Value {
    schemars::schema_for!(GenerateDiagramParams).to_value()
}
