// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Diagram rendering seam.
//!
//! The server core never talks to a rendering engine directly; it goes through
//! [`Renderer`], and the engine handle is created once and reused across calls.
//! The production implementation shells out to the Mermaid CLI.

use std::fmt;
use std::io;

use async_trait::async_trait;

mod mmdc;
#[cfg(test)]
pub(crate) mod test_utils;

pub use mmdc::MmdcRenderer;

/// Result of one successful render call.
///
/// Owned by the invocation that produced it; never cached. `raster` is absent
/// when the engine could produce markup but no PNG.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOutcome {
    pub render_id: String,
    pub markup: String,
    pub raster: Option<Vec<u8>>,
}

/// Rendering collaborator. Safe for concurrent invocation; implementations
/// must not require exclusive access across calls.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(
        &self,
        code: &str,
        theme: &str,
        background_color: &str,
    ) -> Result<RenderOutcome, RenderError>;
}

#[derive(Debug)]
pub enum RenderError {
    /// The engine rejected the diagram (e.g. a Mermaid syntax error).
    Engine { message: String },
    /// Spawning the engine or staging its input/output failed.
    Io(io::Error),
}

impl RenderError {
    /// Caller-facing message, or `fallback` when the failure carries none.
    pub fn message_or<'a>(&'a self, fallback: &'a str) -> String {
        let message = match self {
            RenderError::Engine { message } => message.clone(),
            RenderError::Io(err) => err.to_string(),
        };
        if message.trim().is_empty() {
            fallback.to_owned()
        } else {
            message
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Engine { message } => write!(f, "render engine failed: {message}"),
            Self::Io(err) => write!(f, "render i/o failed: {err}"),
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Engine { .. } => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<io::Error> for RenderError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}
