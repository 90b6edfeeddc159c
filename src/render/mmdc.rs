// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Production renderer shelling out to the Mermaid CLI (`mmdc`).
//!
//! Each call stages the diagram source in a scratch directory under the system
//! temp dir, runs one SVG pass and one best-effort PNG pass, and cleans the
//! directory up afterwards. A failed PNG pass yields an outcome without raster
//! bytes rather than an error; output kinds that require raster bytes surface
//! that downstream.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use uuid::Uuid;

use super::{RenderError, RenderOutcome, Renderer};

pub struct MmdcRenderer {
    command: PathBuf,
}

impl MmdcRenderer {
    pub fn new() -> Self {
        Self::with_command("mmdc")
    }

    /// Uses `command` instead of `mmdc` from `PATH`.
    pub fn with_command(command: impl Into<PathBuf>) -> Self {
        Self { command: command.into() }
    }

    async fn run_pass(
        &self,
        input: &Path,
        output: &Path,
        theme: &str,
        background_color: &str,
    ) -> Result<(), RenderError> {
        let output = Command::new(&self.command)
            .args(cli_args(input, output, theme, background_color))
            .output()
            .await
            .map_err(RenderError::Io)?;

        if output.status.success() {
            Ok(())
        } else {
            Err(RenderError::Engine {
                message: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            })
        }
    }

    async fn render_in(
        &self,
        staging: &Path,
        render_id: &str,
        code: &str,
        theme: &str,
        background_color: &str,
    ) -> Result<RenderOutcome, RenderError> {
        let input = staging.join("diagram.mmd");
        tokio::fs::write(&input, code).await?;

        let svg_path = staging.join("diagram.svg");
        self.run_pass(&input, &svg_path, theme, background_color).await?;
        let markup = tokio::fs::read_to_string(&svg_path).await?;

        let png_path = staging.join("diagram.png");
        let raster = match self.run_pass(&input, &png_path, theme, background_color).await {
            Ok(()) => match tokio::fs::read(&png_path).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    tracing::debug!(error = %err, "png read failed, continuing without raster");
                    None
                }
            },
            Err(err) => {
                tracing::debug!(error = %err, "png pass failed, continuing without raster");
                None
            }
        };

        Ok(RenderOutcome {
            render_id: render_id.to_owned(),
            markup,
            raster,
        })
    }
}

impl Default for MmdcRenderer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Renderer for MmdcRenderer {
    async fn render(
        &self,
        code: &str,
        theme: &str,
        background_color: &str,
    ) -> Result<RenderOutcome, RenderError> {
        let run_id = Uuid::new_v4();
        let render_id = format!("mermaid-{run_id}");
        let staging = std::env::temp_dir().join(format!("siren-{run_id}"));
        tokio::fs::create_dir_all(&staging).await?;

        let outcome = self
            .render_in(&staging, &render_id, code, theme, background_color)
            .await;

        // Scratch files are gone on success and on failure alike.
        if let Err(err) = tokio::fs::remove_dir_all(&staging).await {
            tracing::debug!(error = %err, "staging cleanup failed");
        }

        outcome
    }
}

fn cli_args(input: &Path, output: &Path, theme: &str, background_color: &str) -> Vec<OsString> {
    vec![
        OsString::from("--input"),
        input.as_os_str().to_owned(),
        OsString::from("--output"),
        output.as_os_str().to_owned(),
        OsString::from("--theme"),
        OsString::from(theme),
        OsString::from("--backgroundColor"),
        OsString::from(background_color),
        OsString::from("--quiet"),
    ]
}
