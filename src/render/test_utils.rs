// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use super::{RenderError, RenderOutcome, Renderer};

/// Canned renderer for tests: returns a fixed outcome (or failure) and counts
/// how many times it was invoked.
pub(crate) struct StubRenderer {
    outcome: Result<RenderOutcome, String>,
    calls: AtomicUsize,
}

impl StubRenderer {
    pub(crate) fn succeeding(markup: &str, raster: Option<Vec<u8>>) -> Arc<Self> {
        Arc::new(Self {
            outcome: Ok(RenderOutcome {
                render_id: "mermaid-test".to_owned(),
                markup: markup.to_owned(),
                raster,
            }),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            outcome: Err(message.to_owned()),
            calls: AtomicUsize::new(0),
        })
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Renderer for StubRenderer {
    async fn render(
        &self,
        _code: &str,
        _theme: &str,
        _background_color: &str,
    ) -> Result<RenderOutcome, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.outcome {
            Ok(outcome) => Ok(outcome.clone()),
            Err(message) => Err(RenderError::Engine { message: message.clone() }),
        }
    }
}
