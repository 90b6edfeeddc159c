// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Hosted-viewer URL encoding for mermaid.ink.
//!
//! The viewer accepts the diagram state as `pako:<base64url(deflate(json))>`,
//! the same encoding the Mermaid live editor produces. The JSON carries the
//! original source plus the theme/background configuration; the viewer renders
//! it server-side, so no markup or raster bytes travel in the URL.

use std::io::{self, Write as _};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::json;

const HOSTED_VIEWER_BASE: &str = "https://mermaid.ink";

/// Which hosted rendering the URL should point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostedVariant {
    /// `/svg/` path: vector rendering.
    Svg,
    /// `/img/` path: raster rendering.
    Img,
}

impl HostedVariant {
    fn path_segment(self) -> &'static str {
        match self {
            HostedVariant::Svg => "svg",
            HostedVariant::Img => "img",
        }
    }
}

/// Builds the shareable viewer URL for `code`.
///
/// The background color is applied both as the diagram background and as the
/// `themeVariables.background` override, matching what the live editor emits.
pub fn hosted_viewer_url(
    code: &str,
    variant: HostedVariant,
    theme: &str,
    background_color: &str,
) -> io::Result<String> {
    let state = json!({
        "code": code,
        "mermaid": {
            "theme": theme,
            "backgroundColor": background_color,
            "themeVariables": {
                "background": background_color,
            },
        },
    });

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(state.to_string().as_bytes())?;
    let compressed = encoder.finish()?;

    let encoded = {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine as _;
        URL_SAFE_NO_PAD.encode(compressed)
    };

    Ok(format!(
        "{HOSTED_VIEWER_BASE}/{}/pako:{encoded}",
        variant.path_segment()
    ))
}
