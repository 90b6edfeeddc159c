// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

/// Filename for a saved diagram: `mermaid-<timestamp>-<suffix>.png`, where the
/// timestamp is RFC 3339 UTC with `:` and `.` replaced by `-` so the name is
/// portable across filesystems.
fn timestamped_png_name() -> String {
    use chrono::{SecondsFormat, Utc};

    let timestamp = Utc::now()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-");
    format!("mermaid-{timestamp}-{}.png", random_suffix(6))
}

fn random_suffix(len: usize) -> String {
    use rand::Rng as _;

    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// The error's message, or `fallback` when the message is empty.
fn message_or(err: &dyn std::fmt::Display, fallback: &str) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        fallback.to_owned()
    } else {
        message
    }
}
