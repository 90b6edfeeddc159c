// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Siren — Mermaid diagram MCP server (stdio + SSE + streamable HTTP).
//!
//! One tool, `generate_mermaid_diagram`, served over three interchangeable
//! transport bindings that share a single validator/renderer/dispatcher core.

pub mod ink;
pub mod mcp;
pub mod render;
pub mod rpc;
pub mod shutdown;
pub mod transport;

#[cfg(test)]
mod tests {
    #[test]
    fn sanity() {
        assert_eq!(2 + 2, 4);
    }
}
