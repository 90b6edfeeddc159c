// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Model Context Protocol (MCP) server surface.
//!
//! The MCP layer validates tool arguments, invokes the render collaborator,
//! and shapes the response for whichever transport carried the request.

mod server;
mod types;

pub use server::{McpServer, ServerContext, PROTOCOL_VERSION, SERVER_NAME, TOOL_NAME};
pub use types::{OutputKind, Theme, ToolContent, ToolError, ToolRequest};
