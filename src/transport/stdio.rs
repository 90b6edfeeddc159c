// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Newline-delimited JSON-RPC over the process pipes. stdout carries frames
//! only; everything else the process has to say goes to stderr.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::mcp::McpServer;
use crate::rpc::Response;

/// Serves the process pipes until stdin closes or the token is cancelled.
pub async fn serve(server: McpServer, token: CancellationToken) -> io::Result<()> {
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    run_loop(stdin, stdout, server, token).await
}

/// One frame per line in, one frame per line out. Blank lines are skipped and
/// unparseable lines are answered with a parse error instead of ending the
/// session.
async fn run_loop<R, W>(
    reader: R,
    mut writer: W,
    server: McpServer,
    token: CancellationToken,
) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    loop {
        let line = tokio::select! {
            // Cancellation wins over pending input.
            biased;
            _ = token.cancelled() => {
                tracing::debug!("stdio transport stopping");
                return Ok(());
            }
            line = lines.next_line() => line?,
        };

        let Some(line) = line else {
            tracing::debug!("stdin closed");
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<serde_json::Value>(&line) {
            Ok(message) => server.handle_message(message).await,
            Err(err) => {
                tracing::debug!(error = %err, "unparseable stdio frame");
                Some(Response::parse_error())
            }
        };

        if let Some(response) = response {
            let frame = serde_json::to_string(&response).map_err(io::Error::other)?;
            writer.write_all(frame.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
    }
}
