// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Siren CLI entrypoint.
//!
//! Runs the Mermaid MCP server over one of three transports. The default is
//! stdio (intended for tool integrations); `--transport sse` and
//! `--transport streamable` expose the same server over HTTP.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use siren::mcp::{McpServer, ServerContext};
use siren::render::MmdcRenderer;
use siren::shutdown::ShutdownCoordinator;
use siren::transport::{self, ServerFactory};

const DEFAULT_PORT: u16 = 3033;
const DEFAULT_HOST: &str = "127.0.0.1";

/// How long a finished shutdown waits for the transport task to drain.
const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--transport {{stdio|sse|streamable}}] [--port <port>] [--host <host>] [--endpoint <path>]\n\nOptions:\n  -t, --transport   Transport to serve on: stdio (default), sse, or streamable.\n  -p, --port        Port for the HTTP transports (default {DEFAULT_PORT}).\n  -H, --host        Host for the HTTP transports (default {DEFAULT_HOST}).\n  -e, --endpoint    HTTP endpoint path (default /sse for sse, /mcp for streamable).\n  -h, --help        Print this help and exit.\n\nThe HTTP transports additionally serve GET /health and GET /ping; those\npaths cannot be used as the endpoint."
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Stdio,
    Sse,
    Streamable,
}

impl Transport {
    fn parse(raw: &str) -> Result<Self, ()> {
        match raw.to_ascii_lowercase().as_str() {
            "stdio" => Ok(Self::Stdio),
            "sse" => Ok(Self::Sse),
            "streamable" => Ok(Self::Streamable),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum CliAction {
    Run(CliOptions),
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    transport: Transport,
    host: String,
    port: u16,
    endpoint: Option<String>,
}

impl Default for CliOptions {
    fn default() -> Self {
        Self {
            transport: Transport::Stdio,
            host: DEFAULT_HOST.to_owned(),
            port: DEFAULT_PORT,
            endpoint: None,
        }
    }
}

fn parse_options(mut args: impl Iterator<Item = String>) -> Result<CliAction, ()> {
    let mut transport = None;
    let mut host = None;
    let mut port = None;
    let mut endpoint = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-t" | "--transport" => {
                if transport.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                transport = Some(Transport::parse(&raw)?);
            }
            "-p" | "--port" => {
                if port.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                port = Some(raw.parse::<u16>().map_err(|_| ())?);
            }
            "-H" | "--host" => {
                if host.is_some() {
                    return Err(());
                }
                host = Some(args.next().ok_or(())?);
            }
            "-e" | "--endpoint" => {
                if endpoint.is_some() {
                    return Err(());
                }
                let raw = args.next().ok_or(())?;
                // /health and /ping belong to the base router.
                if !raw.starts_with('/') || raw == "/health" || raw == "/ping" {
                    return Err(());
                }
                endpoint = Some(raw);
            }
            _ => return Err(()),
        }
    }

    let defaults = CliOptions::default();
    Ok(CliAction::Run(CliOptions {
        transport: transport.unwrap_or(defaults.transport),
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        endpoint,
    }))
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "siren=info".into()),
        )
        // stdout is reserved for the stdio transport's frames.
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(options: CliOptions) -> Result<(), Box<dyn Error>> {
    let renderer = Arc::new(MmdcRenderer::new());
    let coordinator = ShutdownCoordinator::new();

    let factory: ServerFactory = Arc::new(move || {
        let ctx = ServerContext::new(renderer.clone())?;
        Ok(McpServer::new(Arc::new(ctx)))
    });

    let mut served = match options.transport {
        Transport::Stdio => {
            let server = factory()?;
            let token = CancellationToken::new();
            coordinator.register("stdio transport", {
                let token = token.clone();
                move || async move {
                    token.cancel();
                    Ok(())
                }
            });
            tracing::info!("stdio transport ready");
            tokio::spawn(transport::stdio::serve(server, token))
        }
        Transport::Sse => {
            let endpoint = options.endpoint.unwrap_or_else(|| "/sse".to_owned());
            let listener = transport::bind(&options.host, options.port).await?;
            transport::sse::serve(listener, endpoint, factory, &coordinator)
        }
        Transport::Streamable => {
            let endpoint = options.endpoint.unwrap_or_else(|| "/mcp".to_owned());
            let listener = transport::bind(&options.host, options.port).await?;
            transport::streamable::serve(listener, endpoint, factory, &coordinator)
        }
    };

    tokio::select! {
        result = &mut served => {
            // The transport ended on its own (stdin closed, listener error).
            coordinator.shutdown().await;
            result??;
        }
        result = coordinator.run() => {
            result?;
            let _ = tokio::time::timeout(DRAIN_TIMEOUT, &mut served).await;
        }
    }

    Ok(())
}

fn main() {
    let result = (|| -> Result<(), Box<dyn Error>> {
        let mut args = std::env::args();
        let program = args.next().unwrap_or_else(|| "siren".to_owned());

        let options = match parse_options(args) {
            Ok(CliAction::Run(options)) => options,
            Ok(CliAction::Help) => {
                print_usage(&program);
                return Ok(());
            }
            Err(()) => {
                print_usage(&program);
                std::process::exit(2);
            }
        };

        init_tracing();

        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        runtime.block_on(run(options))
    })();

    // Startup and serve errors are reported, not rethrown; usage errors above
    // are the only nonzero exits.
    if let Err(err) = result {
        tracing::error!(error = %err, "siren failed");
    }
}
