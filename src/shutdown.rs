// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Siren-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Siren and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Coordinated teardown for the serving transports.
//!
//! Transports register cleanup actions while the process is idle; the first
//! SIGINT or SIGTERM runs them all concurrently, each under its own timeout.
//! A second signal during cleanup exits immediately.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::future::join_all;

pub type CleanupError = Box<dyn std::error::Error + Send + Sync>;
type CleanupFuture = Pin<Box<dyn Future<Output = Result<(), CleanupError>> + Send>>;

/// Each cleanup action gets this long.
const CLEANUP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    ShuttingDown,
    Exited,
}

struct Registered {
    label: &'static str,
    run: Box<dyn FnOnce() -> CleanupFuture + Send>,
}

struct Inner {
    phase: Phase,
    actions: Vec<Registered>,
}

pub struct ShutdownCoordinator {
    inner: Arc<Mutex<Inner>>,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                phase: Phase::Idle,
                actions: Vec::new(),
            })),
        }
    }

    /// Registers a named cleanup action. Dropped once shutdown has begun.
    pub fn register<F, Fut>(&self, label: &'static str, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), CleanupError>> + Send + 'static,
    {
        let mut inner = self.lock();
        if inner.phase != Phase::Idle {
            tracing::warn!(label, "cleanup registered after shutdown began, dropping it");
            return;
        }
        inner.actions.push(Registered {
            label,
            run: Box::new(move || Box::pin(action())),
        });
    }

    /// Runs every registered action concurrently, each bounded by its own
    /// timeout. Later calls return immediately.
    pub async fn shutdown(&self) {
        let actions = {
            let mut inner = self.lock();
            if inner.phase != Phase::Idle {
                return;
            }
            inner.phase = Phase::ShuttingDown;
            std::mem::take(&mut inner.actions)
        };

        if !actions.is_empty() {
            tracing::info!(actions = actions.len(), "running shutdown cleanup");
            let cleanups = actions.into_iter().map(|Registered { label, run }| async move {
                match tokio::time::timeout(CLEANUP_TIMEOUT, run()).await {
                    Ok(Ok(())) => tracing::debug!(label, "cleanup finished"),
                    Ok(Err(error)) => tracing::warn!(label, error = %error, "cleanup failed"),
                    Err(_) => {
                        tracing::warn!(
                            label,
                            timeout_secs = CLEANUP_TIMEOUT.as_secs(),
                            "cleanup timed out"
                        );
                    }
                }
            });

            join_all(cleanups).await;
        }

        self.lock().phase = Phase::Exited;
        tracing::info!("shutdown complete");
    }

    /// Waits for SIGINT or SIGTERM, then runs the cleanup actions. A second
    /// signal while cleanup is under way exits the process with status 1.
    pub async fn run(&self) -> io::Result<()> {
        let signal = wait_for_signal().await?;
        tracing::info!(signal, "shutdown signal received");

        tokio::spawn(async {
            if wait_for_signal().await.is_ok() {
                tracing::warn!("second shutdown signal, exiting immediately");
                std::process::exit(1);
            }
        });

        self.shutdown().await;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().expect("shutdown coordinator lock poisoned")
    }
}

#[cfg(unix)]
async fn wait_for_signal() -> io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    tokio::select! {
        result = tokio::signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> io::Result<&'static str> {
    tokio::signal::ctrl_c().await.map(|()| "SIGINT")
}
