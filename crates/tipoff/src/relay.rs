//! 🎬 *[a stream fills with tweets. somewhere, a Firehose waits.]*
//! *[the clock on the wall reads 2:59pm. trade deadline in one minute.]*
//! *[nobody asked for this many hot takes. and yet, here we are.]*
//!
//! 🔄 The relay loop - patient, tireless, and deeply unbothered by the chaos
//! happening upstream. Each turn it checks three things, in this order:
//!
//! 1. 🛑 Did someone ask us to stop? Then stop.
//! 2. 🐦 Is a tweet ready? Then fan it out to every sink. If not, don't wait: yield
//!    once and go around again.
//! 3. 📡 Is the stream still connected? If not, stop.
//!
//! Sink failures are logged and forgotten. One bad PutRecord doesn't get to ruin
//! the trade deadline for everyone else.
//!
//! ⚠️ The loop never sleeps. It polls. It's a busy-poll. Yes, on purpose, and no,
//! we're not adding a sleep behind anyone's back.
//!
//! 📡 A hang-up ends the loop on the very next liveness check. Tweets still sitting
//! in the stream's channel at that moment are dropped, not drained.

use std::future::Future;

use futures::FutureExt;
use tokio::signal;
use tracing::{debug, error, info, warn};

use crate::backends::{MessageStream, Sink, SinkBackend, StreamBackend};
use crate::common::{StreamMessage, encode};

/// 🏁 Why the relay stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayExit {
    /// 🛑 SIGINT / SIGTERM (or whatever shutdown future the caller handed in).
    ShutdownSignal,
    /// 📡 The upstream connection dropped.
    ConnectionLost,
}

/// 🔄 Owns the sinks. Borrows nothing. Fans out everything.
#[derive(Debug)]
pub(crate) struct Relay {
    sinks: Vec<SinkBackend>,
}

impl Relay {
    pub(crate) fn new(sinks: Vec<SinkBackend>) -> Self {
        Self { sinks }
    }

    /// 🚀 Run until `shutdown` resolves or the stream hangs up, then close the stream. Once.
    pub(crate) async fn run<F>(mut self, mut stream: StreamBackend, shutdown: F) -> RelayExit
    where
        F: Future<Output = ()>,
    {
        info!("🔄 Relay started with {} sink(s)", self.sinks.len());
        tokio::pin!(shutdown);

        let exit = loop {
            if (&mut shutdown).now_or_never().is_some() {
                info!("🛑 closing");
                break RelayExit::ShutdownSignal;
            }

            match stream.try_next() {
                Some(message) => {
                    debug!("🐦 tweet");
                    self.dispatch(&message).await;
                }
                // Default branch: nothing ready. Yield so the reader task gets a turn, no sleep.
                None => tokio::task::yield_now().await,
            }

            if !stream.is_connected() {
                warn!("📡 connection lost");
                break RelayExit::ConnectionLost;
            }
        };

        stream.close().await;
        exit
    }

    /// 📤 Fan one message out to every sink.
    ///
    /// Primary payload first, to every sink. Then, for sinks that want them, each related
    /// tweet as its own record, in the order the provider sent them. Every failure is logged
    /// and skipped; nothing here returns an error.
    pub(crate) async fn dispatch(&mut self, message: &StreamMessage) {
        let primary = match encode(message.payload()) {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                error!("💀 error encoding tweet message: {:#}", err);
                None
            }
        };

        for sink in self.sinks.iter_mut() {
            if let Some(bytes) = &primary {
                info!("📤 Sending tweet to {}", sink.name());
                if let Err(err) = sink.append(bytes.clone()).await {
                    error!("💀 error sending tweet to {}: {:#}", sink.name(), err);
                }
            }

            if !sink.relays_related_posts() {
                continue;
            }

            info!(
                "📎 Sending {} related tweet(s) to {}",
                message.related_posts().len(),
                sink.name()
            );
            for related in message.related_posts() {
                let bytes = match encode(related) {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        error!("💀 error encoding related tweet: {:#}", err);
                        continue;
                    }
                };
                debug!("📎 related tweet");
                if let Err(err) = sink.append(bytes).await {
                    error!("💀 error sending related tweet to {}: {:#}", sink.name(), err);
                }
            }
        }
    }
}

/// 🛑 Resolves on SIGINT (Ctrl+C) or SIGTERM.
///
/// SIGKILL is not on the list. Nobody gets to intercept SIGKILL. That's the point of SIGKILL.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("💀 Failed to install Ctrl+C handler: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("💀 Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("🛑 Received Ctrl+C"),
        _ = terminate => info!("🛑 Received SIGTERM"),
    }
}
