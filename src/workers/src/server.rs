//! Worker server: one task per subscription

use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::{RetrySection, WorkerConfig};
use crate::error::{Result, WorkerError};
use crate::handler::MessageHandlerRef;
use crate::message::Message;
use crate::registry::ListenerRegistry;

/// Counters reported by a subscription worker when it stops
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerStats {
    pub subscription: String,
    /// Messages handled successfully
    pub processed: u64,
    /// Extra attempts made after failures
    pub retries: u64,
    /// Messages dropped after exhausting retries
    pub failed: u64,
}

/// Runs registered listeners against their subscriptions
///
/// Messages within one subscription are handled sequentially; subscriptions
/// run concurrently. A message whose handler keeps failing is retried with
/// linear backoff and then dropped.
pub struct WorkerServer {
    registry: ListenerRegistry,
    config: WorkerConfig,
    token: CancellationToken,
    workers: Vec<JoinHandle<WorkerStats>>,
}

impl std::fmt::Debug for WorkerServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerServer")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkerServer {
    pub fn new(registry: ListenerRegistry, config: WorkerConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| WorkerError::Config(format!("{:#}", e)))?;

        Ok(Self {
            registry,
            config,
            token: CancellationToken::new(),
            workers: Vec::new(),
        })
    }

    /// Token that stops every worker when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Spawn the worker for `subscription` and return the sender that feeds it
    pub fn start(&mut self, subscription: &str) -> Result<mpsc::Sender<Message>> {
        let handler = self
            .registry
            .get(subscription)
            .ok_or_else(|| WorkerError::UnknownSubscription(subscription.to_string()))?;

        let capacity = self
            .config
            .subscription(subscription)
            .map(|s| s.channel_capacity)
            .unwrap_or(1024);
        let (tx, rx) = mpsc::channel(capacity);

        let worker = SubscriptionWorker {
            stats: WorkerStats {
                subscription: subscription.to_string(),
                ..Default::default()
            },
            handler,
            retry: self.config.retry.clone(),
            token: self.token.child_token(),
        };
        self.workers.push(tokio::spawn(worker.run(rx)));

        info!("Started worker for subscription {}", subscription);
        Ok(tx)
    }

    /// Start every enabled subscription from the configuration
    pub fn start_all(&mut self) -> Result<HashMap<String, mpsc::Sender<Message>>> {
        let names: Vec<String> = self
            .config
            .subscriptions()
            .into_iter()
            .filter(|s| s.enabled)
            .map(|s| s.name.clone())
            .collect();

        let mut senders = HashMap::new();
        for name in names {
            let tx = self.start(&name)?;
            senders.insert(name, tx);
        }
        Ok(senders)
    }

    pub fn running(&self) -> usize {
        self.workers.len()
    }

    /// Stop all workers and collect their stats.
    ///
    /// Messages already buffered for a worker are still handled; new sends
    /// fail once the worker has seen the cancellation.
    pub async fn shutdown(self) -> Vec<WorkerStats> {
        self.token.cancel();
        self.join().await
    }

    /// Wait for workers to finish on their own (all senders dropped)
    pub async fn join(self) -> Vec<WorkerStats> {
        let mut stats = Vec::with_capacity(self.workers.len());
        for worker in self.workers {
            match worker.await {
                Ok(s) => stats.push(s),
                Err(e) => error!("Worker task failed: {}", e),
            }
        }
        stats
    }
}

struct SubscriptionWorker {
    stats: WorkerStats,
    handler: MessageHandlerRef,
    retry: RetrySection,
    token: CancellationToken,
}

impl SubscriptionWorker {
    async fn run(mut self, mut rx: mpsc::Receiver<Message>) -> WorkerStats {
        loop {
            let message = tokio::select! {
                _ = self.token.cancelled() => break,
                message = rx.recv() => message,
            };
            match message {
                Some(message) => self.handle(&message).await,
                None => break,
            }
        }

        // Handle what was already accepted before stopping
        rx.close();
        let mut drained = 0u64;
        while let Some(message) = rx.recv().await {
            self.handle(&message).await;
            drained += 1;
        }
        if drained > 0 {
            info!(
                "Worker for {} drained {} buffered messages on shutdown",
                self.stats.subscription, drained
            );
        }

        info!(
            "Worker for {} stopped: processed={}, retries={}, failed={}",
            self.stats.subscription, self.stats.processed, self.stats.retries, self.stats.failed
        );
        self.stats
    }

    async fn handle(&mut self, message: &Message) {
        let mut attempt = 1;
        loop {
            match self.handler.process(message).await {
                Ok(()) => {
                    self.stats.processed += 1;
                    return;
                }
                Err(e) if attempt < self.retry.max_attempts => {
                    warn!(
                        "{}: attempt {}/{} failed: {}",
                        self.stats.subscription, attempt, self.retry.max_attempts, e
                    );
                    let cancelled = tokio::select! {
                        _ = self.token.cancelled() => true,
                        _ = sleep(self.retry.backoff(attempt)) => false,
                    };
                    if cancelled {
                        self.stats.failed += 1;
                        return;
                    }
                    self.stats.retries += 1;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        "{}: dropping message after {} attempts: {}",
                        self.stats.subscription, attempt, e
                    );
                    self.stats.failed += 1;
                    return;
                }
            }
        }
    }
}
