//! Background synchronization engine.
//!
//! Owns the single poll worker, the per-group digest cache, and the
//! lifecycle state. All HTTP calls happen on the worker; `start()`, `stop()`
//! and `is_running()` may be invoked from any task.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

use crate::config::schema::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::http::{ChangeListener, ConfigFetcher};
use crate::model::{ConfigGroup, DigestCache};
use crate::subscriber::SubscriberRegistry;
use crate::sync::backoff::BackoffPolicy;

/// Configuration synchronization engine.
///
/// Composes the fetcher, the change listener, and the subscriber registry.
/// Exactly one background worker drives the poll loop; the digest cache is
/// written only after a snapshot has been delivered to subscribers.
pub struct SyncEngine {
    fetcher: ConfigFetcher,
    listener: ChangeListener,
    registry: Arc<SubscriberRegistry>,
    digests: DigestCache,
    poll_timeout: Duration,
    protocol_retry_delay: Duration,
    backoff_base_ms: u64,
    backoff_max_ms: u64,
    running: AtomicBool,
    inner: Mutex<EngineInner>,
}

/// Worker handle and shutdown channel, guarded together so start/stop
/// transitions are serialized.
struct EngineInner {
    shutdown_tx: Option<broadcast::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl SyncEngine {
    /// Build an engine from a validated configuration and a fixed
    /// subscriber table. Does not contact the admin server yet.
    pub fn new(config: SyncConfig, registry: SubscriberRegistry) -> SyncResult<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_millis(config.admin.connect_timeout_ms))
            .timeout(Duration::from_millis(config.admin.request_timeout_ms))
            .build()
            .map_err(SyncError::transport)?;
        let base_url = config.admin.url.clone();

        Ok(Self {
            fetcher: ConfigFetcher::new(client.clone(), base_url.clone()),
            listener: ChangeListener::new(client, base_url),
            registry: Arc::new(registry),
            digests: DigestCache::seeded(),
            poll_timeout: Duration::from_secs(config.poll.timeout_secs),
            protocol_retry_delay: Duration::from_millis(config.poll.protocol_retry_delay_ms),
            backoff_base_ms: config.backoff.base_ms,
            backoff_max_ms: config.backoff.max_ms,
            running: AtomicBool::new(false),
            inner: Mutex::new(EngineInner {
                shutdown_tx: None,
                worker: None,
            }),
        })
    }

    /// Bootstrap all groups and spawn the poll worker.
    ///
    /// Fails with `AlreadyRunning` if the engine is not stopped. If the
    /// bootstrap fetch fails the error is returned, no worker is spawned,
    /// and the engine remains stopped; serving with zero configuration is
    /// unsafe, so there is no partial bootstrap.
    pub async fn start(&self) -> SyncResult<()> {
        let mut inner = self.inner.lock().await;
        if self.running.load(Ordering::SeqCst) {
            return Err(SyncError::AlreadyRunning);
        }

        tracing::info!("bootstrapping configuration from admin server");
        let snapshots = self.fetcher.fetch(&ConfigGroup::ALL).await?;

        for group in ConfigGroup::ALL {
            match snapshots.get(&group) {
                Some(snapshot) => {
                    self.registry.notify(snapshot, true);
                    self.digests.record(snapshot);
                    tracing::info!(
                        %group,
                        items = snapshot.items.len(),
                        md5 = %snapshot.digest,
                        "group bootstrapped"
                    );
                }
                None => {
                    tracing::warn!(%group, "bootstrap response missing group");
                }
            }
        }

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let worker = PollWorker {
            fetcher: self.fetcher.clone(),
            listener: self.listener.clone(),
            registry: Arc::clone(&self.registry),
            digests: self.digests.clone(),
            poll_timeout: self.poll_timeout,
            protocol_retry_delay: self.protocol_retry_delay,
            backoff: BackoffPolicy::new(self.backoff_base_ms, self.backoff_max_ms),
        };
        inner.worker = Some(tokio::spawn(worker.run(shutdown_rx)));
        inner.shutdown_tx = Some(shutdown_tx);
        self.running.store(true, Ordering::SeqCst);

        tracing::info!("sync engine started");
        Ok(())
    }

    /// Stop the poll worker and wait for it to exit.
    ///
    /// Idempotent: a stopped engine returns immediately. The shutdown signal
    /// cancels an in-flight long poll rather than waiting for its timeout,
    /// so this returns within a bounded time. After it returns, no further
    /// subscriber notifications occur.
    pub async fn stop(&self) {
        let mut inner = self.inner.lock().await;
        let Some(shutdown_tx) = inner.shutdown_tx.take() else {
            tracing::debug!("stop() called on a stopped engine");
            return;
        };

        let _ = shutdown_tx.send(());
        self.running.store(false, Ordering::SeqCst);

        if let Some(worker) = inner.worker.take() {
            if worker.await.is_err() {
                tracing::error!("sync worker panicked before shutdown");
            }
        }
        tracing::info!("sync engine stopped");
    }

    /// Whether the engine is currently running. Safe to call concurrently
    /// with `start()`/`stop()`.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The per-group digest cache, for diagnostics and tests.
    pub fn digests(&self) -> &DigestCache {
        &self.digests
    }
}

/// The single background worker driving the poll loop.
struct PollWorker {
    fetcher: ConfigFetcher,
    listener: ChangeListener,
    registry: Arc<SubscriberRegistry>,
    digests: DigestCache,
    poll_timeout: Duration,
    protocol_retry_delay: Duration,
    backoff: BackoffPolicy,
}

impl PollWorker {
    async fn run(mut self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!("sync worker started");

        loop {
            let outcome = tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("sync worker received shutdown signal, exiting loop");
                    None
                }
                result = self.poll_once() => Some(result),
            };

            let Some(result) = outcome else { break };
            match result {
                Ok(()) => self.backoff.reset(),
                Err(SyncError::Transport(reason)) => {
                    let delay = self.backoff.next_delay();
                    tracing::warn!(
                        %reason,
                        attempt = self.backoff.attempt(),
                        delay_ms = delay.as_millis() as u64,
                        "transport failure talking to admin server, backing off"
                    );
                    if wait_or_shutdown(delay, &mut shutdown).await {
                        break;
                    }
                }
                Err(error) => {
                    // Protocol violations are server-side bugs; retrying
                    // aggressively would not help.
                    tracing::error!(%error, "admin server violated the sync protocol");
                    if wait_or_shutdown(self.protocol_retry_delay, &mut shutdown).await {
                        break;
                    }
                }
            }
        }

        tracing::info!("sync worker exited");
    }

    /// One listen/fetch/notify cycle. An empty changed set is a normal
    /// timeout outcome and completes the cycle immediately.
    async fn poll_once(&self) -> SyncResult<()> {
        let digests = self.digests.snapshot();
        let changed = self.listener.listen(&digests, self.poll_timeout).await?;
        if changed.is_empty() {
            tracing::trace!("long poll elapsed with no changes");
            return Ok(());
        }

        let groups: Vec<ConfigGroup> = changed.into_iter().collect();
        tracing::info!(?groups, "admin server reported changed groups");

        let snapshots = self.fetcher.fetch(&groups).await?;
        for group in &groups {
            // Absent from the response means no change after all.
            let Some(snapshot) = snapshots.get(group) else {
                continue;
            };
            let failed = self.registry.notify(snapshot, false);
            if failed > 0 {
                tracing::warn!(
                    %group,
                    failed,
                    "update delivered with subscriber failures; digest advances regardless"
                );
            }
            self.digests.record(snapshot);
            tracing::debug!(
                %group,
                md5 = %snapshot.digest,
                last_modify_time = snapshot.last_modify_time,
                "digest advanced"
            );
        }
        Ok(())
    }
}

/// Sleep for `delay` unless shutdown arrives first. Returns true on shutdown.
async fn wait_or_shutdown(delay: Duration, shutdown: &mut broadcast::Receiver<()>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        _ = shutdown.recv() => true,
    }
}
