use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::cache::{Cached, CachedClient, Freshness};

pub const LEADERBOARD_INTERVAL: Duration = Duration::from_secs(30);
pub const EVENTS_INTERVAL: Duration = Duration::from_secs(60);

/// Refreshes one API path on a fixed interval.
#[derive(Debug, Clone)]
pub struct Poller {
    client: Arc<CachedClient>,
    path: String,
    interval: Duration,
}

impl Poller {
    pub fn new(client: Arc<CachedClient>, path: impl Into<String>, interval: Duration) -> Self {
        Self {
            client,
            path: path.into(),
            interval,
        }
    }

    pub fn leaderboard(client: Arc<CachedClient>, limit: i64) -> Self {
        Self::new(client, format!("/api/ranking?limit={limit}"), LEADERBOARD_INTERVAL)
    }

    pub fn upcoming_events(client: Arc<CachedClient>) -> Self {
        Self::new(client, "/api/eventos?status=agendado", EVENTS_INTERVAL)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Polls immediately and then once per interval, handing every value
    /// that did not come from a failed revalidation to `on_value`.
    pub fn spawn<T, F>(self, mut on_value: F) -> PollerHandle
    where
        T: DeserializeOwned + Send + 'static,
        F: FnMut(Cached<T>) + Send + 'static,
    {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(path = %self.path, interval = ?self.interval, "poller started");
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        match self.client.get_json::<T>(&self.path).await {
                            Ok(cached) if cached.freshness == Freshness::Stale => {
                                debug!(path = %self.path, "keeping last value");
                            }
                            Ok(cached) => on_value(cached),
                            Err(err) => warn!(path = %self.path, error = %err, "poll failed"),
                        }
                    }
                }
            }
            info!(path = %self.path, "poller stopped");
        });
        PollerHandle {
            stop: Some(stop_tx),
            task,
        }
    }
}

#[derive(Debug)]
pub struct PollerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Stops the loop and waits for an in-flight poll to finish.
    pub async fn cancel(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Err(err) = (&mut self.task).await {
            warn!(error = %err, "poller task ended abnormally");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if self.stop.is_some() {
            self.task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::spawn_server;
    use crate::ClientConfig;
    use std::sync::atomic::Ordering;
    use tokio::sync::mpsc;
    use ufc_core::RankingPrevisor;

    fn client(base_url: &str) -> Arc<CachedClient> {
        let config = ClientConfig {
            api_url: base_url.to_string(),
            dedupe_interval: Duration::ZERO,
            ..ClientConfig::default()
        };
        Arc::new(CachedClient::new(&config).unwrap())
    }

    #[test]
    fn default_intervals() {
        let client = client("http://127.0.0.1:1");
        let board = Poller::leaderboard(client.clone(), 10);
        assert_eq!(board.interval(), Duration::from_secs(30));
        assert_eq!(board.path(), "/api/ranking?limit=10");
        assert_eq!(Poller::upcoming_events(client).interval(), Duration::from_secs(60));
    }

    #[tokio::test]
    async fn delivers_each_refresh_until_cancelled() {
        let server = spawn_server().await;
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = Poller::new(client(&server.base_url), "/api/ranking", Duration::from_millis(20))
            .spawn(move |cached: Cached<Vec<RankingPrevisor>>| {
                let _ = tx.send(cached.value[0].pontos);
            });

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert!(second > first);

        handle.cancel().await;
        let polls = server.hits.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(server.hits.load(Ordering::SeqCst), polls);
    }

    #[tokio::test]
    async fn failed_polls_do_not_reach_the_callback() {
        let server = spawn_server().await;
        server.healthy.store(false, Ordering::SeqCst);
        let (tx, mut rx) = mpsc::unbounded_channel::<i64>();
        let handle = Poller::new(client(&server.base_url), "/api/ranking", Duration::from_millis(10))
            .spawn(move |cached: Cached<Vec<RankingPrevisor>>| {
                let _ = tx.send(cached.value[0].pontos);
            });

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(server.hits.load(Ordering::SeqCst) >= 2);
        assert!(rx.try_recv().is_err());
        handle.cancel().await;
    }
}
