// Copyright (c) 2026 bad-antics
// Licensed under the MIT License. See LICENSE file in the project root.
// https://github.com/bad-antics/invigilator

//! Task scheduler for timed operations

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

struct ScheduledTask {
    interval: Duration,
    handle: JoinHandle<()>,
}

/// Runs named async tasks on fixed intervals.
///
/// A run never overlaps the previous run of the same task: ticks missed
/// while a run is in progress are skipped, not queued.
pub struct Scheduler {
    tasks: Arc<RwLock<HashMap<String, ScheduledTask>>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            shutdown_tx,
        }
    }

    /// Schedule `task` every `interval`, first run one interval from now
    pub async fn add_task<F, Fut>(&self, name: &str, interval: Duration, task: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut shutdown = self.shutdown_tx.subscribe();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // the first tick completes immediately
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => task().await,
                    _ = shutdown.recv() => {
                        debug!("Scheduled task '{}' stopping", task_name);
                        break;
                    }
                }
            }
        });

        let mut tasks = self.tasks.write().await;
        if let Some(old) = tasks.insert(name.to_string(), ScheduledTask { interval, handle }) {
            old.handle.abort();
        }
        debug!("Scheduled task '{}' with interval {:?}", name, interval);
    }

    pub async fn remove_task(&self, name: &str) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.remove(name) {
            task.handle.abort();
        }
    }

    pub async fn interval_of(&self, name: &str) -> Option<Duration> {
        self.tasks.read().await.get(name).map(|t| t.interval)
    }

    /// Stop every task after its current run
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let mut tasks = self.tasks.write().await;
        for (_, task) in tasks.drain() {
            let _ = task.handle.await;
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_task_runs_on_interval() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));

        let counter = runs.clone();
        scheduler
            .add_task("count", Duration::from_secs(5), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        tokio::time::sleep(Duration::from_millis(4_900)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_millis(10_200)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.interval_of("count").await, Some(Duration::from_secs(5)));

        scheduler.shutdown().await;
        tokio::time::sleep(Duration::from_secs(20)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_task() {
        let scheduler = Scheduler::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = runs.clone();
        scheduler
            .add_task("count", Duration::from_secs(1), move || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                }
            })
            .await;

        scheduler.remove_task("count").await;
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.interval_of("count").await, None);
    }
}
