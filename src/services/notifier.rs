// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! "Achievement earned" notifications.
//!
//! Awards are committed first; the event is then queued and delivered by a
//! background worker. Delivery failures are logged and dropped, never retried
//! through the award path.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Event emitted after an award is committed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementEarned {
    pub user_id: String,
    pub achievement: String,
    pub points: u32,
    /// User's level after the award's points were added
    pub level: u32,
}

/// Delivery transport for achievement events.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_achievement_earned(&self, event: &AchievementEarned) -> anyhow::Result<()>;
}

/// Notifier that only writes a log line.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify_achievement_earned(&self, event: &AchievementEarned) -> anyhow::Result<()> {
        tracing::info!(
            user_id = %event.user_id,
            achievement = %event.achievement,
            points = event.points,
            level = event.level,
            "Achievement earned"
        );
        Ok(())
    }
}

/// Sending side of the notification queue.
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::Sender<AchievementEarned>,
}

impl NotificationDispatcher {
    /// Start the delivery worker and return a handle for emitting events.
    ///
    /// The worker exits once every dispatcher clone has been dropped.
    pub fn spawn(notifier: Arc<dyn Notifier>, capacity: usize) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::channel::<AchievementEarned>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                if let Err(e) = notifier.notify_achievement_earned(&event).await {
                    tracing::warn!(
                        user_id = %event.user_id,
                        achievement = %event.achievement,
                        error = %e,
                        "Failed to deliver achievement notification"
                    );
                }
            }
            tracing::debug!("Notification worker stopped");
        });

        (Self { tx }, worker)
    }

    /// Queue an event without waiting. A full or closed queue drops it.
    pub fn emit(&self, event: AchievementEarned) {
        if let Err(e) = self.tx.try_send(event) {
            let (reason, event) = match e {
                mpsc::error::TrySendError::Full(ev) => ("queue full", ev),
                mpsc::error::TrySendError::Closed(ev) => ("worker stopped", ev),
            };
            tracing::warn!(
                user_id = %event.user_id,
                achievement = %event.achievement,
                reason,
                "Dropped achievement notification"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        events: Mutex<Vec<AchievementEarned>>,
    }

    #[async_trait]
    impl Notifier for Recording {
        async fn notify_achievement_earned(&self, event: &AchievementEarned) -> anyhow::Result<()> {
            self.events.lock().unwrap().push(event.clone());
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn notify_achievement_earned(&self, _: &AchievementEarned) -> anyhow::Result<()> {
            anyhow::bail!("push service down")
        }
    }

    fn event(name: &str) -> AchievementEarned {
        AchievementEarned {
            user_id: "u1".to_string(),
            achievement: name.to_string(),
            points: 10,
            level: 1,
        }
    }

    #[tokio::test]
    async fn test_events_are_delivered_in_order() {
        let recording = Arc::new(Recording::default());
        let (dispatcher, worker) = NotificationDispatcher::spawn(recording.clone(), 8);

        dispatcher.emit(event("A"));
        dispatcher.emit(event("B"));
        drop(dispatcher);
        worker.await.unwrap();

        let names: Vec<String> = recording
            .events
            .lock()
            .unwrap()
            .iter()
            .map(|e| e.achievement.clone())
            .collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_failing_notifier_does_not_stop_worker() {
        let (dispatcher, worker) = NotificationDispatcher::spawn(Arc::new(Failing), 8);

        dispatcher.emit(event("A"));
        dispatcher.emit(event("B"));
        drop(dispatcher);

        worker.await.unwrap();
    }
}
