//! In-Process Collaborators
//!
//! Local implementations of the integration ports, used by the demo binary
//! and the tests. They record what was asked of them.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use futures_util::future::{self, BoxFuture, FutureExt};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::integration::ports::{
    AreaError, MissionCompleted, MissionLocator, MissionSource, PlayAreaLoader, TimeControl,
};

#[derive(Debug, Clone, Copy)]
enum LoadBehavior {
    Ready(Duration),
    Fail,
    Never,
}

/// Loader that "loads" after an optional delay and records every call.
#[derive(Debug)]
pub struct InstantLoader {
    behavior: LoadBehavior,
    known_areas: Option<Vec<String>>,
    loads: Mutex<Vec<String>>,
    unloads: Mutex<Vec<String>>,
}

impl InstantLoader {
    fn with_behavior(behavior: LoadBehavior) -> Self {
        Self {
            behavior,
            known_areas: None,
            loads: Mutex::new(Vec::new()),
            unloads: Mutex::new(Vec::new()),
        }
    }

    /// Areas become ready immediately.
    pub fn new() -> Self {
        Self::with_behavior(LoadBehavior::Ready(Duration::ZERO))
    }

    /// Areas become ready after `delay`.
    pub fn with_delay(delay: Duration) -> Self {
        Self::with_behavior(LoadBehavior::Ready(delay))
    }

    /// Every load fails.
    pub fn failing() -> Self {
        Self::with_behavior(LoadBehavior::Fail)
    }

    /// Loads never resolve.
    pub fn never_ready() -> Self {
        Self::with_behavior(LoadBehavior::Never)
    }

    /// Reject every area not in `areas` with `UnknownArea`.
    pub fn restricted_to(mut self, areas: &[&str]) -> Self {
        self.known_areas = Some(areas.iter().map(|a| a.to_string()).collect());
        self
    }

    /// Areas requested so far.
    pub fn loads(&self) -> Vec<String> {
        self.loads.lock().clone()
    }

    /// Areas released so far.
    pub fn unloads(&self) -> Vec<String> {
        self.unloads.lock().clone()
    }
}

impl Default for InstantLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayAreaLoader for InstantLoader {
    fn load(&self, area_id: &str) -> BoxFuture<'static, Result<(), AreaError>> {
        self.loads.lock().push(area_id.to_string());
        let area = area_id.to_string();

        if let Some(known) = &self.known_areas {
            if !known.contains(&area) {
                return future::ready(Err(AreaError::UnknownArea(area))).boxed();
            }
        }

        match self.behavior {
            LoadBehavior::Ready(delay) if delay.is_zero() => future::ready(Ok(())).boxed(),
            LoadBehavior::Ready(delay) => async move {
                tokio::time::sleep(delay).await;
                Ok(())
            }
            .boxed(),
            LoadBehavior::Fail => future::ready(Err(AreaError::Failed {
                area,
                reason: "scene bundle missing".to_string(),
            }))
            .boxed(),
            LoadBehavior::Never => future::pending().boxed(),
        }
    }

    fn unload(&self, area_id: &str) -> BoxFuture<'static, Result<(), AreaError>> {
        self.unloads.lock().push(area_id.to_string());
        future::ready(Ok(())).boxed()
    }
}

/// Mission source driven by hand.
#[derive(Debug)]
pub struct ScriptedMission {
    remaining: AtomicU32,
    completed: AtomicU32,
    completion_tx: broadcast::Sender<MissionCompleted>,
}

impl ScriptedMission {
    /// Source with `targets` targets left.
    pub fn new(targets: u32) -> Self {
        let (completion_tx, _) = broadcast::channel(32);
        Self {
            remaining: AtomicU32::new(targets),
            completed: AtomicU32::new(0),
            completion_tx,
        }
    }

    /// Clear one target and signal the completion.
    pub fn complete_one(&self, mission: &str) {
        // Saturating: completions past zero still count as missions.
        let _ = self
            .remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
        self.completed.fetch_add(1, Ordering::SeqCst);
        let _ = self.completion_tx.send(MissionCompleted { mission: mission.to_string() });
    }

    /// Live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.completion_tx.receiver_count()
    }
}

impl MissionSource for ScriptedMission {
    fn remaining_targets(&self) -> u32 {
        self.remaining.load(Ordering::SeqCst)
    }

    fn completed_missions(&self) -> u32 {
        self.completed.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<MissionCompleted> {
        self.completion_tx.subscribe()
    }
}

/// Locator that hands out the same source for every area, or none.
#[derive(Default)]
pub struct StaticLocator {
    source: Option<Arc<dyn MissionSource>>,
}

impl StaticLocator {
    /// Every area has `source`.
    pub fn with_source(source: Arc<dyn MissionSource>) -> Self {
        Self { source: Some(source) }
    }

    /// No area has a mission source.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl MissionLocator for StaticLocator {
    fn locate(&self, _area_id: &str) -> Option<Arc<dyn MissionSource>> {
        self.source.clone()
    }
}

/// Time control that only records the requested scales.
#[derive(Debug, Default)]
pub struct RecordingTimeControl {
    scales: Mutex<Vec<f32>>,
}

impl RecordingTimeControl {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent scale, if any was set.
    pub fn last(&self) -> Option<f32> {
        self.scales.lock().last().copied()
    }
}

impl TimeControl for RecordingTimeControl {
    fn set_time_scale(&self, scale: f32) {
        self.scales.lock().push(scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_loader_records_calls() {
        let loader = InstantLoader::new();
        assert!(loader.load("A").await.is_ok());
        assert!(loader.unload("A").await.is_ok());
        assert_eq!(loader.loads(), vec!["A".to_string()]);
        assert_eq!(loader.unloads(), vec!["A".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_loader() {
        let loader = InstantLoader::failing();
        let err = loader.load("A").await.unwrap_err();
        assert!(matches!(err, AreaError::Failed { ref area, .. } if area == "A"));
    }

    #[tokio::test]
    async fn test_restricted_loader_rejects_unknown_area() {
        let loader = InstantLoader::new().restricted_to(&["Attic"]);
        assert!(loader.load("Attic").await.is_ok());
        let err = loader.load("Basement").await.unwrap_err();
        assert_eq!(err, AreaError::UnknownArea("Basement".to_string()));
        assert_eq!(loader.loads(), vec!["Attic".to_string(), "Basement".to_string()]);
    }

    #[tokio::test]
    async fn test_scripted_mission_counts() {
        let mission = ScriptedMission::new(1);
        let mut rx = mission.subscribe();

        mission.complete_one("a");
        mission.complete_one("b");

        assert_eq!(mission.remaining_targets(), 0);
        assert_eq!(mission.completed_missions(), 2);
        assert_eq!(rx.recv().await.unwrap().mission, "a");
        assert_eq!(rx.recv().await.unwrap().mission, "b");
    }
}
