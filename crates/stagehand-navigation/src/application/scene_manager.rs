//! The scene manager.
//!
//! Owns the active scene, the history of previously visited scene ids and
//! the transition guard. A navigation runs as: exit animation → `exit` →
//! `destroy` → detach → history push → create → `init` → attach → `enter`
//! → enter animation → idle → `SceneChanged`.
//!
//! The guard is taken synchronously when [`SceneManager::change`] or
//! [`SceneManager::go_back`] is called, before the returned future is
//! polled, and released when the navigation ends, fails or its future is
//! dropped. Requests made while the guard is held are ignored, never queued.
//! The state mutex is only ever held for short synchronous sections; it is
//! never held across an `.await`.

use std::future::{Future, ready};
use std::pin::Pin;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stagehand_core::clock::Clock;
use stagehand_core::container::ContainerHandle;
use stagehand_core::error::StageError;
use stagehand_core::event::EventMetadata;
use stagehand_core::scene::{Scene, SceneFactory, SceneId, SceneServices, Viewport};
use stagehand_core::sound::SoundService;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::application::animator::TransitionAnimator;
use crate::domain::events::{NavigationFailed, SceneChanged, SceneEvent, SceneEventKind};
use crate::domain::navigation::{ChangeOptions, IgnoredReason, NavigationOutcome, TransitionState};
use crate::domain::stage::Stage;

/// Future returned by [`SceneManager::change`] and [`SceneManager::go_back`].
pub type NavigationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<NavigationOutcome, StageError>> + Send + 'a>>;

const EVENT_CAPACITY: usize = 64;

struct ActiveScene {
    id: SceneId,
    scene: Box<dyn Scene>,
    container: ContainerHandle,
}

struct ManagerState {
    phase: TransitionState,
    current: Option<ActiveScene>,
    history: Vec<SceneId>,
    stage: Stage,
    viewport: Viewport,
}

/// Holds the transition guard; dropping it returns the manager to `Idle`.
struct TransitionGuard {
    state: Arc<Mutex<ManagerState>>,
}

impl TransitionGuard {
    fn set(&self, phase: TransitionState) {
        lock(&self.state).phase = phase;
    }
}

impl Drop for TransitionGuard {
    fn drop(&mut self) {
        lock(&self.state).phase = TransitionState::Idle;
    }
}

/// A scene built for an in-flight navigation but not yet active. Dropping
/// it, including when the navigation future is dropped mid-`init`, destroys
/// the scene.
struct IncomingScene {
    id: SceneId,
    scene: Option<Box<dyn Scene>>,
}

impl IncomingScene {
    fn new(id: SceneId, scene: Box<dyn Scene>) -> Self {
        Self {
            id,
            scene: Some(scene),
        }
    }

    async fn init(&mut self) -> Result<(), StageError> {
        match self.scene.as_mut() {
            Some(scene) => scene.init().await,
            None => Ok(()),
        }
    }

    /// Hands the scene over; it is no longer destroyed on drop.
    fn release(mut self) -> Option<Box<dyn Scene>> {
        self.scene.take()
    }
}

impl Drop for IncomingScene {
    fn drop(&mut self) {
        if let Some(mut scene) = self.scene.take() {
            scene.destroy();
            debug!(scene = %self.id, "incoming scene destroyed before it was shown");
        }
    }
}

fn lock(state: &Mutex<ManagerState>) -> MutexGuard<'_, ManagerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Coordinates scene lifecycles, transitions and history.
pub struct SceneManager {
    state: Arc<Mutex<ManagerState>>,
    factory: Arc<dyn SceneFactory>,
    animator: Arc<dyn TransitionAnimator>,
    sound: Arc<dyn SoundService>,
    clock: Arc<dyn Clock>,
    events: broadcast::Sender<SceneEvent>,
    sequence: AtomicI64,
}

impl std::fmt::Debug for SceneManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = lock(&self.state);
        f.debug_struct("SceneManager")
            .field("phase", &state.phase)
            .field("current", &state.current.as_ref().map(|active| &active.id))
            .field("history", &state.history)
            .finish_non_exhaustive()
    }
}

impl SceneManager {
    /// Creates an idle manager with no active scene.
    #[must_use]
    pub fn new(
        factory: Arc<dyn SceneFactory>,
        animator: Arc<dyn TransitionAnimator>,
        sound: Arc<dyn SoundService>,
        clock: Arc<dyn Clock>,
        viewport: Viewport,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(Mutex::new(ManagerState {
                phase: TransitionState::Idle,
                current: None,
                history: Vec::new(),
                stage: Stage::new(),
                viewport,
            })),
            factory,
            animator,
            sound,
            clock,
            events,
            sequence: AtomicI64::new(0),
        }
    }

    /// Navigates to `target`.
    ///
    /// The request is checked and the guard taken before this returns; the
    /// future then runs the transition. Requests that cannot start resolve
    /// to [`NavigationOutcome::Ignored`].
    ///
    /// # Errors
    ///
    /// The future fails with `StageError::SceneConstruction` or
    /// `StageError::SceneInit` (or whatever the factory or scene returned)
    /// when the target cannot be shown. The outgoing scene stays destroyed.
    pub fn change(&self, target: impl Into<SceneId>, options: ChangeOptions) -> NavigationFuture<'_> {
        self.change_correlated(target.into(), options, Uuid::new_v4())
    }

    /// [`change`](Self::change) with an explicit correlation id for the
    /// emitted events.
    pub fn change_correlated(
        &self,
        target: SceneId,
        options: ChangeOptions,
        correlation_id: Uuid,
    ) -> NavigationFuture<'_> {
        match self.begin(&target) {
            Ok(guard) => Box::pin(self.run(guard, target, options, correlation_id)),
            Err(reason) => Box::pin(ready(Ok(NavigationOutcome::Ignored(reason)))),
        }
    }

    /// Like [`change`](Self::change), but spawns the transition on the tokio
    /// runtime. Returns `None` if the request was ignored.
    pub fn change_detached(
        self: &Arc<Self>,
        target: impl Into<SceneId>,
        options: ChangeOptions,
    ) -> Option<JoinHandle<Result<NavigationOutcome, StageError>>> {
        let target = target.into();
        let guard = self.begin(&target).ok()?;
        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            manager
                .run(guard, target, options, Uuid::new_v4())
                .await
        }))
    }

    /// Returns to the most recent history entry with the default transition,
    /// without pushing the current scene.
    pub fn go_back(&self) -> NavigationFuture<'_> {
        self.go_back_correlated(Uuid::new_v4())
    }

    /// [`go_back`](Self::go_back) with an explicit correlation id.
    pub fn go_back_correlated(&self, correlation_id: Uuid) -> NavigationFuture<'_> {
        match self.begin_back() {
            Ok((guard, previous)) => Box::pin(self.run(
                guard,
                previous,
                ChangeOptions::default().without_history(),
                correlation_id,
            )),
            Err(reason) => Box::pin(ready(Ok(NavigationOutcome::Ignored(reason)))),
        }
    }

    /// Like [`go_back`](Self::go_back), but spawns the transition on the
    /// tokio runtime. Returns `None` if the request was ignored.
    pub fn go_back_detached(
        self: &Arc<Self>,
    ) -> Option<JoinHandle<Result<NavigationOutcome, StageError>>> {
        let (guard, previous) = self.begin_back().ok()?;
        let manager = Arc::clone(self);
        Some(tokio::spawn(async move {
            manager
                .run(
                    guard,
                    previous,
                    ChangeOptions::default().without_history(),
                    Uuid::new_v4(),
                )
                .await
        }))
    }

    /// `true` while the history is non-empty.
    #[must_use]
    pub fn can_go_back(&self) -> bool {
        !lock(&self.state).history.is_empty()
    }

    /// Id of the active scene.
    #[must_use]
    pub fn current_id(&self) -> Option<SceneId> {
        lock(&self.state).current.as_ref().map(|active| active.id.clone())
    }

    /// Container of the active scene.
    #[must_use]
    pub fn current_container(&self) -> Option<ContainerHandle> {
        lock(&self.state)
            .current
            .as_ref()
            .map(|active| active.container.clone())
    }

    /// Snapshot of the history, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<SceneId> {
        lock(&self.state).history.clone()
    }

    #[must_use]
    pub fn transition_state(&self) -> TransitionState {
        lock(&self.state).phase
    }

    /// Number of containers currently on stage.
    #[must_use]
    pub fn stage_len(&self) -> usize {
        lock(&self.state).stage.len()
    }

    /// Receives `SceneChanged` and `NavigationFailed` events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SceneEvent> {
        self.events.subscribe()
    }

    /// Forwards the frame delta to the active scene.
    pub fn update(&self, delta_frames: f32) {
        if let Some(active) = lock(&self.state).current.as_mut() {
            active.scene.update(delta_frames);
        }
    }

    /// Records the new viewport and forwards it to the active scene and the
    /// animator.
    pub fn resize(&self, viewport: Viewport) {
        {
            let mut state = lock(&self.state);
            state.viewport = viewport;
            if let Some(active) = state.current.as_mut() {
                active.scene.resize(viewport);
            }
        }
        self.animator.resize(viewport);
    }

    /// Exits and destroys the active scene and clears the history.
    pub fn destroy(&self) {
        let mut state = lock(&self.state);
        if let Some(mut active) = state.current.take() {
            active.scene.exit();
            active.scene.destroy();
            state.stage.detach(&active.container);
            info!(scene = %active.id, "scene manager destroyed active scene");
        }
        state.stage.clear();
        state.history.clear();
    }

    fn begin(&self, target: &SceneId) -> Result<TransitionGuard, IgnoredReason> {
        let mut state = lock(&self.state);
        if state.phase != TransitionState::Idle {
            debug!(%target, phase = %state.phase, "navigation ignored, transition in progress");
            return Err(IgnoredReason::Busy);
        }
        if !self.factory.contains(target) {
            warn!(%target, "navigation ignored, unknown scene");
            return Err(IgnoredReason::UnknownScene(target.clone()));
        }
        if state.current.as_ref().is_some_and(|active| &active.id == target) {
            debug!(%target, "navigation ignored, scene already active");
            return Err(IgnoredReason::AlreadyActive(target.clone()));
        }
        state.phase = TransitionState::ExitingOld;
        Ok(TransitionGuard {
            state: Arc::clone(&self.state),
        })
    }

    /// Pops the history and takes the guard in one critical section.
    fn begin_back(&self) -> Result<(TransitionGuard, SceneId), IgnoredReason> {
        let mut state = lock(&self.state);
        if state.phase != TransitionState::Idle {
            debug!(phase = %state.phase, "go_back ignored, transition in progress");
            return Err(IgnoredReason::Busy);
        }
        let Some(previous) = state.history.pop() else {
            debug!("go_back ignored, history is empty");
            return Err(IgnoredReason::NoHistory);
        };
        state.phase = TransitionState::ExitingOld;
        Ok((
            TransitionGuard {
                state: Arc::clone(&self.state),
            },
            previous,
        ))
    }

    async fn run(
        &self,
        guard: TransitionGuard,
        target: SceneId,
        options: ChangeOptions,
        correlation_id: Uuid,
    ) -> Result<NavigationOutcome, StageError> {
        let outgoing = lock(&self.state)
            .current
            .as_ref()
            .map(|active| (active.id.clone(), active.container.clone()));
        let previous = outgoing.as_ref().map(|(id, _)| id.clone());

        info!(
            from = previous.as_ref().map_or("none", SceneId::as_str),
            to = %target,
            transition = %options.transition,
            %correlation_id,
            "scene change started"
        );

        if let Some((outgoing_id, container)) = outgoing {
            self.animator
                .exit(&container, &options.transition, options.duration)
                .await;
            self.retire(&outgoing_id, &container, options.add_to_history);
        }

        let services = SceneServices {
            sound: Arc::clone(&self.sound),
            viewport: lock(&self.state).viewport,
        };
        let mut incoming = match self.factory.create(&target, &services) {
            Ok(scene) => IncomingScene::new(target.clone(), scene),
            Err(err) => return Err(self.fail(&target, err, correlation_id)),
        };
        if let Err(err) = incoming.init().await {
            drop(incoming);
            return Err(self.fail(&target, err, correlation_id));
        }
        let Some(mut scene) = incoming.release() else {
            return Err(StageError::Infrastructure(format!(
                "scene {target} was released before it was shown"
            )));
        };

        let container = scene.container().clone();
        lock(&self.state).stage.attach(container.clone());
        scene.enter();
        {
            let mut state = lock(&self.state);
            state.current = Some(ActiveScene {
                id: target.clone(),
                scene,
                container: container.clone(),
            });
        }
        guard.set(TransitionState::EnteringNew);

        self.animator
            .enter(&container, &options.transition, options.duration)
            .await;
        drop(guard);

        info!(scene = %target, %correlation_id, "scene change complete");
        self.publish(
            SceneEventKind::SceneChanged(SceneChanged {
                scene_id: target.clone(),
                previous,
                transition: options.transition,
            }),
            correlation_id,
        );
        Ok(NavigationOutcome::Completed(target))
    }

    /// Tears down the outgoing scene after its exit animation.
    fn retire(&self, id: &SceneId, container: &ContainerHandle, add_to_history: bool) {
        let active = lock(&self.state).current.take();
        if let Some(mut active) = active {
            active.scene.exit();
            active.scene.destroy();
        }
        let mut state = lock(&self.state);
        state.stage.detach(container);
        if add_to_history {
            state.history.push(id.clone());
        }
        debug!(scene = %id, history = state.history.len(), "scene retired");
    }

    fn fail(&self, target: &SceneId, err: StageError, correlation_id: Uuid) -> StageError {
        error!(scene = %target, error = %err, %correlation_id, "scene change failed");
        self.publish(
            SceneEventKind::NavigationFailed(NavigationFailed {
                scene_id: target.clone(),
                reason: err.to_string(),
            }),
            correlation_id,
        );
        err
    }

    fn publish(&self, kind: SceneEventKind, correlation_id: Uuid) {
        let event = SceneEvent {
            metadata: EventMetadata {
                event_id: Uuid::now_v7(),
                event_type: kind.event_type().to_owned(),
                sequence_number: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
                correlation_id,
                occurred_at: self.clock.now(),
            },
            kind,
        };
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use async_trait::async_trait;
    use crate::application::animator::{InstantAnimator, TweenAnimator, TweenDriver};
    use stagehand_test_support::{FixedClock, RecordingSceneFactory, RecordingSoundService};

    const FRAME: Duration = Duration::from_micros(16_667);

    fn manager_with(factory: RecordingSceneFactory) -> (SceneManager, Arc<RecordingSceneFactory>) {
        let factory = Arc::new(factory);
        let manager = SceneManager::new(
            factory.clone(),
            Arc::new(InstantAnimator::new()),
            Arc::new(RecordingSoundService::default()),
            Arc::new(FixedClock::default()),
            Viewport::default(),
        );
        (manager, factory)
    }

    fn rooms() -> RecordingSceneFactory {
        RecordingSceneFactory::new(&["HOUSE", "INTERIOR", "LIVING", "BEDROOM"])
    }

    #[tokio::test]
    async fn test_first_change_creates_and_enters_scene() {
        // Arrange
        let (manager, factory) = manager_with(rooms());
        let mut events = manager.subscribe();

        // Act
        let outcome = manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        // Assert
        assert_eq!(outcome, NavigationOutcome::Completed("HOUSE".into()));
        assert_eq!(manager.current_id(), Some("HOUSE".into()));
        assert!(manager.history().is_empty());
        assert_eq!(manager.transition_state(), TransitionState::Idle);
        assert_eq!(manager.stage_len(), 1);
        assert_eq!(
            factory.log().lifecycle(),
            vec!["HOUSE:create", "HOUSE:init", "HOUSE:enter"]
        );
        let event = events.recv().await.unwrap();
        assert_eq!(
            event.kind,
            SceneEventKind::SceneChanged(SceneChanged {
                scene_id: "HOUSE".into(),
                previous: None,
                transition: "fade".into(),
            })
        );
        assert_eq!(event.metadata.sequence_number, 1);
    }

    #[tokio::test]
    async fn test_change_runs_lifecycle_in_order() {
        // Arrange
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        factory.log().clear();

        // Act
        manager
            .change("INTERIOR", ChangeOptions::default().with_transition("slideLeft"))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            factory.log().lifecycle(),
            vec![
                "HOUSE:exit",
                "HOUSE:destroy",
                "INTERIOR:create",
                "INTERIOR:init",
                "INTERIOR:enter",
            ]
        );
        assert_eq!(manager.history(), vec![SceneId::from("HOUSE")]);
        assert_eq!(manager.stage_len(), 1);
    }

    #[tokio::test]
    async fn test_second_change_while_busy_is_ignored() {
        // Arrange
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        // Act
        let first = manager.change("INTERIOR", ChangeOptions::default());
        let second = manager.change("LIVING", ChangeOptions::default()).await.unwrap();
        let first = first.await.unwrap();

        // Assert
        assert_eq!(second, NavigationOutcome::Ignored(IgnoredReason::Busy));
        assert_eq!(first, NavigationOutcome::Completed("INTERIOR".into()));
        assert_eq!(manager.current_id(), Some("INTERIOR".into()));
        assert!(!factory.created().contains(&"LIVING".into()));
    }

    #[tokio::test]
    async fn test_go_back_while_busy_is_ignored() {
        let (manager, _factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        manager.change("INTERIOR", ChangeOptions::default()).await.unwrap();

        let pending = manager.change("LIVING", ChangeOptions::default());
        let back = manager.go_back().await.unwrap();
        pending.await.unwrap();

        assert_eq!(back, NavigationOutcome::Ignored(IgnoredReason::Busy));
        assert_eq!(
            manager.history(),
            vec![SceneId::from("HOUSE"), SceneId::from("INTERIOR")]
        );
    }

    #[tokio::test]
    async fn test_unknown_scene_leaves_everything_untouched() {
        // Arrange
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        factory.log().clear();

        // Act
        let outcome = manager.change("ATTIC", ChangeOptions::default()).await.unwrap();

        // Assert
        assert_eq!(
            outcome,
            NavigationOutcome::Ignored(IgnoredReason::UnknownScene("ATTIC".into()))
        );
        assert_eq!(manager.current_id(), Some("HOUSE".into()));
        assert!(factory.log().events().is_empty());
        assert_eq!(manager.transition_state(), TransitionState::Idle);
    }

    #[tokio::test]
    async fn test_change_to_active_scene_is_ignored() {
        let (manager, _factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        let outcome = manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        assert_eq!(
            outcome,
            NavigationOutcome::Ignored(IgnoredReason::AlreadyActive("HOUSE".into()))
        );
        assert!(manager.history().is_empty());
    }

    #[tokio::test]
    async fn test_go_back_pops_without_pushing() {
        // Arrange
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        manager.change("INTERIOR", ChangeOptions::default()).await.unwrap();
        manager.change("LIVING", ChangeOptions::default()).await.unwrap();

        // Act
        let back = manager.go_back().await.unwrap();

        // Assert
        assert_eq!(back, NavigationOutcome::Completed("INTERIOR".into()));
        assert_eq!(manager.history(), vec![SceneId::from("HOUSE")]);
        assert_eq!(factory.log().count("INTERIOR:create"), 2);
    }

    #[tokio::test]
    async fn test_go_back_with_empty_history_is_ignored() {
        let (manager, _factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        let outcome = manager.go_back().await.unwrap();

        assert_eq!(outcome, NavigationOutcome::Ignored(IgnoredReason::NoHistory));
        assert!(!manager.can_go_back());
        assert_eq!(manager.current_id(), Some("HOUSE".into()));
    }

    #[tokio::test]
    async fn test_add_to_history_false_skips_push() {
        let (manager, _factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        manager
            .change("INTERIOR", ChangeOptions::default().without_history())
            .await
            .unwrap();

        assert!(manager.history().is_empty());
    }

    #[tokio::test]
    async fn test_init_failure_releases_guard_and_reports() {
        // Arrange
        let (manager, factory) = manager_with(rooms().with_failing_init("BEDROOM"));
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        let mut events = manager.subscribe();

        // Act
        let result = manager.change("BEDROOM", ChangeOptions::default()).await;

        // Assert
        assert!(matches!(result, Err(StageError::SceneInit { .. })));
        assert_eq!(manager.transition_state(), TransitionState::Idle);
        assert_eq!(manager.current_id(), None);
        assert_eq!(manager.stage_len(), 0);
        assert_eq!(factory.log().count("HOUSE:destroy"), 1);
        let event = events.recv().await.unwrap();
        assert!(matches!(event.kind, SceneEventKind::NavigationFailed(_)));

        let recovered = manager.change("LIVING", ChangeOptions::default()).await.unwrap();
        assert!(recovered.is_completed());
    }

    #[tokio::test]
    async fn test_construction_failure_surfaces_error() {
        let (manager, _factory) = manager_with(rooms().with_failing_construction("LIVING"));

        let result = manager.change("LIVING", ChangeOptions::default()).await;

        assert!(matches!(result, Err(StageError::SceneConstruction { .. })));
        assert_eq!(manager.transition_state(), TransitionState::Idle);
    }

    #[tokio::test]
    async fn test_dropped_navigation_releases_guard() {
        let (manager, _factory) = manager_with(rooms());

        let pending = manager.change("HOUSE", ChangeOptions::default());
        assert_eq!(manager.transition_state(), TransitionState::ExitingOld);
        drop(pending);

        assert_eq!(manager.transition_state(), TransitionState::Idle);
    }

    #[tokio::test]
    async fn test_history_depth_matches_completed_pushes() {
        let (manager, _factory) = manager_with(rooms());
        let path = ["HOUSE", "INTERIOR", "LIVING", "BEDROOM", "LIVING", "HOUSE"];

        for id in path {
            manager.change(id, ChangeOptions::default()).await.unwrap();
        }

        assert_eq!(manager.history().len(), path.len() - 1);
        assert_eq!(manager.current_id(), Some("HOUSE".into()));
    }

    #[tokio::test]
    async fn test_revisit_keeps_earlier_entry_and_backs_out_step_by_step() {
        // Arrange
        let (manager, _factory) = manager_with(rooms());
        for id in ["HOUSE", "INTERIOR", "HOUSE"] {
            manager.change(id, ChangeOptions::default()).await.unwrap();
        }

        // Act
        let history = manager.history();
        let back = manager.go_back().await.unwrap();

        // Assert
        assert_eq!(history, vec![SceneId::from("HOUSE"), SceneId::from("INTERIOR")]);
        assert_eq!(back, NavigationOutcome::Completed("INTERIOR".into()));
        assert_eq!(manager.history(), vec![SceneId::from("HOUSE")]);
        assert!(!manager.history().contains(&"INTERIOR".into()));
    }

    #[tokio::test]
    async fn test_update_and_resize_reach_active_scene() {
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();

        manager.update(1.0);
        manager.resize(Viewport {
            width: 800.0,
            height: 600.0,
        });

        assert_eq!(factory.log().count("HOUSE:update"), 1);
        assert_eq!(factory.log().count("HOUSE:resize"), 1);
    }

    #[tokio::test]
    async fn test_destroy_tears_down_and_clears_history() {
        let (manager, factory) = manager_with(rooms());
        manager.change("HOUSE", ChangeOptions::default()).await.unwrap();
        manager.change("INTERIOR", ChangeOptions::default()).await.unwrap();

        manager.destroy();

        assert_eq!(manager.current_id(), None);
        assert!(!manager.can_go_back());
        assert_eq!(manager.stage_len(), 0);
        assert_eq!(factory.log().count("INTERIOR:destroy"), 1);
    }

    #[tokio::test]
    async fn test_change_detached_completes_on_runtime() {
        let (manager, _factory) = manager_with(rooms());
        let manager = Arc::new(manager);

        let handle = manager
            .change_detached("HOUSE", ChangeOptions::default().with_duration(Duration::ZERO))
            .unwrap();
        let ignored = manager.change_detached("INTERIOR", ChangeOptions::default());
        let outcome = handle.await.unwrap().unwrap();

        assert!(ignored.is_none());
        assert_eq!(outcome, NavigationOutcome::Completed("HOUSE".into()));
    }

    /// A scene whose `init` never resolves.
    struct StalledScene {
        container: ContainerHandle,
        destroyed: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Scene for StalledScene {
        fn container(&self) -> &ContainerHandle {
            &self.container
        }

        async fn init(&mut self) -> Result<(), StageError> {
            std::future::pending::<()>().await;
            Ok(())
        }

        fn destroy(&mut self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    struct StalledFactory {
        destroyed: Arc<AtomicUsize>,
    }

    impl SceneFactory for StalledFactory {
        fn contains(&self, id: &SceneId) -> bool {
            id.as_str() == "HOUSE"
        }

        fn create(
            &self,
            _id: &SceneId,
            _services: &SceneServices,
        ) -> Result<Box<dyn Scene>, StageError> {
            Ok(Box::new(StalledScene {
                container: ContainerHandle::new(),
                destroyed: Arc::clone(&self.destroyed),
            }))
        }
    }

    #[tokio::test]
    async fn test_navigation_dropped_during_init_destroys_incoming_scene() {
        // Arrange
        let destroyed = Arc::new(AtomicUsize::new(0));
        let manager = SceneManager::new(
            Arc::new(StalledFactory {
                destroyed: Arc::clone(&destroyed),
            }),
            Arc::new(InstantAnimator::new()),
            Arc::new(RecordingSoundService::default()),
            Arc::new(FixedClock::default()),
            Viewport::default(),
        );

        // Act
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            manager.change("HOUSE", ChangeOptions::default()),
        )
        .await;

        // Assert
        assert!(result.is_err());
        assert_eq!(destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(manager.transition_state(), TransitionState::Idle);
        assert_eq!(manager.current_id(), None);
        assert_eq!(manager.stage_len(), 0);
    }

    fn tweened(factory: &Arc<RecordingSceneFactory>) -> (Arc<SceneManager>, TweenDriver) {
        let driver = TweenDriver::new();
        let manager = SceneManager::new(
            factory.clone(),
            Arc::new(TweenAnimator::new(driver.clone(), Viewport::default())),
            Arc::new(RecordingSoundService::default()),
            Arc::new(FixedClock::default()),
            Viewport::default(),
        );
        (Arc::new(manager), driver)
    }

    async fn drive_to_completion(
        driver: &TweenDriver,
        task: JoinHandle<Result<NavigationOutcome, StageError>>,
    ) -> NavigationOutcome {
        for _ in 0..200 {
            if task.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
            driver.advance(FRAME);
        }
        task.await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_tweened_change_exits_fully_before_creating_target() {
        // Arrange
        let factory = Arc::new(rooms());
        let (manager, driver) = tweened(&factory);
        let first = manager
            .change_detached("HOUSE", ChangeOptions::default())
            .unwrap();
        drive_to_completion(&driver, first).await;

        // Act
        let task = manager
            .change_detached("INTERIOR", ChangeOptions::default())
            .unwrap();
        let mut phases = vec![manager.transition_state()];
        let mut created_during_exit = false;
        let mut busy = None;
        for _ in 0..200 {
            if task.is_finished() {
                break;
            }
            tokio::task::yield_now().await;
            let phase = manager.transition_state();
            if phases.last() != Some(&phase) {
                phases.push(phase);
            }
            if phase == TransitionState::ExitingOld
                && factory.created().contains(&"INTERIOR".into())
            {
                created_during_exit = true;
            }
            if busy.is_none() {
                busy = Some(manager.change("LIVING", ChangeOptions::default()).await.unwrap());
            }
            driver.advance(FRAME);
        }
        let outcome = task.await.unwrap().unwrap();
        let phase = manager.transition_state();
        if phases.last() != Some(&phase) {
            phases.push(phase);
        }

        // Assert
        assert_eq!(outcome, NavigationOutcome::Completed("INTERIOR".into()));
        assert_eq!(
            phases,
            vec![
                TransitionState::ExitingOld,
                TransitionState::EnteringNew,
                TransitionState::Idle,
            ]
        );
        assert!(!created_during_exit);
        assert_eq!(busy, Some(NavigationOutcome::Ignored(IgnoredReason::Busy)));
        assert!(!factory.created().contains(&"LIVING".into()));
        assert_eq!(driver.active(), 0);
        assert_eq!(
            manager.current_container().map(|container| container.transform()),
            Some(stagehand_core::container::Transform::default())
        );
    }
}
