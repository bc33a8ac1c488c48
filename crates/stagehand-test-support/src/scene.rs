//! Recording scenes: `Scene` and `SceneFactory` doubles that log every
//! lifecycle hook to a shared log.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use stagehand_core::container::ContainerHandle;
use stagehand_core::error::StageError;
use stagehand_core::scene::{Scene, SceneFactory, SceneId, SceneServices, Viewport};

/// Shared log of lifecycle hooks, recorded as `"<scene>:<hook>"`.
#[derive(Debug, Clone, Default)]
pub struct LifecycleLog {
    log: Arc<Mutex<Vec<String>>>,
}

impl LifecycleLog {
    /// Appends `"<scene>:<hook>"` to the log.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn record(&self, scene: &SceneId, hook: &str) {
        self.log.lock().unwrap().push(format!("{scene}:{hook}"));
    }

    /// Returns a snapshot of every recorded entry, oldest first.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }

    /// Returns the entries without per-frame `update` noise.
    #[must_use]
    pub fn lifecycle(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter(|entry| !entry.ends_with(":update"))
            .collect()
    }

    /// Counts occurrences of an exact entry such as `"HOUSE:destroy"`.
    #[must_use]
    pub fn count(&self, entry: &str) -> usize {
        self.events().iter().filter(|e| *e == entry).count()
    }

    /// Forgets everything recorded so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

/// A scene that records its hooks and optionally fails `init`.
#[derive(Debug)]
pub struct RecordingScene {
    id: SceneId,
    container: ContainerHandle,
    log: LifecycleLog,
    fail_init: bool,
}

impl RecordingScene {
    /// Create a scene that succeeds at every hook.
    #[must_use]
    pub fn new(id: impl Into<SceneId>, log: LifecycleLog) -> Self {
        Self {
            id: id.into(),
            container: ContainerHandle::new(),
            log,
            fail_init: false,
        }
    }

    /// Create a scene whose `init` returns `StageError::SceneInit`.
    #[must_use]
    pub fn failing_init(id: impl Into<SceneId>, log: LifecycleLog) -> Self {
        Self {
            fail_init: true,
            ..Self::new(id, log)
        }
    }
}

#[async_trait]
impl Scene for RecordingScene {
    fn container(&self) -> &ContainerHandle {
        &self.container
    }

    async fn init(&mut self) -> Result<(), StageError> {
        self.log.record(&self.id, "init");
        if self.fail_init {
            return Err(StageError::SceneInit {
                scene: self.id.clone(),
                reason: "assets unavailable".into(),
            });
        }
        Ok(())
    }

    fn enter(&mut self) {
        self.log.record(&self.id, "enter");
    }

    fn exit(&mut self) {
        self.log.record(&self.id, "exit");
    }

    fn update(&mut self, _delta_frames: f32) {
        self.log.record(&self.id, "update");
    }

    fn resize(&mut self, _viewport: Viewport) {
        self.log.record(&self.id, "resize");
    }

    fn destroy(&mut self) {
        self.log.record(&self.id, "destroy");
    }
}

/// A factory of `RecordingScene`s for a fixed set of ids.
#[derive(Debug, Default)]
pub struct RecordingSceneFactory {
    known: BTreeSet<SceneId>,
    failing_init: BTreeSet<SceneId>,
    failing_construction: BTreeSet<SceneId>,
    log: LifecycleLog,
    created: Mutex<Vec<SceneId>>,
}

impl RecordingSceneFactory {
    /// Create a factory that knows exactly `ids`.
    #[must_use]
    pub fn new(ids: &[&str]) -> Self {
        Self {
            known: ids.iter().map(|id| SceneId::from(*id)).collect(),
            ..Self::default()
        }
    }

    /// Scenes built for `id` will fail `init`.
    #[must_use]
    pub fn with_failing_init(mut self, id: &str) -> Self {
        self.known.insert(id.into());
        self.failing_init.insert(id.into());
        self
    }

    /// `create` for `id` will return `StageError::SceneConstruction`.
    #[must_use]
    pub fn with_failing_construction(mut self, id: &str) -> Self {
        self.known.insert(id.into());
        self.failing_construction.insert(id.into());
        self
    }

    /// The log shared by every scene this factory builds.
    #[must_use]
    pub fn log(&self) -> LifecycleLog {
        self.log.clone()
    }

    /// Ids passed to successful `create` calls, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn created(&self) -> Vec<SceneId> {
        self.created.lock().unwrap().clone()
    }
}

impl SceneFactory for RecordingSceneFactory {
    fn contains(&self, id: &SceneId) -> bool {
        self.known.contains(id)
    }

    fn create(
        &self,
        id: &SceneId,
        _services: &SceneServices,
    ) -> Result<Box<dyn Scene>, StageError> {
        if !self.known.contains(id) {
            return Err(StageError::UnknownScene(id.clone()));
        }
        if self.failing_construction.contains(id) {
            return Err(StageError::SceneConstruction {
                scene: id.clone(),
                reason: "factory refused".into(),
            });
        }

        self.log.record(id, "create");
        self.created.lock().unwrap().push(id.clone());
        let scene = if self.failing_init.contains(id) {
            RecordingScene::failing_init(id.clone(), self.log.clone())
        } else {
            RecordingScene::new(id.clone(), self.log.clone())
        };
        Ok(Box::new(scene))
    }
}
