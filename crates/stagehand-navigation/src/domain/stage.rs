//! The stage: the set of containers currently drawn.

use stagehand_core::container::ContainerHandle;

/// Containers attached for rendering, back to front.
#[derive(Debug, Default)]
pub struct Stage {
    children: Vec<ContainerHandle>,
}

impl Stage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `container` on top. Attaching the same container twice is
    /// a no-op.
    pub fn attach(&mut self, container: ContainerHandle) {
        if !self.contains(&container) {
            self.children.push(container);
        }
    }

    /// Detaches `container`. Returns `true` if it was attached.
    pub fn detach(&mut self, container: &ContainerHandle) -> bool {
        let before = self.children.len();
        self.children.retain(|child| !child.same_as(container));
        self.children.len() != before
    }

    /// Detaches everything.
    pub fn clear(&mut self) {
        self.children.clear();
    }

    #[must_use]
    pub fn contains(&self, container: &ContainerHandle) -> bool {
        self.children.iter().any(|child| child.same_as(container))
    }

    #[must_use]
    pub fn children(&self) -> &[ContainerHandle] {
        &self.children
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
