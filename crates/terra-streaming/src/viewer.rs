//! Viewer position sources injected into the streaming manager.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec2;

/// Supplies the viewer's ground-plane position each tick.
pub trait ViewerSource {
    /// Current position in world units.
    fn position(&self) -> Vec2;
}

/// A position cell shared between the manager and whatever moves the viewer.
///
/// Clones share the same cell. Consumer-thread only.
#[derive(Clone, Debug, Default)]
pub struct ViewerHandle {
    position: Rc<Cell<Vec2>>,
}

impl ViewerHandle {
    /// Create a handle at `position`.
    pub fn new(position: Vec2) -> Self {
        Self {
            position: Rc::new(Cell::new(position)),
        }
    }

    /// Move the viewer.
    pub fn set(&self, position: Vec2) {
        self.position.set(position);
    }

    /// Move the viewer by `delta`.
    pub fn translate(&self, delta: Vec2) {
        self.position.set(self.position.get() + delta);
    }
}

impl ViewerSource for ViewerHandle {
    fn position(&self) -> Vec2 {
        self.position.get()
    }
}

impl<F> ViewerSource for F
where
    F: Fn() -> Vec2,
{
    fn position(&self) -> Vec2 {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_clones_share_position() {
        let viewer = ViewerHandle::new(Vec2::ZERO);
        let other = viewer.clone();
        other.set(Vec2::new(3.0, 4.0));
        assert_eq!(viewer.position(), Vec2::new(3.0, 4.0));
        viewer.translate(Vec2::new(1.0, 0.0));
        assert_eq!(other.position(), Vec2::new(4.0, 4.0));
    }

    #[test]
    fn test_closure_source() {
        let source = || Vec2::splat(7.0);
        assert_eq!(source.position(), Vec2::splat(7.0));
    }
}
