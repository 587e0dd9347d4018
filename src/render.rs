//! Renderer collaborator interface
//!
//! The core never draws. It tells the renderer when a projectile appears,
//! where it is each frame, and when it's gone.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sim::{Pose, ProjectileConfig, ProjectileId};

/// Receives projectile presentation updates
pub trait RenderSink {
    /// A projectile was thrown
    fn deploy(&mut self, id: ProjectileId, config: &ProjectileConfig);
    /// Per-frame placement
    fn pose(&mut self, id: ProjectileId, pose: Pose);
    /// The projectile is finished; drop its visuals
    fn remove(&mut self, id: ProjectileId);
}

/// Renderer that ignores everything (headless use)
#[derive(Debug, Default, Clone, Copy)]
pub struct NullRenderer;

impl RenderSink for NullRenderer {
    fn deploy(&mut self, _id: ProjectileId, _config: &ProjectileConfig) {}
    fn pose(&mut self, _id: ProjectileId, _pose: Pose) {}
    fn remove(&mut self, _id: ProjectileId) {}
}

/// Recorded renderer call
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    Deploy(ProjectileId, String),
    Pose(ProjectileId, Pose),
    Remove(ProjectileId),
}

/// Renderer that keeps a shared log of calls
///
/// Clones share the log, so a test can hand one clone to the controller and
/// inspect the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    calls: Rc<RefCell<Vec<RenderCall>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<RenderCall> {
        self.calls.borrow().clone()
    }

    pub fn deployed(&self) -> Vec<ProjectileId> {
        self.filter(|call| match call {
            RenderCall::Deploy(id, _) => Some(*id),
            _ => None,
        })
    }

    pub fn removed(&self) -> Vec<ProjectileId> {
        self.filter(|call| match call {
            RenderCall::Remove(id) => Some(*id),
            _ => None,
        })
    }

    /// Latest pose sent for `id`
    pub fn last_pose(&self, id: ProjectileId) -> Option<Pose> {
        self.calls.borrow().iter().rev().find_map(|call| match call {
            RenderCall::Pose(pid, pose) if *pid == id => Some(*pose),
            _ => None,
        })
    }

    fn filter(&self, pick: impl Fn(&RenderCall) -> Option<ProjectileId>) -> Vec<ProjectileId> {
        self.calls.borrow().iter().filter_map(pick).collect()
    }
}

impl RenderSink for RecordingRenderer {
    fn deploy(&mut self, id: ProjectileId, config: &ProjectileConfig) {
        self.calls
            .borrow_mut()
            .push(RenderCall::Deploy(id, config.symbol.clone()));
    }

    fn pose(&mut self, id: ProjectileId, pose: Pose) {
        self.calls.borrow_mut().push(RenderCall::Pose(id, pose));
    }

    fn remove(&mut self, id: ProjectileId) {
        self.calls.borrow_mut().push(RenderCall::Remove(id));
    }
}
