use glam::Vec3;
use smallvec::SmallVec;

/// Raw input from the grabbable target and the controller holding it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputEvent {
    Grabbed,
    Ungrabbed,
    /// Trigger crossed its press threshold; `controller_up` is the
    /// controller's local up axis in world space at that moment.
    TriggerPressed { controller_up: Vec3 },
    TriggerReleased,
    TriggerAxisChanged { pressure: f32 },
    /// The device layer lost its controller setup.
    ControllerLost,
}

/// A trigger press as seen by the gesture detector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerPress {
    pub time: f64,
    pub controller_up: Vec3,
}

/// Events collected between two frames, drained in arrival order. Each
/// carries the clock time it was observed at.
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: SmallVec<[(f64, InputEvent); 8]>,
}

impl EventQueue {
    pub fn push(&mut self, event: InputEvent, at: f64) {
        self.pending.push((at, event));
    }

    pub fn take(&mut self) -> SmallVec<[(f64, InputEvent); 8]> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
