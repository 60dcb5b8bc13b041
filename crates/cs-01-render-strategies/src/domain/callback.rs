use std::sync::Arc;

use parking_lot::Mutex;

use super::prerequisite::Prerequisite;

/// Fans a completion notification out to every attached prerequisite.
///
/// Hand one of these to whatever produces the awaited condition; it calls
/// [`invoke`](Self::invoke) once the condition may have changed.
#[derive(Clone, Default)]
pub struct PrerequisiteCallback {
    prerequisites: Arc<Mutex<Vec<Prerequisite>>>,
}

impl PrerequisiteCallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a prerequisite. Attaching the same instance twice is a no-op.
    pub fn attach(&self, prerequisite: &Prerequisite) {
        let mut prerequisites = self.prerequisites.lock();
        if !prerequisites.iter().any(|p| p.ptr_eq(prerequisite)) {
            prerequisites.push(prerequisite.clone());
        }
    }

    pub fn invoke(&self) {
        let attached = self.prerequisites.lock().clone();
        for prerequisite in attached {
            prerequisite.notify_completion();
        }
    }

    pub fn len(&self) -> usize {
        self.prerequisites.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.prerequisites.lock().is_empty()
    }
}
