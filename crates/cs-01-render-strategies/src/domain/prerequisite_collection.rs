//! Per-component set of prerequisites, partitioned by lifecycle phase.
//!
//! Prerequisites that allow initialization are checked after the component
//! initializes and gate only the on-initialized hooks; all others are
//! checked before initialization starts. Each partition is awaited
//! concurrently.

use std::time::Duration;

use futures::future::join_all;
use parking_lot::Mutex;
use tracing::debug;

use super::prerequisite::Prerequisite;
use crate::error::{LifecycleError, TimeoutError};

/// Prerequisites owned by one component, keyed by instance identity.
#[derive(Default)]
pub struct PrerequisiteCollection {
    entries: Mutex<Vec<Prerequisite>>,
}

impl PrerequisiteCollection {
    /// Empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a prerequisite. Fails if this exact instance is already present.
    pub fn add(&self, prerequisite: Prerequisite) -> Result<Prerequisite, LifecycleError> {
        let mut entries = self.entries.lock();
        if entries.iter().any(|p| p.ptr_eq(&prerequisite)) {
            return Err(LifecycleError::invalid_operation(
                "The prerequisite is already in the collection.",
            ));
        }
        entries.push(prerequisite.clone());
        Ok(prerequisite)
    }

    /// Add a manual prerequisite with default settings.
    pub fn add_manual(
        &self,
        requirement: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Result<Prerequisite, LifecycleError> {
        self.add(Prerequisite::manual(requirement).build())
    }

    /// Add an automatic prerequisite polled every `period`.
    pub fn add_automatic(
        &self,
        period: Duration,
        requirement: impl Fn() -> bool + Send + Sync + 'static,
    ) -> Result<Prerequisite, LifecycleError> {
        self.add(Prerequisite::automatic(period, requirement).build())
    }

    /// Remove this exact instance. Fails if it is not present.
    pub fn remove(&self, prerequisite: &Prerequisite) -> Result<(), LifecycleError> {
        let mut entries = self.entries.lock();
        let position = entries
            .iter()
            .position(|p| p.ptr_eq(prerequisite))
            .ok_or_else(|| {
                LifecycleError::invalid_operation("The prerequisite was not found in the collection.")
            })?;
        entries.remove(position);
        Ok(())
    }

    /// True if this exact instance is present.
    pub fn contains(&self, prerequisite: &Prerequisite) -> bool {
        self.entries.lock().iter().any(|p| p.ptr_eq(prerequisite))
    }

    /// Number of prerequisites in both partitions.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// True when no prerequisite was added.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Prerequisites that must hold before the component initializes.
    pub fn before_initialization(&self) -> Vec<Prerequisite> {
        self.partition(false)
    }

    /// Prerequisites that allow initialization and gate only the
    /// on-initialized hooks.
    pub fn after_initialization(&self) -> Vec<Prerequisite> {
        self.partition(true)
    }

    /// Await every before-initialization prerequisite concurrently.
    ///
    /// All of them run to completion; the first failure is returned.
    pub async fn ensure_before_initialization(&self) -> Result<(), TimeoutError> {
        ensure_all("before-initialization", self.before_initialization()).await
    }

    /// Await every after-initialization prerequisite concurrently.
    pub async fn ensure_after_initialization(&self) -> Result<(), TimeoutError> {
        ensure_all("after-initialization", self.after_initialization()).await
    }

    fn partition(&self, allow_initialization: bool) -> Vec<Prerequisite> {
        self.entries
            .lock()
            .iter()
            .filter(|p| p.allows_initialization() == allow_initialization)
            .cloned()
            .collect()
    }
}

async fn ensure_all(partition: &str, prerequisites: Vec<Prerequisite>) -> Result<(), TimeoutError> {
    if prerequisites.is_empty() {
        return Ok(());
    }
    debug!(partition, count = prerequisites.len(), "ensuring prerequisites");
    join_all(prerequisites.iter().map(|p| p.ensure()))
        .await
        .into_iter()
        .collect()
}
