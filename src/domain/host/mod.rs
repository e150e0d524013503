//! Contracts owned by the host application
//!
//! The host provides the real generation transport, the game-state snapshot
//! and an operator-facing notification surface. This crate only consumes
//! these traits.

mod backend;
mod notifier;
mod snapshot;

pub use backend::GenerationBackend;
pub use notifier::{Notifier, NotifyLevel};
pub use snapshot::StateSnapshotReader;

#[cfg(test)]
pub use backend::mock::RecordingBackend;
#[cfg(test)]
pub use notifier::mock::RecordingNotifier;
#[cfg(test)]
pub use snapshot::MockStateSnapshotReader;
