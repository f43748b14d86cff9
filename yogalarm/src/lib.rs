//! Core engine of the temperature alarm appliance.
//!
//! The library holds the parts shared between the binary and its tests: the
//! edge-triggered alarm evaluator with persisted thresholds, the background
//! tone scheduler, the shared-value bindings handed to the presentation layer,
//! and the numeric key-value store interface the evaluator persists through.

pub mod alarm;
pub mod audio;
pub mod binding;
pub mod store;

pub use alarm::{Alarm, AlarmKind};
pub use audio::{Beep, ToneOutput, TonePlayer};
pub use binding::{SharedSlot, ValueBinding};
pub use store::{FileStore, MemoryStore, NumericStore};
