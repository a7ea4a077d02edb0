//! Concurrent PBR texture generation over the `pbrgen-pipeline`
//! operators.
//!
//! A [`Generator`] accepts a source image and runs a fixed
//! thirteen-task dependency graph producing pre-computed variant
//! pairs for each output channel (albedo, height, normal, occlusion,
//! metallic). Finished runs install a [`VariantCache`]; slider
//! adjustments then blend cached pairs in a single pixel pass instead
//! of re-running the heavy operators.
//!
//! Runs are cancellable at operator boundaries and report per-task
//! timing through [`RunDiagnostics`].

pub mod cache;
pub mod diagnostics;
pub mod error;
mod graph;
pub mod scheduler;
mod slot;
mod task;

pub use cache::{Channel, GenerationSettings, VariantCache};
pub use diagnostics::{RunDiagnostics, TaskDiagnostics};
pub use error::GenerateError;
pub use graph::TASK_COUNT;
pub use scheduler::{Generator, Progress, RunHandle, RunStatus};
