// # zonecheck-core
//
// Core library for the zonecheck DNS API verification tools.
//
// ## Architecture Overview
//
// - **DirectoryClient**: Trait for the provider's remote management API
// - **RequestObserver**: Diagnostic hook for request lifecycle events
// - **VerificationSequencer**: Scripted create/rename/delete run against one zone
// - **RunRecorder**: Result builder threaded through every step
// - **Report**: The single JSON object each program prints
//
// ## Design Principles
//
// 1. **Sequential**: one remote call at a time, in a fixed order
// 2. **Guarded**: zones that already hold reserved test names are never touched
// 3. **Fail fast**: the first unexpected failure ends the run; nothing is retried
// 4. **Library-First**: the binaries are thin wrappers around this crate

pub mod config;
pub mod error;
pub mod report;
pub mod sequencer;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credentials, SequenceConfig};
pub use error::{Error, Result};
pub use report::{Report, RunRecorder};
pub use sequencer::{SequenceOutcome, VerificationSequencer};
pub use traits::{DirectoryClient, NoopObserver, RequestObserver};
