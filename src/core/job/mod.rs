//! Job lifecycle: orchestration, state, progress and publishing

pub mod orchestrator;
pub mod progress;
pub mod publish;
pub mod state;

pub use orchestrator::{JobOrchestrator, JobRequest};
pub use progress::{NoopProgressSink, ProgressSink, StatusTableSink};
pub use publish::ExportPublisher;
pub use state::JobStateStore;
