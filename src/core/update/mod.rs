pub mod orchestrator;

pub use orchestrator::{UpdateOrchestrator, UpdateStage};
