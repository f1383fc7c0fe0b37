pub mod supervisor;

pub use supervisor::{ConsoleLine, ConsoleStream, ProcessSupervisor, ServerProcess};
