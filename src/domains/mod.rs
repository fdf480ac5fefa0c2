pub mod identity;
pub mod logger;
pub mod task_assignment;

// Contexts share submodule names, so only the logger is flattened.
pub use logger::{DomainLogger, DynLogger, FileLogger};
