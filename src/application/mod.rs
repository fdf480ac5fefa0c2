mod audit;
pub mod auth_service;
pub mod profile_service;
pub mod task_service;

pub use auth_service::*;
pub use profile_service::*;
pub use task_service::*;
