pub mod kafka;
pub mod loggers;
pub mod memory_repository;
pub mod notifications;
pub mod password;
pub mod postgres;

pub use kafka::*;
pub use loggers::*;
pub use memory_repository::*;
pub use notifications::*;
pub use password::*;
pub use postgres::*;
