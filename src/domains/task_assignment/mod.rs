pub mod aggregate;
pub mod events;
pub mod filters;
pub mod geo;
pub mod ports;
pub mod projections;
pub mod selector;
pub mod types;

pub use aggregate::*;
pub use events::*;
pub use filters::*;
pub use geo::*;
pub use ports::*;
pub use projections::*;
pub use selector::*;
pub use types::*;
