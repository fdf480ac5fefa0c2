pub mod aggregate;
pub mod events;
pub mod otp;
pub mod ports;
pub mod projections;

pub use aggregate::*;
pub use events::*;
pub use otp::*;
pub use ports::*;
pub use projections::*;
