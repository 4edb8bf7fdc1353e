//! Fleet-tracking service integration
//!
//! Everything that talks to the external fleet API lives here: credential
//! rotation, per-vehicle call spacing, the external date format codec, wire
//! payload shapes, and the retrying HTTP client itself.

pub mod client;
pub mod codec;
pub mod rate_limiter;
pub mod token_pool;
pub mod wire;

pub use client::{FleetClient, FleetError};
pub use codec::DateTimeCodec;
pub use rate_limiter::VehicleRateLimiter;
pub use token_pool::TokenPool;
