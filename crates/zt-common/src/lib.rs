//! Shared domain model, repository traits, and the injected clock
//! abstraction for the zero-trust control plane. This crate has no
//! knowledge of transport (gRPC), cryptography, or policy evaluation — those
//! live in `zt-crypto`, `zt-policy`, and `zt-auth` respectively, which all
//! depend on this crate rather than the other way around.

pub mod clock;
pub mod domain;
pub mod error;

pub use clock::{Clock, FixedClock, SystemClock};
pub use domain::*;
pub use error::*;
