//! The zero-trust control plane's data model (§3): entities and the
//! repository traits that abstract the opaque store this core is built
//! against. Ids are plain opaque strings per §3, carried as `&str`/`String`
//! at every repository and service boundary.

pub mod model;
pub mod repositories;

pub use model::*;
pub use repositories::*;
