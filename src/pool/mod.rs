//! Operator options, errors, backend dispatch, and the public entry points.

mod backend;
pub(crate) mod constants;
mod operator;
mod types;
pub(crate) mod utils;

#[cfg(test)]
mod tests;

pub use backend::BackendCapabilities;
pub use operator::{backend_capabilities, backward, forward, PointPool};
pub use types::{ErrorKind, PoolError, PoolOptions};
