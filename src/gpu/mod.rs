//! GPU kernels and host-side launches for the accelerator backend.

pub(crate) mod constants;
mod kernels;
mod launch;


pub(crate) use kernels::*;
pub(crate) use launch::{backward_on, forward_on, supports_float_atomics};
