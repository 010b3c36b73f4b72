//! CPU execution backend: rayon data parallelism with lock-free gradient accumulation.

mod atomic;
mod backward;
mod forward;


pub(crate) use backward::pool_backward;
pub(crate) use forward::pool_forward;
