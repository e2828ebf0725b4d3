//! Parameter update rules
//!
//! Optimizers turn a batch's summed gradients into parameter changes. The
//! layer owns its velocity buffers; the optimizer only carries the
//! coefficients for one run.

pub mod sgd;

pub use sgd::MomentumSgd;
