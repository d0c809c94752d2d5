//! Alignment kernels: the fast substitution-only scan ([`nodp`]) and the
//! banded affine-gap dynamic-programming fallback ([`odpd`]).

pub mod nodp;
pub mod odpd;

pub use nodp::no_dp;
pub use odpd::odpd;
