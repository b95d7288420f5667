//! Deterministic fakes and expectation mocks shared by the test suite

pub mod fakes;

#[cfg(feature = "mocks")]
pub mod mocks;

pub use fakes::*;
#[cfg(feature = "mocks")]
pub use mocks::*;
