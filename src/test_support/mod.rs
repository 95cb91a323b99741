//! Shared fixtures for unit tests.

pub(crate) mod fake_source;
pub(crate) mod socket_guard;
