//! Helpers shared by unit tests.

pub mod fake_transport;
pub mod socket_guard;
