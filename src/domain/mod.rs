//! Domain types shared by the poller, the checkout simulator and the adapters.
//!
//! Nothing in here performs I/O; the `ports` module declares the traits that
//! the infrastructure and interface layers implement.

pub mod callback;
pub mod order;
pub mod ports;
pub mod status;
