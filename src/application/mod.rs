//! Application layer containing the payment polling orchestration.
//!
//! `session` owns the timer-driven status polling, `flows` decides what a
//! finished poll means for each page, and `checkout` drives the demo shop
//! from order creation to the simulated provider answer.

pub mod checkout;
pub mod flows;
pub mod session;
