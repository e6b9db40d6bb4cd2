#![warn(clippy::all, missing_docs)]

//! Core domain logic for the innkeep room-booking ledger.
//!
//! This crate hosts the data models, configuration handling,
//! ledger persistence, and the front-desk state machine used by
//! the terminal UI and any future frontends.

pub mod config;
pub mod desk;
pub mod ledger;
pub mod models;
pub mod payment;

pub use config::AppConfig;
pub use desk::{default_inventory, Confirmation, DeskError, FrontDesk, RestoreOutcome};
pub use ledger::{LedgerSnapshot, LedgerStore};
pub use models::{Reservation, Room};
pub use payment::PaymentClerk;
