//! Domain types, pure validators and the ports the application drives.

pub mod address;
pub mod amount;
pub mod envelope;
pub mod ledger;
pub mod network;
pub mod ports;
pub mod session;
pub mod transaction;
