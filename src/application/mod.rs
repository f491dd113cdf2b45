//! Application layer orchestrating the domain ports.
//!
//! [`pipeline::PaymentPipeline`] is the payment state machine. The balance
//! synchronizer, session controller and payment desk are the stateful
//! collaborators a dashboard holds around it.

pub mod balance;
pub mod desk;
pub mod pipeline;
pub mod session;
