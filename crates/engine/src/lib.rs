//! Rate monitoring engine.
//!
//! This crate contains the alert-decision core: the pure rate evaluator, the
//! poll-cycle monitor, the manual-check trigger, and the vault command
//! surface consumed by the chat front-end.

pub mod evaluator;
pub mod monitor;
pub mod service;
pub mod trigger;

pub use evaluator::{evaluate, Evaluation};
pub use monitor::Monitor;
pub use service::{
    EndpointProvisioner, EnrollRequest, ProvisionError, ServiceError, VaultService,
};
pub use trigger::{check_trigger, CheckTrigger};
