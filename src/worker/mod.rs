//! Device-side execution of claimed jobs.
//!
//! This module covers everything that happens on the verifier after a claim
//! succeeds, plus the background task that keeps the device reachable:
//! - **Dispatch**: hands the SMS to the radio and records the attempt locally
//! - **Confirmation**: finalises the shared job once the radio reports success
//! - **Keep-alive**: periodically probes the network so push delivery stays prompt
//!
//! # Components
//!
//! - [`Dispatcher`]: sends the SMS, appends a log entry, notifies listeners
//! - [`DeliveryConfirmer`]: marks the job sent in the shared store
//! - [`KeepAlivePinger`]: fixed-rate reachability probe
//!
//! # Flow
//!
//! 1. [`Dispatcher::dispatch`] registers the message id and sends
//! 2. The radio outcome arrives through [`PendingDeliveries`](crate::sms::PendingDeliveries)
//! 3. [`DeliveryConfirmer::confirm`] updates the shared store on success only

pub mod confirmer;
pub mod dispatcher;
pub mod keepalive;

pub use confirmer::{ConfirmOutcome, DeliveryConfirmer};
pub use dispatcher::{DispatchOutcome, Dispatcher};
pub use keepalive::{KeepAliveHandle, KeepAlivePinger};
