#![warn(clippy::all, clippy::pedantic)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::return_self_not_must_use
)]

//! Medical symptom-assessment and retrieval-augmented chat service.
//!
//! Two user-facing flows share one gateway: a fixed seven-question symptom
//! assessment that ends in a model-synthesized differential diagnosis, and
//! a conversational QA pipeline grounded in a pre-indexed medical corpus.
//! The assessment's free-text main symptom is screened against keyword
//! tiers; a matched keyword aborts the flow with an emergency referral.

pub mod assessment;
pub mod chat;
pub mod config;
pub mod diagnosis;
pub mod error;
pub mod gateway;
pub mod providers;
pub mod retrieval;
pub mod screening;
pub mod sessions;

pub use config::Config;
pub use error::{MediqError, Result};
