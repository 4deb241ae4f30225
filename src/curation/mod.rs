//! Name curation: validation, adaptive sampling and the two batch
//! directions built on them.

pub mod classifier;
pub mod cleaning;
pub mod domain;
pub mod generation;
pub mod local;
pub mod orchestrator;
pub mod registry;
pub mod report;
pub mod rows;
pub mod sampler;
pub mod source;
pub mod stats;
pub mod validation;

pub use domain::{Candidate, CountryCode, Gender, RejectionReason, ValidationOutcome};
pub use validation::{ValidationConfig, ValidationPipeline};
