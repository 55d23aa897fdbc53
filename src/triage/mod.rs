//! Deterministic clinical triage.
//!
//! Component order inside [`TriagePipeline::triage`]:
//! consistency check → override guard → classifier → deterioration →
//! digital twin → department routing → insurance → capacity lookup.
//!
//! Every component except the classifier is a pure function of the
//! normalized patient snapshot.

pub mod classifier;
pub mod department;
pub mod deterioration;
pub mod digital_twin;
pub mod insurance;
pub mod messages;
pub mod orchestrator;
pub mod override_guard;
pub mod resources;
pub mod rules;
pub mod scoring;
pub mod symptom_checker;
pub mod types;

pub use classifier::{BaselineClassifier, ClassifierError, ClassifierOutput, FeatureVector, RiskClassifier};
pub use orchestrator::TriagePipeline;
pub use resources::{CapacityStatus, ResourceError, ResourceLookup, ResourceStore};
pub use types::{TriageError, TriageResult};
