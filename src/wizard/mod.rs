//! Scale questionnaire: linear wizard navigation and scoring.

pub mod controller;
pub mod scoring;

pub use controller::{Advance, WizardController, WizardView};
pub use scoring::{Band, Banding, Baseline, ScoreSummary};
