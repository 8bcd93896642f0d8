//! # Triage Core
//!
//! Core logic for the patient intake wizard and the staff triage dashboard.
//!
//! This crate contains pure, in-memory operations:
//! - The wizard flow (both variants) and per-session intake state
//! - Form collectors, the basic-data gate, age and high-risk assessment
//! - The keyword-driven follow-up question generator
//! - Dashboard filter/sort over demo fixtures, history lookups and evaluations
//!
//! **No API concerns**: HTTP servers and command-line handling belong in `api-rest` and
//! `triage-cli`. Nothing here reads environment variables or persists data.

pub mod auth;
pub mod clock;
pub mod config;
pub mod constants;
pub mod dashboard;
pub mod error;
pub mod esi;
pub mod evaluation;
pub mod fixtures;
pub mod intake;
pub mod multiselect;
pub mod notice;
pub mod questions;
pub mod reference;
pub mod session;
pub mod wizard;

pub use config::CoreConfig;
pub use dashboard::{Dashboard, DashboardFilter, SortKey};
pub use error::{TriageError, TriageResult};
pub use esi::EsiLevel;
pub use fixtures::FixtureBook;
pub use questions::{generate_questions, Question, QuestionGenerator};
pub use reference::ReferenceCode;
pub use session::{IntakeSession, SessionAction, SessionView};
pub use wizard::{FlowDefinition, FlowVariant, StepController, StepKind};
