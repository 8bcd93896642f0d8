//! Constants used throughout the triage core crate.
//!
//! Literal values that the wizard, the dashboard and the surfaces must agree on live here.

/// Prefix of the reference code handed to a patient at the end of the intake.
pub const REFERENCE_PREFIX: &str = "PRE";

/// Smallest numeric part of a reference code.
pub const REFERENCE_MIN: u32 = 10_000;

/// Largest numeric part of a reference code.
pub const REFERENCE_MAX: u32 = 99_999;

/// Age (in full years) from which the high-risk alert is shown.
pub const DEFAULT_HIGH_RISK_AGE: u32 = 65;

/// Seconds between refreshes of the dashboard clock.
pub const CLOCK_REFRESH_SECS: u64 = 60;

/// Option code meaning "no allergies" / "no conditions".
pub const NONE_CODE: &str = "none";

/// Option code that reveals the free-text elaboration field.
pub const OTHER_CODE: &str = "other";

/// Summary shown by a multi-select with nothing selected.
pub const EMPTY_SELECTION_TEXT: &str = "Seleccione...";

/// Demo fixtures compiled into the binary.
pub const DEFAULT_FIXTURES_YAML: &str = include_str!("../fixtures/demo_patients.yaml");

/// Default REST bind address.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Seconds without a request after which an intake session is dropped.
pub const SESSION_IDLE_SECS: u64 = 30 * 60;
