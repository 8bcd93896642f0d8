//! Demo fixture book for the staff dashboard.
//!
//! The fixture document is YAML with two top-level lists:
//!
//! - `patients`: the dashboard rows, in display order,
//! - `histories`: canned history panels keyed by ESI level.
//!
//! The document is parsed once at startup into a [`FixtureBook`], which the dashboard and the
//! history/evaluation lookups share. A row's history comes from its ESI level; a level with no
//! history entry falls back to [`LevelHistory::unrecorded`].

use crate::dashboard::{parse_arrival, AttendanceStatus, Dashboard, PatientRow};
use crate::esi::EsiLevel;
use crate::intake::Sex;
use crate::reference::ReferenceCode;
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

// ============================================================================
// Public domain-level types
// ============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PriorVisit {
    pub date: String,
    pub reason: String,
    pub esi: EsiLevel,
}

/// History panel contents shared by every patient at one ESI level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LevelHistory {
    pub allergies: String,
    pub conditions: String,
    pub contact: String,
    /// Empty when the panel shows no alert.
    pub alert: String,
    pub visits: Vec<PriorVisit>,
}

impl LevelHistory {
    /// Panel shown for a level without recorded history.
    pub fn unrecorded() -> Self {
        Self {
            allergies: "No registradas".into(),
            conditions: "No registradas".into(),
            contact: "No registrado".into(),
            alert: String::new(),
            visits: Vec::new(),
        }
    }

    pub fn has_alert(&self) -> bool {
        !self.alert.trim().is_empty()
    }
}

/// A dashboard row joined with its level's history panel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PatientDetail {
    pub reference: ReferenceCode,
    pub name: String,
    pub age: u32,
    pub sex: Sex,
    pub age_sex: String,
    pub complaint: String,
    pub esi: EsiLevel,
    pub esi_label: &'static str,
    pub history: LevelHistory,
}

#[derive(Clone, Debug, Default)]
pub struct FixtureBook {
    rows: Vec<PatientRow>,
    histories: BTreeMap<EsiLevel, LevelHistory>,
}

impl FixtureBook {
    /// Parse a fixture document.
    ///
    /// Uses `serde_path_to_error` so a schema mismatch names the failing field
    /// (for example `patients[2].arrival`).
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::FixtureSchema`] if the YAML does not match the document schema
    /// (including unknown keys), and [`TriageError::FixtureInvalid`] if a value is out of range
    /// or a reference/level is repeated.
    pub fn parse(yaml_text: &str) -> TriageResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, FixtureDocument>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>".to_string()
                } else {
                    path
                };
                return Err(TriageError::FixtureSchema {
                    path,
                    message: source.to_string(),
                });
            }
        };

        let book = wire_to_domain(wire)?;
        tracing::info!(
            patients = book.rows.len(),
            histories = book.histories.len(),
            "loaded dashboard fixtures"
        );
        Ok(book)
    }

    pub fn rows(&self) -> &[PatientRow] {
        &self.rows
    }

    pub fn dashboard(&self) -> Dashboard {
        Dashboard::new(self.rows.clone())
    }

    pub fn row(&self, reference: ReferenceCode) -> TriageResult<&PatientRow> {
        self.rows
            .iter()
            .find(|row| row.reference == reference)
            .ok_or_else(|| TriageError::UnknownPatient(reference.to_string()))
    }

    /// History panel for `esi`, or the unrecorded panel if the document has none.
    pub fn history_for(&self, esi: EsiLevel) -> LevelHistory {
        self.histories
            .get(&esi)
            .cloned()
            .unwrap_or_else(LevelHistory::unrecorded)
    }

    pub fn patient_detail(&self, reference: ReferenceCode) -> TriageResult<PatientDetail> {
        let row = self.row(reference)?;
        Ok(PatientDetail {
            reference: row.reference,
            name: row.name.clone(),
            age: row.age,
            sex: row.sex,
            age_sex: row.age_sex(),
            complaint: row.complaint.clone(),
            esi: row.esi,
            esi_label: row.esi.label(),
            history: self.history_for(row.esi),
        })
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FixtureDocument {
    patients: Vec<PatientWire>,
    #[serde(default)]
    histories: Vec<HistoryWire>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    reference: String,
    esi: u8,
    name: String,
    age: u32,
    sex: String,
    arrival: String,
    complaint: String,
    status: AttendanceStatus,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct HistoryWire {
    esi: u8,
    allergies: String,
    conditions: String,
    contact: String,
    #[serde(default)]
    alert: String,
    #[serde(default)]
    visits: Vec<VisitWire>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct VisitWire {
    date: String,
    reason: String,
    esi: u8,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn invalid(msg: String) -> TriageError {
    TriageError::FixtureInvalid(msg)
}

fn wire_to_domain(wire: FixtureDocument) -> TriageResult<FixtureBook> {
    let mut seen = HashSet::new();
    let mut rows = Vec::with_capacity(wire.patients.len());
    for (idx, p) in wire.patients.into_iter().enumerate() {
        let reference = ReferenceCode::parse(&p.reference)
            .map_err(|e| invalid(format!("patients[{idx}].reference: {e}")))?;
        if !seen.insert(reference) {
            return Err(invalid(format!(
                "patients[{idx}].reference: {reference} appears more than once"
            )));
        }
        if p.name.trim().is_empty() {
            return Err(invalid(format!("patients[{idx}].name is empty")));
        }

        rows.push(PatientRow {
            reference,
            esi: EsiLevel::try_from(p.esi)
                .map_err(|e| invalid(format!("patients[{idx}].esi: {e}")))?,
            name: p.name.trim().to_string(),
            age: p.age,
            sex: Sex::from_code(&p.sex).map_err(|e| invalid(format!("patients[{idx}].sex: {e}")))?,
            arrival: parse_arrival(&p.arrival)
                .map_err(|e| invalid(format!("patients[{idx}].arrival: {e}")))?,
            complaint: p.complaint.trim().to_string(),
            status: p.status,
        });
    }

    let mut histories = BTreeMap::new();
    for (idx, h) in wire.histories.into_iter().enumerate() {
        let esi = EsiLevel::try_from(h.esi)
            .map_err(|e| invalid(format!("histories[{idx}].esi: {e}")))?;

        let mut visits = Vec::with_capacity(h.visits.len());
        for (v_idx, v) in h.visits.into_iter().enumerate() {
            visits.push(PriorVisit {
                date: v.date,
                reason: v.reason,
                esi: EsiLevel::try_from(v.esi).map_err(|e| {
                    invalid(format!("histories[{idx}].visits[{v_idx}].esi: {e}"))
                })?,
            });
        }

        let history = LevelHistory {
            allergies: h.allergies,
            conditions: h.conditions,
            contact: h.contact,
            alert: h.alert,
            visits,
        };
        if histories.insert(esi, history).is_some() {
            return Err(invalid(format!(
                "histories[{idx}].esi: level {esi} appears more than once"
            )));
        }
    }

    Ok(FixtureBook { rows, histories })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_FIXTURES_YAML;

    fn demo() -> FixtureBook {
        FixtureBook::parse(DEFAULT_FIXTURES_YAML).expect("demo fixtures parse")
    }

    #[test]
    fn demo_fixtures_cover_every_level() {
        let book = demo();
        assert_eq!(book.rows().len(), 7);
        for level in EsiLevel::ALL {
            assert_ne!(book.history_for(level), LevelHistory::unrecorded(), "{level}");
        }
    }

    #[test]
    fn detail_joins_row_with_level_history() {
        let book = demo();
        let detail = book
            .patient_detail(ReferenceCode::parse("PRE-12345").unwrap())
            .unwrap();

        assert_eq!(detail.name, "Carlos Rodríguez");
        assert_eq!(detail.age_sex, "72/M");
        assert_eq!(detail.complaint, "Dolor de pecho intenso");
        assert_eq!(detail.history.allergies, "Penicilina, Aspirina");
        assert!(detail.history.has_alert());
        assert_eq!(detail.history.visits.len(), 2);
        assert_eq!(detail.history.visits[1].reason, "Infarto agudo de miocardio");
        assert_eq!(detail.history.visits[1].esi, EsiLevel::Resuscitation);
    }

    #[test]
    fn unknown_reference_is_an_error() {
        let err = demo()
            .patient_detail(ReferenceCode::parse("PRE-99999").unwrap())
            .expect_err("unknown");
        assert!(matches!(err, TriageError::UnknownPatient(r) if r == "PRE-99999"));
    }

    #[test]
    fn missing_level_history_falls_back_to_unrecorded() {
        let yaml = r#"
patients:
  - reference: PRE-11111
    esi: 4
    name: Pedro Pérez
    age: 30
    sex: M
    arrival: "12:00"
    complaint: Esguince
    status: waiting
"#;
        let book = FixtureBook::parse(yaml).unwrap();
        let detail = book
            .patient_detail(ReferenceCode::parse("PRE-11111").unwrap())
            .unwrap();

        assert_eq!(detail.history.allergies, "No registradas");
        assert_eq!(detail.history.conditions, "No registradas");
        assert_eq!(detail.history.contact, "No registrado");
        assert!(!detail.history.has_alert());
        assert!(detail.history.visits.is_empty());
    }

    #[test]
    fn schema_mismatch_reports_path() {
        let yaml = r#"
patients:
  - reference: PRE-11111
    esi: 4
    name: Pedro Pérez
    age: 30
    sex: M
    arrival: "12:00"
    complaint: Esguince
    status: waiting
    bed: 3
"#;
        match FixtureBook::parse(yaml) {
            Err(TriageError::FixtureSchema { path, .. }) => assert!(path.starts_with("patients")),
            other => panic!("expected schema error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_bad_values_and_duplicates() {
        let row = |reference: &str, arrival: &str| {
            format!(
                "  - reference: {reference}\n    esi: 2\n    name: X\n    age: 1\n    sex: F\n    arrival: \"{arrival}\"\n    complaint: Y\n    status: waiting\n"
            )
        };

        let bad_time = format!("patients:\n{}", row("PRE-11111", "25:99"));
        assert!(matches!(
            FixtureBook::parse(&bad_time),
            Err(TriageError::FixtureInvalid(msg)) if msg.contains("arrival")
        ));

        let duplicate = format!("patients:\n{}{}", row("PRE-11111", "10:00"), row("PRE-11111", "11:00"));
        assert!(matches!(
            FixtureBook::parse(&duplicate),
            Err(TriageError::FixtureInvalid(msg)) if msg.contains("more than once")
        ));
    }
}
