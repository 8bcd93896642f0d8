//! Vital-signs evaluation opened from a dashboard row.

use crate::esi::EsiLevel;
use crate::fixtures::FixtureBook;
use crate::notice::Notice;
use crate::reference::ReferenceCode;
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};

/// Patient name and reason for visit shown at the top of the evaluation overlay.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EvaluationHeader {
    pub reference: ReferenceCode,
    pub patient_name: String,
    pub reason: String,
    pub current_esi: EsiLevel,
}

pub fn evaluation_header(
    book: &FixtureBook,
    reference: ReferenceCode,
) -> TriageResult<EvaluationHeader> {
    let row = book.row(reference)?;
    Ok(EvaluationHeader {
        reference,
        patient_name: row.name.clone(),
        reason: row.complaint.clone(),
        current_esi: row.esi,
    })
}

/// Vital signs as entered by staff. Unmeasured values are left out.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct VitalSignsForm {
    /// mmHg.
    pub systolic: Option<u16>,
    /// mmHg.
    pub diastolic: Option<u16>,
    /// Beats per minute.
    pub heart_rate: Option<u16>,
    /// Breaths per minute.
    pub respiratory_rate: Option<u16>,
    /// Degrees Celsius.
    pub temperature: Option<f32>,
    /// Percent.
    pub oxygen_saturation: Option<u8>,
    /// Level picked with the ESI buttons.
    pub esi: Option<EsiLevel>,
    pub notes: String,
}

fn check_range<T: PartialOrd + std::fmt::Display + Copy>(
    field: &str,
    value: Option<T>,
    min: T,
    max: T,
) -> TriageResult<()> {
    match value {
        Some(v) if v < min || v > max => Err(TriageError::InvalidInput(format!(
            "{field} must be within {min}..={max}, got {v}"
        ))),
        _ => Ok(()),
    }
}

impl VitalSignsForm {
    /// Reject readings outside physiologically plausible bounds.
    pub fn validate(&self) -> TriageResult<()> {
        check_range("systolic", self.systolic, 40, 300)?;
        check_range("diastolic", self.diastolic, 20, 200)?;
        check_range("heart_rate", self.heart_rate, 20, 300)?;
        check_range("respiratory_rate", self.respiratory_rate, 4, 80)?;
        check_range("temperature", self.temperature, 30.0, 45.0)?;
        check_range("oxygen_saturation", self.oxygen_saturation, 50, 100)?;

        if let (Some(sys), Some(dia)) = (self.systolic, self.diastolic) {
            if dia >= sys {
                return Err(TriageError::InvalidInput(format!(
                    "diastolic ({dia}) must be below systolic ({sys})"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SavedEvaluation {
    pub reference: ReferenceCode,
    pub vitals: VitalSignsForm,
    pub notice: Notice,
}

/// Validate and accept an evaluation. Nothing is written anywhere; callers may keep the result
/// in memory.
pub fn save_evaluation(
    book: &FixtureBook,
    reference: ReferenceCode,
    vitals: VitalSignsForm,
) -> TriageResult<SavedEvaluation> {
    book.row(reference)?;
    vitals.validate()?;

    tracing::info!(%reference, esi = ?vitals.esi, "evaluation saved");
    Ok(SavedEvaluation {
        reference,
        vitals,
        notice: Notice::evaluation_saved(),
    })
}

pub fn request_report() -> Notice {
    tracing::info!("report requested");
    Notice::report_requested()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_FIXTURES_YAML;

    fn book() -> FixtureBook {
        FixtureBook::parse(DEFAULT_FIXTURES_YAML).unwrap()
    }

    fn carlos() -> ReferenceCode {
        ReferenceCode::parse("PRE-12345").unwrap()
    }

    #[test]
    fn header_names_patient_and_reason() {
        let header = evaluation_header(&book(), carlos()).unwrap();
        assert_eq!(header.patient_name, "Carlos Rodríguez");
        assert_eq!(header.reason, "Dolor de pecho intenso");
    }

    #[test]
    fn save_returns_confirmation_notice() {
        let vitals = VitalSignsForm {
            systolic: Some(150),
            diastolic: Some(95),
            heart_rate: Some(110),
            temperature: Some(37.2),
            esi: Some(EsiLevel::Emergency),
            ..Default::default()
        };
        let saved = save_evaluation(&book(), carlos(), vitals).unwrap();
        assert_eq!(saved.notice.message, "Evaluación guardada correctamente.");
        assert_eq!(saved.vitals.esi, Some(EsiLevel::Emergency));
    }

    #[test]
    fn save_rejects_implausible_vitals_and_unknown_patients() {
        let vitals = VitalSignsForm {
            oxygen_saturation: Some(120),
            ..Default::default()
        };
        assert!(matches!(
            save_evaluation(&book(), carlos(), vitals),
            Err(TriageError::InvalidInput(_))
        ));

        let inverted = VitalSignsForm {
            systolic: Some(80),
            diastolic: Some(90),
            ..Default::default()
        };
        assert!(inverted.validate().is_err());

        let unknown = ReferenceCode::parse("PRE-99999").unwrap();
        assert!(matches!(
            save_evaluation(&book(), unknown, VitalSignsForm::default()),
            Err(TriageError::UnknownPatient(_))
        ));
    }

    #[test]
    fn report_request_is_only_a_notice() {
        assert!(request_report().message.starts_with("Generando reporte..."));
    }
}
