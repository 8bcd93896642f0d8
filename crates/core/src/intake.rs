//! Intake record and the per-step form collectors.
//!
//! Each wizard step submits a raw form. The basic-data form is gated by [`BasicDataForm::is_complete`];
//! the other steps accept whatever was entered. Collected values are stored on the
//! [`IntakeRecord`] owned by the session.

use crate::multiselect::{MultiSelect, Selection, ALLERGY_OPTIONS, CONDITION_OPTIONS};
use crate::questions::AnswerRecord;
use crate::reference::ReferenceCode;
use crate::{TriageError, TriageResult};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use triage_types::{NonEmptyText, SingleLineText};

/// Format accepted for birthdates.
pub const BIRTHDATE_FORMAT: &str = "%Y-%m-%d";

/// Who is using the kiosk.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Staff,
}

/// Identity document kinds accepted at reception.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DocumentType {
    #[serde(rename = "CC")]
    CitizenshipCard,
    #[serde(rename = "TI")]
    IdentityCard,
    #[serde(rename = "RC")]
    BirthRegistry,
    #[serde(rename = "PS")]
    Passport,
}

impl DocumentType {
    pub fn code(self) -> &'static str {
        match self {
            DocumentType::CitizenshipCard => "CC",
            DocumentType::IdentityCard => "TI",
            DocumentType::BirthRegistry => "RC",
            DocumentType::Passport => "PS",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DocumentType::CitizenshipCard => "Cédula de Ciudadanía",
            DocumentType::IdentityCard => "Tarjeta de Identidad",
            DocumentType::BirthRegistry => "Registro Civil de Nacimiento",
            DocumentType::Passport => "Pasaporte",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// One-letter code used in the dashboard's age/sex column.
    pub fn code(self) -> &'static str {
        match self {
            Sex::Male => "M",
            Sex::Female => "F",
        }
    }

    pub fn from_code(code: &str) -> TriageResult<Self> {
        match code.trim() {
            "M" | "m" => Ok(Sex::Male),
            "F" | "f" => Ok(Sex::Female),
            other => Err(TriageError::InvalidInput(format!("unknown sex code: {other:?}"))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum PregnancyAnswer {
    Yes,
    No,
    Unsure,
}

/// Full years between `birthdate` and `today`.
///
/// A birthday that has not yet come round this year does not count. Birthdates after `today`
/// give zero.
pub fn age_on(birthdate: NaiveDate, today: NaiveDate) -> u32 {
    let mut age = today.year() - birthdate.year();
    if (today.month(), today.day()) < (birthdate.month(), birthdate.day()) {
        age -= 1;
    }
    u32::try_from(age).unwrap_or(0)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AgeAssessment {
    pub age: u32,
    pub high_risk: bool,
}

pub fn assess_age(birthdate: NaiveDate, today: NaiveDate, high_risk_age: u32) -> AgeAssessment {
    let age = age_on(birthdate, today);
    AgeAssessment {
        age,
        high_risk: age >= high_risk_age,
    }
}

pub fn parse_birthdate(input: &str) -> TriageResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), BIRTHDATE_FORMAT)
        .map_err(|_| TriageError::InvalidDate(input.to_string()))
}

/// Raw basic-data form as typed by the patient. Every field may be blank.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct BasicDataForm {
    pub full_name: String,
    /// `YYYY-MM-DD`.
    pub birthdate: String,
    pub document_type: Option<DocumentType>,
    pub document_number: String,
    pub sex: Option<Sex>,
    pub pregnant: Option<PregnancyAnswer>,
    pub emergency_contact_name: String,
    pub emergency_contact_phone: String,
}

impl BasicDataForm {
    pub fn pregnancy_question_visible(&self) -> bool {
        self.sex == Some(Sex::Female)
    }

    /// Whether the register action is enabled.
    ///
    /// Every required field must be filled in, and a pregnancy answer must be present when the
    /// patient is female.
    pub fn is_complete(&self) -> bool {
        let filled = |s: &str| !s.trim().is_empty();
        let pregnancy_answered = !self.pregnancy_question_visible() || self.pregnant.is_some();

        filled(&self.full_name)
            && parse_birthdate(&self.birthdate).is_ok()
            && self.document_type.is_some()
            && filled(&self.document_number)
            && self.sex.is_some()
            && filled(&self.emergency_contact_name)
            && filled(&self.emergency_contact_phone)
            && pregnancy_answered
    }

    /// Age and high-risk flag for the birthdate typed so far, if it parses.
    pub fn age_preview(&self, today: NaiveDate, high_risk_age: u32) -> Option<AgeAssessment> {
        parse_birthdate(&self.birthdate)
            .ok()
            .map(|birthdate| assess_age(birthdate, today, high_risk_age))
    }

    /// Validate the form and build the identity part of the intake record.
    ///
    /// # Errors
    ///
    /// Returns [`TriageError::IncompleteForm`] when [`is_complete`](Self::is_complete) is false,
    /// [`TriageError::InvalidDate`] for a birthdate after `today`, and
    /// [`TriageError::InvalidInput`] for multi-line text in single-line fields.
    pub fn collect(&self, today: NaiveDate, high_risk_age: u32) -> TriageResult<IdentityData> {
        if !self.is_complete() {
            return Err(TriageError::IncompleteForm("basic data"));
        }
        let (Some(document_type), Some(sex)) = (self.document_type, self.sex) else {
            return Err(TriageError::IncompleteForm("basic data"));
        };

        let birthdate = parse_birthdate(&self.birthdate)?;
        if birthdate > today {
            return Err(TriageError::InvalidDate(self.birthdate.clone()));
        }
        let assessment = assess_age(birthdate, today, high_risk_age);

        Ok(IdentityData {
            full_name: single_line("full_name", &self.full_name)?,
            birthdate,
            age: assessment.age,
            high_risk: assessment.high_risk,
            document_type,
            document_number: single_line("document_number", &self.document_number)?,
            sex,
            pregnant: match sex {
                Sex::Female => self.pregnant,
                Sex::Male => None,
            },
            emergency_contact: EmergencyContact {
                name: single_line("emergency_contact_name", &self.emergency_contact_name)?,
                phone: single_line("emergency_contact_phone", &self.emergency_contact_phone)?,
            },
        })
    }
}

fn single_line(field: &str, value: &str) -> TriageResult<SingleLineText> {
    SingleLineText::new(value).map_err(|e| TriageError::InvalidInput(format!("{field}: {e}")))
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct EmergencyContact {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub name: SingleLineText,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub phone: SingleLineText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IdentityData {
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub full_name: SingleLineText,
    pub birthdate: NaiveDate,
    pub age: u32,
    pub high_risk: bool,
    pub document_type: DocumentType,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub document_number: SingleLineText,
    pub sex: Sex,
    pub pregnant: Option<PregnancyAnswer>,
    pub emergency_contact: EmergencyContact,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct MedicalHistoryForm {
    pub allergies: Vec<String>,
    pub other_allergies: String,
    pub conditions: Vec<String>,
    pub other_conditions: String,
    pub surgeries: String,
}

impl MedicalHistoryForm {
    pub fn collect(&self) -> TriageResult<MedicalHistory> {
        let allergies =
            MultiSelect::from_codes(ALLERGY_OPTIONS, &self.allergies, &self.other_allergies)?;
        let conditions =
            MultiSelect::from_codes(CONDITION_OPTIONS, &self.conditions, &self.other_conditions)?;

        Ok(MedicalHistory {
            allergies: allergies.to_selection(),
            conditions: conditions.to_selection(),
            surgeries: NonEmptyText::optional(&self.surgeries),
        })
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MedicalHistory {
    pub allergies: Selection,
    pub conditions: Selection,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub surgeries: Option<NonEmptyText>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct SymptomsForm {
    pub main_symptoms: String,
    /// Free-form duration chosen from the duration dropdown (for example `hours`, `days`).
    pub duration: String,
}

impl SymptomsForm {
    pub fn collect(&self) -> Complaint {
        Complaint {
            text: self.main_symptoms.trim().to_string(),
            duration: NonEmptyText::optional(&self.duration),
        }
    }
}

/// Chief complaint. The text may be empty; the question generator then falls back to its
/// general questionnaire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Complaint {
    pub text: String,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub duration: Option<NonEmptyText>,
}

/// Everything collected over one pass through the wizard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IntakeRecord {
    pub role: Option<Role>,
    pub identity: Option<IdentityData>,
    pub medical_history: Option<MedicalHistory>,
    pub complaint: Option<Complaint>,
    pub answers: Vec<AnswerRecord>,
    pub reference: Option<ReferenceCode>,
}

impl IntakeRecord {
    pub fn is_high_risk(&self) -> bool {
        self.identity.as_ref().is_some_and(|i| i.high_risk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn complete_male_form() -> BasicDataForm {
        BasicDataForm {
            full_name: "Luis Gómez".into(),
            birthdate: "1980-04-02".into(),
            document_type: Some(DocumentType::CitizenshipCard),
            document_number: "1020304050".into(),
            sex: Some(Sex::Male),
            pregnant: None,
            emergency_contact_name: "Marta Gómez".into(),
            emergency_contact_phone: "555-0101".into(),
        }
    }

    #[test]
    fn age_counts_only_completed_birthdays() {
        let today = date(2026, 10, 19);
        assert_eq!(age_on(date(1961, 10, 19), today), 65);
        assert_eq!(age_on(date(1961, 10, 20), today), 64);
        assert_eq!(age_on(date(1961, 11, 1), today), 64);
        assert_eq!(age_on(date(2030, 1, 1), today), 0);
    }

    #[test]
    fn high_risk_alert_starts_at_threshold() {
        let today = date(2026, 10, 19);
        assert!(assess_age(date(1961, 10, 19), today, 65).high_risk);
        assert!(!assess_age(date(1961, 10, 20), today, 65).high_risk);
    }

    #[test]
    fn female_needs_pregnancy_answer() {
        let mut form = complete_male_form();
        assert!(form.is_complete());
        assert!(!form.pregnancy_question_visible());

        form.sex = Some(Sex::Female);
        assert!(form.pregnancy_question_visible());
        assert!(!form.is_complete());

        form.pregnant = Some(PregnancyAnswer::No);
        assert!(form.is_complete());
    }

    #[test]
    fn each_required_field_gates_completion() {
        let blanks: [fn(&mut BasicDataForm); 7] = [
            |f| f.full_name = "  ".into(),
            |f| f.birthdate = "".into(),
            |f| f.document_type = None,
            |f| f.document_number = "".into(),
            |f| f.sex = None,
            |f| f.emergency_contact_name = "".into(),
            |f| f.emergency_contact_phone = "".into(),
        ];
        for blank in blanks {
            let mut form = complete_male_form();
            blank(&mut form);
            assert!(!form.is_complete(), "{form:?}");
        }
    }

    #[test]
    fn collect_drops_pregnancy_answer_for_male_patients() {
        let mut form = complete_male_form();
        form.pregnant = Some(PregnancyAnswer::Yes);
        let identity = form.collect(date(2026, 10, 19), 65).unwrap();

        assert_eq!(identity.age, 46);
        assert!(!identity.high_risk);
        assert_eq!(identity.pregnant, None);
        assert_eq!(identity.full_name.as_str(), "Luis Gómez");
    }

    #[test]
    fn collect_rejects_incomplete_and_future_birthdates() {
        let mut form = complete_male_form();
        form.sex = None;
        assert!(matches!(
            form.collect(date(2026, 10, 19), 65),
            Err(TriageError::IncompleteForm(_))
        ));

        let mut form = complete_male_form();
        form.birthdate = "2027-01-01".into();
        assert!(matches!(
            form.collect(date(2026, 10, 19), 65),
            Err(TriageError::InvalidDate(_))
        ));
    }

    #[test]
    fn medical_history_keeps_other_text_only_with_other_code() {
        let form = MedicalHistoryForm {
            allergies: vec!["penicillin".into(), "other".into()],
            other_allergies: "Ibuprofeno".into(),
            conditions: vec!["diabetes".into()],
            other_conditions: "ignored".into(),
            surgeries: "   ".into(),
        };
        let history = form.collect().unwrap();

        assert_eq!(history.allergies.labels, vec!["Penicilina", "Otra"]);
        assert_eq!(
            history.allergies.other.as_ref().map(NonEmptyText::as_str),
            Some("Ibuprofeno")
        );
        assert!(history.conditions.other.is_none());
        assert!(history.surgeries.is_none());
    }
}
