//! Allergy and condition pickers.
//!
//! Both pickers are checkbox lists over a fixed catalog with two special codes: `none`, which
//! is mutually exclusive with everything else, and `other`, which reveals a free-text box.

use crate::constants::{EMPTY_SELECTION_TEXT, NONE_CODE, OTHER_CODE};
use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use triage_types::NonEmptyText;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SelectOption {
    pub code: &'static str,
    pub label: &'static str,
}

const fn opt(code: &'static str, label: &'static str) -> SelectOption {
    SelectOption { code, label }
}

pub const ALLERGY_OPTIONS: &[SelectOption] = &[
    opt("none", "Ninguna"),
    opt("penicillin", "Penicilina"),
    opt("aspirin", "Aspirina"),
    opt("nsaids", "Antiinflamatorios (AINEs)"),
    opt("sulfa", "Sulfas"),
    opt("latex", "Látex"),
    opt("seafood", "Mariscos"),
    opt("pollen", "Polen"),
    opt("other", "Otra"),
];

pub const CONDITION_OPTIONS: &[SelectOption] = &[
    opt("none", "Ninguna"),
    opt("hypertension", "Hipertensión"),
    opt("diabetes", "Diabetes"),
    opt("asthma", "Asma"),
    opt("copd", "EPOC"),
    opt("heart-disease", "Enfermedad cardíaca"),
    opt("kidney-disease", "Enfermedad renal"),
    opt("other", "Otra"),
];

/// Live state of one picker.
#[derive(Clone, Debug)]
pub struct MultiSelect {
    catalog: &'static [SelectOption],
    checked: Vec<bool>,
    other_text: String,
}

impl MultiSelect {
    pub fn new(catalog: &'static [SelectOption]) -> Self {
        Self {
            catalog,
            checked: vec![false; catalog.len()],
            other_text: String::new(),
        }
    }

    pub fn allergies() -> Self {
        Self::new(ALLERGY_OPTIONS)
    }

    pub fn conditions() -> Self {
        Self::new(CONDITION_OPTIONS)
    }

    /// Rebuild a picker from submitted codes, applied in the order given.
    pub fn from_codes<S: AsRef<str>>(
        catalog: &'static [SelectOption],
        codes: &[S],
        other_text: &str,
    ) -> TriageResult<Self> {
        let mut select = Self::new(catalog);
        for code in codes {
            select.set(code.as_ref(), true)?;
        }
        select.set_other_text(other_text);
        Ok(select)
    }

    fn position(&self, code: &str) -> TriageResult<usize> {
        self.catalog
            .iter()
            .position(|o| o.code == code)
            .ok_or_else(|| TriageError::InvalidOption {
                question: "multi-select".into(),
                value: code.to_string(),
            })
    }

    /// Check or uncheck `code`.
    ///
    /// Checking `none` clears every other box; checking anything else clears `none`.
    /// Unchecking `other` discards the free text.
    pub fn set(&mut self, code: &str, checked: bool) -> TriageResult<()> {
        let idx = self.position(code)?;
        self.checked[idx] = checked;

        if checked {
            let none_wins = code == NONE_CODE;
            for (i, option) in self.catalog.iter().enumerate() {
                if i != idx && (none_wins || option.code == NONE_CODE) {
                    self.checked[i] = false;
                }
            }
        }

        if !self.other_visible() {
            self.other_text.clear();
        }
        Ok(())
    }

    pub fn toggle(&mut self, code: &str) -> TriageResult<()> {
        let idx = self.position(code)?;
        let next = !self.checked[idx];
        self.set(code, next)
    }

    pub fn is_checked(&self, code: &str) -> bool {
        self.position(code)
            .map(|i| self.checked[i])
            .unwrap_or(false)
    }

    /// Free text is only kept while `other` is checked.
    pub fn set_other_text(&mut self, text: &str) {
        if self.other_visible() {
            self.other_text = text.to_string();
        }
    }

    pub fn other_visible(&self) -> bool {
        self.is_checked(OTHER_CODE)
    }

    fn selected(&self) -> impl Iterator<Item = &SelectOption> {
        self.catalog
            .iter()
            .zip(&self.checked)
            .filter(|(_, checked)| **checked)
            .map(|(option, _)| option)
    }

    pub fn codes(&self) -> Vec<&'static str> {
        self.selected().map(|o| o.code).collect()
    }

    /// Labels of the checked options, in catalog order.
    pub fn tags(&self) -> Vec<&'static str> {
        self.selected().map(|o| o.label).collect()
    }

    /// Text shown on the closed dropdown.
    pub fn summary(&self) -> String {
        match self.selected().count() {
            0 => EMPTY_SELECTION_TEXT.to_string(),
            n => format!("{n} seleccionadas"),
        }
    }

    pub fn clear(&mut self) {
        self.checked.iter_mut().for_each(|c| *c = false);
        self.other_text.clear();
    }

    pub fn view(&self) -> MultiSelectView {
        MultiSelectView {
            codes: self.codes().into_iter().map(String::from).collect(),
            tags: self.tags().into_iter().map(String::from).collect(),
            summary: self.summary(),
            other_visible: self.other_visible(),
            other_text: self.other_text.clone(),
        }
    }

    /// Freeze the picker into the value stored on the intake record.
    pub fn to_selection(&self) -> Selection {
        Selection {
            codes: self.codes().into_iter().map(String::from).collect(),
            labels: self.tags().into_iter().map(String::from).collect(),
            other: if self.other_visible() {
                NonEmptyText::optional(&self.other_text)
            } else {
                None
            },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MultiSelectView {
    pub codes: Vec<String>,
    pub tags: Vec<String>,
    pub summary: String,
    pub other_visible: bool,
    pub other_text: String,
}

/// Submitted picker value: the chosen codes and, when `other` is among them, the elaboration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Selection {
    pub codes: Vec<String>,
    pub labels: Vec<String>,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub other: Option<NonEmptyText>,
}

impl Selection {
    pub fn is_none(&self) -> bool {
        self.codes.iter().any(|c| c == NONE_CODE)
    }
}
