//! Keyword-driven follow-up questionnaire.
//!
//! The symptoms step collects a free-text chief complaint. This module turns that text into a
//! short, structured questionnaire: each [`QuestionGroup`] in the catalog carries a keyword
//! predicate and the questions it contributes. Every group whose predicate matches contributes,
//! in catalog order. When nothing matches, a fixed general pair is asked instead so the patient
//! is never shown an empty step.
//!
//! Generation is a pure function of the input text. Rendering the questions (radio buttons,
//! checkboxes, a select box) is left to the surface.

use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How a question is answered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum QuestionKind {
    /// Exactly one option, rendered as radio buttons.
    SingleChoice,
    /// Any number of options, rendered as checkboxes.
    MultiChoice,
    /// Exactly one option, rendered as a select box.
    SingleChoiceDropdown,
}

impl QuestionKind {
    pub fn accepts_many(self) -> bool {
        matches!(self, QuestionKind::MultiChoice)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
}

/// A generated, answerable question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Question {
    pub kind: QuestionKind,
    pub id: String,
    pub prompt: String,
    pub options: Vec<QuestionOption>,
}

impl Question {
    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

/// Boolean combination of substring tests over lower-cased text.
#[derive(Clone, Copy, Debug)]
pub enum KeywordPredicate {
    Contains(&'static str),
    All(&'static [KeywordPredicate]),
    Any(&'static [KeywordPredicate]),
}

impl KeywordPredicate {
    /// Evaluate against text that has already been lower-cased.
    pub fn matches(&self, normalized: &str) -> bool {
        match self {
            KeywordPredicate::Contains(needle) => normalized.contains(needle),
            KeywordPredicate::All(parts) => parts.iter().all(|p| p.matches(normalized)),
            KeywordPredicate::Any(parts) => parts.iter().any(|p| p.matches(normalized)),
        }
    }
}

/// Static description of one catalog question.
#[derive(Clone, Copy, Debug)]
pub struct QuestionTemplate {
    pub kind: QuestionKind,
    pub id: &'static str,
    pub prompt: &'static str,
    pub options: &'static [(&'static str, &'static str)],
}

impl QuestionTemplate {
    fn instantiate(&self) -> Question {
        Question {
            kind: self.kind,
            id: self.id.to_string(),
            prompt: self.prompt.to_string(),
            options: self
                .options
                .iter()
                .map(|(value, label)| QuestionOption {
                    value: (*value).to_string(),
                    label: (*label).to_string(),
                })
                .collect(),
        }
    }
}

/// A keyword predicate together with the questions it contributes.
#[derive(Clone, Copy, Debug)]
pub struct QuestionGroup {
    pub name: &'static str,
    pub predicate: KeywordPredicate,
    pub questions: &'static [QuestionTemplate],
}

use KeywordPredicate::{All, Any, Contains};
use QuestionKind::{MultiChoice, SingleChoice, SingleChoiceDropdown};

const CHEST_PAIN: QuestionGroup = QuestionGroup {
    name: "chest-pain",
    predicate: All(&[Contains("dolor"), Contains("pecho")]),
    questions: &[
        QuestionTemplate {
            kind: SingleChoice,
            id: "chest-pain-type",
            prompt: "¿Cómo describiría el dolor en el pecho?",
            options: &[
                ("pressure", "Opresivo (como un peso)"),
                ("sharp", "Agudo/punzante"),
                ("burning", "Ardor/quemazón"),
                ("other", "Otro tipo"),
            ],
        },
        QuestionTemplate {
            kind: MultiChoice,
            id: "chest-pain-associated",
            prompt: "¿El dolor se acompaña de alguno de estos síntomas?",
            options: &[
                ("shortness-breath", "Dificultad para respirar"),
                ("sweating", "Sudoración"),
                ("nausea", "Náuseas o vómitos"),
                ("arm-pain", "Dolor que se extiende al brazo, hombro o mandíbula"),
                ("none", "Ninguno de los anteriores"),
            ],
        },
    ],
};

const BREATHING: QuestionGroup = QuestionGroup {
    name: "breathing",
    predicate: Any(&[
        Contains("respira"),
        Contains("ahogo"),
        Contains("falta de aire"),
    ]),
    questions: &[QuestionTemplate {
        kind: SingleChoice,
        id: "breathing-difficulty",
        prompt: "¿Cómo calificaría su dificultad para respirar?",
        options: &[
            ("mild", "Leve (puedo hablar normalmente)"),
            ("moderate", "Moderada (me cuesta hablar sin pausar)"),
            ("severe", "Severa (apenas puedo hablar)"),
        ],
    }],
};

const FEVER: QuestionGroup = QuestionGroup {
    name: "fever",
    predicate: Any(&[Contains("fiebre"), Contains("temperatura")]),
    questions: &[
        QuestionTemplate {
            kind: SingleChoice,
            id: "fever-duration",
            prompt: "¿Desde cuándo tiene fiebre?",
            options: &[
                ("today", "Hoy"),
                ("yesterday", "Desde ayer"),
                ("days", "Varios días"),
                ("week", "Una semana o más"),
            ],
        },
        QuestionTemplate {
            kind: SingleChoiceDropdown,
            id: "fever-temperature",
            prompt: "¿Cuál es la temperatura más alta que ha registrado?",
            options: &[
                ("", "Seleccione..."),
                ("below-38", "Menos de 38°C"),
                ("38-38.5", "Entre 38°C y 38.5°C"),
                ("38.5-39", "Entre 38.5°C y 39°C"),
                ("above-39", "Más de 39°C"),
                ("unknown", "No lo sé"),
            ],
        },
    ],
};

const HEADACHE: QuestionGroup = QuestionGroup {
    name: "headache",
    predicate: Any(&[Contains("dolor de cabeza"), Contains("cefalea")]),
    questions: &[QuestionTemplate {
        kind: SingleChoice,
        id: "headache-intensity",
        prompt: "¿Cómo calificaría la intensidad de su dolor de cabeza?",
        options: &[("mild", "Leve"), ("moderate", "Moderado"), ("severe", "Severo")],
    }],
};

const VOMITING: QuestionGroup = QuestionGroup {
    name: "vomiting",
    predicate: Any(&[
        Contains("vómito"),
        Contains("vomito"),
        Contains("náusea"),
        Contains("nausea"),
    ]),
    questions: &[
        QuestionTemplate {
            kind: SingleChoice,
            id: "vomit-frequency",
            prompt: "¿Con qué frecuencia ha vomitado?",
            options: &[
                ("once", "Una vez"),
                ("few", "Pocas veces (2-3)"),
                ("several", "Varias veces (más de 3)"),
                ("continuous", "Continuamente"),
            ],
        },
        QuestionTemplate {
            kind: MultiChoice,
            id: "vomit-characteristics",
            prompt: "¿Cómo describiría el vómito?",
            options: &[
                ("food", "Restos de comida"),
                ("yellow", "Amarillento/bilioso"),
                ("blood", "Con sangre"),
                ("coffee", "Color café/posos de café"),
            ],
        },
    ],
};

const DIARRHOEA: QuestionGroup = QuestionGroup {
    name: "diarrhoea",
    predicate: Contains("diarrea"),
    questions: &[
        QuestionTemplate {
            kind: SingleChoice,
            id: "diarrhea-frequency",
            prompt: "¿Cuántas deposiciones diarreicas ha tenido en las últimas 24 horas?",
            options: &[("1-3", "1-3"), ("4-6", "4-6"), ("more-6", "Más de 6")],
        },
        QuestionTemplate {
            kind: MultiChoice,
            id: "diarrhea-characteristics",
            prompt: "¿Ha notado alguna de estas características?",
            options: &[
                ("blood", "Sangre"),
                ("mucus", "Moco"),
                ("black", "Heces negras"),
                ("none", "Ninguna de las anteriores"),
            ],
        },
    ],
};

/// Groups in the order their questions are emitted.
pub const STANDARD_GROUPS: &[QuestionGroup] =
    &[CHEST_PAIN, BREATHING, FEVER, HEADACHE, VOMITING, DIARRHOEA];

/// Asked when no group matches.
pub const FALLBACK_QUESTIONS: &[QuestionTemplate] = &[
    QuestionTemplate {
        kind: SingleChoice,
        id: "pain-intensity",
        prompt: "¿Cómo calificaría la intensidad de su malestar?",
        options: &[("mild", "Leve"), ("moderate", "Moderado"), ("severe", "Severo")],
    },
    QuestionTemplate {
        kind: MultiChoice,
        id: "general-symptoms",
        prompt: "¿Presenta alguno de estos síntomas?",
        options: &[
            ("fever", "Fiebre"),
            ("headache", "Dolor de cabeza"),
            ("fatigue", "Fatiga/cansancio"),
            ("dizziness", "Mareo"),
            ("none", "Ninguno de los anteriores"),
        ],
    },
];

/// Maps free-text symptoms to a questionnaire.
#[derive(Clone, Copy, Debug)]
pub struct QuestionGenerator {
    groups: &'static [QuestionGroup],
    fallback: &'static [QuestionTemplate],
}

impl Default for QuestionGenerator {
    fn default() -> Self {
        Self::standard()
    }
}

impl QuestionGenerator {
    /// The generator used by the wizard.
    pub const fn standard() -> Self {
        Self {
            groups: STANDARD_GROUPS,
            fallback: FALLBACK_QUESTIONS,
        }
    }

    pub const fn with_catalog(
        groups: &'static [QuestionGroup],
        fallback: &'static [QuestionTemplate],
    ) -> Self {
        Self { groups, fallback }
    }

    /// Names of the groups whose predicate matches `symptoms`, in catalog order.
    pub fn matched_groups(&self, symptoms: &str) -> Vec<&'static str> {
        let normalized = symptoms.to_lowercase();
        self.groups
            .iter()
            .filter(|g| g.predicate.matches(&normalized))
            .map(|g| g.name)
            .collect()
    }

    /// Build the questionnaire for `symptoms`.
    pub fn generate(&self, symptoms: &str) -> Vec<Question> {
        let normalized = symptoms.to_lowercase();

        let mut questions: Vec<Question> = self
            .groups
            .iter()
            .filter(|g| g.predicate.matches(&normalized))
            .flat_map(|g| g.questions.iter().map(QuestionTemplate::instantiate))
            .collect();

        if questions.is_empty() {
            questions = self
                .fallback
                .iter()
                .map(QuestionTemplate::instantiate)
                .collect();
        }

        tracing::debug!("generated {} follow-up questions", questions.len());
        questions
    }
}

/// Shorthand for [`QuestionGenerator::standard`]`().generate(symptoms)`.
pub fn generate_questions(symptoms: &str) -> Vec<Question> {
    QuestionGenerator::standard().generate(symptoms)
}

/// A submitted answer: one value for single-choice questions, a list for checkboxes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum Answer {
    Single(String),
    Multiple(Vec<String>),
}

/// A validated answer, resolved against the question that was asked.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AnswerRecord {
    pub question_id: String,
    pub prompt: String,
    pub values: Vec<String>,
    pub labels: Vec<String>,
}

/// Check submitted answers against the questionnaire they answer.
///
/// Answers are returned in questionnaire order. Unanswered questions are skipped, as is the
/// dropdown placeholder. Multi-choice values are de-duplicated and reported in option order.
///
/// # Errors
///
/// - [`TriageError::UnknownQuestion`] if an answer names a question that was not asked.
/// - [`TriageError::SingleAnswerExpected`] if several values are sent for a single-choice
///   question.
/// - [`TriageError::InvalidOption`] if a value is not one of the question's options.
pub fn collect_answers(
    questions: &[Question],
    answers: &BTreeMap<String, Answer>,
) -> TriageResult<Vec<AnswerRecord>> {
    if let Some(unknown) = answers
        .keys()
        .find(|id| !questions.iter().any(|q| &q.id == *id))
    {
        return Err(TriageError::UnknownQuestion(unknown.clone()));
    }

    let mut records = Vec::new();
    for question in questions {
        let Some(answer) = answers.get(&question.id) else {
            continue;
        };

        let submitted: Vec<&str> = match answer {
            Answer::Single(v) => vec![v.as_str()],
            Answer::Multiple(vs) if question.kind.accepts_many() => {
                vs.iter().map(String::as_str).collect()
            }
            Answer::Multiple(vs) if vs.len() <= 1 => vs.iter().map(String::as_str).collect(),
            Answer::Multiple(_) => {
                return Err(TriageError::SingleAnswerExpected(question.id.clone()));
            }
        };

        for value in &submitted {
            if question.option(value).is_none() {
                return Err(TriageError::InvalidOption {
                    question: question.id.clone(),
                    value: (*value).to_string(),
                });
            }
        }

        let chosen: Vec<&QuestionOption> = question
            .options
            .iter()
            .filter(|o| !o.value.is_empty() && submitted.contains(&o.value.as_str()))
            .collect();
        if chosen.is_empty() {
            continue;
        }

        records.push(AnswerRecord {
            question_id: question.id.clone(),
            prompt: question.prompt.clone(),
            values: chosen.iter().map(|o| o.value.clone()).collect(),
            labels: chosen.iter().map(|o| o.label.clone()).collect(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.id.as_str()).collect()
    }

    #[test]
    fn chest_pain_questions_come_first_in_order() {
        for text in [
            "Tengo DOLOR en el PECHO",
            "pecho con dolor y fiebre",
            "dolor de cabeza y dolor de pecho",
        ] {
            let questions = generate_questions(text);
            assert_eq!(questions[0].id, "chest-pain-type", "input {text:?}");
            assert_eq!(questions[0].kind, QuestionKind::SingleChoice);
            assert_eq!(questions[1].id, "chest-pain-associated");
            assert_eq!(questions[1].kind, QuestionKind::MultiChoice);
        }
    }

    #[test]
    fn dolor_alone_does_not_trigger_chest_group() {
        let questions = generate_questions("dolor de rodilla");
        assert_eq!(ids(&questions), vec!["pain-intensity", "general-symptoms"]);
    }

    #[test]
    fn fever_adds_duration_and_temperature_dropdown() {
        for text in ["tengo fiebre", "me subió la temperatura"] {
            let questions = generate_questions(text);
            assert_eq!(ids(&questions), vec!["fever-duration", "fever-temperature"]);

            let dropdown = &questions[1];
            assert_eq!(dropdown.kind, QuestionKind::SingleChoiceDropdown);
            assert_eq!(dropdown.options.len(), 6);
            assert_eq!(dropdown.options[0].value, "");
            assert_eq!(dropdown.options[0].label, "Seleccione...");
        }
    }

    #[test]
    fn unmatched_input_gets_the_general_pair() {
        for text in ["", "estoy cansado", "   "] {
            let questions = generate_questions(text);
            assert_eq!(
                ids(&questions),
                vec!["pain-intensity", "general-symptoms"],
                "input {text:?}"
            );
            assert_eq!(questions[0].kind, QuestionKind::SingleChoice);
            assert_eq!(questions[1].kind, QuestionKind::MultiChoice);
        }
    }

    #[test]
    fn multiple_groups_are_concatenated_without_duplicates() {
        let questions = generate_questions("tengo dolor en el pecho y fiebre");
        assert_eq!(
            ids(&questions),
            vec![
                "chest-pain-type",
                "chest-pain-associated",
                "fever-duration",
                "fever-temperature",
            ]
        );
    }

    #[test]
    fn every_group_can_fire_at_once_in_catalog_order() {
        let text = "dolor de pecho, falta de aire, fiebre, dolor de cabeza, náuseas y diarrea";
        let generator = QuestionGenerator::standard();
        assert_eq!(
            generator.matched_groups(text),
            vec!["chest-pain", "breathing", "fever", "headache", "vomiting", "diarrhoea"]
        );
        assert_eq!(generator.generate(text).len(), 10);
    }

    #[test]
    fn accented_and_unaccented_keywords_both_match() {
        assert_eq!(
            ids(&generate_questions("VÓMITO desde anoche")),
            vec!["vomit-frequency", "vomit-characteristics"]
        );
        assert_eq!(
            ids(&generate_questions("nausea")),
            vec!["vomit-frequency", "vomit-characteristics"]
        );
    }

    #[test]
    fn generation_is_idempotent() {
        let text = "Me cuesta respirar y tengo diarrea";
        assert_eq!(generate_questions(text), generate_questions(text));
    }

    #[test]
    fn collect_answers_resolves_labels_in_questionnaire_order() {
        let questions = generate_questions("dolor en el pecho");
        let mut answers = BTreeMap::new();
        answers.insert(
            "chest-pain-associated".to_string(),
            Answer::Multiple(vec!["sweating".into(), "shortness-breath".into(), "sweating".into()]),
        );
        answers.insert(
            "chest-pain-type".to_string(),
            Answer::Single("pressure".into()),
        );

        let records = collect_answers(&questions, &answers).expect("valid answers");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].question_id, "chest-pain-type");
        assert_eq!(records[0].labels, vec!["Opresivo (como un peso)"]);
        assert_eq!(records[1].values, vec!["shortness-breath", "sweating"]);
    }

    #[test]
    fn collect_answers_skips_dropdown_placeholder() {
        let questions = generate_questions("fiebre");
        let mut answers = BTreeMap::new();
        answers.insert("fever-temperature".to_string(), Answer::Single(String::new()));

        let records = collect_answers(&questions, &answers).expect("valid answers");
        assert!(records.is_empty());
    }

    #[test]
    fn collect_answers_rejects_unknown_question_and_option() {
        let questions = generate_questions("fiebre");

        let mut answers = BTreeMap::new();
        answers.insert("chest-pain-type".to_string(), Answer::Single("sharp".into()));
        assert!(matches!(
            collect_answers(&questions, &answers),
            Err(TriageError::UnknownQuestion(id)) if id == "chest-pain-type"
        ));

        let mut answers = BTreeMap::new();
        answers.insert("fever-duration".to_string(), Answer::Single("forever".into()));
        assert!(matches!(
            collect_answers(&questions, &answers),
            Err(TriageError::InvalidOption { .. })
        ));
    }

    #[test]
    fn collect_answers_rejects_many_values_for_radio() {
        let questions = generate_questions("cefalea");
        let mut answers = BTreeMap::new();
        answers.insert(
            "headache-intensity".to_string(),
            Answer::Multiple(vec!["mild".into(), "severe".into()]),
        );
        assert!(matches!(
            collect_answers(&questions, &answers),
            Err(TriageError::SingleAnswerExpected(_))
        ));
    }

    #[test]
    fn custom_catalog_replaces_groups_and_fallback() {
        use KeywordPredicate::{All, Any, Contains};
        use QuestionKind::SingleChoice;

        const KNEE: &[QuestionGroup] = &[QuestionGroup {
            name: "knee",
            predicate: All(&[Contains("rodilla"), Any(&[Contains("dolor"), Contains("hinchada")])]),
            questions: &[QuestionTemplate {
                kind: SingleChoice,
                id: "knee-injury",
                prompt: "¿Se golpeó la rodilla?",
                options: &[("yes", "Sí"), ("no", "No")],
            }],
        }];
        let generator = QuestionGenerator::with_catalog(KNEE, &[]);

        assert_eq!(generator.matched_groups("rodilla hinchada"), vec!["knee"]);
        assert_eq!(ids(&generator.generate("Dolor de rodilla")), vec!["knee-injury"]);
        assert!(generator.generate("dolor en el pecho").is_empty());
    }
}
