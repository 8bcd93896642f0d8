use crate::wizard::StepKind;

#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("form is incomplete: {0}")]
    IncompleteForm(&'static str),
    #[error("Por favor, complete todos los campos.")]
    MissingCredentials,

    #[error("step {step:?} is not part of the {variant} flow")]
    StepNotInFlow {
        step: StepKind,
        variant: &'static str,
    },
    #[error("step index {index} is outside 1..={total}")]
    StepOutOfRange { index: usize, total: usize },
    #[error("{action} is only available on step {expected:?} (current step is {current:?})")]
    WrongStep {
        action: &'static str,
        expected: StepKind,
        current: StepKind,
    },

    #[error("step {0:?} cannot be entered yet")]
    EntryDenied(StepKind),
    #[error("step {0:?} cannot be left yet")]
    ExitDenied(StepKind),
    #[error("cannot go back to {target:?}: it is not behind {current:?}")]
    NotBehind { current: StepKind, target: StepKind },
    #[error("the {0} overlay is not open")]
    OverlayNotOpen(&'static str),

    #[error("unknown question: {0}")]
    UnknownQuestion(String),
    #[error("option {value:?} is not offered by question {question}")]
    InvalidOption { question: String, value: String },
    #[error("question {0} accepts a single answer")]
    SingleAnswerExpected(String),

    #[error("invalid date: {0}")]
    InvalidDate(String),
    #[error("invalid time: {0}")]
    InvalidTime(String),
    #[error("invalid ESI level: {0}")]
    InvalidEsiLevel(String),
    #[error("invalid reference code: {0}")]
    InvalidReference(String),
    #[error("unknown patient reference: {0}")]
    UnknownPatient(String),
    #[error("unknown session: {0}")]
    UnknownSession(uuid::Uuid),

    #[error("fixture document schema mismatch at {path}: {message}")]
    FixtureSchema { path: String, message: String },
    #[error("invalid fixture document: {0}")]
    FixtureInvalid(String),
    #[error("failed to read fixture file: {0}")]
    FixtureRead(std::io::Error),
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
