//! Intake session state.
//!
//! An [`IntakeSession`] owns everything one kiosk user accumulates: the step controller, the
//! intake record, the live form drafts and the presentation toggles. It is only mutated through
//! [`IntakeSession::apply`], one [`SessionAction`] at a time, and each submit checks that the
//! wizard is on the matching step before touching the record.

use crate::auth::{LoginForm, RecoveryForm, RecoveryStage};
use crate::config::CoreConfig;
use crate::intake::{
    AgeAssessment, BasicDataForm, IntakeRecord, MedicalHistoryForm, Role, SymptomsForm,
};
use crate::multiselect::{MultiSelect, MultiSelectView};
use crate::notice::Notice;
use crate::questions::{collect_answers, Answer, Question, QuestionGenerator};
use crate::reference::ReferenceCode;
use crate::wizard::{
    EntryGate, ExitGate, FlowDefinition, FlowVariant, ProgressView, StepController, StepKind,
};
use crate::{TriageError, TriageResult};
use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Overlay {
    Login,
    Register,
    PasswordRecovery,
    History,
    VitalSigns,
}

impl Overlay {
    pub fn as_str(self) -> &'static str {
        match self {
            Overlay::Login => "login",
            Overlay::Register => "register",
            Overlay::PasswordRecovery => "password-recovery",
            Overlay::History => "history",
            Overlay::VitalSigns => "vital-signs",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Picker {
    Allergies,
    Conditions,
}

/// Everything a user can do to a session.
#[derive(Clone, Debug, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum SessionAction {
    /// Press the start button on the welcome screen.
    Start,
    ChooseRole { role: Role },
    Login { form: LoginForm },
    SubmitRecovery { form: RecoveryForm },
    /// Live input on the basic-data form; re-evaluates the register gate.
    UpdateBasicData { form: BasicDataForm },
    SubmitBasicData { form: BasicDataForm },
    SetOption { picker: Picker, code: String, checked: bool },
    SetOtherText { picker: Picker, text: String },
    SubmitMedicalHistory { form: MedicalHistoryForm },
    SubmitSymptoms { form: SymptomsForm },
    SubmitAnswers { answers: BTreeMap<String, Answer> },
    GoBack { to: StepKind },
    Restart,
    ToggleTheme,
    OpenOverlay { overlay: Overlay },
    CloseOverlay,
}

#[derive(Clone, Debug)]
pub struct IntakeSession {
    id: Uuid,
    controller: StepController,
    high_risk_age: u32,
    roles_revealed: bool,
    staff_logged_in: bool,
    record: IntakeRecord,
    basic_data_draft: BasicDataForm,
    allergies: MultiSelect,
    conditions: MultiSelect,
    questions: Vec<Question>,
    theme: Theme,
    overlay: Option<Overlay>,
    recovery_stage: RecoveryStage,
}

impl IntakeSession {
    pub fn new(variant: FlowVariant, high_risk_age: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            controller: StepController::new(FlowDefinition::new(variant)),
            high_risk_age,
            roles_revealed: variant == FlowVariant::RoleScreen,
            staff_logged_in: false,
            record: IntakeRecord::default(),
            basic_data_draft: BasicDataForm::default(),
            allergies: MultiSelect::allergies(),
            conditions: MultiSelect::conditions(),
            questions: Vec::new(),
            theme: Theme::default(),
            overlay: None,
            recovery_stage: RecoveryStage::default(),
        }
    }

    pub fn from_config(config: &CoreConfig) -> Self {
        Self::new(config.flow_variant(), config.high_risk_age())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn current_step(&self) -> StepKind {
        self.controller.current_step()
    }

    pub fn record(&self) -> &IntakeRecord {
        &self.record
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn overlay(&self) -> Option<Overlay> {
        self.overlay
    }

    fn variant(&self) -> FlowVariant {
        self.controller.flow().variant()
    }

    fn expect_step(&self, action: &'static str, expected: StepKind) -> TriageResult<()> {
        let current = self.current_step();
        if current != expected {
            return Err(TriageError::WrongStep {
                action,
                expected,
                current,
            });
        }
        Ok(())
    }

    fn expect_overlay(&self, overlay: Overlay) -> TriageResult<()> {
        if self.overlay != Some(overlay) {
            return Err(TriageError::OverlayNotOpen(overlay.as_str()));
        }
        Ok(())
    }

    fn gate_open(&self, gate: EntryGate) -> bool {
        match gate {
            EntryGate::Open => true,
            EntryGate::StaffRole => self.record.role == Some(Role::Staff),
            EntryGate::StaffLogin => self.staff_logged_in,
        }
    }

    fn exit_open(&self, gate: ExitGate) -> bool {
        match gate {
            ExitGate::None => true,
            ExitGate::BasicDataComplete => self.record.identity.is_some(),
        }
    }

    /// Check that `to` may be entered: its entry gate holds and, when moving forwards, the
    /// exit gate of the current step holds.
    fn check_goto(&self, to: StepKind, forward: bool) -> TriageResult<()> {
        let index = self.controller.flow().index_of(to)?;
        let entry = self.controller.flow().descriptor(index)?.entry;
        if !self.gate_open(entry) {
            return Err(TriageError::EntryDenied(to));
        }
        if forward && !self.exit_open(self.controller.current_descriptor().exit) {
            return Err(TriageError::ExitDenied(self.current_step()));
        }
        Ok(())
    }

    /// Move to `to`, honouring the gates checked by [`check_goto`](Self::check_goto).
    fn goto(&mut self, to: StepKind, forward: bool) -> TriageResult<()> {
        self.check_goto(to, forward)?;
        if forward {
            self.controller.advance(to)?;
        } else {
            self.controller.go_back(to)?;
        }
        Ok(())
    }

    /// Return to an earlier (or the current) step. Forward moves only happen through submits.
    fn go_back(&mut self, to: StepKind) -> TriageResult<()> {
        let index = self.controller.flow().index_of(to)?;
        if index > self.controller.current_index() {
            return Err(TriageError::NotBehind {
                current: self.current_step(),
                target: to,
            });
        }
        self.goto(to, false)
    }

    fn picker_mut(&mut self, picker: Picker) -> &mut MultiSelect {
        match picker {
            Picker::Allergies => &mut self.allergies,
            Picker::Conditions => &mut self.conditions,
        }
    }

    /// Apply one user action.
    ///
    /// `today` is used for the age calculation and `rng` for the reference code handed out
    /// when the dynamic questions are submitted. Returns a notice when the action produces one.
    ///
    /// # Errors
    ///
    /// The session is left unchanged when an error is returned.
    pub fn apply<R: Rng + ?Sized>(
        &mut self,
        action: SessionAction,
        today: NaiveDate,
        rng: &mut R,
    ) -> TriageResult<Option<Notice>> {
        match action {
            SessionAction::Start => {
                self.expect_step("start", StepKind::Welcome)?;
                match self.variant() {
                    FlowVariant::RoleScreen => self.goto(StepKind::RoleSelection, true)?,
                    FlowVariant::LoginGate => self.roles_revealed = true,
                }
            }
            SessionAction::ChooseRole { role } => self.choose_role(role)?,
            SessionAction::Login { form } => {
                self.expect_overlay(Overlay::Login)?;
                form.check()?;
                let panel = self.controller.flow().index_of(StepKind::StaffPanel)?;
                if self.controller.flow().descriptor(panel)?.entry != EntryGate::StaffLogin {
                    return Err(TriageError::EntryDenied(StepKind::StaffPanel));
                }
                self.staff_logged_in = true;
                self.overlay = None;
                self.goto(StepKind::StaffPanel, true)?;
                tracing::info!(session = %self.id, "staff panel opened");
            }
            SessionAction::SubmitRecovery { form } => {
                self.expect_overlay(Overlay::PasswordRecovery)?;
                form.check()?;
                self.recovery_stage = RecoveryStage::Sent;
                return Ok(Some(Notice::recovery_sent()));
            }
            SessionAction::UpdateBasicData { form } => {
                self.expect_step("update basic data", StepKind::BasicData)?;
                self.basic_data_draft = form;
            }
            SessionAction::SubmitBasicData { form } => {
                self.expect_step("submit basic data", StepKind::BasicData)?;
                let identity = form.collect(today, self.high_risk_age)?;
                if identity.high_risk {
                    tracing::info!(session = %self.id, age = identity.age, "high-risk patient");
                }
                self.record.identity = Some(identity);
                self.basic_data_draft = form;
                self.goto(StepKind::MedicalHistory, true)?;
            }
            SessionAction::SetOption {
                picker,
                code,
                checked,
            } => {
                self.expect_step("select option", StepKind::MedicalHistory)?;
                self.picker_mut(picker).set(&code, checked)?;
            }
            SessionAction::SetOtherText { picker, text } => {
                self.expect_step("set other text", StepKind::MedicalHistory)?;
                self.picker_mut(picker).set_other_text(&text);
            }
            SessionAction::SubmitMedicalHistory { form } => {
                self.expect_step("submit medical history", StepKind::MedicalHistory)?;
                let history = form.collect()?;
                let allergies = MultiSelect::from_codes(
                    crate::multiselect::ALLERGY_OPTIONS,
                    &form.allergies,
                    &form.other_allergies,
                )?;
                let conditions = MultiSelect::from_codes(
                    crate::multiselect::CONDITION_OPTIONS,
                    &form.conditions,
                    &form.other_conditions,
                )?;
                self.allergies = allergies;
                self.conditions = conditions;
                self.record.medical_history = Some(history);
                self.goto(StepKind::Symptoms, true)?;
            }
            SessionAction::SubmitSymptoms { form } => {
                self.expect_step("submit symptoms", StepKind::Symptoms)?;
                let complaint = form.collect();
                self.questions = QuestionGenerator::standard().generate(&complaint.text);
                tracing::debug!(
                    session = %self.id,
                    questions = self.questions.len(),
                    "generated follow-up questions"
                );
                self.record.complaint = Some(complaint);
                self.record.answers.clear();
                self.goto(StepKind::DynamicQuestions, true)?;
            }
            SessionAction::SubmitAnswers { answers } => {
                self.expect_step("submit answers", StepKind::DynamicQuestions)?;
                if self.record.identity.is_none() {
                    return Err(TriageError::IncompleteForm("basic data"));
                }
                if self.record.medical_history.is_none() {
                    return Err(TriageError::IncompleteForm("medical history"));
                }
                if self.record.complaint.is_none() {
                    return Err(TriageError::IncompleteForm("symptoms"));
                }
                let collected = collect_answers(&self.questions, &answers)?;
                self.check_goto(StepKind::Confirmation, true)?;
                self.record.answers = collected;
                let reference = ReferenceCode::generate(rng);
                self.record.reference = Some(reference);
                self.goto(StepKind::Confirmation, true)?;
                tracing::info!(session = %self.id, %reference, "intake completed");
            }
            SessionAction::GoBack { to } => self.go_back(to)?,
            SessionAction::Restart => self.restart(),
            SessionAction::ToggleTheme => self.theme = self.theme.toggled(),
            SessionAction::OpenOverlay { overlay } => {
                if overlay == Overlay::PasswordRecovery {
                    self.recovery_stage = RecoveryStage::EnterEmail;
                }
                self.overlay = Some(overlay);
            }
            SessionAction::CloseOverlay => self.overlay = None,
        }
        Ok(None)
    }

    fn choose_role(&mut self, role: Role) -> TriageResult<()> {
        match self.variant() {
            FlowVariant::RoleScreen => self.expect_step("choose role", StepKind::RoleSelection)?,
            FlowVariant::LoginGate => {
                self.expect_step("choose role", StepKind::Welcome)?;
                if !self.roles_revealed {
                    return Err(TriageError::InvalidInput(
                        "press start before choosing a role".into(),
                    ));
                }
            }
        }

        let previous = self.record.role.replace(role);
        let result = match (role, self.variant()) {
            (Role::Patient, _) => self.goto(StepKind::BasicData, true),
            (Role::Staff, FlowVariant::RoleScreen) => self.goto(StepKind::StaffPanel, true),
            (Role::Staff, FlowVariant::LoginGate) => {
                self.overlay = Some(Overlay::Login);
                Ok(())
            }
        };
        if result.is_err() {
            self.record.role = previous;
        }
        result
    }

    /// Discard the intake and return to the first step. Theme and revealed roles survive.
    fn restart(&mut self) {
        self.record = IntakeRecord::default();
        self.basic_data_draft = BasicDataForm::default();
        self.allergies.clear();
        self.conditions.clear();
        self.questions.clear();
        self.staff_logged_in = false;
        self.overlay = None;
        self.recovery_stage = RecoveryStage::default();
        self.controller.reset();
    }

    pub fn view(&self, today: NaiveDate) -> SessionView {
        SessionView {
            id: self.id,
            variant: self.variant(),
            progress: self.controller.view(),
            roles_revealed: self.roles_revealed,
            theme: self.theme,
            overlay: self.overlay,
            recovery_stage: self.recovery_stage,
            basic_data: BasicDataGate {
                complete: self.basic_data_draft.is_complete(),
                pregnancy_question_visible: self.basic_data_draft.pregnancy_question_visible(),
                age: self.basic_data_draft.age_preview(today, self.high_risk_age),
            },
            allergies: self.allergies.view(),
            conditions: self.conditions.view(),
            questions: self.questions.clone(),
            record: self.record.clone(),
        }
    }
}

/// Register-button state for the current basic-data draft.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BasicDataGate {
    pub complete: bool,
    pub pregnancy_question_visible: bool,
    pub age: Option<AgeAssessment>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SessionView {
    pub id: Uuid,
    pub variant: FlowVariant,
    pub progress: ProgressView,
    pub roles_revealed: bool,
    pub theme: Theme,
    pub overlay: Option<Overlay>,
    pub recovery_stage: RecoveryStage,
    pub basic_data: BasicDataGate,
    pub allergies: MultiSelectView,
    pub conditions: MultiSelectView,
    pub questions: Vec<Question>,
    pub record: IntakeRecord,
}
