//! Wizard flow definitions and the step controller.
//!
//! Both wizard variants share one flow definition: an ordered list of [`StepDescriptor`]s. The
//! `role-screen` variant has a dedicated role-selection screen after the welcome screen; the
//! `login-gate` variant reveals the roles inline on the welcome screen and gates the staff panel
//! behind the login overlay instead. Everything else is identical.
//!
//! The controller only tracks where the user is. It never validates forms: callers decide
//! whether a transition is allowed and then ask the controller to jump.

use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};

/// The screens a flow can contain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum StepKind {
    Welcome,
    RoleSelection,
    BasicData,
    MedicalHistory,
    Symptoms,
    DynamicQuestions,
    Confirmation,
    StaffPanel,
}

impl StepKind {
    pub fn title(self) -> &'static str {
        match self {
            StepKind::Welcome => "Bienvenida",
            StepKind::RoleSelection => "Selección de rol",
            StepKind::BasicData => "Datos básicos",
            StepKind::MedicalHistory => "Antecedentes médicos",
            StepKind::Symptoms => "Síntomas",
            StepKind::DynamicQuestions => "Preguntas adicionales",
            StepKind::Confirmation => "Confirmación",
            StepKind::StaffPanel => "Panel del personal médico",
        }
    }
}

/// Condition that must hold before a step may be entered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum EntryGate {
    Open,
    /// The staff role has been chosen on the role-selection screen.
    StaffRole,
    /// The staff login overlay has been submitted with every field filled in.
    StaffLogin,
}

/// Condition that must hold before the user may leave a step forwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum ExitGate {
    None,
    /// Every required identity and emergency-contact field is present.
    BasicDataComplete,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct StepDescriptor {
    pub kind: StepKind,
    pub entry: EntryGate,
    pub exit: ExitGate,
}

impl StepDescriptor {
    const fn open(kind: StepKind) -> Self {
        Self {
            kind,
            entry: EntryGate::Open,
            exit: ExitGate::None,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum FlowVariant {
    /// Eight steps, with a dedicated role-selection screen.
    RoleScreen,
    /// Seven steps, roles shown inline and the staff panel behind a login.
    #[default]
    LoginGate,
}

impl FlowVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowVariant::RoleScreen => "role-screen",
            FlowVariant::LoginGate => "login-gate",
        }
    }
}

impl std::fmt::Display for FlowVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FlowVariant {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "role-screen" => Ok(FlowVariant::RoleScreen),
            "login-gate" => Ok(FlowVariant::LoginGate),
            other => Err(TriageError::InvalidInput(format!(
                "unknown flow variant {other:?} (expected role-screen or login-gate)"
            ))),
        }
    }
}

/// Ordered list of steps for one wizard variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct FlowDefinition {
    variant: FlowVariant,
    steps: Vec<StepDescriptor>,
}

impl FlowDefinition {
    pub fn new(variant: FlowVariant) -> Self {
        let mut steps = vec![StepDescriptor::open(StepKind::Welcome)];
        if variant == FlowVariant::RoleScreen {
            steps.push(StepDescriptor::open(StepKind::RoleSelection));
        }
        steps.extend([
            StepDescriptor {
                kind: StepKind::BasicData,
                entry: EntryGate::Open,
                exit: ExitGate::BasicDataComplete,
            },
            StepDescriptor::open(StepKind::MedicalHistory),
            StepDescriptor::open(StepKind::Symptoms),
            StepDescriptor::open(StepKind::DynamicQuestions),
            StepDescriptor::open(StepKind::Confirmation),
            StepDescriptor {
                kind: StepKind::StaffPanel,
                entry: match variant {
                    FlowVariant::RoleScreen => EntryGate::StaffRole,
                    FlowVariant::LoginGate => EntryGate::StaffLogin,
                },
                exit: ExitGate::None,
            },
        ]);

        Self { variant, steps }
    }

    pub fn variant(&self) -> FlowVariant {
        self.variant
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn contains(&self, kind: StepKind) -> bool {
        self.steps.iter().any(|s| s.kind == kind)
    }

    /// 1-based position of `kind` in this flow.
    pub fn index_of(&self, kind: StepKind) -> TriageResult<usize> {
        self.steps
            .iter()
            .position(|s| s.kind == kind)
            .map(|i| i + 1)
            .ok_or(TriageError::StepNotInFlow {
                step: kind,
                variant: self.variant.as_str(),
            })
    }

    /// Descriptor at a 1-based index.
    pub fn descriptor(&self, index: usize) -> TriageResult<&StepDescriptor> {
        index
            .checked_sub(1)
            .and_then(|i| self.steps.get(i))
            .ok_or(TriageError::StepOutOfRange {
                index,
                total: self.steps.len(),
            })
    }
}

/// Snapshot of the controller for rendering a progress indicator.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ProgressView {
    pub index: usize,
    pub total: usize,
    pub step: StepKind,
    pub title: &'static str,
    pub percent: f64,
}

/// Tracks the current step of a flow.
#[derive(Clone, Debug)]
pub struct StepController {
    flow: FlowDefinition,
    current: usize,
}

impl StepController {
    pub fn new(flow: FlowDefinition) -> Self {
        Self { flow, current: 1 }
    }

    pub fn flow(&self) -> &FlowDefinition {
        &self.flow
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.flow.len()
    }

    pub fn current_step(&self) -> StepKind {
        // `current` is only ever set from a validated index.
        self.flow.steps[self.current - 1].kind
    }

    pub fn current_descriptor(&self) -> &StepDescriptor {
        &self.flow.steps[self.current - 1]
    }

    /// Jump forwards to `to`.
    pub fn advance(&mut self, to: StepKind) -> TriageResult<usize> {
        let index = self.flow.index_of(to)?;
        self.jump(index)
    }

    /// Jump backwards to `to`. Like [`advance`](Self::advance), any target is allowed.
    pub fn go_back(&mut self, to: StepKind) -> TriageResult<usize> {
        let index = self.flow.index_of(to)?;
        self.jump(index)
    }

    /// Return to step 1, which every flow has.
    pub fn reset(&mut self) {
        tracing::debug!("step {} -> 1 (reset)", self.current);
        self.current = 1;
    }

    /// Jump to a raw 1-based index.
    pub fn jump(&mut self, index: usize) -> TriageResult<usize> {
        let descriptor = self.flow.descriptor(index)?;
        tracing::debug!(
            "step {} -> {} ({:?})",
            self.current,
            index,
            descriptor.kind
        );
        self.current = index;
        Ok(index)
    }

    /// Linear progress, `(index - 1) / (total - 1) * 100`.
    pub fn progress_percent(&self) -> f64 {
        let total = self.total();
        if total <= 1 {
            return 100.0;
        }
        (self.current - 1) as f64 / (total - 1) as f64 * 100.0
    }

    pub fn view(&self) -> ProgressView {
        let step = self.current_step();
        ProgressView {
            index: self.current,
            total: self.total(),
            step,
            title: step.title(),
            percent: self.progress_percent(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variants_differ_only_by_role_screen() {
        let role = FlowDefinition::new(FlowVariant::RoleScreen);
        let login = FlowDefinition::new(FlowVariant::LoginGate);

        assert_eq!(role.len(), 8);
        assert_eq!(login.len(), 7);
        assert!(role.contains(StepKind::RoleSelection));
        assert!(!login.contains(StepKind::RoleSelection));
        assert_eq!(role.index_of(StepKind::StaffPanel).unwrap(), 8);
        assert_eq!(login.index_of(StepKind::StaffPanel).unwrap(), 7);
        assert_eq!(login.index_of(StepKind::BasicData).unwrap(), 2);
    }

    #[test]
    fn staff_panel_gate_depends_on_variant() {
        let role = FlowDefinition::new(FlowVariant::RoleScreen);
        let login = FlowDefinition::new(FlowVariant::LoginGate);
        let entry = |flow: &FlowDefinition| {
            flow.steps()
                .iter()
                .find(|s| s.kind == StepKind::StaffPanel)
                .map(|s| s.entry)
        };
        assert_eq!(entry(&role), Some(EntryGate::StaffRole));
        assert_eq!(entry(&login), Some(EntryGate::StaffLogin));
    }

    #[test]
    fn progress_is_linear_in_index() {
        let mut ctl = StepController::new(FlowDefinition::new(FlowVariant::RoleScreen));
        assert_eq!(ctl.progress_percent(), 0.0);

        ctl.advance(StepKind::StaffPanel).unwrap();
        assert_eq!(ctl.progress_percent(), 100.0);

        ctl.go_back(StepKind::BasicData).unwrap();
        let expected = 2.0 / 7.0 * 100.0;
        assert!((ctl.progress_percent() - expected).abs() < 1e-9);
    }

    #[test]
    fn jumps_are_not_restricted_to_neighbours() {
        let mut ctl = StepController::new(FlowDefinition::new(FlowVariant::LoginGate));
        ctl.advance(StepKind::Confirmation).unwrap();
        assert_eq!(ctl.current_step(), StepKind::Confirmation);
        ctl.go_back(StepKind::Welcome).unwrap();
        assert_eq!(ctl.current_index(), 1);
    }

    #[test]
    fn reset_returns_to_first_step() {
        let mut ctl = StepController::new(FlowDefinition::new(FlowVariant::RoleScreen));
        ctl.advance(StepKind::Symptoms).unwrap();
        assert_eq!(ctl.current_descriptor().exit, ExitGate::None);

        ctl.go_back(StepKind::BasicData).unwrap();
        assert_eq!(ctl.current_descriptor().exit, ExitGate::BasicDataComplete);

        ctl.reset();
        assert_eq!(ctl.current_step(), StepKind::Welcome);
        assert_eq!(ctl.progress_percent(), 0.0);
    }

    #[test]
    fn missing_step_is_rejected_without_moving() {
        let mut ctl = StepController::new(FlowDefinition::new(FlowVariant::LoginGate));
        let err = ctl.advance(StepKind::RoleSelection).expect_err("not in flow");
        assert!(matches!(err, TriageError::StepNotInFlow { .. }));
        assert_eq!(ctl.current_index(), 1);
    }

    #[test]
    fn out_of_range_index_is_rejected() {
        let mut ctl = StepController::new(FlowDefinition::new(FlowVariant::LoginGate));
        assert!(matches!(
            ctl.jump(0),
            Err(TriageError::StepOutOfRange { index: 0, total: 7 })
        ));
        assert!(matches!(
            ctl.jump(8),
            Err(TriageError::StepOutOfRange { index: 8, total: 7 })
        ));
    }

    #[test]
    fn variant_round_trips_through_str() {
        for variant in [FlowVariant::RoleScreen, FlowVariant::LoginGate] {
            assert_eq!(variant.as_str().parse::<FlowVariant>().unwrap(), variant);
        }
    }
}
