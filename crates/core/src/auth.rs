//! Staff login and password recovery.
//!
//! There are no credentials behind these forms. Submitting only checks that every field was
//! filled in; anything else is accepted.

use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

impl LoginForm {
    /// # Errors
    ///
    /// Returns [`TriageError::MissingCredentials`] if the email or the password is blank.
    pub fn check(&self) -> TriageResult<()> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(TriageError::MissingCredentials);
        }
        tracing::debug!(remember_me = self.remember_me, "staff login accepted");
        Ok(())
    }
}

// Password stays out of logs.
impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("email", &self.email)
            .field("remember_me", &self.remember_me)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(default)]
pub struct RecoveryForm {
    pub email: String,
}

impl RecoveryForm {
    pub fn check(&self) -> TriageResult<()> {
        if self.email.trim().is_empty() {
            return Err(TriageError::MissingCredentials);
        }
        Ok(())
    }
}

/// Which half of the recovery overlay is showing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "kebab-case")]
pub enum RecoveryStage {
    #[default]
    EnterEmail,
    Sent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_requires_both_fields() {
        let mut form = LoginForm {
            email: "medico@hospital.org".into(),
            password: String::new(),
            remember_me: true,
        };
        let err = form.check().expect_err("blank password");
        assert_eq!(err.to_string(), "Por favor, complete todos los campos.");

        form.password = "x".into();
        assert!(form.check().is_ok());

        form.email = "  ".into();
        assert!(matches!(form.check(), Err(TriageError::MissingCredentials)));
    }

    #[test]
    fn recovery_requires_email() {
        assert!(RecoveryForm::default().check().is_err());
        let form = RecoveryForm {
            email: "a@b.co".into(),
        };
        assert!(form.check().is_ok());
    }
}
