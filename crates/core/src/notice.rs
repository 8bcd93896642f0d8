//! User-visible notifications.
//!
//! Stand-ins for the blocking alerts the kiosk shows after staff actions.

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn evaluation_saved() -> Self {
        Self::new(NoticeKind::Success, "Evaluación guardada correctamente.")
    }

    pub fn report_requested() -> Self {
        Self::new(
            NoticeKind::Info,
            "Generando reporte... En una aplicación real, esto descargaría un archivo PDF o CSV.",
        )
    }

    pub fn recovery_sent() -> Self {
        Self::new(
            NoticeKind::Success,
            "Si el correo está registrado, recibirá instrucciones para restablecer su contraseña.",
        )
    }
}
