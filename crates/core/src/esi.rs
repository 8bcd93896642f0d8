//! Emergency Severity Index.
//!
//! A five-level ordinal urgency scale, 1 being the most severe. Levels serialise as their
//! number so that `esi: 3` reads naturally in fixtures and query strings.

use crate::{TriageError, TriageResult};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum EsiLevel {
    Resuscitation = 1,
    Emergency = 2,
    Urgent = 3,
    LessUrgent = 4,
    NonUrgent = 5,
}

impl EsiLevel {
    pub const ALL: [EsiLevel; 5] = [
        EsiLevel::Resuscitation,
        EsiLevel::Emergency,
        EsiLevel::Urgent,
        EsiLevel::LessUrgent,
        EsiLevel::NonUrgent,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            EsiLevel::Resuscitation => "Resucitación",
            EsiLevel::Emergency => "Emergencia",
            EsiLevel::Urgent => "Urgencia",
            EsiLevel::LessUrgent => "Menor Urgencia",
            EsiLevel::NonUrgent => "No Urgente",
        }
    }

    /// Badge colour used by the dashboard for this level.
    pub fn colour(self) -> &'static str {
        match self {
            EsiLevel::Resuscitation => "red",
            EsiLevel::Emergency => "orange",
            EsiLevel::Urgent => "yellow",
            EsiLevel::LessUrgent => "green",
            EsiLevel::NonUrgent => "blue",
        }
    }
}

impl TryFrom<u8> for EsiLevel {
    type Error = TriageError;

    fn try_from(value: u8) -> TriageResult<Self> {
        match value {
            1 => Ok(EsiLevel::Resuscitation),
            2 => Ok(EsiLevel::Emergency),
            3 => Ok(EsiLevel::Urgent),
            4 => Ok(EsiLevel::LessUrgent),
            5 => Ok(EsiLevel::NonUrgent),
            other => Err(TriageError::InvalidEsiLevel(other.to_string())),
        }
    }
}

impl From<EsiLevel> for u8 {
    fn from(level: EsiLevel) -> Self {
        level.number()
    }
}

impl std::str::FromStr for EsiLevel {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let n: u8 = s
            .trim()
            .parse()
            .map_err(|_| TriageError::InvalidEsiLevel(s.to_string()))?;
        EsiLevel::try_from(n)
    }
}

impl std::fmt::Display for EsiLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.number())
    }
}

#[cfg(feature = "openapi")]
impl<'s> utoipa::ToSchema<'s> for EsiLevel {
    fn schema() -> (
        &'s str,
        utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
    ) {
        let object = utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::SchemaType::Integer)
            .minimum(Some(1.0))
            .maximum(Some(5.0))
            .description(Some("Emergency Severity Index, 1 (most severe) to 5"))
            .build();
        (
            "EsiLevel",
            utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lower_number_is_more_urgent() {
        assert!(EsiLevel::Resuscitation < EsiLevel::NonUrgent);
        assert_eq!(EsiLevel::ALL.iter().map(|l| l.number()).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn parses_numbers_only_within_scale() {
        assert_eq!(" 2 ".parse::<EsiLevel>().unwrap(), EsiLevel::Emergency);
        assert!("0".parse::<EsiLevel>().is_err());
        assert!("6".parse::<EsiLevel>().is_err());
        assert!("urgent".parse::<EsiLevel>().is_err());
    }

    #[test]
    fn serialises_as_number() {
        assert_eq!(serde_json::to_string(&EsiLevel::Urgent).unwrap(), "3");
        let level: EsiLevel = serde_json::from_str("4").unwrap();
        assert_eq!(level, EsiLevel::LessUrgent);
        assert!(serde_json::from_str::<EsiLevel>("9").is_err());
    }
}
