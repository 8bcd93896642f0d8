//! Patient reference codes (`PRE-NNNNN`).
//!
//! A code is handed to the patient when the intake completes. It is a display artefact only:
//! codes are not stored and nothing checks them for uniqueness.

use crate::constants::{REFERENCE_MAX, REFERENCE_MIN, REFERENCE_PREFIX};
use crate::{TriageError, TriageResult};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferenceCode(u32);

impl ReferenceCode {
    /// Draw a fresh code with a uniformly random numeric part in
    /// [`REFERENCE_MIN`]`..=`[`REFERENCE_MAX`].
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self(rng.gen_range(REFERENCE_MIN..=REFERENCE_MAX))
    }

    /// Parse a code of the exact shape `PRE-` followed by five digits.
    pub fn parse(input: &str) -> TriageResult<Self> {
        let invalid = || TriageError::InvalidReference(input.to_string());

        let digits = input
            .strip_prefix(REFERENCE_PREFIX)
            .and_then(|rest| rest.strip_prefix('-'))
            .ok_or_else(invalid)?;
        if digits.len() != 5 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let number: u32 = digits.parse().map_err(|_| invalid())?;
        if !(REFERENCE_MIN..=REFERENCE_MAX).contains(&number) {
            return Err(invalid());
        }

        Ok(Self(number))
    }

    pub fn number(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for ReferenceCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{REFERENCE_PREFIX}-{}", self.0)
    }
}

impl std::str::FromStr for ReferenceCode {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ReferenceCode {
    type Error = TriageError;

    fn try_from(value: String) -> TriageResult<Self> {
        Self::parse(&value)
    }
}

impl From<ReferenceCode> for String {
    fn from(code: ReferenceCode) -> Self {
        code.to_string()
    }
}

#[cfg(feature = "openapi")]
impl<'s> utoipa::ToSchema<'s> for ReferenceCode {
    fn schema() -> (
        &'s str,
        utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
    ) {
        let object = utoipa::openapi::ObjectBuilder::new()
            .schema_type(utoipa::openapi::SchemaType::String)
            .pattern(Some(r"^PRE-\d{5}$"))
            .example(Some(serde_json::json!("PRE-12345")))
            .build();
        (
            "ReferenceCode",
            utoipa::openapi::RefOr::T(utoipa::openapi::schema::Schema::Object(object)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn generated_codes_have_the_documented_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let code = ReferenceCode::generate(&mut rng);
            let text = code.to_string();

            assert!(text.starts_with("PRE-"), "{text}");
            let digits = &text[4..];
            assert_eq!(digits.len(), 5, "{text}");
            assert!(digits.bytes().all(|b| b.is_ascii_digit()), "{text}");
            assert!((10_000..=99_999).contains(&code.number()));
            assert_eq!(ReferenceCode::parse(&text).unwrap(), code);
        }
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        for bad in ["PRE-1234", "PRE-123456", "pre-12345", "PRE12345", "PRE-1234a", "PRE-09999", ""] {
            assert!(ReferenceCode::parse(bad).is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn serialises_as_display_string() {
        let code = ReferenceCode::parse("PRE-23456").unwrap();
        assert_eq!(serde_json::to_string(&code).unwrap(), "\"PRE-23456\"");
    }
}
