//! Validated text primitives shared by the intake wizard and the staff dashboard.
//!
//! Form fields arrive as raw strings from whatever surface hosts the wizard. The types here
//! make "this field was actually filled in" a property of the value rather than a check that
//! every caller has to remember.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
    /// The input text contained a line break where a single line is required.
    #[error("text must be a single line")]
    MultiLine,
}

/// A trimmed string that holds at least one non-whitespace character.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, trimming leading and trailing whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if nothing remains after trimming.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`] but maps blank input to `None`.
    ///
    /// Form collectors use this for optional fields, where an empty input box simply means
    /// "not provided".
    pub fn optional(input: impl AsRef<str>) -> Option<Self> {
        Self::new(input).ok()
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for NonEmptyText {
    type Err = TextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A single line of non-empty text, such as a name or a phone number.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SingleLineText(NonEmptyText);

impl SingleLineText {
    /// Creates a new `SingleLineText`.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::MultiLine`] when the trimmed
    /// input still contains `\n` or `\r`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let text = NonEmptyText::new(input)?;
        if text.as_str().contains(['\n', '\r']) {
            return Err(TextError::MultiLine);
        }
        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for SingleLineText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl serde::Serialize for SingleLineText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for SingleLineText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        SingleLineText::new(&s).map_err(serde::de::Error::custom)
    }
}
