/// Errors that can occur when creating validated vocabulary types.
#[derive(Debug, thiserror::Error)]
pub enum FeeTypeError {
    /// The input text was empty or contained only whitespace
    #[error("Fee type key cannot be empty")]
    Empty,
}

/// A fee-type vocabulary key, e.g. `"Admin Fee"` or `"Venipuncture"`.
///
/// This type wraps a `String` and ensures it contains at least one
/// non-whitespace character. The input is automatically trimmed of leading and
/// trailing whitespace during construction. Equality and hashing are exact
/// (case-sensitive), matching how fee-service lookup treats keys, whilst
/// waiver comparison uses [`FeeTypeKey::eq_ignore_case`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeeTypeKey(String);

impl FeeTypeKey {
    /// Creates a new `FeeTypeKey` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(FeeTypeKey)` if the trimmed input is non-empty,
    /// or `Err(FeeTypeError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, FeeTypeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FeeTypeError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this key names an admin-type fee.
    ///
    /// Admin-type fees are charged once per triggering item rather than once
    /// per cart. The rule is substring-based: any key containing "admin"
    /// (case-insensitive) qualifies.
    pub fn is_admin(&self) -> bool {
        self.0.to_lowercase().contains("admin")
    }

    /// Case-insensitive comparison against another fee-type key string.
    ///
    /// Waiver rules compare fee types case-insensitively, so `"venipuncture"`
    /// waives `"Venipuncture"`.
    pub fn eq_ignore_case(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl std::fmt::Display for FeeTypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for FeeTypeKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for FeeTypeKey {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for FeeTypeKey {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        FeeTypeKey::new(&s).map_err(serde::de::Error::custom)
    }
}
