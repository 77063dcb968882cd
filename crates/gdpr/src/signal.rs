//! GDPR applicability signal parsing and normalization.

use error_stack::Report;

use crate::error::GdprError;

/// Whether GDPR applies to the current request.
///
/// Requests carry the signal as an optional string field; an absent or empty
/// value is ambiguous and resolves to the operator-configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// The request did not state whether GDPR applies.
    Ambiguous,
    /// GDPR does not apply ("0").
    No,
    /// GDPR applies ("1").
    Yes,
}

impl Signal {
    /// Parse the raw signal value from a request.
    ///
    /// `None` and the empty string are ambiguous. Any value other than "0"
    /// or "1" is an error; callers that choose to proceed anyway should
    /// treat it as [`Signal::Ambiguous`].
    ///
    /// # Errors
    ///
    /// Returns [`GdprError::InvalidSignal`] for any non-empty value that is
    /// not "0" or "1".
    pub fn parse(raw: Option<&str>) -> Result<Self, Report<GdprError>> {
        match raw {
            None | Some("") => Ok(Self::Ambiguous),
            Some("0") => Ok(Self::No),
            Some("1") => Ok(Self::Yes),
            Some(other) => Err(Report::new(GdprError::InvalidSignal {
                value: other.to_string(),
            })),
        }
    }

    /// Resolve an ambiguous signal to the configured default value.
    pub fn normalize(self, default: Self) -> Self {
        match self {
            Self::Ambiguous => default,
            signal => signal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absent_is_ambiguous() {
        assert_eq!(Signal::parse(None).unwrap(), Signal::Ambiguous);
        assert_eq!(Signal::parse(Some("")).unwrap(), Signal::Ambiguous);
    }

    #[test]
    fn test_parse_zero_and_one() {
        assert_eq!(Signal::parse(Some("0")).unwrap(), Signal::No);
        assert_eq!(Signal::parse(Some("1")).unwrap(), Signal::Yes);
    }

    #[test]
    fn test_parse_garbage_is_an_error() {
        let err = Signal::parse(Some("yes")).unwrap_err();
        assert!(matches!(
            err.current_context(),
            GdprError::InvalidSignal { value } if value == "yes"
        ));
    }

    #[test]
    fn test_normalize_resolves_only_ambiguous() {
        assert_eq!(Signal::Ambiguous.normalize(Signal::Yes), Signal::Yes);
        assert_eq!(Signal::Ambiguous.normalize(Signal::No), Signal::No);
        assert_eq!(Signal::No.normalize(Signal::Yes), Signal::No);
        assert_eq!(Signal::Yes.normalize(Signal::No), Signal::Yes);
    }
}
