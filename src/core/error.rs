//! Render error: the single failure kind raised while lowering resources.

use std::fmt;

/// Validation error raised by any descriptor check.
///
/// Every failure aborts the current add/construct call and propagates to the
/// top of the render pass. The message is the only diagnostic the descriptor
/// author sees, so it names the offending value and valid alternatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderError {
    pub message: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for RenderError {}

impl From<RenderError> for String {
    fn from(e: RenderError) -> Self {
        e.message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_is_message() {
        let e = RenderError::new("Volume [data] already added");
        assert_eq!(e.to_string(), "Volume [data] already added");
    }

    #[test]
    fn test_error_into_string() {
        let s: String = RenderError::new("boom").into();
        assert_eq!(s, "boom");
    }
}
