use lf_core::error::Error;
use lf_core::span::Span;

/// Internal invariant violation in a loop model or pipeline.
pub fn conversion_error(message: impl Into<String>) -> Error {
    Error::invalid_model(message)
}

/// Same as [`conversion_error`], pointing at the loop being converted.
pub fn conversion_error_with_span(message: impl Into<String>, span: Span) -> Error {
    Error::invalid_model(format!("{} [span {}:{}]", message.into(), span.lo, span.hi))
}

/// Return early with an invalid-model error
#[macro_export]
macro_rules! convert_bail {
    ($message:expr) => {
        return Err($crate::error::conversion_error($message))
    };
    ($message:expr, $span:expr) => {
        return Err($crate::error::conversion_error_with_span($message, $span))
    };
}

/// Ensure a pipeline invariant holds, or return an invalid-model error
#[macro_export]
macro_rules! convert_ensure {
    ($cond:expr, $message:expr) => {
        if !($cond) {
            $crate::convert_bail!($message);
        }
    };
    ($cond:expr, $message:expr, $span:expr) => {
        if !($cond) {
            $crate::convert_bail!($message, $span);
        }
    };
}
