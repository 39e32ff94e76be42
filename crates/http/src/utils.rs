//! Helper macros shared by the decoders.

/// Returns early with `$error` unless `$predicate` holds.
///
/// Reads like `assert!`, but hands the failure back to the caller instead of panicking.
///
/// ```ignore
/// ensure!(!name.is_empty(), ParseError::invalid_header("header name is empty"));
/// ```
macro_rules! ensure {
    ($predicate:expr, $error:expr) => {
        if !$predicate {
            return Err($error);
        }
    };
}

pub(crate) use ensure;
