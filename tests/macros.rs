//! Common test macros.

/// Install a test logger once per test binary; later calls are no-ops.
#[macro_export]
macro_rules! init_logging {
    () => {
        let _ = env_logger::builder().is_test(true).try_init();
    };
}

/// Assert that a result is an error matching a pattern.
///
/// # Usage
/// ```ignore
/// assert_err_matches!(result, PipelineError::Cancelled);
/// assert_err_matches!(result, PipelineError::LineTooLong { line: 3, .. });
/// ```
#[macro_export]
macro_rules! assert_err_matches {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Err(other) => panic!(
                "assertion failed: error does not match `{}`\n  actual: {other:?}",
                stringify!($pattern)
            ),
            Ok(value) => panic!(
                "assertion failed: expected error `{}`, got Ok({value:?})",
                stringify!($pattern)
            ),
        }
    };
}
