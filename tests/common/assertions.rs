//! Assertion macros with descriptive failure messages.

/// Assert that a command exited with `code`, printing both streams otherwise.
///
/// # Example
/// ```ignore
/// assert_exit_code!(result, 2);
/// ```
#[macro_export]
macro_rules! assert_exit_code {
    ($result:expr, $code:expr) => {
        assert_eq!(
            $result.exit_code, $code,
            "Unexpected exit code.\nstdout:\n{}\nstderr:\n{}",
            $result.stdout, $result.stderr
        );
    };
}

/// Assert that stdout or stderr contains `needle`.
///
/// # Example
/// ```ignore
/// assert_output_contains!(result, "Deployment successful");
/// ```
#[macro_export]
macro_rules! assert_output_contains {
    ($result:expr, $needle:expr) => {
        let combined = $result.combined_output();
        assert!(
            combined.contains($needle),
            "Expected output to contain '{}'.\nstdout:\n{}\nstderr:\n{}",
            $needle,
            $result.stdout,
            $result.stderr
        );
    };
}
