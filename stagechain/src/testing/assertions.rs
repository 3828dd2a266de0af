//! Test assertions for chain results.

use crate::handling::Disposition;

/// Asserts that the recorded markers match `expected`, in order.
pub fn assert_markers(actual: &[String], expected: &[&str]) {
    assert!(
        actual.iter().map(String::as_str).eq(expected.iter().copied()),
        "Expected markers {:?}, got {:?}",
        expected,
        actual
    );
}

/// Asserts that the work was claimed by `handler`.
pub fn assert_handled_by(disposition: &Disposition, handler: &str) {
    match disposition {
        Disposition::Handled { handler: actual } => assert_eq!(
            actual, handler,
            "Expected work to be claimed by '{}', got '{}'",
            handler, actual
        ),
        Disposition::FellBack => panic!("Expected work to be claimed by '{handler}', but the fallback ran"),
    }
}

/// Asserts that no handler claimed the work.
pub fn assert_fell_back(disposition: &Disposition) {
    assert_eq!(
        disposition,
        &Disposition::FellBack,
        "Expected the fallback to run, got {:?}",
        disposition
    );
}
