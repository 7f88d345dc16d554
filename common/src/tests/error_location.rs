use crate::ErrorLocation;
use std::panic::Location;

/// **VALUE**: Verifies that `ErrorLocation::from()` correctly captures file, line, and column.
///
/// **WHY THIS MATTERS**: ErrorLocation is the foundation of the error tracking system.
/// If it fails to capture accurate location data, every error message in the workspace
/// loses its debugging value.
///
/// **BUG THIS CATCHES**: Would catch if `Location::caller()` stops being propagated
/// correctly, or file path / line / column capture breaks.
#[test]
#[track_caller]
fn given_location_caller_when_error_location_created_then_captures_file_line_column() {
    // GIVEN: Current caller location
    // WHEN: Creating ErrorLocation from caller
    let location = ErrorLocation::from(Location::caller());

    // THEN: Should capture file, line, and column
    assert!(
        location.file.contains("error_location.rs"),
        "Should capture file path"
    );
    assert!(location.line > 0, "Should capture line number");
    assert!(location.column > 0, "Should capture column number");
}

/// **VALUE**: Verifies that ErrorLocation Display formatting produces the expected format.
///
/// **WHY THIS MATTERS**: Error messages are shown to users and developers. If the format
/// breaks, error messages become unreadable or lose critical location information.
///
/// **BUG THIS CATCHES**: Would catch if the Display implementation changes format
/// (e.g., drops the brackets) or omits file path, line, or column.
#[test]
#[track_caller]
fn given_error_location_when_formatted_then_produces_bracketed_format() {
    // GIVEN: An ErrorLocation
    let location = ErrorLocation::from(Location::caller());

    // WHEN: Formatting as string
    let formatted = format!("{}", location);

    // THEN: Should produce "[file:line:column]" format
    assert!(formatted.starts_with('['), "Should start with '['");
    assert!(formatted.ends_with(']'), "Should end with ']'");
    assert!(
        formatted.contains("error_location.rs"),
        "Should include filename"
    );
    assert!(
        formatted.contains(&location.line.to_string()),
        "Should include line number"
    );
}

/// **VALUE**: Verifies that `#[track_caller]` propagation works correctly.
///
/// **WHY THIS MATTERS**: The error location system depends on `#[track_caller]`
/// propagating through function calls. If this breaks, all errors report the wrong
/// location (always pointing at the error constructor instead of the actual error site).
///
/// **BUG THIS CATCHES**: Would catch if someone removes `#[track_caller]` from a
/// constructor in the error chain, collapsing every call site to one location.
#[test]
fn given_multiple_call_sites_when_capturing_location_then_each_has_unique_line() {
    // GIVEN: A helper function that captures location
    #[track_caller]
    fn capture_location() -> ErrorLocation {
        ErrorLocation::from(Location::caller())
    }

    // WHEN: Capturing location from different call sites
    let loc1 = capture_location();
    let loc2 = capture_location();

    // THEN: Should have same file but different line numbers
    assert_eq!(loc1.file, loc2.file, "Should have same file");
    assert_ne!(loc1.line, loc2.line, "Should have different line numbers");
    assert_eq!(loc1.line + 1, loc2.line, "Lines should be sequential");
}
