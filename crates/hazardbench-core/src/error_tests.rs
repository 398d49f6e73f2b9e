//! Tests for `error` module

use super::error::*;

#[test]
fn test_error_codes_are_unique() {
    // Arrange - create all error variants
    let errors: Vec<Error> = vec![
        Error::HazardDetected {
            scenario: "lock-order".into(),
            stuck: vec!["reader".into()],
        },
        Error::ThreadPanicked("boom".into()),
        Error::Spawn(std::io::Error::other("test")),
        Error::Config("test".into()),
    ];

    // Act - collect all codes
    let codes: Vec<&str> = errors.iter().map(Error::code).collect();

    // Assert - all codes are unique and follow pattern
    let mut unique_codes = codes.clone();
    unique_codes.sort_unstable();
    unique_codes.dedup();
    assert_eq!(codes.len(), unique_codes.len(), "Error codes must be unique");

    for code in &codes {
        assert!(code.starts_with("HAZ-"), "Code {code} should start with HAZ-");
    }
}

#[test]
fn test_hazard_display_lists_stuck_threads() {
    let err = Error::HazardDetected {
        scenario: "lock-order".into(),
        stuck: vec!["reader".into(), "invalidator".into()],
    };

    let display = format!("{err}");

    assert!(display.contains("HAZ-001"));
    assert!(display.contains("lock-order"));
    assert!(display.contains("2 thread(s)"));
    assert!(display.contains("reader, invalidator"));
}

#[test]
fn test_only_hazard_detected_is_hazard() {
    assert!(Error::HazardDetected {
        scenario: "x".into(),
        stuck: vec![],
    }
    .is_hazard());
    assert!(!Error::ThreadPanicked("x".into()).is_hazard());
    assert!(!Error::Config("x".into()).is_hazard());
}

#[test]
fn test_config_error_converts() {
    let err: Error = crate::config::ConfigError::ParseError("bad toml".into()).into();

    assert_eq!(err.code(), "HAZ-004");
    assert!(err.to_string().contains("bad toml"));
}
