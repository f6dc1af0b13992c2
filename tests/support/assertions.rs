use xpguard::domain::ValidationResult;

pub fn assert_near(actual: f64, expected: f64, tolerance: f64) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "expected {} ± {}, got {}",
        expected,
        tolerance,
        actual
    );
}

pub fn assert_clean(result: &ValidationResult) {
    assert!(result.is_valid, "expected valid, errors: {:?}", result.errors);
    assert!(result.errors.is_empty());
    assert!(result.warnings.is_empty(), "unexpected warnings: {:?}", result.warnings);
    assert_eq!(result.risk_score, 0);
}

pub fn assert_rejected_with(result: &ValidationResult, needle: &str) {
    assert!(!result.is_valid, "expected rejection containing '{needle}'");
    assert!(
        result.has_error_containing(needle),
        "no error containing '{needle}' in {:?}",
        result.errors
    );
}
