use pomidoras_core::{parse_duration_secs, DurationParseError};
use rstest::rstest;

#[rstest]
#[case("0", 0)]
#[case("90", 90)]
#[case("90s", 90)]
#[case("5m", 300)]
#[case("1h", 3600)]
#[case("1h30m", 5400)]
#[case("2m5s", 125)]
#[case("0s", 0)]
#[case(" 25m ", 1500)]
fn accepts_raw_counts_and_duration_strings(#[case] input: &str, #[case] expected: u64) {
    assert_eq!(parse_duration_secs(input), Ok(expected));
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("-5")]
#[case("-5m")]
#[case("m")]
#[case("5x")]
#[case("5ms")]
#[case("abc")]
#[case("99999999999999999999")]
#[case("99999999999999999h")]
fn rejects_malformed_input(#[case] input: &str) {
    assert!(
        parse_duration_secs(input).is_err(),
        "'{input}' should not parse"
    );
}

#[test]
fn negative_error_names_input() {
    let err = parse_duration_secs("-30s").unwrap_err();
    assert_eq!(err, DurationParseError::Negative("-30s".to_string()));
    assert!(err.to_string().contains("-30s"));
}
