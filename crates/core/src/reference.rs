//! Human-readable reference ids (`CLI-0001`, `EMP-0042`).
//!
//! Numbers are zero-padded to four digits and keep growing past 9999.

/// Reference prefix for employees.
pub const EMPLOYEE_PREFIX: &str = "EMP";
/// Reference prefix for placements.
pub const PLACEMENT_PREFIX: &str = "PLC";

/// Formats a reference id.
#[must_use]
pub fn format_reference(prefix: &str, number: u32) -> String {
    format!("{prefix}-{number:04}")
}

/// Extracts the number of a reference id with the given prefix.
#[must_use]
pub fn parse_reference(prefix: &str, reference: &str) -> Option<u32> {
    reference
        .strip_prefix(prefix)?
        .strip_prefix('-')?
        .parse()
        .ok()
}

/// Next reference id after the highest existing one.
#[must_use]
pub fn next_reference(prefix: &str, latest: Option<&str>) -> String {
    let last = latest
        .and_then(|reference| parse_reference(prefix, reference))
        .unwrap_or(0);
    format_reference(prefix, last.saturating_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("EMP", None, "EMP-0001")]
    #[case("EMP", Some("EMP-0041"), "EMP-0042")]
    #[case("CLI", Some("CLI-9999"), "CLI-10000")]
    #[case("PLC", Some("garbage"), "PLC-0001")]
    fn test_next_reference(
        #[case] prefix: &str,
        #[case] latest: Option<&str>,
        #[case] expected: &str,
    ) {
        assert_eq!(next_reference(prefix, latest), expected);
    }

    #[test]
    fn test_parse_requires_matching_prefix() {
        assert_eq!(parse_reference("VEN", "VEN-0012"), Some(12));
        assert_eq!(parse_reference("VEN", "ECL-0012"), None);
    }
}
