//! Property tests for raw-input coercion: surrounding whitespace and letter
//! case never change the outcome of a parse.

use proptest::prelude::*;
use rreq_model::RequestStatus;
use rreq_validate::{parse_item_kind, parse_priority, parse_status};

/// Re-case a canonical value character by character.
fn recase(value: &str, flips: &[bool]) -> String {
    value
        .chars()
        .zip(flips.iter().cycle())
        .map(|(c, flip)| {
            if *flip {
                c.to_ascii_lowercase()
            } else {
                c
            }
        })
        .collect()
}

proptest! {
    #[test]
    fn status_parse_ignores_case_and_whitespace(
        index in 0usize..RequestStatus::ALL.len(),
        flips in proptest::collection::vec(any::<bool>(), 1..8),
        pad_left in 0usize..4,
        pad_right in 0usize..4,
    ) {
        let status = RequestStatus::ALL[index];
        let mangled = format!(
            "{}{}{}",
            " ".repeat(pad_left),
            recase(status.as_str(), &flips),
            " ".repeat(pad_right),
        );
        prop_assert_eq!(parse_status(&mangled), Ok(status));
    }

    #[test]
    fn lowercase_noise_parses_iff_canonical_does(raw in "[a-z]{1,12}") {
        match raw.to_uppercase().parse::<RequestStatus>() {
            Ok(status) => prop_assert_eq!(parse_status(&raw), Ok(status)),
            Err(_) => prop_assert!(parse_status(&raw).is_err()),
        }
    }

    #[test]
    fn priority_and_kind_reject_empty_and_noise(noise in "[0-9]{1,6}") {
        prop_assert!(parse_priority(&noise).is_err());
        prop_assert!(parse_item_kind(&noise).is_err());
        prop_assert!(parse_priority("").is_err());
        prop_assert!(parse_item_kind("").is_err());
    }
}
