//! Decline classification: inspect `error_code` to
//! decide whether the scheduler should retry.

use crate::errors::codes;
use crate::models::DeclineType;

pub fn classify(error_code: &str) -> DeclineType {
    if codes::HARD_DECLINE_CODES.contains(&error_code) {
        DeclineType::Hard
    } else {
        // Explicit soft codes and anything unrecognized both retry —
        // unknown codes are treated conservatively as soft (spec
        // §4.4.2).
        DeclineType::Soft
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_hard_codes_classify_as_hard() {
        assert_eq!(classify("expired_card"), DeclineType::Hard);
        assert_eq!(classify("fraud_detected"), DeclineType::Hard);
    }

    #[test]
    fn known_soft_codes_classify_as_soft() {
        assert_eq!(classify("insufficient_funds"), DeclineType::Soft);
        assert_eq!(classify("timeout"), DeclineType::Soft);
    }

    #[test]
    fn unknown_codes_default_to_soft() {
        assert_eq!(classify("some_new_code_we_have_never_seen"), DeclineType::Soft);
    }
}
