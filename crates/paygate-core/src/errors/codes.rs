//! Stable machine error codes. Kept as plain string
//! constants rather than a Rust enum: these codes round-trip through
//! an external processor's JSON response, and unknown codes must
//! survive unmodified so the "unknown decline classifies as soft"
//! rule can still see them — which means this boundary has to stay
//! stringly-typed.

pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
pub const PAYMENT_METHOD_NOT_FOUND: &str = "PAYMENT_METHOD_NOT_FOUND";
pub const SUBSCRIPTION_NOT_FOUND: &str = "SUBSCRIPTION_NOT_FOUND";
pub const INVALID_REFUND_AMOUNT: &str = "INVALID_REFUND_AMOUNT";
pub const PROCESSORS_UNAVAILABLE: &str = "PROCESSORS_UNAVAILABLE";

/// Hard declines: never retried.
pub const HARD_DECLINE_CODES: &[&str] = &[
    "card_declined",
    "invalid_card",
    "expired_card",
    "card_not_supported",
    "invalid_account",
    "currency_not_supported",
    "fraud_detected",
    "stolen_card",
    "lost_card",
    "pickup_card",
    "invalid_amount",
    "do_not_honor",
    "account_closed",
    "insufficient_permission",
];

/// Soft declines: retry-eligible. An unknown code not
/// in either list is treated as soft, conservatively.
pub const SOFT_DECLINE_CODES: &[&str] = &[
    "insufficient_funds",
    "processing_error",
    "try_again_later",
    "temporary_failure",
    "network_error",
    "timeout",
    "rate_limit_exceeded",
    "service_unavailable",
    "processor_unavailable",
    "CHARGE_ERROR",
    "ORCHESTRATOR_ERROR",
];
