//! Error-code → user-facing message mapping. The
//! underlying code is always returned alongside the message for
//! machine consumers.

pub fn user_message_for(error_code: &str) -> &'static str {
    match error_code {
        "card_declined" => "Your card was declined. Please try a different payment method.",
        "insufficient_funds" => "Insufficient funds. Please try a different payment method or add funds.",
        "expired_card" | "invalid_card" | "card_not_supported" => "Your card has expired or is invalid. Please update your payment method.",
        "network_error" | "timeout" => "Network error while processing your payment. Please try again.",
        "processor_unavailable" | "service_unavailable" | "PROCESSORS_UNAVAILABLE" => {
            "Payment system temporarily unavailable. Please try again shortly."
        }
        "fraud_detected" | "stolen_card" | "lost_card" | "pickup_card" => {
            "Payment declined for security reasons. Please contact your card issuer."
        }
        _ => "Payment could not be processed.",
    }
}
