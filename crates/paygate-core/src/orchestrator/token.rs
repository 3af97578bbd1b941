//! Token selection policy: network tokens are preferred
//! because they preserve the option to fail over without a second
//! stored token.

use crate::models::PaymentMethod;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectedToken {
    Network(String),
    ProcessorSpecific(String),
}

impl SelectedToken {
    pub fn value(&self) -> &str {
        match self {
            SelectedToken::Network(t) => t,
            SelectedToken::ProcessorSpecific(t) => t,
        }
    }
}

/// Pick exactly one token for `processor_name`, per the fallback
/// chain: network token, then a processor-specific token, then any
/// processor token. Returns `None` if nothing usable is on file.
pub fn select_token(method: &PaymentMethod, processor_name: &str) -> Option<SelectedToken> {
    if let Some(token) = method.network_token.as_deref() {
        if !token.is_empty() {
            return Some(SelectedToken::Network(token.to_string()));
        }
    }
    if let Some(token) = method.token_for_processor(processor_name) {
        if !token.is_empty() {
            return Some(SelectedToken::ProcessorSpecific(token.to_string()));
        }
    }
    if let Some(token) = method.any_processor_token() {
        if !token.is_empty() {
            return Some(SelectedToken::ProcessorSpecific(token.to_string()));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn method(network: Option<&str>, a: Option<&str>, b: Option<&str>) -> PaymentMethod {
        PaymentMethod {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_type: crate::models::TokenType::Network,
            network_token: network.map(str::to_string),
            processor_a_token: a.map(str::to_string),
            processor_b_token: b.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prefers_network_token_regardless_of_processor() {
        let m = method(Some("ntk_x"), Some("tok_a"), Some("tok_b"));
        assert_eq!(select_token(&m, "processor_b"), Some(SelectedToken::Network("ntk_x".to_string())));
    }

    #[test]
    fn falls_back_to_matching_processor_token() {
        let m = method(None, Some("tok_a"), Some("tok_b"));
        assert_eq!(
            select_token(&m, "processor_b"),
            Some(SelectedToken::ProcessorSpecific("tok_b".to_string()))
        );
    }

    #[test]
    fn falls_back_to_any_processor_token_as_last_resort() {
        let m = method(None, Some("tok_a"), None);
        assert_eq!(
            select_token(&m, "processor_b"),
            Some(SelectedToken::ProcessorSpecific("tok_a".to_string()))
        );
    }

    #[test]
    fn no_usable_token_returns_none() {
        let m = method(None, None, None);
        assert_eq!(select_token(&m, "processor_a"), None);
    }
}
