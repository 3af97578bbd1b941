//! Payment method model: a portable network token OR a
//! dual-vault pair of processor-specific tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "token_type", rename_all = "snake_case")]
pub enum TokenType {
    Network,
    DualVault,
}

/// A payment method owned by a user. Immutable after creation — a
/// refresh (e.g. a new card on file) creates a logically new version
/// with a new id rather than mutating this row in place.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentMethod {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_type: TokenType,
    /// Portable token valid at any processor. Present iff `token_type
    /// == Network`.
    pub network_token: Option<String>,
    /// Vault token for `processor_a`. Present iff `token_type ==
    /// DualVault`.
    pub processor_a_token: Option<String>,
    /// Vault token for `processor_b`. Present iff `token_type ==
    /// DualVault`.
    pub processor_b_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl PaymentMethod {
    /// Validate the at-least-one-usable-token invariant.
    pub fn validate(&self) -> Result<()> {
        match self.token_type {
            TokenType::Network => {
                if self.network_token.as_deref().unwrap_or("").is_empty() {
                    return Err(Error::validation(
                        "network payment method is missing its network_token",
                    ));
                }
            }
            TokenType::DualVault => {
                let a_empty = self.processor_a_token.as_deref().unwrap_or("").is_empty();
                let b_empty = self.processor_b_token.as_deref().unwrap_or("").is_empty();
                if a_empty || b_empty {
                    return Err(Error::validation(
                        "dual-vault payment method requires both processor tokens",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Look up the processor-specific token for a given processor
    /// name, used by the best-effort fallback step of token selection
    ///.
    pub fn token_for_processor(&self, processor_name: &str) -> Option<&str> {
        match processor_name {
            "processor_a" => self.processor_a_token.as_deref(),
            "processor_b" => self.processor_b_token.as_deref(),
            _ => None,
        }
    }

    /// Any processor-specific token at all, regardless of which
    /// processor it belongs to — used as the last-resort fallback.
    pub fn any_processor_token(&self) -> Option<&str> {
        self.processor_a_token
            .as_deref()
            .or(self.processor_b_token.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(token_type: TokenType) -> PaymentMethod {
        PaymentMethod {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_type,
            network_token: None,
            processor_a_token: None,
            processor_b_token: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn network_method_requires_network_token() {
        let pm = base(TokenType::Network);
        assert!(pm.validate().is_err());

        let mut pm = pm;
        pm.network_token = Some("ntk_x".to_string());
        assert!(pm.validate().is_ok());
    }

    #[test]
    fn dual_vault_requires_both_tokens() {
        let mut pm = base(TokenType::DualVault);
        pm.processor_a_token = Some("tok_a".to_string());
        assert!(pm.validate().is_err());

        pm.processor_b_token = Some("tok_b".to_string());
        assert!(pm.validate().is_ok());
    }

    #[test]
    fn token_for_processor_looks_up_by_name() {
        let mut pm = base(TokenType::DualVault);
        pm.processor_a_token = Some("tok_a".to_string());
        pm.processor_b_token = Some("tok_b".to_string());

        assert_eq!(pm.token_for_processor("processor_a"), Some("tok_a"));
        assert_eq!(pm.token_for_processor("processor_b"), Some("tok_b"));
        assert_eq!(pm.token_for_processor("processor_c"), None);
    }
}
