use rust_decimal::Decimal;

use crate::models::rule::{ConditionValue, Rule, ThresholdOperator};

/// Built-in rule set used when no declarative config is present at
/// startup: a high-value-amount rule, a
/// currency rule, and a 70/30 percentage split.
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            name: "high-value-amount".to_string(),
            priority: 1,
            condition: ConditionValue::AmountThreshold {
                operator: ThresholdOperator::GreaterThan,
                amount: Decimal::new(100_000, 2),
            },
            target_processor: "processor_b".to_string(),
            percentage: None,
            is_active: true,
        },
        Rule {
            name: "non-usd-currency".to_string(),
            priority: 2,
            condition: ConditionValue::Currency {
                currencies: vec!["EUR".to_string(), "GBP".to_string()],
            },
            target_processor: "processor_b".to_string(),
            percentage: None,
            is_active: true,
        },
        Rule {
            name: "default-split-a".to_string(),
            priority: 3,
            condition: ConditionValue::Percentage,
            target_processor: "processor_a".to_string(),
            percentage: Some(70),
            is_active: true,
        },
        Rule {
            name: "default-split-b".to_string(),
            priority: 4,
            condition: ConditionValue::Percentage,
            target_processor: "processor_b".to_string(),
            percentage: Some(100),
            is_active: true,
        },
    ]
}
