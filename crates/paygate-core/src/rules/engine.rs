//! Rule Engine: a prioritized, hot-reloadable predicate-based router.
//! The rule list is a `RuleCondition`/`RuleAction` enum-of-variants
//! plus an `evaluate(&self, ctx) -> bool` shape, applied here to
//! payment routing requests.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::models::rule::{Rule, RuleRequest};
use crate::{Error, Result};

use super::defaults::default_rules;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleFile {
    pub version: u32,
    pub last_updated: DateTime<Utc>,
    pub rules: Vec<Rule>,
    pub default_rule: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Alternative {
    pub target_processor: String,
    pub rule_name: Option<String>,
    pub confidence: f64,
}

#[derive(Debug, Clone)]
pub struct Evaluation {
    pub target_processor: String,
    pub rule_matched: Option<String>,
    pub rule_priority: Option<i32>,
    pub confidence: f64,
    pub alternatives: Vec<Alternative>,
}

pub struct RuleEngine {
    rules: ArcSwap<Vec<Rule>>,
    config_path: Option<String>,
    reload_count: AtomicU64,
    last_reload: Mutex<DateTime<Utc>>,
}

impl RuleEngine {
    /// Load from `config_path` if present, falling back to the
    /// built-in default rule set so the system boots either way
    ///.
    pub fn load(config_path: &str) -> Self {
        let rules = Self::read_rules_file(config_path).unwrap_or_else(|_| default_rules());
        Self {
            rules: ArcSwap::from_pointee(Self::sorted(rules)),
            config_path: Some(config_path.to_string()),
            reload_count: AtomicU64::new(0),
            last_reload: Mutex::new(Utc::now()),
        }
    }

    pub fn with_rules(rules: Vec<Rule>) -> Self {
        Self {
            rules: ArcSwap::from_pointee(Self::sorted(rules)),
            config_path: None,
            reload_count: AtomicU64::new(0),
            last_reload: Mutex::new(Utc::now()),
        }
    }

    fn read_rules_file(path: &str) -> Result<Vec<Rule>> {
        if !Path::new(path).exists() {
            return Err(Error::not_found(format!("rule config not found at {}", path)));
        }
        let contents = std::fs::read_to_string(path)?;
        let file: RuleFile = toml::from_str(&contents)?;
        Ok(file.rules)
    }

    /// Stable sort by ascending priority; equal priorities keep
    /// insertion order.
    fn sorted(mut rules: Vec<Rule>) -> Vec<Rule> {
        rules.sort_by_key(|r| r.priority);
        rules
    }

    pub fn reload_count(&self) -> u64 {
        self.reload_count.load(Ordering::SeqCst)
    }

    pub fn last_reload(&self) -> DateTime<Utc> {
        *self.last_reload.lock().expect("last_reload mutex poisoned")
    }

    pub fn rules(&self) -> Vec<Rule> {
        self.rules.load().as_ref().clone()
    }

    /// Re-read the config file and atomically swap the rule list.
    /// Falls back to the current list on any read/parse failure.
    pub fn reload(&self) -> Result<()> {
        let path = self
            .config_path
            .as_deref()
            .ok_or_else(|| Error::config("rule engine was not configured with a file path"))?;
        let rules = Self::read_rules_file(path)?;
        self.rules.store(std::sync::Arc::new(Self::sorted(rules)));
        self.reload_count.fetch_add(1, Ordering::SeqCst);
        *self.last_reload.lock().expect("last_reload mutex poisoned") = Utc::now();
        Ok(())
    }

    /// Replace one rule by name, re-sorting afterward. Inserts if the
    /// name doesn't already exist.
    pub fn update(&self, name: &str, rule: Rule) {
        let mut rules = self.rules();
        if let Some(existing) = rules.iter_mut().find(|r| r.name == name) {
            *existing = rule;
        } else {
            rules.push(rule);
        }
        self.rules.store(std::sync::Arc::new(Self::sorted(rules)));
        self.reload_count.fetch_add(1, Ordering::SeqCst);
        *self.last_reload.lock().expect("last_reload mutex poisoned") = Utc::now();
    }

    /// Evaluate the rule list against a request. Percentage draws
    /// come from `rand::thread_rng`.
    pub fn evaluate(&self, request: &RuleRequest) -> Evaluation {
        let rules = self.rules.load();
        let mut alternatives = Vec::new();

        for rule in rules.iter() {
            if !rule.is_active {
                continue;
            }
            let draw = rand::thread_rng().gen_range(0..100);
            if rule.matches(request, draw) {
                // collect a couple of subsequent rules as alternatives,
                // the way a caller would want to see the next choices.
                for other in rules.iter().skip_while(|r| r.name != rule.name).skip(1).take(2) {
                    if !other.is_active {
                        continue;
                    }
                    alternatives.push(Alternative {
                        target_processor: other.target_processor.clone(),
                        rule_name: Some(other.name.clone()),
                        confidence: other.confidence(),
                    });
                }
                return Evaluation {
                    target_processor: rule.target_processor.clone(),
                    rule_matched: Some(rule.name.clone()),
                    rule_priority: Some(rule.priority),
                    confidence: rule.confidence(),
                    alternatives,
                };
            }
        }

        Evaluation {
            target_processor: "processor_a".to_string(),
            rule_matched: None,
            rule_priority: None,
            confidence: 0.5,
            alternatives,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::rule::{ConditionValue, ThresholdOperator};
    use rust_decimal::Decimal;

    fn rule(name: &str, priority: i32, amount: Decimal, target: &str) -> Rule {
        Rule {
            name: name.to_string(),
            priority,
            condition: ConditionValue::AmountThreshold {
                operator: ThresholdOperator::GreaterThan,
                amount,
            },
            target_processor: target.to_string(),
            percentage: None,
            is_active: true,
        }
    }

    #[test]
    fn fallback_to_processor_a_when_nothing_matches() {
        let engine = RuleEngine::with_rules(vec![rule("r1", 1, Decimal::new(1_000_000, 2), "processor_b")]);
        let mut req = RuleRequest::default();
        req.amount = Decimal::new(100, 2);
        let eval = engine.evaluate(&req);
        assert_eq!(eval.target_processor, "processor_a");
        assert!(eval.rule_matched.is_none());
        assert_eq!(eval.confidence, 0.5);
    }

    #[test]
    fn lower_priority_number_wins_when_both_match() {
        let engine = RuleEngine::with_rules(vec![
            rule("r2", 2, Decimal::new(0, 2), "processor_b"),
            rule("r1", 1, Decimal::new(0, 2), "processor_a"),
        ]);
        let mut req = RuleRequest::default();
        req.amount = Decimal::new(100, 2);
        let eval = engine.evaluate(&req);
        assert_eq!(eval.rule_matched.as_deref(), Some("r1"));
        assert_eq!(eval.target_processor, "processor_a");
    }

    #[test]
    fn inactive_rules_are_skipped() {
        let mut r1 = rule("r1", 1, Decimal::new(0, 2), "processor_a");
        r1.is_active = false;
        let engine = RuleEngine::with_rules(vec![r1, rule("r2", 2, Decimal::new(0, 2), "processor_b")]);
        let mut req = RuleRequest::default();
        req.amount = Decimal::new(100, 2);
        let eval = engine.evaluate(&req);
        assert_eq!(eval.rule_matched.as_deref(), Some("r2"));
    }

    #[test]
    fn update_replaces_and_resorts() {
        let engine = RuleEngine::with_rules(vec![rule("r1", 5, Decimal::new(0, 2), "processor_a")]);
        engine.update("r2", rule("r2", 1, Decimal::new(0, 2), "processor_b"));
        let rules = engine.rules();
        assert_eq!(rules[0].name, "r2");
        assert_eq!(engine.reload_count(), 1);
    }

    #[test]
    fn percentage_split_lands_near_70_30_over_many_draws() {
        let engine = RuleEngine::with_rules(vec![
            Rule {
                name: "split-a".to_string(),
                priority: 1,
                condition: ConditionValue::Percentage,
                target_processor: "processor_a".to_string(),
                percentage: Some(70),
                is_active: true,
            },
            Rule {
                name: "split-b".to_string(),
                priority: 2,
                condition: ConditionValue::Percentage,
                target_processor: "processor_b".to_string(),
                percentage: Some(100),
                is_active: true,
            },
        ]);

        let n = 2000;
        let req = RuleRequest::default();
        let mut a_count = 0;
        for _ in 0..n {
            if engine.evaluate(&req).target_processor == "processor_a" {
                a_count += 1;
            }
        }
        let fraction = a_count as f64 / n as f64;
        assert!(
            (fraction - 0.7).abs() < 0.05,
            "expected ~0.7 processor_a share, got {}",
            fraction
        );
    }
}
