//! Subscription model: a user's recurring billing agreement.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::Currency;
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "subscription_status", rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
    Paused,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq)]
#[sqlx(type_name = "billing_cycle", rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Yearly,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Subscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub payment_method_id: Uuid,
    pub status: SubscriptionStatus,
    pub amount: Decimal,
    pub currency: Currency,
    pub billing_cycle: BillingCycle,
    pub current_period_start: DateTime<Utc>,
    pub current_period_end: DateTime<Utc>,
    pub next_billing_date: DateTime<Utc>,
    pub cancel_at_period_end: bool,
    pub canceled_at: Option<DateTime<Utc>>,
    pub trial_start: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    pub fn validate(&self) -> Result<()> {
        if self.current_period_end <= self.current_period_start {
            return Err(Error::validation(
                "subscription current_period_end must be after current_period_start",
            ));
        }
        Ok(())
    }

    /// Whether the scheduler's due query should ever pick this
    /// subscription up again. A canceled subscription is never
    /// selected.
    pub fn is_billable(&self) -> bool {
        self.status == SubscriptionStatus::Active && !self.cancel_at_period_end
    }

    /// Advance the billing period forward by one cycle, keeping
    /// `next_billing_date` monotonically non-decreasing.
    pub fn advance_period(&mut self, now: DateTime<Utc>) {
        let next_end = match self.billing_cycle {
            BillingCycle::Monthly => add_months(self.current_period_end, 1),
            BillingCycle::Yearly => add_months(self.current_period_end, 12),
        };
        self.current_period_start = self.current_period_end;
        self.current_period_end = next_end;
        if next_end > self.next_billing_date {
            self.next_billing_date = next_end;
        } else {
            // Defensive: never let the next billing date regress even
            // if the clock or stored period drifted.
            self.next_billing_date = self.next_billing_date.max(now);
        }
    }
}

fn add_months(dt: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    use chrono::{Datelike, TimeZone};

    let total_months = dt.month0() as i64 + months as i64;
    let year = dt.year() + (total_months / 12) as i32;
    let month = (total_months % 12) as u32 + 1;

    // Clamp to the last valid day of the target month (e.g. Jan 31 + 1
    // month -> Feb 28) instead of overflowing into the month after.
    let mut day = dt.day();
    loop {
        if let Some(naive) = chrono::NaiveDate::from_ymd_opt(year, month, day) {
            return Utc.from_utc_datetime(&naive.and_time(dt.time()));
        }
        day -= 1;
        if day == 0 {
            return dt;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_subscription() -> Subscription {
        let now = Utc::now();
        Subscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            payment_method_id: Uuid::new_v4(),
            status: SubscriptionStatus::Active,
            amount: Decimal::new(2900, 2),
            currency: Currency::new("USD"),
            billing_cycle: BillingCycle::Monthly,
            current_period_start: now,
            current_period_end: now + Duration::days(30),
            next_billing_date: now + Duration::days(30),
            cancel_at_period_end: false,
            canceled_at: None,
            trial_start: None,
            trial_end: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn rejects_inverted_period() {
        let mut sub = base_subscription();
        sub.current_period_end = sub.current_period_start;
        assert!(sub.validate().is_err());
    }

    #[test]
    fn canceled_subscriptions_are_not_billable() {
        let mut sub = base_subscription();
        assert!(sub.is_billable());
        sub.status = SubscriptionStatus::Canceled;
        assert!(!sub.is_billable());
    }

    #[test]
    fn cancel_at_period_end_excludes_from_billing() {
        let mut sub = base_subscription();
        sub.cancel_at_period_end = true;
        assert!(!sub.is_billable());
    }

    #[test]
    fn advance_period_never_regresses_next_billing_date() {
        let mut sub = base_subscription();
        let before = sub.next_billing_date;
        sub.advance_period(Utc::now());
        assert!(sub.next_billing_date >= before);
        assert!(sub.current_period_end > sub.current_period_start);
    }
}
