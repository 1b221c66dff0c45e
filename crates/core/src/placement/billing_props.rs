//! Property-based tests for the billing timeline.

use chrono::{Days, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::billing::{
    BillingPeriod, BillingRates, PlacementSpan, plan_new_billing, rate_on, validate_rates,
};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

fn rates_strategy() -> impl Strategy<Value = (i64, i64)> {
    (1i64..100_000).prop_flat_map(|bill| (Just(bill), 1i64..=bill))
}

/// Applies successive billings the way the repository does.
fn build_history(offsets: &[u64]) -> Vec<BillingPeriod> {
    let span = PlacementSpan {
        start: base(),
        end: None,
    };
    let rates = BillingRates {
        bill_rate: Decimal::new(9500, 2),
        overtime_bill_rate: Decimal::ZERO,
        pay_rate: Decimal::new(7000, 2),
    };
    let mut history: Vec<BillingPeriod> = Vec::new();
    let mut day = 0u64;
    for offset in offsets {
        day += offset;
        let from = base() + Days::new(day);
        let closure = plan_new_billing(span, &history, &rates, from).unwrap();
        if let Some(closure) = closure {
            let closed = history
                .iter_mut()
                .find(|b| b.id == closure.billing_id)
                .unwrap();
            closed.effective_to = Some(closure.effective_to);
        }
        history.push(BillingPeriod {
            id: Uuid::new_v4(),
            rates,
            effective_from: from,
            effective_to: None,
        });
    }
    history
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Valid rates are exactly those with 0 < pay <= bill.
    #[test]
    fn prop_pay_not_above_bill_is_valid((bill, pay) in rates_strategy()) {
        let rates = BillingRates {
            bill_rate: Decimal::new(bill, 2),
            overtime_bill_rate: Decimal::ZERO,
            pay_rate: Decimal::new(pay, 2),
        };
        prop_assert!(validate_rates(&rates).is_ok());

        let inverted = BillingRates {
            pay_rate: rates.bill_rate + Decimal::new(1, 2),
            ..rates
        };
        prop_assert!(validate_rates(&inverted).is_err());
    }

    /// After any sequence of inserts every day is covered by exactly one period
    /// and only the last period is open.
    #[test]
    fn prop_history_has_no_gaps_or_overlaps(
        first in 0u64..30,
        rest in prop::collection::vec(1u64..60, 0..8),
    ) {
        let mut offsets = vec![first];
        offsets.extend(rest);
        let history = build_history(&offsets);

        let open = history.iter().filter(|b| b.effective_to.is_none()).count();
        prop_assert_eq!(open, 1);

        let last_day = history.iter().map(|b| b.effective_from).max().unwrap() + Days::new(5);
        let mut day = base() + Days::new(first);
        while day <= last_day {
            let covering = history.iter().filter(|b| b.covers(day)).count();
            prop_assert_eq!(covering, 1);
            prop_assert!(rate_on(&history, day).is_some());
            day = day + Days::new(1);
        }
    }
}
