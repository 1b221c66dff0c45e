//! Billing rate timeline of a placement.
//!
//! Billings form a sequence of non-overlapping periods ordered by
//! `effective_from`. Only the latest one may be open-ended; adding a new
//! rate closes the previous open period the day before the new one starts.

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::placement::error::BillingError;

/// Hourly rates of one billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRates {
    /// Rate billed to the client.
    pub bill_rate: Decimal,
    /// Overtime rate billed to the client.
    pub overtime_bill_rate: Decimal,
    /// Rate paid to the consultant.
    pub pay_rate: Decimal,
}

impl BillingRates {
    /// Margin per regular hour.
    #[must_use]
    pub fn margin(&self) -> Decimal {
        self.bill_rate - self.pay_rate
    }
}

/// A stored billing period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    /// `placement_billings.id`.
    pub id: Uuid,
    /// Rates.
    pub rates: BillingRates,
    /// First day the rates apply.
    pub effective_from: NaiveDate,
    /// Last day the rates apply, `None` while open.
    pub effective_to: Option<NaiveDate>,
}

impl BillingPeriod {
    /// Whether the period covers `date`.
    #[must_use]
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.effective_from <= date && self.effective_to.is_none_or(|to| date <= to)
    }
}

/// Placement dates a billing must fall within.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementSpan {
    /// Placement start.
    pub start: NaiveDate,
    /// Placement end, if fixed.
    pub end: Option<NaiveDate>,
}

/// Closing of the previous open period required by a new billing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodClosure {
    /// Billing to close.
    pub billing_id: Uuid,
    /// New `effective_to`.
    pub effective_to: NaiveDate,
}

/// Checks the rates of a billing.
///
/// # Errors
///
/// Rejects non-positive bill/pay rates, a negative overtime rate, and a
/// pay rate above the bill rate.
pub fn validate_rates(rates: &BillingRates) -> Result<(), BillingError> {
    if rates.bill_rate <= Decimal::ZERO {
        return Err(BillingError::NonPositiveRate { field: "bill_rate" });
    }
    if rates.pay_rate <= Decimal::ZERO {
        return Err(BillingError::NonPositiveRate { field: "pay_rate" });
    }
    if rates.overtime_bill_rate < Decimal::ZERO {
        return Err(BillingError::NegativeOvertimeRate);
    }
    if rates.pay_rate > rates.bill_rate {
        return Err(BillingError::PayExceedsBill {
            pay: rates.pay_rate,
            bill: rates.bill_rate,
        });
    }
    Ok(())
}

/// Validates a new billing against the placement and existing history.
///
/// `history` may be in any order. Returns the closure to apply to the
/// previous open period, if one exists.
///
/// # Errors
///
/// Rate errors from [`validate_rates`], or an effective date outside the
/// placement or not after the latest existing billing.
pub fn plan_new_billing(
    span: PlacementSpan,
    history: &[BillingPeriod],
    rates: &BillingRates,
    effective_from: NaiveDate,
) -> Result<Option<PeriodClosure>, BillingError> {
    validate_rates(rates)?;

    if effective_from < span.start {
        return Err(BillingError::BeforePlacementStart {
            effective_from,
            start: span.start,
        });
    }
    if let Some(end) = span.end
        && effective_from > end
    {
        return Err(BillingError::AfterPlacementEnd {
            effective_from,
            end,
        });
    }

    let Some(latest) = history.iter().max_by_key(|b| b.effective_from) else {
        return Ok(None);
    };
    if effective_from <= latest.effective_from {
        return Err(BillingError::NotAfterLatest {
            latest: latest.effective_from,
        });
    }

    let closure = history
        .iter()
        .filter(|b| b.effective_to.is_none_or(|to| to >= effective_from))
        .max_by_key(|b| b.effective_from)
        .and_then(|open| {
            effective_from
                .checked_sub_days(Days::new(1))
                .map(|effective_to| PeriodClosure {
                    billing_id: open.id,
                    effective_to,
                })
        });
    Ok(closure)
}

/// Rates in force on `date`.
#[must_use]
pub fn rate_on(history: &[BillingPeriod], date: NaiveDate) -> Option<&BillingPeriod> {
    history
        .iter()
        .filter(|b| b.covers(date))
        .max_by_key(|b| b.effective_from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rates(bill: Decimal, pay: Decimal) -> BillingRates {
        BillingRates {
            bill_rate: bill,
            overtime_bill_rate: bill * dec!(1.5),
            pay_rate: pay,
        }
    }

    fn span() -> PlacementSpan {
        PlacementSpan {
            start: date(2025, 1, 6),
            end: Some(date(2025, 12, 31)),
        }
    }

    fn open_period(from: NaiveDate) -> BillingPeriod {
        BillingPeriod {
            id: Uuid::new_v4(),
            rates: rates(dec!(95), dec!(70)),
            effective_from: from,
            effective_to: None,
        }
    }

    #[test]
    fn test_first_billing_needs_no_closure() {
        let plan = plan_new_billing(span(), &[], &rates(dec!(95), dec!(70)), date(2025, 1, 6));
        assert_eq!(plan, Ok(None));
    }

    #[test]
    fn test_new_billing_closes_open_period() {
        let current = open_period(date(2025, 1, 6));
        let plan = plan_new_billing(
            span(),
            std::slice::from_ref(&current),
            &rates(dec!(100), dec!(72.50)),
            date(2025, 4, 1),
        )
        .unwrap();
        assert_eq!(
            plan,
            Some(PeriodClosure {
                billing_id: current.id,
                effective_to: date(2025, 3, 31),
            })
        );
    }

    #[test]
    fn test_rate_checks() {
        assert_eq!(
            validate_rates(&rates(dec!(0), dec!(0))),
            Err(BillingError::NonPositiveRate { field: "bill_rate" })
        );
        assert_eq!(
            validate_rates(&rates(dec!(50), dec!(60))),
            Err(BillingError::PayExceedsBill {
                pay: dec!(60),
                bill: dec!(50)
            })
        );
        let mut negative_ot = rates(dec!(50), dec!(40));
        negative_ot.overtime_bill_rate = dec!(-1);
        assert_eq!(
            validate_rates(&negative_ot),
            Err(BillingError::NegativeOvertimeRate)
        );
    }

    #[test]
    fn test_effective_date_bounds() {
        let r = rates(dec!(95), dec!(70));
        assert!(matches!(
            plan_new_billing(span(), &[], &r, date(2025, 1, 5)),
            Err(BillingError::BeforePlacementStart { .. })
        ));
        assert!(matches!(
            plan_new_billing(span(), &[], &r, date(2026, 1, 1)),
            Err(BillingError::AfterPlacementEnd { .. })
        ));
        let current = open_period(date(2025, 3, 1));
        assert_eq!(
            plan_new_billing(span(), &[current], &r, date(2025, 3, 1)),
            Err(BillingError::NotAfterLatest {
                latest: date(2025, 3, 1)
            })
        );
    }

    #[test]
    fn test_rate_on_picks_covering_period() {
        let first = BillingPeriod {
            effective_to: Some(date(2025, 3, 31)),
            ..open_period(date(2025, 1, 6))
        };
        let second = BillingPeriod {
            rates: rates(dec!(100), dec!(75)),
            ..open_period(date(2025, 4, 1))
        };
        let history = vec![second.clone(), first.clone()];

        assert_eq!(rate_on(&history, date(2025, 2, 1)), Some(&first));
        assert_eq!(rate_on(&history, date(2025, 4, 1)), Some(&second));
        assert_eq!(rate_on(&history, date(2024, 12, 31)), None);
        assert_eq!(second.rates.margin(), dec!(25));
    }
}
