use bigdecimal::{BigDecimal, RoundingMode};
use chrono::Duration;
use hotel_core::config::AppConfig;

/// Percentages applied on top of an order's subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingRates {
    pub tax_rate: BigDecimal,
    pub service_charge_rate: BigDecimal,
}

impl Default for PricingRates {
    fn default() -> Self {
        PricingRates::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PricingRates {
    fn from(config: &AppConfig) -> Self {
        PricingRates {
            tax_rate: config.tax_rate.clone(),
            service_charge_rate: config.service_charge_rate.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderTotals {
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub service_charge: BigDecimal,
    pub total_price: BigDecimal,
}

pub(crate) fn money(amount: BigDecimal) -> BigDecimal {
    amount.with_scale_round(2, RoundingMode::HalfUp)
}

pub fn line_total(unit_price: &BigDecimal, quantity: i32) -> BigDecimal {
    money(unit_price * BigDecimal::from(quantity))
}

impl PricingRates {
    /// Totals for the given line totals. Tax and service charge are each
    /// rounded half-up to cents before they are added.
    pub fn totals<'a>(&self, line_totals: impl IntoIterator<Item = &'a BigDecimal>) -> OrderTotals {
        let subtotal = money(
            line_totals
                .into_iter()
                .fold(BigDecimal::from(0), |acc, line| acc + line),
        );
        let tax_amount = money(&subtotal * &self.tax_rate);
        let service_charge = money(&subtotal * &self.service_charge_rate);
        let total_price = &subtotal + &tax_amount + &service_charge;
        OrderTotals {
            subtotal,
            tax_amount,
            service_charge,
            total_price,
        }
    }
}

/// Kitchen estimate from `(preparation minutes, quantity)` per line.
///
/// A single line takes its own preparation time. Several lines take the
/// slowest item plus half the average quantity-weighted preparation time.
pub fn preparation_estimate(lines: &[(Option<i32>, i32)]) -> Duration {
    let mut max_minutes = 0i64;
    let mut total_minutes = 0i64;
    for (prep, quantity) in lines {
        if let Some(prep) = prep {
            let prep = i64::from(*prep);
            total_minutes += prep * i64::from(*quantity);
            max_minutes = max_minutes.max(prep);
        }
    }
    if lines.len() > 1 {
        let extra_seconds = total_minutes * 60 / (lines.len() as i64 * 2);
        Duration::minutes(max_minutes) + Duration::seconds(extra_seconds)
    } else {
        Duration::minutes(max_minutes)
    }
}
