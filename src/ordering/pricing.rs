use chrono::{DateTime, Duration, Utc};
use rand::Rng;

pub const TAX_RATE: f64 = 0.10;
pub const DELIVERY_FEE: f64 = 0.0;

const BASE_DELIVERY_MINUTES: i64 = 30;
const DELIVERY_JITTER_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Totals {
    pub subtotal: f64,
    pub tax: f64,
    pub delivery_fee: f64,
    pub total: f64,
}

/// Price a basket of `(unit price, quantity)` lines as submitted by the guest.
pub fn totals<I>(lines: I) -> Totals
where
    I: IntoIterator<Item = (f64, i32)>,
{
    let subtotal: f64 = lines
        .into_iter()
        .map(|(price, quantity)| price * f64::from(quantity))
        .sum();
    let tax = round_cents(subtotal * TAX_RATE);
    Totals {
        subtotal,
        tax,
        delivery_fee: DELIVERY_FEE,
        total: subtotal + tax + DELIVERY_FEE,
    }
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Somewhere between 30 and 44 minutes from `now`.
pub fn estimated_delivery(now: DateTime<Utc>) -> DateTime<Utc> {
    let extra = rand::rng().random_range(0..DELIVERY_JITTER_MINUTES);
    now + Duration::minutes(BASE_DELIVERY_MINUTES + extra)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prices_a_basket() {
        let t = totals([(10.0, 2), (5.0, 1)]);
        assert_eq!(t.subtotal, 25.0);
        assert_eq!(t.tax, 2.5);
        assert_eq!(t.delivery_fee, 0.0);
        assert_eq!(t.total, 27.5);
    }

    #[test]
    fn total_is_sum_of_parts() {
        let t = totals([(3.33, 3), (0.99, 7), (12.5, 1)]);
        assert_eq!(t.total, t.subtotal + t.tax + t.delivery_fee);
        assert_eq!(t.tax, round_cents(t.subtotal * TAX_RATE));
    }

    #[test]
    fn tax_is_rounded_to_cents() {
        let t = totals([(1.99, 1)]);
        assert_eq!(t.tax, 0.2);
    }

    #[test]
    fn empty_basket_is_free() {
        let t = totals(std::iter::empty::<(f64, i32)>());
        assert_eq!(t.total, 0.0);
    }

    #[test]
    fn delivery_estimate_window() {
        let now = Utc::now();
        for _ in 0..50 {
            let eta = estimated_delivery(now);
            let minutes = (eta - now).num_minutes();
            assert!((30..45).contains(&minutes), "{minutes}");
        }
    }
}
