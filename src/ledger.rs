//! Monetary totals over line items. No rounding happens here; amounts are
//! only formatted when rendered.

use crate::model::LineItem;

pub fn line_total(item: &LineItem) -> f64 {
    item.quantity * item.unit_price
}

pub fn grand_total(items: &[LineItem]) -> f64 {
    items.iter().fold(0.0, |acc, item| acc + line_total(item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u32, quantity: f64, unit_price: f64) -> LineItem {
        LineItem { quantity, unit_price, ..LineItem::blank(id) }
    }

    #[test]
    fn test_empty_total_is_zero() {
        assert_eq!(grand_total(&[]), 0.0);
        assert!(grand_total(&[]).is_sign_positive());
    }

    #[test]
    fn test_line_total() {
        assert_eq!(line_total(&item(1, 3.0, 10.0)), 30.0);
        assert_eq!(line_total(&item(1, 0.0, 10.0)), 0.0);
    }

    #[test]
    fn test_grand_total_sums_lines() {
        let items = vec![item(1, 2.0, 5.5), item(2, 1.0, 100.0)];
        let expected: f64 = items.iter().map(|i| i.quantity * i.unit_price).sum();
        assert_eq!(grand_total(&items), expected);
        assert_eq!(grand_total(&items), 111.0);
    }

    #[test]
    fn test_negative_values_pass_through() {
        let items = vec![item(1, -1.0, 20.0), item(2, 2.0, 15.0)];
        assert_eq!(grand_total(&items), 10.0);
    }
}
