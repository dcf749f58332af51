//! CNY currency conversion against a static exchange-rate table.

/// Exchange rates with CNY as the base currency.
const EXCHANGE_RATES: &[(&str, f64)] = &[
    ("CNY", 1.0),
    ("USD", 7.0905),
    ("EUR", 8.1918),
    ("GBP", 9.2742),
    ("JPY", 0.045207),
    ("KRW", 0.004845),
    ("HKD", 0.91064),
    ("TWD", 0.23),
    ("SGD", 5.4359),
    ("CAD", 5.0575),
    ("AUD", 4.6080),
    ("CHF", 8.8168),
    ("RUB", 0.088283),
    ("UAH", 0.1718),
    ("BRL", 1.4),
    ("INR", 0.087),
    ("MXN", 0.3869),
    ("IDR", 0.00048),
];

/// Convert an amount to CNY. Returns `None` when the amount or currency is
/// unknown, or the currency is not in the table.
pub fn to_cny(amount: Option<f64>, currency: Option<&str>) -> Option<f64> {
    let amount = amount?;
    let code = currency?.to_uppercase();
    let rate = EXCHANGE_RATES
        .iter()
        .find(|(c, _)| *c == code)
        .map(|(_, r)| *r)?;
    Some((amount * rate * 100.0).round() / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cny_passes_through_unchanged() {
        assert_eq!(to_cny(Some(123.45), Some("CNY")), Some(123.45));
        assert_eq!(to_cny(Some(0.0), Some("cny")), Some(0.0));
    }

    #[test]
    fn converts_and_rounds_to_two_decimals() {
        assert_eq!(to_cny(Some(10.0), Some("USD")), Some(70.91));
        assert_eq!(to_cny(Some(100.0), Some("UAH")), Some(17.18));
        assert_eq!(to_cny(Some(1.0), Some("jpy")), Some(0.05));
    }

    #[test]
    fn none_for_missing_amount_or_currency() {
        assert_eq!(to_cny(None, Some("USD")), None);
        assert_eq!(to_cny(Some(10.0), None), None);
    }

    #[test]
    fn none_for_unsupported_currency() {
        assert_eq!(to_cny(Some(10.0), Some("XYZ")), None);
    }
}
