//! Deterministic rendering of a merged price report.
//!
//! Pure functions only: currency symbols, discount percentages and the
//! home/comparison price difference. Unknown figures render as the literal
//! "unknown" token; under the "NONE" comparison sentinel the comparison and
//! difference lines are omitted entirely.

use crate::config::STEAM_STORE_WEB_BASE;
use crate::types::{Comparison, PriceReport};

/// Format an amount with its currency symbol, two decimals fixed.
pub fn fmt_price(amount: Option<f64>, currency: Option<&str>) -> String {
    let (amount, currency) = match (amount, currency) {
        (Some(a), Some(c)) => (a, c),
        _ => return "unknown".to_string(),
    };
    match currency {
        "CNY" => format!("￥{:.2}", amount),
        "UAH" => format!("₴{:.2}", amount),
        "USD" => format!("${:.2}", amount),
        other => format!("{} {:.2}", other, amount),
    }
}

/// Historical-low discount. The regular-price basis is preferred because it
/// is stable; the live-price basis shifts whenever the live price itself is
/// discounted.
pub fn percent_drop(now: Option<f64>, low: Option<f64>, regular: Option<f64>) -> String {
    if let (Some(regular), Some(low)) = (regular, low) {
        if regular > 0.0 {
            return format!("-{:.0}%", ((1.0 - low / regular) * 100.0).round());
        }
    }
    if let (Some(now), Some(low)) = (now, low) {
        if now > 0.0 {
            return format!("-{:.0}%", ((1.0 - low / now) * 100.0).round());
        }
    }
    "unknown".to_string()
}

/// Home vs comparison difference, computed only when both CNY amounts are
/// known and the comparison amount is strictly positive. Negative delta
/// means the home region is cheaper.
pub fn price_difference(home_cny: Option<f64>, compare_cny: Option<f64>) -> String {
    let (home, compare) = match (home_cny, compare_cny) {
        (Some(h), Some(c)) if c > 0.0 => (h, c),
        _ => return "Unable to compute the current price difference".to_string(),
    };
    let diff = home - compare;
    let pct = diff / compare * 100.0;
    if diff < 0.0 {
        format!(
            "Home region is cheaper by ￥{:.2} ({:.2}% cheaper)",
            -diff, -pct
        )
    } else {
        format!("Home region costs ￥{:.2} more (+{:.2}%)", diff, pct)
    }
}

/// Render the full report. Returns the message text and an optional image
/// reference for the messaging boundary.
pub fn render(report: &PriceReport) -> (String, Option<String>) {
    let name = if report.display_name.is_empty() {
        format!("AppID: {}", report.appid)
    } else {
        report.display_name.clone()
    };

    // A missing catalog mapping carries no price data at all; say so
    // instead of rendering a report full of "unknown".
    if report.catalog_missing {
        let msg = format!(
            "{}\nNo price-history mapping was found for this title, so price \
             data is unavailable. Try searching with a different name.\n\
             Store link: {}/app/{}",
            name, STEAM_STORE_WEB_BASE, report.appid
        );
        return (msg, report.image_url.clone());
    }

    let mut home_line = fmt_price(report.home.amount, report.home.currency.as_deref());
    if report.home.discount_percent > 0 {
        home_line.push_str(&format!(" -{}%", report.home.discount_percent));
    }

    let low_line = format!(
        "{} {}",
        fmt_price(report.history_low, report.home.currency.as_deref()),
        percent_drop(report.home.amount, report.history_low, report.regular_price)
    );

    let mut msg = format!(
        "{}\nHome price: {}\nHistorical low: {}\n",
        name, home_line, low_line
    );

    if let Comparison::Quote(q) = &report.compare {
        let mut compare_line = fmt_price(q.amount, q.currency.as_deref());
        if q.discount_percent > 0 {
            compare_line.push_str(&format!(" -{}%", q.discount_percent));
        }
        if let Some(cny) = report.compare_cny.filter(|v| *v > 0.0) {
            compare_line.push_str(&format!(" (￥{:.2})", cny));
        }
        msg.push_str(&format!(
            "\n{} price: {}\n\n{}\n",
            report.compare_region,
            compare_line,
            price_difference(report.home_cny, report.compare_cny)
        ));
    }

    if let Some(score) = &report.review_score {
        msg.push_str(&format!("Rating: {}\n", score));
    }
    msg.push_str(&format!(
        "Store link: {}/app/{}",
        STEAM_STORE_WEB_BASE, report.appid
    ));

    (msg, report.image_url.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PriceQuote;
    use chrono::Utc;

    #[test]
    fn currency_symbols() {
        assert_eq!(fmt_price(Some(140.0), Some("CNY")), "￥140.00");
        assert_eq!(fmt_price(Some(100.5), Some("UAH")), "₴100.50");
        assert_eq!(fmt_price(Some(59.99), Some("USD")), "$59.99");
        assert_eq!(fmt_price(Some(10.0), Some("EUR")), "EUR 10.00");
        assert_eq!(fmt_price(None, Some("CNY")), "unknown");
        assert_eq!(fmt_price(Some(1.0), None), "unknown");
    }

    #[test]
    fn percent_drop_prefers_regular_basis() {
        assert_eq!(percent_drop(Some(50.0), Some(40.0), Some(100.0)), "-60%");
        assert_eq!(percent_drop(Some(50.0), Some(40.0), None), "-20%");
        assert_eq!(percent_drop(None, None, None), "unknown");
        assert_eq!(percent_drop(Some(0.0), Some(0.0), None), "unknown");
    }

    #[test]
    fn difference_sign_convention() {
        let dearer = price_difference(Some(100.0), Some(80.0));
        assert!(dearer.contains("+25.00%"), "{}", dearer);
        assert!(dearer.contains("more"));

        let cheaper = price_difference(Some(80.0), Some(100.0));
        assert!(cheaper.contains("cheaper"), "{}", cheaper);
        assert!(cheaper.contains("20.00"), "{}", cheaper);

        assert_eq!(
            price_difference(Some(100.0), None),
            "Unable to compute the current price difference"
        );
        assert_eq!(
            price_difference(Some(100.0), Some(0.0)),
            "Unable to compute the current price difference"
        );
    }

    fn base_report(compare: Comparison) -> PriceReport {
        PriceReport {
            appid: "1091500".to_string(),
            display_name: "Cyberpunk 2077".to_string(),
            image_url: None,
            catalog_id: Some("018d".to_string()),
            catalog_missing: false,
            home: PriceQuote {
                amount: Some(140.0),
                currency: Some("CNY".to_string()),
                discount_percent: 50,
                captured_at: Utc::now(),
            },
            history_low: Some(124.0),
            regular_price: Some(298.0),
            compare,
            compare_region: "UA".to_string(),
            home_cny: Some(140.0),
            compare_cny: None,
            review_score: None,
        }
    }

    #[test]
    fn sentinel_omits_comparison_lines() {
        let (msg, _) = render(&base_report(Comparison::Disabled));
        assert!(!msg.contains("UA price"));
        assert!(!msg.contains("price difference"));
        assert!(msg.contains("Home price: ￥140.00 -50%"));
        assert!(msg.contains("Historical low: ￥124.00 -58%"));
    }

    #[test]
    fn missing_catalog_mapping_renders_plain_message() {
        use crate::types::PriceReport;
        let report = PriceReport::no_catalog_mapping(
            "1091500",
            "Cyberpunk 2077",
            Some("https://cdn/x_header.jpg".to_string()),
        );
        let (msg, image) = render(&report);
        assert!(msg.contains("Cyberpunk 2077"));
        assert!(msg.contains("Try searching with a different name"));
        assert!(!msg.contains("Home price"));
        assert!(!msg.contains("Historical low"));
        assert_eq!(image.as_deref(), Some("https://cdn/x_header.jpg"));
    }

    #[test]
    fn comparison_line_present_with_quote() {
        let mut report = base_report(Comparison::Quote(PriceQuote {
            amount: Some(700.0),
            currency: Some("UAH".to_string()),
            discount_percent: 30,
            captured_at: Utc::now(),
        }));
        report.compare_cny = Some(120.26);
        let (msg, _) = render(&report);
        assert!(msg.contains("UA price: ₴700.00 -30% (￥120.26)"));
        assert!(msg.contains("more (+16.41%)"), "{}", msg);
    }
}
