//! Autofill formatting and credit card network detection

use crate::evaluator::{EvalError, EvalResult};
use crate::template;
use genui_proto::{AutofillEntry, Date};

/// Render `${field}` placeholders against the fields of an autofill entry
pub fn format_entry(entry: &AutofillEntry, pattern: &str) -> EvalResult<String> {
    template::render(pattern, |name| entry.field(name).map(str::to_string))
        .map_err(|field| EvalError::MissingField { field })
}

/// Render `${day}`, `${month}`, `${year}` and their zero-padded `2` variants
pub fn format_date(date: &Date, pattern: &str) -> EvalResult<String> {
    template::render(pattern, |name| {
        let value = match name {
            "day" => date.day.to_string(),
            "day2" => format!("{:02}", date.day),
            "month" => date.month.to_string(),
            "month2" => format!("{:02}", date.month),
            "year" => date.year.to_string(),
            "year2" => format!("{:02}", date.year.rem_euclid(100)),
            _ => return None,
        };
        Some(value)
    })
    .map_err(|field| EvalError::MissingField { field })
}

pub fn field_value(entry: &AutofillEntry, field: &str) -> EvalResult<String> {
    entry
        .field(field)
        .map(str::to_string)
        .ok_or_else(|| EvalError::MissingField {
            field: field.to_string(),
        })
}

/// Card network of a credit card entry.
///
/// An explicit `network` field wins; otherwise the network is derived from the issuer
/// prefix of `card_number`.
pub fn card_network(entry: &AutofillEntry) -> EvalResult<String> {
    if let Some(network) = entry.field("network").filter(|n| !n.trim().is_empty()) {
        return Ok(network.trim().to_ascii_lowercase());
    }

    let number = entry.field("card_number").ok_or_else(|| EvalError::MissingField {
        field: "card_number".to_string(),
    })?;
    let digits: String = number.chars().filter(char::is_ascii_digit).collect();

    network_from_digits(&digits)
        .map(str::to_string)
        .ok_or_else(|| EvalError::UnknownCardNetwork {
            guid: entry.guid.clone(),
        })
}

fn network_from_digits(digits: &str) -> Option<&'static str> {
    let prefix = |len: usize| -> Option<u32> { digits.get(..len).and_then(|p| p.parse().ok()) };

    if digits.starts_with('4') {
        return Some("visa");
    }
    if matches!(prefix(2), Some(34) | Some(37)) {
        return Some("amex");
    }
    if matches!(prefix(2), Some(51..=55)) || matches!(prefix(4), Some(2221..=2720)) {
        return Some("mastercard");
    }
    if prefix(4) == Some(6011) || prefix(2) == Some(65) {
        return Some("discover");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_entry() {
        let entry = AutofillEntry::new("guid-1")
            .with_field("name", "Jane Doe")
            .with_field("city", "Zurich");
        assert_eq!(format_entry(&entry, "${name}, ${city}").unwrap(), "Jane Doe, Zurich");
        assert!(matches!(
            format_entry(&entry, "${zip}"),
            Err(EvalError::MissingField { field }) if field == "zip"
        ));
    }

    #[test]
    fn test_format_date_fields() {
        let date = Date::new(2024, 3, 7);
        assert_eq!(format_date(&date, "${month2}/${year2}").unwrap(), "03/24");
        assert_eq!(format_date(&date, "${day}.${month}.${year}").unwrap(), "7.3.2024");
    }

    #[test]
    fn test_card_network_from_number() {
        let card = |number: &str| AutofillEntry::new("card").with_field("card_number", number);
        assert_eq!(card_network(&card("4111 1111 1111 1111")).unwrap(), "visa");
        assert_eq!(card_network(&card("5500000000000004")).unwrap(), "mastercard");
        assert_eq!(card_network(&card("2221000000000009")).unwrap(), "mastercard");
        assert_eq!(card_network(&card("378282246310005")).unwrap(), "amex");
        assert_eq!(card_network(&card("6011111111111117")).unwrap(), "discover");
        assert!(matches!(
            card_network(&card("9999")),
            Err(EvalError::UnknownCardNetwork { .. })
        ));
    }

    #[test]
    fn test_explicit_network_wins() {
        let entry = AutofillEntry::new("card")
            .with_field("network", "JCB")
            .with_field("card_number", "4111111111111111");
        assert_eq!(card_network(&entry).unwrap(), "jcb");
    }
}
