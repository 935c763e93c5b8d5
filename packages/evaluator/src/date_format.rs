//! Date formatting with `EEE, MMM d y` style patterns
//!
//! Supported fields: `E` (weekday), `M` (month), `d` (day) and `y` (year). Text inside
//! single quotes is copied verbatim, `''` is a literal quote, and any other non-letter
//! character is copied as-is.

use crate::evaluator::{EvalError, EvalResult};
use chrono::{Datelike, NaiveDate};
use genui_proto::Date;

pub fn to_naive_date(date: &Date) -> EvalResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year, date.month, date.day)
        .ok_or(EvalError::InvalidDate { date: *date })
}

pub fn format_date(date: &Date, pattern: &str) -> EvalResult<String> {
    let naive = to_naive_date(date)?;
    let mut output = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                output.push('\'');
                continue;
            }
            let mut closed = false;
            while let Some(quoted) = chars.next() {
                if quoted == '\'' {
                    if chars.peek() == Some(&'\'') {
                        chars.next();
                        output.push('\'');
                        continue;
                    }
                    closed = true;
                    break;
                }
                output.push(quoted);
            }
            if !closed {
                return Err(EvalError::InvalidDateFormat {
                    pattern: pattern.to_string(),
                    details: "unterminated quote".to_string(),
                });
            }
            continue;
        }

        if !c.is_ascii_alphabetic() {
            output.push(c);
            continue;
        }

        let mut count = 1;
        while chars.peek() == Some(&c) {
            chars.next();
            count += 1;
        }
        output.push_str(&format_field(&naive, c, count, pattern)?);
    }

    Ok(output)
}

fn format_field(date: &NaiveDate, field: char, count: usize, pattern: &str) -> EvalResult<String> {
    let formatted = match (field, count) {
        ('y', 2) => format!("{:02}", date.year().rem_euclid(100)),
        ('y', n) if n >= 4 => format!("{:0width$}", date.year(), width = n),
        ('y', _) => date.year().to_string(),
        ('M', 1) => date.month().to_string(),
        ('M', 2) => format!("{:02}", date.month()),
        ('M', 3) => date.format("%b").to_string(),
        ('M', _) => date.format("%B").to_string(),
        ('d', 1) => date.day().to_string(),
        ('d', 2) => format!("{:02}", date.day()),
        ('E', n) if n <= 3 => date.format("%a").to_string(),
        ('E', _) => date.format("%A").to_string(),
        _ => {
            return Err(EvalError::InvalidDateFormat {
                pattern: pattern.to_string(),
                details: format!("unsupported field '{}'", field.to_string().repeat(count)),
            })
        }
    };
    Ok(formatted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_weekday_pattern() {
        let date = Date::new(2020, 3, 13);
        assert_eq!(format_date(&date, "EEE, MMM d y").unwrap(), "Fri, Mar 13 2020");
    }

    #[test]
    fn test_long_and_padded_fields() {
        let date = Date::new(2021, 7, 4);
        assert_eq!(
            format_date(&date, "EEEE dd MMMM yyyy").unwrap(),
            "Sunday 04 July 2021"
        );
        assert_eq!(format_date(&date, "MM/yy").unwrap(), "07/21");
    }

    #[test]
    fn test_quoted_literals() {
        let date = Date::new(2020, 1, 2);
        assert_eq!(format_date(&date, "'day' d 'o''clock'").unwrap(), "day 2 o'clock");
        assert_eq!(format_date(&date, "d''M").unwrap(), "2'1");
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            format_date(&Date::new(2020, 2, 30), "d"),
            Err(EvalError::InvalidDate { .. })
        ));
        assert!(matches!(
            format_date(&Date::new(2020, 2, 3), "HH:mm"),
            Err(EvalError::InvalidDateFormat { .. })
        ));
    }
}
