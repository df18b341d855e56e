/// Validates an order number against the Luhn checksum, as required of all
/// payment-style identifiers accepted by this service.
pub fn is_valid(order_number: &str) -> bool {
    if order_number.is_empty() || !order_number.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }

    let digits: Vec<u32> = order_number
        .chars()
        .map(|c| c.to_digit(10).expect("checked ascii digit above"))
        .collect();

    let parity = digits.len() % 2;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == parity {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Parses a decimal order number into its numeric form, rejecting anything
/// that would not round-trip back to the same string.
pub fn parse(order_number: &str) -> Option<i64> {
    if order_number.is_empty() || !order_number.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let parsed: i64 = order_number.parse().ok()?;
    if format(parsed) != order_number {
        return None;
    }
    Some(parsed)
}

pub fn format(order_number: i64) -> String {
    order_number.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_known_valid_numbers() {
        assert!(is_valid("79927398713"));
        assert!(is_valid("12345678903"));
    }

    #[test]
    fn rejects_bad_checksum() {
        assert!(!is_valid("79927398710"));
        assert!(!is_valid("1234567890"));
    }

    #[test]
    fn rejects_non_digits_and_empty() {
        assert!(!is_valid(""));
        assert!(!is_valid("1234a678903"));
        assert!(!is_valid("-12345678903"));
    }

    #[test]
    fn parse_round_trips() {
        assert_eq!(parse("12345678903"), Some(12345678903));
        assert_eq!(format(12345678903), "12345678903");
    }

    #[test]
    fn parse_rejects_leading_zero_mismatch() {
        assert_eq!(parse("0123"), None);
    }
}
