use std::str::FromStr;

use rust_decimal::Decimal;

use super::error::InputError;
use super::value::{FieldKind, FieldValue};

/// The raw payload of a UI change event.
///
/// Checkbox-style events usually carry no value; text-like events carry
/// whatever the widget currently displays.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InputEvent {
    value: Option<String>,
}

impl InputEvent {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
        }
    }

    pub fn toggle() -> Self {
        Self { value: None }
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl From<&str> for InputEvent {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for InputEvent {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// Converts a raw input event into a value of the field's kind.
pub trait InputAdapter: Send + Sync {
    fn coerce(&self, current: &FieldValue, event: &InputEvent) -> Result<FieldValue, InputError>;
}

/// Default coercion rules: flags toggle the current value and ignore the
/// event payload, numbers parse the payload, text passes it through.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardInput;

impl InputAdapter for StandardInput {
    fn coerce(&self, current: &FieldValue, event: &InputEvent) -> Result<FieldValue, InputError> {
        match current.kind() {
            FieldKind::Flag => Ok(FieldValue::Flag(!current.is_truthy())),
            FieldKind::Number => {
                parse_number(event.value().unwrap_or_default()).map(FieldValue::Number)
            }
            FieldKind::Text => Ok(FieldValue::Text(
                event.value().unwrap_or_default().to_owned(),
            )),
        }
    }
}

const MAX_FRACTION_DIGITS: usize = 28;

/// Empty input is zero. Input with more significant fraction digits than a
/// `Decimal` can hold is rejected rather than rounded.
pub fn parse_number(raw: &str) -> Result<Decimal, InputError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    if fraction_digits(trimmed) > MAX_FRACTION_DIGITS {
        return Err(InputError::InvalidNumber(raw.to_owned()));
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| InputError::InvalidNumber(raw.to_owned()))
}

fn fraction_digits(number: &str) -> usize {
    let mantissa = number.split(['e', 'E']).next().unwrap_or_default();
    mantissa
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.trim_end_matches('0').len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_toggles_current_value_and_ignores_payload() {
        let next = StandardInput
            .coerce(&FieldValue::Flag(true), &InputEvent::new("true"))
            .expect("flag coercion never fails");
        assert_eq!(next, FieldValue::Flag(false));

        let next = StandardInput
            .coerce(&FieldValue::Flag(false), &InputEvent::toggle())
            .expect("flag coercion never fails");
        assert_eq!(next, FieldValue::Flag(true));
    }

    #[test]
    fn number_parsing_accepts_signed_decimal_and_scientific() {
        assert_eq!(parse_number("-5"), Ok(Decimal::from(-5)));
        assert_eq!(parse_number(" 2.50 "), Ok(Decimal::new(250, 2)));
        assert_eq!(parse_number("1e3"), Ok(Decimal::from(1000)));
        assert_eq!(parse_number(""), Ok(Decimal::ZERO));
        assert_eq!(
            parse_number("12abc"),
            Err(InputError::InvalidNumber("12abc".into()))
        );
    }

    #[test]
    fn number_parsing_rejects_unrepresentable_precision() {
        let too_fine = "0.0000000000000000000000000000001";
        assert_eq!(
            parse_number(too_fine),
            Err(InputError::InvalidNumber(too_fine.into()))
        );
        assert_eq!(
            parse_number("0.5000000000000000000000000000000"),
            Ok(Decimal::new(5, 1))
        );
        assert_eq!(
            parse_number("0.0000000000000000000000000001"),
            Ok(Decimal::new(1, 28))
        );
    }

    #[test]
    fn text_without_payload_becomes_empty() {
        let next = StandardInput
            .coerce(&FieldValue::from("old"), &InputEvent::toggle())
            .expect("text coercion never fails");
        assert_eq!(next, FieldValue::from(""));
    }
}
