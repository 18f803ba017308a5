use thiserror::Error;

use super::value::FieldKind;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum InputError {
    #[error("`{0}` is not a number")]
    InvalidNumber(String),
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormError {
    #[error("no field named `{0}` in this form")]
    UnknownField(String),
    #[error("field id {0} is out of range for this form")]
    UnknownFieldId(usize),
    #[error("field `{0}` is declared more than once")]
    DuplicateField(String),
    #[error("field `{field}` holds {expected} values, got {found}")]
    TypeMismatch {
        field: String,
        expected: FieldKind,
        found: FieldKind,
    },
    #[error("field `{field}` rejected input")]
    InvalidInput {
        field: String,
        #[source]
        source: InputError,
    },
    #[error("submit handler is already bound")]
    SubmitHandlerAlreadyBound,
}

pub type FormResult<T> = Result<T, FormError>;
