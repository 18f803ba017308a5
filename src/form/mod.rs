mod controller;
mod error;
mod field;
mod input;
mod observer;
mod validation;
mod value;


pub use calmform_derive::FormModel;
pub use controller::{
    FieldId, FieldIndex, FieldKey, FieldMut, FieldSelector, FormController, FormId, FormOptions,
    FormSnapshot, FormStatus, SubmitOutcome,
};
pub use error::{FormError, FormResult, InputError};
pub use field::{FieldController, FieldState};
pub use input::{InputAdapter, InputEvent, StandardInput, parse_number};
pub use observer::SubscriptionId;
pub use validation::{FieldConfig, FormModel, FormView, TransformFn, ValidateFn};
pub use value::{FieldKind, FieldValue, FormValues, KindMismatch};

#[doc(hidden)]
pub mod compat {
    pub use super::validation::read_model_field;
}
