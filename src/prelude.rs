pub use crate::form::{
    FieldConfig, FieldKind, FieldSelector, FieldState, FieldValue, FormController, FormError,
    FormModel, FormOptions, FormResult, FormStatus, FormValues, FormView, InputEvent,
    SubmitOutcome,
};
