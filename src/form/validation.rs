use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use rust_decimal::Decimal;

use super::controller::{FieldIndex, FieldKey, FieldSelector};
use super::error::{FormError, FormResult};
use super::field::FieldController;
use super::value::{FieldValue, FormValues, KindMismatch};

pub type ValidateFn =
    Arc<dyn Fn(&FieldValue, &FormView<'_>) -> Option<Vec<String>> + Send + Sync>;
pub type TransformFn = Arc<dyn Fn(FieldValue) -> FieldValue + Send + Sync>;

/// Re-declaring a field replaces its whole configuration; unset timing
/// flags fall back to the form's [`FormOptions`](super::FormOptions).
#[derive(Clone, Default)]
pub struct FieldConfig {
    pub(super) validate: Option<ValidateFn>,
    pub(super) transform: Option<TransformFn>,
    pub(super) validate_other_fields: Vec<String>,
    pub(super) validate_clean: Option<bool>,
    pub(super) validate_on_submit: Option<bool>,
}

impl FieldConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate<F>(mut self, validator: F) -> Self
    where
        F: Fn(&FieldValue, &FormView<'_>) -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.validate = Some(Arc::new(validator));
        self
    }

    /// Applied to coerced input before it is stored. Must keep the value kind.
    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(FieldValue) -> FieldValue + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    /// Fields re-validated whenever this one changes, regardless of their own
    /// timing flags.
    ///
    /// A deferred target that picks up errors this way keeps them when the
    /// user later corrects it: its own writes do not validate before the
    /// first submit, and submit does not re-run a validator that has already
    /// run. Pair mutual triggers with `validate_on_submit(false)` on both
    /// sides, or call `FormController::validate_fields` after the write.
    pub fn validate_other_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.validate_other_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn validate_clean(mut self, value: bool) -> Self {
        self.validate_clean = Some(value);
        self
    }

    pub fn validate_on_submit(mut self, value: bool) -> Self {
        self.validate_on_submit = Some(value);
        self
    }
}

impl Debug for FieldConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldConfig")
            .field("validate", &self.validate.is_some())
            .field("transform", &self.transform.is_some())
            .field("validate_other_fields", &self.validate_other_fields)
            .field("validate_clean", &self.validate_clean)
            .field("validate_on_submit", &self.validate_on_submit)
            .finish()
    }
}

/// A validator runs before its own field stores the candidate value, so the
/// candidate arrives as the first argument while every other field reads
/// back exactly what was last written to it.
#[derive(Clone, Copy)]
pub struct FormView<'a> {
    pub(super) index: &'a FieldIndex,
    pub(super) fields: &'a [FieldController],
}

impl<'a> FormView<'a> {
    pub fn field(&self, field: impl FieldSelector) -> FormResult<&'a FieldController> {
        let id = field.resolve(self.index)?;
        self.fields
            .get(id.index())
            .ok_or(FormError::UnknownFieldId(id.index()))
    }

    pub fn value(&self, field: impl FieldSelector) -> FormResult<&'a FieldValue> {
        Ok(self.field(field)?.value())
    }

    pub fn text(&self, field: impl FieldSelector) -> Option<&'a str> {
        self.value(field).ok().and_then(FieldValue::as_text)
    }

    pub fn number(&self, field: impl FieldSelector) -> Option<Decimal> {
        self.value(field).ok().and_then(FieldValue::as_number)
    }

    pub fn flag(&self, field: impl FieldSelector) -> Option<bool> {
        self.value(field).ok().and_then(FieldValue::as_flag)
    }

    pub fn values(&self) -> FormValues {
        self.fields
            .iter()
            .map(|field| (field.name().to_owned(), field.value().clone()))
            .collect()
    }
}

pub trait FormModel: Sized {
    type Fields;

    fn fields() -> Self::Fields;
    fn into_defaults(self) -> Vec<(FieldKey, FieldValue)>;
    fn from_values(values: &FormValues) -> FormResult<Self>;
}

pub fn read_model_field<T>(values: &FormValues, key: FieldKey) -> FormResult<T>
where
    T: TryFrom<FieldValue, Error = KindMismatch>,
{
    let value = values
        .get(key.as_str())
        .cloned()
        .ok_or_else(|| FormError::UnknownField(key.as_str().to_owned()))?;
    T::try_from(value).map_err(|mismatch| FormError::TypeMismatch {
        field: key.as_str().to_owned(),
        expected: mismatch.expected,
        found: mismatch.found,
    })
}
