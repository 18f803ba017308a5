use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::controller::{FieldId, FormOptions};
use super::error::{FormError, FormResult};
use super::input::{InputAdapter, InputEvent};
use super::observer::{Observers, SubscriptionId};
use super::validation::{FormView, TransformFn, ValidateFn};
use super::value::{FieldKind, FieldValue};

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FieldState {
    pub value: FieldValue,
    pub dirty: bool,
    pub errors: Vec<String>,
}

impl FieldState {
    pub fn new(value: FieldValue) -> Self {
        Self {
            value,
            dirty: false,
            errors: Vec::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

#[derive(Clone)]
pub(super) struct FieldSettings {
    pub(super) validate: Option<ValidateFn>,
    pub(super) transform: Option<TransformFn>,
    pub(super) triggers: Vec<FieldId>,
    pub(super) validate_clean: bool,
    pub(super) validate_on_submit: bool,
}

impl FieldSettings {
    pub(super) fn from_options(options: &FormOptions) -> Self {
        Self {
            validate: None,
            transform: None,
            triggers: Vec::new(),
            validate_clean: options.validate_clean,
            validate_on_submit: options.validate_on_submit,
        }
    }
}

pub struct FieldController {
    id: FieldId,
    name: Arc<str>,
    default_state: FieldState,
    state: FieldState,
    settings: FieldSettings,
    submitted: bool,
    has_validated: bool,
    observers: Observers<FieldState>,
}

impl FieldController {
    pub(super) fn new(
        id: FieldId,
        name: Arc<str>,
        default_value: FieldValue,
        options: &FormOptions,
    ) -> Self {
        let default_state = FieldState::new(default_value);
        Self {
            id,
            name,
            state: default_state.clone(),
            default_state,
            settings: FieldSettings::from_options(options),
            submitted: false,
            has_validated: false,
            observers: Observers::default(),
        }
    }

    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.default_state.value.kind()
    }

    pub fn value(&self) -> &FieldValue {
        &self.state.value
    }

    pub fn state(&self) -> &FieldState {
        &self.state
    }

    pub fn default_state(&self) -> &FieldState {
        &self.default_state
    }

    pub fn is_dirty(&self) -> bool {
        self.state.dirty
    }

    pub fn errors(&self) -> &[String] {
        &self.state.errors
    }

    pub fn has_errors(&self) -> bool {
        !self.state.errors.is_empty()
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted
    }

    /// Latched on the first validator run; cleared only by reset.
    pub fn has_validated(&self) -> bool {
        self.has_validated
    }

    pub fn validate_clean(&self) -> bool {
        self.settings.validate_clean
    }

    pub fn validate_on_submit(&self) -> bool {
        self.settings.validate_on_submit
    }

    pub fn triggers(&self) -> &[FieldId] {
        &self.settings.triggers
    }

    /// First error, hidden until the user has edited the field or tried to submit.
    pub fn display_error(&self) -> Option<&str> {
        if !self.state.dirty && !self.submitted {
            return None;
        }
        self.state.errors.first().map(String::as_str)
    }

    pub fn display_value(&self) -> String {
        self.state.value.to_string()
    }

    pub fn is_checked(&self) -> bool {
        self.state.value.is_truthy()
    }

    pub fn validates_on_change(&self) -> bool {
        let settings = &self.settings;
        settings.validate_clean
            || !settings.validate_on_submit
            || (settings.validate_on_submit && self.submitted)
    }

    pub(super) fn apply_settings(&mut self, settings: FieldSettings) {
        self.settings = settings;
    }

    pub(super) fn check_kind(&self, value: &FieldValue) -> FormResult<()> {
        let expected = self.kind();
        let found = value.kind();
        if expected == found {
            return Ok(());
        }
        Err(FormError::TypeMismatch {
            field: self.name.to_string(),
            expected,
            found,
        })
    }

    pub(super) fn read_input(
        &self,
        adapter: &dyn InputAdapter,
        event: &InputEvent,
    ) -> FormResult<FieldValue> {
        let coerced = adapter
            .coerce(&self.state.value, event)
            .map_err(|source| FormError::InvalidInput {
                field: self.name.to_string(),
                source,
            })?;
        let value = match &self.settings.transform {
            Some(transform) => transform(coerced),
            None => coerced,
        };
        self.check_kind(&value)?;
        Ok(value)
    }

    pub(super) fn evaluate(&self, value: &FieldValue, view: &FormView<'_>) -> Vec<String> {
        self.settings
            .validate
            .as_ref()
            .and_then(|validate| validate(value, view))
            .unwrap_or_default()
    }

    /// Stores a new value. `errors` is `Some` when the validator ran for it.
    pub(super) fn commit_value(&mut self, value: FieldValue, errors: Option<Vec<String>>) {
        if errors.is_some() {
            self.has_validated = true;
        }
        let next = FieldState {
            value,
            dirty: true,
            errors: errors.unwrap_or_else(|| self.state.errors.clone()),
        };
        self.replace_state(next);
    }

    pub(super) fn commit_errors(&mut self, errors: Vec<String>) {
        self.has_validated = true;
        let next = FieldState {
            errors,
            ..self.state.clone()
        };
        self.replace_state(next);
    }

    pub(super) fn mark_submitted(&mut self) {
        self.submitted = true;
    }

    pub(super) fn reset(&mut self) {
        self.submitted = false;
        self.has_validated = false;
        self.replace_state(self.default_state.clone());
    }

    pub(super) fn subscribe(
        &mut self,
        observer: impl Fn(&FieldState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub(super) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.observers.unsubscribe(id)
    }

    fn replace_state(&mut self, next: FieldState) {
        if next == self.state {
            return;
        }
        self.state = next;
        self.observers.notify(&self.state);
    }
}

impl Debug for FieldController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldController")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("state", &self.state)
            .field("submitted", &self.submitted)
            .field("has_validated", &self.has_validated)
            .finish_non_exhaustive()
    }
}
