use std::collections::BTreeMap;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use super::error::{FormError, FormResult};
use super::field::{FieldController, FieldSettings, FieldState};
use super::input::{InputAdapter, InputEvent, StandardInput};
use super::observer::{Observers, SubscriptionId};
use super::validation::{FieldConfig, FormModel, FormView};
use super::value::{FieldValue, FormValues};

static FORM_ID_ALLOCATOR: AtomicU64 = AtomicU64::new(1);

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FormId(pub u64);

impl FormId {
    pub fn next() -> Self {
        Self(FORM_ID_ALLOCATOR.fetch_add(1, Ordering::SeqCst))
    }
}

/// Dense index of a field, assigned in declaration order and bound to the
/// form that issued it.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldId {
    form: FormId,
    index: usize,
}

impl FieldId {
    pub const fn form(self) -> FormId {
        self.form
    }

    pub const fn index(self) -> usize {
        self.index
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct FieldKey(&'static str);

impl FieldKey {
    pub const fn new(value: &'static str) -> Self {
        Self(value)
    }

    pub const fn as_str(self) -> &'static str {
        self.0
    }
}

impl Display for FieldKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl From<FieldKey> for String {
    fn from(value: FieldKey) -> Self {
        value.0.to_owned()
    }
}

#[derive(Clone, Debug)]
pub struct FieldIndex {
    form: FormId,
    names: Vec<Arc<str>>,
    by_name: BTreeMap<Arc<str>, FieldId>,
}

impl FieldIndex {
    fn new(form: FormId) -> Self {
        Self {
            form,
            names: Vec::new(),
            by_name: BTreeMap::new(),
        }
    }

    fn insert(&mut self, name: &str) -> FormResult<(FieldId, Arc<str>)> {
        if self.by_name.contains_key(name) {
            return Err(FormError::DuplicateField(name.to_owned()));
        }
        let id = FieldId {
            form: self.form,
            index: self.names.len(),
        };
        let name: Arc<str> = Arc::from(name);
        self.names.push(name.clone());
        self.by_name.insert(name.clone(), id);
        Ok((id, name))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<FieldId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, id: FieldId) -> Option<&str> {
        self.names.get(id.index).map(|name| &**name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(|name| &**name)
    }
}

pub trait FieldSelector {
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId>;
}

impl FieldSelector for FieldId {
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId> {
        if self.form == index.form && self.index < index.len() {
            Ok(*self)
        } else {
            Err(FormError::UnknownFieldId(self.index))
        }
    }
}

impl FieldSelector for FieldKey {
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId> {
        self.as_str().resolve(index)
    }
}

impl FieldSelector for str {
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId> {
        index
            .lookup(self)
            .ok_or_else(|| FormError::UnknownField(self.to_owned()))
    }
}

impl FieldSelector for String {
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId> {
        self.as_str().resolve(index)
    }
}

impl<S> FieldSelector for &S
where
    S: FieldSelector + ?Sized,
{
    fn resolve(&self, index: &FieldIndex) -> FormResult<FieldId> {
        (**self).resolve(index)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormOptions {
    pub validate_clean: bool,
    pub validate_on_submit: bool,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            validate_clean: false,
            validate_on_submit: true,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FormStatus {
    pub valid: bool,
    pub submitted: bool,
    pub submit_count: u32,
}

impl FormStatus {
    const INITIAL: Self = Self {
        valid: true,
        submitted: false,
        submit_count: 0,
    };
}

impl Default for FormStatus {
    fn default() -> Self {
        Self::INITIAL
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct FormSnapshot {
    pub status: FormStatus,
    pub fields: BTreeMap<String, FieldState>,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SubmitOutcome {
    Submitted(FormValues),
    /// Names of the fields that blocked the submit, in declaration order.
    Rejected { invalid: Vec<String> },
}

impl SubmitOutcome {
    pub fn is_submitted(&self) -> bool {
        matches!(self, SubmitOutcome::Submitted(_))
    }
}

pub(super) type SubmitHandler = Box<dyn FnMut(&FormValues) + Send>;

pub struct FormController {
    id: FormId,
    options: FormOptions,
    index: FieldIndex,
    fields: Vec<FieldController>,
    status: FormStatus,
    observers: Observers<FormStatus>,
    submit_handler: Option<SubmitHandler>,
    input_adapter: Arc<dyn InputAdapter>,
}

impl FormController {
    pub fn new<I, K, V>(defaults: I) -> FormResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        Self::with_options(defaults, FormOptions::default())
    }

    pub fn with_options<I, K, V>(defaults: I, options: FormOptions) -> FormResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let id = FormId::next();
        let mut index = FieldIndex::new(id);
        let mut fields = Vec::new();
        for (name, value) in defaults {
            let (field_id, name) = index.insert(name.as_ref())?;
            fields.push(FieldController::new(field_id, name, value.into(), &options));
        }
        debug!(form = id.0, fields = fields.len(), "form created");
        Ok(Self {
            id,
            options,
            index,
            fields,
            status: FormStatus::INITIAL,
            observers: Observers::default(),
            submit_handler: None,
            input_adapter: Arc::new(StandardInput),
        })
    }

    pub fn from_model<M>(model: M) -> FormResult<Self>
    where
        M: FormModel,
    {
        Self::new(
            model
                .into_defaults()
                .into_iter()
                .map(|(key, value)| (key.as_str(), value)),
        )
    }

    pub fn with_input_adapter(mut self, adapter: impl InputAdapter + 'static) -> Self {
        self.input_adapter = Arc::new(adapter);
        self
    }

    pub fn form_id(&self) -> FormId {
        self.id
    }

    pub fn options(&self) -> FormOptions {
        self.options
    }

    pub fn status(&self) -> FormStatus {
        self.status
    }

    pub fn is_valid(&self) -> bool {
        self.status.valid
    }

    pub fn is_submitted(&self) -> bool {
        self.status.submitted
    }

    pub fn field_index(&self) -> &FieldIndex {
        &self.index
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldController> {
        self.fields.iter()
    }

    pub fn field(&self, field: impl FieldSelector) -> FormResult<&FieldController> {
        let id = field.resolve(&self.index)?;
        Ok(&self.fields[id.index])
    }

    pub fn field_mut(&mut self, field: impl FieldSelector) -> FormResult<FieldMut<'_>> {
        let id = field.resolve(&self.index)?;
        Ok(FieldMut { form: self, id })
    }

    pub fn view(&self) -> FormView<'_> {
        FormView {
            index: &self.index,
            fields: &self.fields,
        }
    }

    pub fn value(&self, field: impl FieldSelector) -> FormResult<&FieldValue> {
        Ok(self.field(field)?.value())
    }

    pub fn values(&self) -> FormValues {
        self.view().values()
    }

    pub fn values_as<M>(&self) -> FormResult<M>
    where
        M: FormModel,
    {
        M::from_values(&self.values())
    }

    pub fn snapshot(&self) -> FormSnapshot {
        FormSnapshot {
            status: self.status,
            fields: self
                .fields
                .iter()
                .map(|field| (field.name().to_owned(), field.state().clone()))
                .collect(),
        }
    }

    /// Trigger names are resolved here, so a typo fails the declaration
    /// instead of silently never re-validating.
    pub fn configure(&mut self, field: impl FieldSelector, config: FieldConfig) -> FormResult<()> {
        let id = field.resolve(&self.index)?;
        let triggers = config
            .validate_other_fields
            .iter()
            .map(|name| name.resolve(&self.index))
            .collect::<FormResult<Vec<_>>>()?;
        let settings = FieldSettings {
            validate: config.validate,
            transform: config.transform,
            triggers,
            validate_clean: config
                .validate_clean
                .unwrap_or(self.options.validate_clean),
            validate_on_submit: config
                .validate_on_submit
                .unwrap_or(self.options.validate_on_submit),
        };
        trace!(
            form = self.id.0,
            field = self.fields[id.index].name(),
            triggers = settings.triggers.len(),
            "field configured"
        );
        self.fields[id.index].apply_settings(settings);
        Ok(())
    }

    pub fn set_value(
        &mut self,
        field: impl FieldSelector,
        value: impl Into<FieldValue>,
    ) -> FormResult<()> {
        let id = field.resolve(&self.index)?;
        self.write_value(id, value.into())
    }

    /// Applies every entry or none: names and kinds are checked up front.
    pub fn set_values<I, S, V>(&mut self, values: I) -> FormResult<()>
    where
        I: IntoIterator<Item = (S, V)>,
        S: FieldSelector,
        V: Into<FieldValue>,
    {
        let mut pending = Vec::new();
        for (field, value) in values {
            let id = field.resolve(&self.index)?;
            let value = value.into();
            self.fields[id.index].check_kind(&value)?;
            pending.push((id, value));
        }
        for (id, value) in pending {
            self.write_value(id, value)?;
        }
        Ok(())
    }

    pub fn on_input(&mut self, field: impl FieldSelector, event: &InputEvent) -> FormResult<()> {
        let id = field.resolve(&self.index)?;
        let value = self.fields[id.index].read_input(self.input_adapter.as_ref(), event)?;
        self.write_value(id, value)
    }

    /// Forces validation of the listed fields regardless of their timing policy.
    pub fn validate_fields<I, S>(&mut self, fields: I) -> FormResult<()>
    where
        I: IntoIterator<Item = S>,
        S: FieldSelector,
    {
        let ids = fields
            .into_iter()
            .map(|field| field.resolve(&self.index))
            .collect::<FormResult<Vec<_>>>()?;
        self.validate_ids(&ids);
        self.on_field_change();
        Ok(())
    }

    pub fn on_field_change(&mut self) {
        let valid = !self.fields.iter().any(FieldController::has_errors);
        self.update_status(FormStatus {
            valid,
            ..self.status
        });
    }

    pub fn can_submit(&mut self, field: impl FieldSelector) -> FormResult<bool> {
        let id = field.resolve(&self.index)?;
        let ok = self.can_submit_id(id);
        self.on_field_change();
        Ok(ok)
    }

    pub fn bind_submit(
        &mut self,
        handler: impl FnMut(&FormValues) + Send + 'static,
    ) -> FormResult<()> {
        if self.submit_handler.is_some() {
            return Err(FormError::SubmitHandlerAlreadyBound);
        }
        self.submit_handler = Some(Box::new(handler));
        Ok(())
    }

    pub fn submit(&mut self) -> SubmitOutcome {
        let mut status = FormStatus {
            submitted: true,
            submit_count: self.status.submit_count.saturating_add(1),
            ..self.status
        };

        let mut invalid = Vec::new();
        let ids: Vec<FieldId> = self.fields.iter().map(FieldController::id).collect();
        for id in ids {
            if !self.can_submit_id(id) {
                invalid.push(self.fields[id.index].name().to_owned());
            }
        }

        if !invalid.is_empty() {
            status.valid = false;
            self.update_status(status);
            debug!(form = self.id.0, invalid = ?invalid, "submit rejected");
            return SubmitOutcome::Rejected { invalid };
        }

        status.valid = true;
        self.update_status(status);
        let values = self.values();
        debug!(
            form = self.id.0,
            handler = self.submit_handler.is_some(),
            "submit accepted"
        );
        if let Some(handler) = self.submit_handler.as_mut() {
            handler(&values);
        }
        SubmitOutcome::Submitted(values)
    }

    pub fn reset(&mut self) {
        for field in &mut self.fields {
            field.reset();
        }
        self.update_status(FormStatus::INITIAL);
        debug!(form = self.id.0, "form reset");
    }

    pub fn reset_field(&mut self, field: impl FieldSelector) -> FormResult<()> {
        let id = field.resolve(&self.index)?;
        self.fields[id.index].reset();
        self.on_field_change();
        Ok(())
    }

    pub fn subscribe(
        &mut self,
        observer: impl Fn(&FormStatus) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.observers.subscribe(observer)
    }

    pub fn subscribe_field(
        &mut self,
        field: impl FieldSelector,
        observer: impl Fn(&FieldState) + Send + Sync + 'static,
    ) -> FormResult<SubscriptionId> {
        let id = field.resolve(&self.index)?;
        Ok(self.fields[id.index].subscribe(observer))
    }

    pub fn unsubscribe(&mut self, subscription: SubscriptionId) -> bool {
        if self.observers.unsubscribe(subscription) {
            return true;
        }
        self.fields
            .iter_mut()
            .any(|field| field.unsubscribe(subscription))
    }

    fn write_value(&mut self, id: FieldId, value: FieldValue) -> FormResult<()> {
        let field = &self.fields[id.index];
        field.check_kind(&value)?;
        let errors = field
            .validates_on_change()
            .then(|| field.evaluate(&value, &self.view()));
        trace!(
            form = self.id.0,
            field = field.name(),
            validated = errors.is_some(),
            errors = errors.as_ref().map_or(0, Vec::len),
            "field value written"
        );
        let triggers = field.triggers().to_vec();

        self.fields[id.index].commit_value(value, errors);
        if !triggers.is_empty() {
            self.validate_ids(&triggers);
        }
        self.on_field_change();
        Ok(())
    }

    /// Runs each listed validator against its field's current value. Never
    /// follows the validated fields' own triggers, so trigger cycles end after
    /// one hop.
    fn validate_ids(&mut self, ids: &[FieldId]) {
        for id in ids {
            let field = &self.fields[id.index];
            let errors = field.evaluate(field.value(), &self.view());
            trace!(
                form = self.id.0,
                field = field.name(),
                errors = errors.len(),
                "field validated"
            );
            self.fields[id.index].commit_errors(errors);
        }
    }

    fn can_submit_id(&mut self, id: FieldId) -> bool {
        let field = &mut self.fields[id.index];
        field.mark_submitted();
        if !field.has_validated() {
            self.validate_ids(&[id]);
        }
        !self.fields[id.index].has_errors()
    }

    fn update_status(&mut self, next: FormStatus) {
        if next == self.status {
            return;
        }
        if next.valid != self.status.valid {
            debug!(form = self.id.0, valid = next.valid, "form validity changed");
        }
        self.status = next;
        self.observers.notify(&self.status);
    }
}

impl Debug for FormController {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormController")
            .field("id", &self.id)
            .field("options", &self.options)
            .field("status", &self.status)
            .field("fields", &self.fields)
            .field("submit_handler", &self.submit_handler.is_some())
            .finish_non_exhaustive()
    }
}

pub struct FieldMut<'a> {
    form: &'a mut FormController,
    id: FieldId,
}

impl FieldMut<'_> {
    pub fn id(&self) -> FieldId {
        self.id
    }

    pub fn controller(&self) -> &FieldController {
        &self.form.fields[self.id.index]
    }

    pub fn value(&self) -> &FieldValue {
        self.controller().value()
    }

    pub fn state(&self) -> &FieldState {
        self.controller().state()
    }

    pub fn has_errors(&self) -> bool {
        self.controller().has_errors()
    }

    pub fn set_value(&mut self, value: impl Into<FieldValue>) -> FormResult<()> {
        self.form.write_value(self.id, value.into())
    }

    pub fn on_input(&mut self, event: &InputEvent) -> FormResult<()> {
        self.form.on_input(self.id, event)
    }

    pub fn can_submit(&mut self) -> bool {
        let ok = self.form.can_submit_id(self.id);
        self.form.on_field_change();
        ok
    }

    pub fn configure(&mut self, config: FieldConfig) -> FormResult<()> {
        self.form.configure(self.id, config)
    }

    pub fn reset(&mut self) {
        self.form.fields[self.id.index].reset();
        self.form.on_field_change();
    }

    pub fn subscribe(
        &mut self,
        observer: impl Fn(&FieldState) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.form.fields[self.id.index].subscribe(observer)
    }
}
