//! FormConfiguration: everything rendering needs for one showing of a form.

use std::sync::Arc;

use formtree_config::FormtreeConfig;
use formtree_fields::{
    conform, default_value, item_default, resolve_paths, FieldNode, FieldPath, FieldsError,
    FormDefinition, FormDefinitions, LeafConfig, PathTree, RepeatableController, Segment, SelectOption,
    ValidationMode,
};
use serde_json::Value;
use tracing::debug;

use crate::actions::{ActionBar, ActionRenderer, DefaultActions};
use crate::error::{FormError, Result};
use crate::pending::PendingSignal;
use crate::pipeline::SubmissionPipeline;
use crate::render::{render_leaf, WidgetRenderer};
use crate::submit::SubmitHandler;
use crate::validator::{SchemaValidator, ValidationOutcome, Validator, ValidatorChain};

/// Builder for [`FormConfiguration`]. Created by [`FormConfiguration::builder`].
pub struct FormConfigurationBuilder {
    name: Option<String>,
    tree: FieldNode,
    values: Option<Value>,
    validator: Option<Arc<dyn Validator>>,
    extra_validators: Vec<Arc<dyn Validator>>,
    submit: Option<Arc<dyn SubmitHandler>>,
    actions: Option<Arc<dyn ActionRenderer>>,
    mode: Option<ValidationMode>,
    config: Option<FormtreeConfig>,
    pending: Option<PendingSignal>,
    options: Vec<(String, Vec<SelectOption>)>,
}

impl FormConfigurationBuilder {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Starting values. Reshaped to the tree; missing keys get defaults.
    pub fn values(mut self, values: Value) -> Self {
        self.values = Some(values);
        self
    }

    /// Replace the schema validator derived from the tree.
    pub fn validator(mut self, validator: impl Validator + 'static) -> Self {
        self.validator = Some(Arc::new(validator));
        self
    }

    /// Run `validator` after the base validator.
    pub fn also_validate(mut self, validator: impl Validator + 'static) -> Self {
        self.extra_validators.push(Arc::new(validator));
        self
    }

    pub fn submit(mut self, handler: impl SubmitHandler + 'static) -> Self {
        self.submit = Some(Arc::new(handler));
        self
    }

    pub fn submit_shared(mut self, handler: Arc<dyn SubmitHandler>) -> Self {
        self.submit = Some(handler);
        self
    }

    pub fn actions(mut self, renderer: impl ActionRenderer + 'static) -> Self {
        self.actions = Some(Arc::new(renderer));
        self
    }

    pub fn mode(mut self, mode: ValidationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Defaults for mode and action labels when not set explicitly.
    pub fn with_config(mut self, config: &FormtreeConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    /// Share a pending signal with other forms.
    pub fn pending(mut self, signal: PendingSignal) -> Self {
        self.pending = Some(signal);
        self
    }

    /// Options for a select leaf, known only at show time.
    pub fn options(mut self, path: impl Into<String>, options: Vec<SelectOption>) -> Self {
        self.options.push((path.into(), options));
        self
    }

    /// Check the tree, inject options and derive paths and defaults.
    pub fn build(self) -> Result<FormConfiguration> {
        let mut tree = self.tree;
        tree.check()?;
        for (path, options) in self.options {
            tree.set_options(&path, options)?;
        }

        let paths = resolve_paths(&tree);
        let default_values = match &self.values {
            Some(values) => conform(&tree, values),
            None => default_value(&tree),
        };

        let base = match self.validator {
            Some(validator) => validator,
            None => Arc::new(SchemaValidator::from_tree(&tree)?) as Arc<dyn Validator>,
        };
        let validator: Arc<dyn Validator> = if self.extra_validators.is_empty() {
            base
        } else {
            let chain = self
                .extra_validators
                .into_iter()
                .fold(ValidatorChain::new().with_shared(base), ValidatorChain::with_shared);
            Arc::new(chain)
        };

        let submit = self.submit.ok_or(FormError::MissingSubmitHandler)?;
        let config = self.config.unwrap_or_default();
        let actions = self
            .actions
            .unwrap_or_else(|| Arc::new(DefaultActions::from_config(&config.actions)));
        let mode = self.mode.unwrap_or(config.validation.mode);

        debug!(form = ?self.name, ?mode, "form configuration built");
        Ok(FormConfiguration {
            name: self.name,
            tree,
            paths,
            default_values,
            validator,
            submit,
            actions,
            mode,
            pending: self.pending.unwrap_or_default(),
        })
    }
}

/// A field tree bound to its defaults, validator, submit handler and
/// action renderer. Immutable once built; clones share handlers.
#[derive(Clone)]
pub struct FormConfiguration {
    name: Option<String>,
    tree: FieldNode,
    paths: PathTree,
    default_values: Value,
    validator: Arc<dyn Validator>,
    submit: Arc<dyn SubmitHandler>,
    actions: Arc<dyn ActionRenderer>,
    mode: ValidationMode,
    pending: PendingSignal,
}

impl FormConfiguration {
    pub fn builder(tree: impl Into<FieldNode>) -> FormConfigurationBuilder {
        FormConfigurationBuilder {
            name: None,
            tree: tree.into(),
            values: None,
            validator: None,
            extra_validators: Vec::new(),
            submit: None,
            actions: None,
            mode: None,
            config: None,
            pending: None,
            options: Vec::new(),
        }
    }

    /// Builder seeded with a stored definition's name, mode and tree.
    pub fn from_definition(definition: &FormDefinition) -> FormConfigurationBuilder {
        Self::builder(definition.tree.clone())
            .name(definition.name.clone())
            .mode(definition.mode)
    }

    /// Open the definitions directory named by `definitions.dir`.
    pub async fn open_definitions(config: &FormtreeConfig) -> Result<FormDefinitions> {
        let dir = config
            .definitions
            .dir
            .clone()
            .ok_or(FormError::DefinitionsNotConfigured)?;
        debug!(?dir, "opening form definitions");
        Ok(FormDefinitions::open(dir).build().await?)
    }

    /// Builder for the named stored definition with `config` applied.
    pub async fn from_config(
        config: &FormtreeConfig,
        name: &str,
    ) -> Result<FormConfigurationBuilder> {
        let definitions = Self::open_definitions(config).await?;
        let definition = definitions.require(name)?;
        Ok(Self::from_definition(definition).with_config(config))
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn tree(&self) -> &FieldNode {
        &self.tree
    }

    pub fn paths(&self) -> &PathTree {
        &self.paths
    }

    pub fn default_values(&self) -> &Value {
        &self.default_values
    }

    pub fn mode(&self) -> ValidationMode {
        self.mode
    }

    pub fn pending(&self) -> &PendingSignal {
        &self.pending
    }

    pub fn lookup(&self, path: &str) -> Result<&LeafConfig> {
        Ok(self.tree.lookup(path)?)
    }

    pub fn validate(&self, value: &Value) -> ValidationOutcome {
        self.validator.validate(value)
    }

    /// Error to show under `path` after an edit. Always `None` in
    /// on-submit mode.
    pub fn field_error_on_change(&self, value: &Value, path: &str) -> Option<String> {
        if self.mode != ValidationMode::OnChange {
            return None;
        }
        self.validator.validate(value).error_at(path).map(str::to_string)
    }

    pub fn render_actions(&self, pending: bool) -> ActionBar {
        self.actions.render(pending)
    }

    /// Actions for the current state of the pending signal.
    pub fn render_actions_now(&self) -> ActionBar {
        self.actions.render(self.pending.is_pending())
    }

    pub fn render_field<R>(&self, path: &str, renderer: &mut R) -> Result<R::Output>
    where
        R: WidgetRenderer + ?Sized,
    {
        let leaf = self.tree.lookup(path)?;
        Ok(render_leaf(path, leaf, renderer))
    }

    /// Render every concrete leaf of `value` in tree order.
    pub fn render_all<R>(&self, value: &Value, renderer: &mut R) -> Result<Vec<(String, R::Output)>>
    where
        R: WidgetRenderer + ?Sized,
    {
        self.paths
            .concrete_leaf_paths(value)
            .into_iter()
            .map(|path| {
                let output = self.render_field(&path, renderer)?;
                Ok((path, output))
            })
            .collect()
    }

    /// Default value for a new item of the repeatable at `list_path`.
    pub fn new_item(&self, list_path: &str) -> Result<Value> {
        match self.tree.node_at(list_path)? {
            FieldNode::Repeatable(repeatable) => Ok(item_default(&repeatable.item)),
            _ => Err(FieldsError::NotRepeatable {
                path: list_path.to_string(),
            }
            .into()),
        }
    }

    /// Controller over the repeatable at `list_path`, seeded from the defaults.
    pub fn repeatable(&self, list_path: &str) -> Result<RepeatableController> {
        self.repeatable_in(&self.default_values, list_path)
    }

    /// Controller over the repeatable at `list_path`, seeded from `value`.
    pub fn repeatable_in(&self, value: &Value, list_path: &str) -> Result<RepeatableController> {
        let items = value_at(value, &FieldPath::parse(list_path))
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();
        Ok(RepeatableController::new(&self.paths, list_path, items)?)
    }

    /// A pipeline for this showing, sharing this form's pending signal.
    pub fn pipeline(&self) -> SubmissionPipeline {
        let pipeline = SubmissionPipeline::new(
            Arc::clone(&self.validator),
            Arc::clone(&self.submit),
            self.pending.clone(),
        );
        match &self.name {
            Some(name) => pipeline.with_name(name.clone()),
            None => pipeline,
        }
    }
}

impl std::fmt::Debug for FormConfiguration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FormConfiguration")
            .field("name", &self.name)
            .field("mode", &self.mode)
            .field("paths", &self.paths)
            .field("default_values", &self.default_values)
            .finish_non_exhaustive()
    }
}

fn value_at<'a>(value: &'a Value, path: &FieldPath) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(value, |current, segment| match segment {
            Segment::Name(name) => current.get(name.as_str()),
            Segment::Index(index) => current.get(*index),
        })
}
