use std::cell::{OnceCell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::debug;

use crate::api::{ArgOptions, DataclassWrapper, FieldError, FieldRef};
use crate::config::FieldConfig;
use crate::model::{Action, FieldDefault, Nargs, Value};
use crate::parser::{ArgumentParser, ConfigError};
use crate::prelude::{ArgumentCallback, Structure};
use crate::schema::{FieldSpec, StructSchema};
use crate::table::{split_dest, ConstructorArguments};
use crate::types::TypeDescriptor;

/// Wraps a single field of a structure, and translates it into an argument.
///
/// The derived properties (`option_strings`, `arg_options`, `required`, `default`, ..) are computed on first use, and cached.
/// The `default`, `required`, `help` and `metavar` may be overridden before then.
pub struct FieldWrapper {
    field: FieldSpec,
    parent: Rc<dyn Structure>,
    config: FieldConfig,
    pub(super) option_strings: OnceCell<Vec<String>>,
    pub(super) arg_options: OnceCell<ArgOptions>,
    required: OnceCell<bool>,
    help: OnceCell<Option<String>>,
    metavar: Option<String>,
    default: OnceCell<Option<FieldDefault>>,
    dest_field: OnceCell<Option<FieldRef>>,
    results: RefCell<BTreeMap<String, Value>>,
}

impl std::fmt::Debug for FieldWrapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldWrapper")
            .field("name", &self.field.name())
            .field("type", &self.field.ty().type_name())
            .field("parent", &self.parent.name())
            .finish()
    }
}

impl FieldWrapper {
    /// Wrap the `field`, owned by the `parent` structure.
    pub fn new(field: FieldSpec, parent: Rc<dyn Structure>, config: FieldConfig) -> Self {
        Self {
            field,
            parent,
            config,
            option_strings: OnceCell::default(),
            arg_options: OnceCell::default(),
            required: OnceCell::default(),
            help: OnceCell::default(),
            metavar: None,
            default: OnceCell::default(),
            dest_field: OnceCell::default(),
            results: RefCell::default(),
        }
    }

    /// The wrapped field declaration.
    pub fn field(&self) -> &FieldSpec {
        &self.field
    }

    /// The owning structure.
    pub fn parent(&self) -> &Rc<dyn Structure> {
        &self.parent
    }

    /// The configuration of this field.
    pub fn config(&self) -> &FieldConfig {
        &self.config
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        self.field.name()
    }

    /// The effective type, used for conversion.
    /// For an optional field, this is the non-absence alternative.
    pub fn ty(&self) -> &TypeDescriptor {
        self.field.ty().effective()
    }

    /// Whether the effective type is a list.
    pub fn is_list(&self) -> bool {
        self.ty().is_list()
    }

    /// Whether the effective type is a tuple.
    pub fn is_tuple(&self) -> bool {
        self.ty().is_tuple()
    }

    /// Whether the effective type is an enumeration.
    pub fn is_enum(&self) -> bool {
        self.ty().is_enum()
    }

    /// Whether the effective type is a boolean.
    pub fn is_bool(&self) -> bool {
        self.ty().is_bool()
    }

    /// Whether the declared type is optional.
    pub fn is_optional(&self) -> bool {
        self.field.ty().is_optional()
    }

    /// Whether the field dispatches to sub-commands.
    pub fn is_subparser(&self) -> bool {
        self.field.ty().is_subparser() || self.field.overrides().subcommands.is_some()
    }

    /// The type arguments of the effective type.
    pub fn type_arguments(&self) -> Vec<&TypeDescriptor> {
        self.ty().type_arguments()
    }

    /// Whether the owning structure is instantiated more than once.
    pub fn is_reused(&self) -> bool {
        self.destinations().len() > 1
    }

    /// The prefix of the option strings.
    pub fn prefix(&self) -> &str {
        self.parent.prefix()
    }

    /// The declared aliases.
    pub fn aliases(&self) -> &[String] {
        &self.field.overrides().aliases
    }

    /// The custom argument options, which replace the inferred ones.
    pub fn custom_arg_options(&self) -> &ArgOptions {
        &self.field.overrides().options
    }

    /// The action-kind; `store` unless overridden.
    pub fn action(&self) -> Action {
        self.custom_arg_options()
            .action
            .clone()
            .unwrap_or(Action::Store)
    }

    /// The custom multiplicity (`nargs`).
    pub fn nargs(&self) -> Option<Nargs> {
        self.custom_arg_options().nargs
    }

    /// The custom choices.
    pub fn choices(&self) -> Option<&[String]> {
        self.custom_arg_options().choices.as_deref()
    }

    /// The destination path of each instantiation of the owning structure.
    /// A proxy uses those of its target.
    pub fn destinations(&self) -> Vec<String> {
        match self.dest_field() {
            Some(target) => target.destinations.clone(),
            None => self
                .parent
                .destinations()
                .iter()
                .map(|destination| format!("{destination}.{}", self.name()))
                .collect(),
        }
    }

    /// The destination key of the argument.
    /// A proxy uses that of its target.
    pub fn dest(&self) -> String {
        match self.dest_field() {
            Some(target) => target.dest.clone(),
            None => format!("{}.{}", self.parent.dest(), self.name()),
        }
    }

    /// The field which this field is a proxy for (shares its destination with).
    pub fn dest_field(&self) -> Option<&FieldRef> {
        self.dest_field
            .get_or_init(|| {
                self.field
                    .overrides()
                    .proxy_for
                    .and_then(|id| self.parent.lineage_field(id))
            })
            .as_ref()
    }

    /// Whether this field is a proxy for another.
    pub fn is_proxy(&self) -> bool {
        self.dest_field().is_some()
    }

    /// The default: a single value, or one per destination when the owning structure is reused.
    ///
    /// In increasing priority: the field's declared default, then the corresponding attribute of the owning structure's default instance(s).
    /// The `store_true` and `store_false` actions imply a default of `false` and `true` respectively.
    pub fn default(&self) -> Option<&FieldDefault> {
        self.default
            .get_or_init(|| self.resolve_default())
            .as_ref()
    }

    /// Override the default.
    pub fn set_default(&mut self, default: Option<FieldDefault>) {
        self.default = OnceCell::from(default);
    }

    fn resolve_default(&self) -> Option<FieldDefault> {
        let mut default = self
            .field
            .default()
            .filter(|value| !value.is_none())
            .cloned();

        match self.action() {
            Action::StoreTrue if default.is_none() => default = Some(Value::Bool(false)),
            Action::StoreFalse if default.is_none() => default = Some(Value::Bool(true)),
            _ => {}
        };

        let mut resolved = default.clone().map(FieldDefault::Single);
        let parent_defaults = self.parent.defaults();

        if !parent_defaults.is_empty() {
            let mut values: Vec<Option<Value>> = parent_defaults
                .iter()
                .map(|instance| {
                    instance
                        .get(self.name())
                        .filter(|value| !value.is_none())
                        .cloned()
                        .or_else(|| default.clone())
                })
                .collect();

            resolved = if values.len() == 1 {
                values.remove(0).map(FieldDefault::Single)
            } else {
                Some(FieldDefault::PerInstance(values))
            };
        }

        if self.is_reused() {
            let instances = self.destinations().len();
            resolved = match resolved {
                Some(FieldDefault::Single(value)) => {
                    Some(FieldDefault::PerInstance(vec![Some(value); instances]))
                }
                Some(FieldDefault::PerInstance(mut values)) => {
                    // Destinations beyond the default instances fall back to the declared default.
                    values.resize(instances, default.clone());
                    Some(FieldDefault::PerInstance(values))
                }
                None => None,
            };
        }

        resolved
    }

    /// Whether the argument must be specified.
    pub fn required(&self) -> bool {
        *self.required.get_or_init(|| self.resolve_required())
    }

    /// Override whether the argument must be specified.
    pub fn set_required(&mut self, required: bool) {
        self.required = OnceCell::from(required);
    }

    fn resolve_required(&self) -> bool {
        if self.action().is_store_variant() {
            // All the store_* actions do not require a value.
            false
        } else if self.is_optional() {
            false
        } else if self.parent.required() {
            true
        } else if matches!(self.nargs(), Some(Nargs::Optional) | Some(Nargs::Any)) {
            false
        } else if matches!(self.nargs(), Some(Nargs::AtLeastOne)) {
            true
        } else {
            match self.default() {
                None => true,
                Some(default) if self.is_reused() => default.any_missing(),
                Some(default) => !default.is_present(),
            }
        }
    }

    /// The help text, from the attribute documentation of the owning structure.
    pub fn help(&self) -> Option<&str> {
        self.help
            .get_or_init(|| match self.parent.attribute_docstring(self.name()) {
                Ok(docstring) => docstring.help(),
                Err(error) => {
                    debug!(
                        "Couldn't find attribute docstring for field '{}': {error}",
                        self.name()
                    );
                    None
                }
            })
            .as_deref()
    }

    /// Override the help text.
    pub fn set_help(&mut self, help: impl Into<String>) {
        self.help = OnceCell::from(Some(help.into()));
    }

    /// The name of the value shown in the help message.
    pub fn metavar(&self) -> Option<&str> {
        self.metavar.as_deref()
    }

    /// Override the metavar.
    pub fn set_metavar(&mut self, metavar: impl Into<String>) {
        self.metavar = Some(metavar.into());
    }

    /// The values post-processed for each destination, during the latest parse.
    pub fn results(&self) -> BTreeMap<String, Value> {
        self.results.borrow().clone()
    }

    /// The sub-commands of this field: the explicitly named ones, or one per alternative, named by its lower-cased type name.
    pub fn subparsers_dict(&self) -> Vec<(String, Rc<StructSchema>)> {
        match &self.field.overrides().subcommands {
            Some(subcommands) => subcommands.clone(),
            None => self
                .field
                .ty()
                .type_arguments()
                .into_iter()
                .filter_map(|alternative| match alternative {
                    TypeDescriptor::Nested(schema) => {
                        Some((schema.name().to_lowercase(), schema.clone()))
                    }
                    _ => None,
                })
                .collect(),
        }
    }

    /// Register one sub-command per alternative with the `parser`.
    /// Each sub-command registers the fields of its structure under this field's destination.
    pub fn add_subparsers(self: &Rc<Self>, parser: &mut ArgumentParser) -> Result<(), ConfigError> {
        if !self.is_subparser() {
            return Err(ConfigError(format!(
                "The field '{}' does not dispatch to sub-commands.",
                self.name()
            )));
        }

        let callback: Rc<dyn ArgumentCallback> = self.clone();
        let dest = self.dest();
        let subparsers = parser.add_subparsers(
            self.name(),
            self.help().map(str::to_string),
            dest.clone(),
            true,
            Some(callback),
        )?;

        for (subcommand, schema) in self.subparsers_dict() {
            debug!(
                "Adding subparser '{subcommand}' for type '{}'.",
                schema.name()
            );
            let subparser = subparsers.add_parser(subcommand);
            DataclassWrapper::builder(schema)
                .destination(dest.clone())
                .config(self.config)
                .build()
                .register(subparser)?;
        }

        Ok(())
    }

    /// The equivalent `argparse` registration of this field, for debugging.
    pub fn equivalent_argparse_code(&self) -> String {
        let options = self.arg_options();
        let mut entries = Vec::default();

        if let Some(converter) = &options.converter {
            entries.push(format!("'type': {}", converter.type_name()));
        }
        if let Some(action) = &options.action {
            entries.push(format!("'action': '{action}'"));
        }
        if let Some(help) = &options.help {
            entries.push(format!("'help': {help:?}"));
        }
        if let Some(required) = &options.required {
            entries.push(format!("'required': {}", if *required { "True" } else { "False" }));
        }
        if let Some(dest) = &options.dest {
            entries.push(format!("'dest': '{dest}'"));
        }
        if let Some(default) = &options.default {
            entries.push(format!("'default': {default}"));
        }
        if let Some(choices) = &options.choices {
            entries.push(format!("'choices': {choices:?}"));
        }
        if let Some(nargs) = &options.nargs {
            entries.push(format!("'nargs': '{nargs}'"));
        }

        format!(
            "group.add_argument(*{:?}, **{{{}}})",
            self.option_strings(),
            entries.join(", ")
        )
    }
}

impl ArgumentCallback for FieldWrapper {
    fn invoke(
        &self,
        arguments: &mut ConstructorArguments,
        values: Value,
        _option_string: Option<&str>,
    ) -> Result<(), FieldError> {
        let values = if self.is_reused() {
            let values = self.duplicate_if_needed(values)?;
            let replicated = Value::List(values.clone());
            debug!("Replicated the parsed values: '{replicated}'.");
            values
        } else {
            vec![values]
        };

        let mut results = self.results.borrow_mut();
        results.clear();

        for (index, (destination, value)) in self.destinations().into_iter().zip(values).enumerate()
        {
            let (parent_dest, attribute) = split_dest(&destination);
            let value = self.postprocess_at(value, index)?;
            debug!(
                "Setting value of '{value}' in constructor arguments of parent at key '{parent_dest}' and attribute '{attribute}'."
            );
            arguments.set(parent_dest, attribute, value.clone());
            results.insert(destination, value);
        }

        Ok(())
    }
}
