use std::rc::Rc;

use tracing::debug;

use crate::api::FieldWrapper;
use crate::config::FieldConfig;
use crate::docstring::{AttributeDocString, DocstringError};
use crate::model::{Instance, Value};
use crate::parser::{ArgumentParser, ConfigError};
use crate::prelude::{ArgumentCallback, Docstrings, Structure};
use crate::schema::{FieldId, StructSchema};
use crate::types::TypeDescriptor;

/// A resolved reference to a field, found through the lineage of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRef {
    /// The identifier of the field.
    pub id: FieldId,
    /// The attribute name.
    pub name: String,
    /// The primary destination path.
    pub dest: String,
    /// One destination path per instantiation of the owning structure.
    pub destinations: Vec<String>,
    /// The default the field had before being shadowed by a proxy.
    pub original_default: Option<Value>,
}

/// The concrete owning structure of a set of fields.
pub struct StructureContext {
    schema: Rc<StructSchema>,
    destinations: Vec<String>,
    prefix: String,
    defaults: Vec<Instance>,
    required: bool,
    parent: Option<Rc<StructureContext>>,
    docstrings: Rc<dyn Docstrings>,
}

impl std::fmt::Debug for StructureContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureContext")
            .field("name", &self.schema.name())
            .field("destinations", &self.destinations)
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl StructureContext {
    /// The declaration of the structure.
    pub fn schema(&self) -> &Rc<StructSchema> {
        &self.schema
    }

    /// The structure which nests this one, if any.
    pub fn parent(&self) -> Option<&Rc<StructureContext>> {
        self.parent.as_ref()
    }
}

impl Structure for StructureContext {
    fn name(&self) -> &str {
        self.schema.name()
    }

    fn dest(&self) -> &str {
        // Never empty: the builder always provides a destination.
        self.destinations
            .first()
            .map(String::as_str)
            .unwrap_or_default()
    }

    fn destinations(&self) -> &[String] {
        &self.destinations
    }

    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn defaults(&self) -> &[Instance] {
        &self.defaults
    }

    fn required(&self) -> bool {
        self.required
    }

    fn lineage_field(&self, id: FieldId) -> Option<FieldRef> {
        match self.schema.fields().iter().find(|field| field.id() == id) {
            Some(field) => Some(FieldRef {
                id,
                name: field.name().to_string(),
                dest: format!("{}.{}", self.dest(), field.name()),
                destinations: self
                    .destinations
                    .iter()
                    .map(|destination| format!("{destination}.{}", field.name()))
                    .collect(),
                original_default: field.overrides().original_default.clone(),
            }),
            None => self
                .parent
                .as_ref()
                .and_then(|parent| parent.lineage_field(id)),
        }
    }

    fn attribute_docstring(&self, attribute: &str) -> Result<AttributeDocString, DocstringError> {
        self.docstrings
            .attribute_docstring(self.schema.name(), attribute)
    }
}

/// Builder for a [`DataclassWrapper`].
pub struct StructureBuilder {
    schema: Rc<StructSchema>,
    destinations: Vec<String>,
    prefix: String,
    defaults: Vec<Instance>,
    required: bool,
    config: FieldConfig,
    docstrings: Option<Rc<dyn Docstrings>>,
}

impl StructureBuilder {
    /// Add a destination: the structure is instantiated once per destination.
    /// Defaults to the lower-cased structure name.
    pub fn destination(mut self, destination: impl Into<String>) -> Self {
        self.destinations.push(destination.into());
        self
    }

    /// Set the prefix of every option string.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Add a default instance.
    /// Either one for all destinations, or one per destination.
    pub fn default_instance(mut self, instance: Instance) -> Self {
        self.defaults.push(instance);
        self
    }

    /// Set whether the structure must be specified.
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the configuration threaded into every field.
    pub fn config(mut self, config: FieldConfig) -> Self {
        self.config = config;
        self
    }

    /// Look up attribute documentation in `docstrings`, rather than in the schema.
    pub fn docstrings(mut self, docstrings: Rc<dyn Docstrings>) -> Self {
        self.docstrings = Some(docstrings);
        self
    }

    /// Build the wrapper, along with the wrappers of every nested structure.
    pub fn build(self) -> DataclassWrapper {
        self.build_within(None)
    }

    fn build_within(self, parent: Option<Rc<StructureContext>>) -> DataclassWrapper {
        let StructureBuilder {
            schema,
            mut destinations,
            prefix,
            defaults,
            required,
            config,
            docstrings,
        } = self;

        if destinations.is_empty() {
            destinations.push(schema.name().to_lowercase());
        }

        let docstrings = docstrings.unwrap_or_else(|| schema.clone() as Rc<dyn Docstrings>);
        let context = Rc::new(StructureContext {
            schema: schema.clone(),
            destinations,
            prefix,
            defaults,
            required,
            parent,
            docstrings,
        });
        let mut fields = Vec::default();
        let mut children = Vec::default();

        for field in schema.fields() {
            match field.ty() {
                TypeDescriptor::Nested(nested) if field.overrides().subcommands.is_none() => {
                    debug!(
                        "Nesting the structure '{}' at the field '{}'.",
                        nested.name(),
                        field.name()
                    );
                    let mut builder = StructureBuilder {
                        schema: nested.clone(),
                        destinations: context
                            .destinations
                            .iter()
                            .map(|destination| format!("{destination}.{}", field.name()))
                            .collect(),
                        prefix: context.prefix.clone(),
                        defaults: Vec::default(),
                        required: context.required,
                        config,
                        docstrings: None,
                    };

                    for instance in &context.defaults {
                        if let Some(Value::Struct(nested_default)) = instance.get(field.name()) {
                            builder.defaults.push(nested_default.clone());
                        }
                    }

                    if builder.defaults.is_empty() {
                        if let Some(Value::Struct(nested_default)) = field.default() {
                            builder.defaults.push(nested_default.clone());
                        }
                    }

                    children.push(builder.build_within(Some(context.clone())));
                }
                _ => {
                    let parent: Rc<dyn Structure> = context.clone();
                    fields.push(Rc::new(FieldWrapper::new(field.clone(), parent, config)));
                }
            }
        }

        DataclassWrapper {
            context,
            fields,
            children,
        }
    }
}

/// Wraps a structure: one [`FieldWrapper`] per field, and one nested wrapper per nested structure.
#[derive(Debug)]
pub struct DataclassWrapper {
    context: Rc<StructureContext>,
    fields: Vec<Rc<FieldWrapper>>,
    children: Vec<DataclassWrapper>,
}

impl DataclassWrapper {
    /// Start building the wrapper of `schema`.
    pub fn builder(schema: Rc<StructSchema>) -> StructureBuilder {
        StructureBuilder {
            schema,
            destinations: Vec::default(),
            prefix: String::default(),
            defaults: Vec::default(),
            required: false,
            config: FieldConfig::default(),
            docstrings: None,
        }
    }

    /// The owning structure of the wrapped fields.
    pub fn context(&self) -> &Rc<StructureContext> {
        &self.context
    }

    /// The name of the structure type.
    pub fn name(&self) -> &str {
        self.context.name()
    }

    /// The primary destination path.
    pub fn dest(&self) -> &str {
        self.context.dest()
    }

    /// One destination path per instantiation.
    pub fn destinations(&self) -> &[String] {
        self.context.destinations()
    }

    /// The wrappers of the (non-nested) fields, in declaration order.
    pub fn fields(&self) -> &[Rc<FieldWrapper>] {
        &self.fields
    }

    /// The wrapper of the field `name`.
    pub fn field(&self, name: &str) -> Option<&Rc<FieldWrapper>> {
        self.fields.iter().find(|field| field.name() == name)
    }

    /// Mutable access to the wrapper of the field `name`, to override its derived properties.
    /// Only available before the wrapper is registered.
    pub fn field_mut(&mut self, name: &str) -> Option<&mut FieldWrapper> {
        self.fields
            .iter_mut()
            .find(|field| field.name() == name)
            .and_then(Rc::get_mut)
    }

    /// The wrappers of the nested structures.
    pub fn children(&self) -> &[DataclassWrapper] {
        &self.children
    }

    /// Register every field, and those of the nested structures, as arguments of the `parser`.
    pub fn register(&self, parser: &mut ArgumentParser) -> Result<(), ConfigError> {
        for destination in self.destinations() {
            parser.declare_structure(destination, self.name());
        }

        for field in &self.fields {
            if field.is_subparser() {
                field.add_subparsers(parser)?;
                continue;
            }

            if !field.field().init() {
                debug!("Skipping the non-init field '{}'.", field.name());
                continue;
            }

            let callback: Rc<dyn ArgumentCallback> = field.clone();
            parser.add_argument(
                field.option_strings().to_vec(),
                field.arg_options().clone(),
                Some(callback),
            )?;
        }

        for child in &self.children {
            child.register(parser)?;
        }

        Ok(())
    }
}
