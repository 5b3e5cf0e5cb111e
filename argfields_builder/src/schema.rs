use std::rc::Rc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::api::ArgOptions;
use crate::docstring::{AttributeDocString, DocTable, DocstringError};
use crate::model::Value;
use crate::prelude::Docstrings;
use crate::types::TypeDescriptor;

static NEXT_FIELD_ID: AtomicU32 = AtomicU32::new(0);

/// A stable identifier for a field declaration.
/// Assigned once, when the `FieldSpec` is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(u32);

impl FieldId {
    fn next() -> Self {
        FieldId(NEXT_FIELD_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// User overrides for a field.
/// Explicit overrides always win over the inferred behaviour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldOverrides {
    /// Alternative names; may carry their own leading dashes.
    pub aliases: Vec<String>,
    /// Argument options which replace the inferred ones.
    pub options: ArgOptions,
    /// The field whose destination this field writes to.
    pub proxy_for: Option<FieldId>,
    /// Explicit sub-command names, for a sub-command dispatch field.
    pub subcommands: Option<Vec<(String, Rc<StructSchema>)>>,
    /// The default the field had before being shadowed by a proxy.
    pub original_default: Option<Value>,
}

/// The declaration of a single field of a structure.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    id: FieldId,
    name: String,
    ty: TypeDescriptor,
    default: Option<Value>,
    init: bool,
    overrides: FieldOverrides,
}

impl FieldSpec {
    /// Declare a field without a default.
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            id: FieldId::next(),
            name: name.into(),
            ty,
            default: None,
            init: true,
            overrides: FieldOverrides::default(),
        }
    }

    /// Set the default value of the field.
    pub fn default_value(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    /// Exclude this field from construction; it registers no argument.
    pub fn no_init(mut self) -> Self {
        self.init = false;
        self
    }

    /// Add an alternative name for the field.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.overrides.aliases.push(alias.into());
        self
    }

    /// Override the inferred argument options.
    pub fn options(mut self, options: ArgOptions) -> Self {
        self.overrides.options = options;
        self
    }

    /// Store this field's value at the destination of `target` rather than its own.
    pub fn proxy_for(mut self, target: &FieldSpec) -> Self {
        self.overrides.proxy_for = Some(target.id);
        self
    }

    /// Add an explicitly named sub-command, for a sub-command dispatch field.
    pub fn subcommand(mut self, name: impl Into<String>, schema: Rc<StructSchema>) -> Self {
        self.overrides
            .subcommands
            .get_or_insert_with(Vec::default)
            .push((name.into(), schema));
        self
    }

    /// Record the default this field had before being shadowed.
    pub fn original_default(mut self, value: Value) -> Self {
        self.overrides.original_default = Some(value);
        self
    }

    /// The identifier of this field.
    pub fn id(&self) -> FieldId {
        self.id
    }

    /// The attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The declared type.
    pub fn ty(&self) -> &TypeDescriptor {
        &self.ty
    }

    /// The declared default; `None` is the missing-value sentinel.
    pub fn default(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    /// Whether the field takes part in construction.
    pub fn init(&self) -> bool {
        self.init
    }

    /// The user overrides.
    pub fn overrides(&self) -> &FieldOverrides {
        &self.overrides
    }
}

/// The declaration of a structure: its name, fields and attribute documentation.
#[derive(Debug, Clone, PartialEq)]
pub struct StructSchema {
    name: String,
    fields: Vec<FieldSpec>,
    docs: DocTable,
}

impl StructSchema {
    /// Declare a structure without fields.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            docs: DocTable::new(name.clone()),
            name,
            fields: Vec::default(),
        }
    }

    /// Add a field.
    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Document an attribute.
    pub fn doc(mut self, attribute: impl Into<String>, doc: AttributeDocString) -> Self {
        self.docs.insert(attribute, doc);
        self
    }

    /// The name of the structure.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fields, in declaration order.
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }
}

impl Docstrings for StructSchema {
    fn attribute_docstring(
        &self,
        owner: &str,
        attribute: &str,
    ) -> Result<AttributeDocString, DocstringError> {
        self.docs.lookup(owner, attribute)
    }
}
