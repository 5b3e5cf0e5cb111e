//! Traits which, typically, may be imported without concern: `use argfields::prelude::*`.

use crate::api::{FieldError, FieldRef};
use crate::docstring::{AttributeDocString, DocstringError};
use crate::model::{Instance, Value};
use crate::schema::FieldId;
use crate::table::ConstructorArguments;

/// Behaviour of the structure which owns a field.
// Needs to be imported in order to implement a custom owning structure.
pub trait Structure {
    /// The name of the structure type.
    fn name(&self) -> &str;

    /// The primary destination path of the structure.
    fn dest(&self) -> &str;

    /// One destination path per instantiation of the structure.
    fn destinations(&self) -> &[String];

    /// The prefix of every option string of the structure's fields.
    fn prefix(&self) -> &str;

    /// The default instances of the structure, if any.
    fn defaults(&self) -> &[Instance];

    /// Whether the structure must be specified.
    fn required(&self) -> bool;

    /// Find a field by identifier, in this structure or any of its ancestors.
    fn lineage_field(&self, id: FieldId) -> Option<FieldRef>;

    /// The documentation of an attribute of this structure.
    fn attribute_docstring(&self, attribute: &str) -> Result<AttributeDocString, DocstringError>;
}

/// Behaviour to look up the documentation of attributes.
pub trait Docstrings {
    /// The documentation of `attribute` on the structure `owner`.
    fn attribute_docstring(
        &self,
        owner: &str,
        attribute: &str,
    ) -> Result<AttributeDocString, DocstringError>;
}

/// Behaviour to receive the parsed value of an argument.
///
/// Invoked by the `ArgumentParser` once per parse, with the value (or the default) of the argument's destination.
pub trait ArgumentCallback {
    /// Receive the `values` parsed for the argument, and the last option string which matched it.
    fn invoke(
        &self,
        arguments: &mut ConstructorArguments,
        values: Value,
        option_string: Option<&str>,
    ) -> Result<(), FieldError>;
}
