use std::collections::BTreeMap;

use crate::constant::DEST_SEPARATOR;
use crate::model::{Instance, Value};

/// Split a destination path into its parent destination and attribute name.
///
/// `"config.optim.lr"` splits into `("config.optim", "lr")`.
/// A path without a separator has an empty parent.
pub fn split_dest(destination: &str) -> (&str, &str) {
    match destination.rsplit_once(DEST_SEPARATOR) {
        Some((parent, attribute)) => (parent, attribute),
        None => ("", destination),
    }
}

/// The values to construct the parsed structures with.
///
/// Maps a destination path to the attributes of the structure instance at that path.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConstructorArguments {
    entries: BTreeMap<String, BTreeMap<String, Value>>,
    structures: BTreeMap<String, String>,
}

impl ConstructorArguments {
    /// Set the `attribute` of the instance at `destination`.
    pub fn set(&mut self, destination: &str, attribute: &str, value: Value) {
        self.entries
            .entry(destination.to_string())
            .or_default()
            .insert(attribute.to_string(), value);
    }

    /// Get the `attribute` of the instance at `destination`.
    pub fn get(&self, destination: &str, attribute: &str) -> Option<&Value> {
        self.entries
            .get(destination)
            .and_then(|attributes| attributes.get(attribute))
    }

    /// Get the value at a full destination path, such as `"config.count"`.
    pub fn value_at(&self, path: &str) -> Option<&Value> {
        let (destination, attribute) = split_dest(path);
        self.get(destination, attribute)
    }

    /// The attributes of the instance at `destination`.
    pub fn attributes(&self, destination: &str) -> Option<&BTreeMap<String, Value>> {
        self.entries.get(destination)
    }

    /// The destinations which have at least one attribute.
    pub fn destinations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Declare that the structure `type_name` is constructed at `destination`.
    pub fn declare(&mut self, destination: &str, type_name: &str) {
        self.structures
            .insert(destination.to_string(), type_name.to_string());
    }

    /// The structure declared at `destination`.
    pub fn type_name(&self, destination: &str) -> Option<&str> {
        self.structures.get(destination).map(String::as_str)
    }

    /// Assemble the instance at `destination`, including any declared nested instances.
    pub fn instance(&self, destination: &str) -> Option<Instance> {
        let type_name = self.type_name(destination)?;
        let mut instance = Instance::new(type_name);

        if let Some(attributes) = self.entries.get(destination) {
            instance.attributes = attributes.clone();
        }

        for nested in self.structures.keys() {
            if let Some(attribute) = nested
                .strip_prefix(destination)
                .and_then(|rest| rest.strip_prefix(DEST_SEPARATOR))
            {
                if attribute.contains(DEST_SEPARATOR) {
                    continue;
                }

                if let Some(child) = self.instance(nested) {
                    instance
                        .attributes
                        .insert(attribute.to_string(), Value::Struct(child));
                }
            }
        }

        Some(instance)
    }

    /// Absorb every entry and declaration of `other`.
    pub fn merge(&mut self, other: ConstructorArguments) {
        for (destination, attributes) in other.entries {
            self.entries
                .entry(destination)
                .or_default()
                .extend(attributes);
        }

        self.structures.extend(other.structures);
    }
}
