use tracing::{debug, warn};

use crate::api::{FieldError, FieldWrapper};
use crate::config::ConstructionPolicy;
use crate::model::Value;
use crate::types::TypeDescriptor;

impl FieldWrapper {
    /// Convert a raw parsed value into the field's declared type, for the first destination.
    pub fn postprocess(&self, raw_parsed_value: Value) -> Result<Value, FieldError> {
        self.postprocess_at(raw_parsed_value, 0)
    }

    /// Convert a raw parsed value into the field's declared type, for the destination at `index`.
    ///
    /// Enumeration members are looked up by name, sequences are coerced into the declared container,
    /// and a boolean flag given without a value negates its default.
    /// Custom types are built with their constructor.
    pub fn postprocess_at(&self, raw_parsed_value: Value, index: usize) -> Result<Value, FieldError> {
        let ty = self.ty();

        if let Some(enum_type) = ty.as_enum() {
            debug!(
                "Post-processing the enum field '{}' with value '{raw_parsed_value}'.",
                self.name()
            );
            return match raw_parsed_value {
                Value::Str(name) => enum_type.lookup(&name).map(Value::Enum).ok_or_else(|| {
                    FieldError::UnknownMember {
                        field: self.name().to_string(),
                        enum_name: enum_type.name().to_string(),
                        name,
                    }
                }),
                other => Ok(other),
            };
        }

        if self.is_tuple() {
            // The parser collects values into lists.
            return Ok(match raw_parsed_value {
                Value::List(items) => Value::Tuple(items),
                other => other,
            });
        }

        if self.is_bool() {
            if raw_parsed_value.is_none() {
                if let Some(default) = self
                    .default()
                    .and_then(|default| default.at(index))
                    .filter(|default| !default.is_none())
                {
                    debug!("Value is None, returning the opposite of the default '{default}'.");
                    return Ok(Value::Bool(!default.truthy()));
                }

                if let Some(original_default) = self
                    .dest_field()
                    .and_then(|target| target.original_default.as_ref())
                {
                    debug!(
                        "Value is None, returning the opposite of the original default '{original_default}'."
                    );
                    return Ok(Value::Bool(!original_default.truthy()));
                }
            }

            return Ok(raw_parsed_value);
        }

        if self.is_list() {
            return Ok(match raw_parsed_value {
                Value::Tuple(items) => Value::List(items),
                other => other,
            });
        }

        if self.is_subparser() {
            return Ok(raw_parsed_value);
        }

        match ty {
            TypeDescriptor::Custom(custom_type) => {
                if raw_parsed_value.is_none() {
                    return Ok(raw_parsed_value);
                }

                match custom_type.construct(&raw_parsed_value) {
                    Ok(value) => Ok(value),
                    Err(message) => match self.config().construction() {
                        ConstructionPolicy::Lenient => {
                            warn!(
                                "Unable to instantiate the field '{}' of type '{}' by using the type as a constructor. Returning the raw parsed value instead ({raw_parsed_value}). ({message})",
                                self.name(),
                                custom_type.name()
                            );
                            Ok(raw_parsed_value)
                        }
                        ConstructionPolicy::Strict => Err(FieldError::Construction {
                            field: self.name().to_string(),
                            type_name: custom_type.name().to_string(),
                            message,
                        }),
                    },
                }
            }
            other if !other.is_builtin() => {
                warn!(
                    "Unable to instantiate the field '{}' of type '{}', which has no constructor. Returning the raw parsed value instead ({raw_parsed_value}).",
                    self.name(),
                    other.type_name()
                );
                Ok(raw_parsed_value)
            }
            _ => {
                debug!(
                    "Post-processing the field '{}' of type '{}' with value '{raw_parsed_value}'.",
                    self.name(),
                    ty.type_name()
                );
                Ok(raw_parsed_value)
            }
        }
    }
}
