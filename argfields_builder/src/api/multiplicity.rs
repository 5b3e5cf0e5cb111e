use tracing::debug;

use crate::api::{FieldError, FieldWrapper};
use crate::model::Value;

impl FieldWrapper {
    /// Spread the parsed value(s) over the destinations of this reused field.
    ///
    /// A single value is duplicated for every destination.
    /// Only valid for a reused field (more than 1 destination), otherwise [`FieldError::NotReused`].
    pub fn duplicate_if_needed(&self, parsed_values: Value) -> Result<Vec<Value>, FieldError> {
        let instances = self.destinations().len();
        debug!(
            "Field '{}' to be parsed for {instances} instances, (raw) parsed values: '{parsed_values}'.",
            self.name()
        );
        duplicate(
            self.name(),
            self.is_list(),
            self.is_tuple(),
            instances,
            parsed_values,
        )
    }
}

pub(crate) fn duplicate(
    field: &str,
    is_list: bool,
    is_tuple: bool,
    instances: usize,
    parsed_values: Value,
) -> Result<Vec<Value>, FieldError> {
    if instances < 2 {
        return Err(FieldError::NotReused {
            field: field.to_string(),
            instances,
        });
    }

    let parsed_values = match parsed_values {
        Value::Tuple(items) if is_list => Value::List(items),
        other => other,
    };

    if !is_tuple && !is_list {
        if let Value::List(outer) = &parsed_values {
            if parsed_values.nesting_level() == 2 && outer.len() == 1 {
                if let Some(inner) = outer[0].as_sequence() {
                    if inner.len() == instances {
                        return Ok(inner.to_vec());
                    }
                }
            }
        }
    }

    let values = match parsed_values {
        Value::List(items) | Value::Tuple(items) => items,
        scalar => vec![scalar],
    };

    if values.len() == instances {
        Ok(values)
    } else if values.len() == 1 {
        Ok(vec![values[0].clone(); instances])
    } else {
        Err(FieldError::InconsistentArgument {
            field: field.to_string(),
            received: values.len(),
            expected: instances,
        })
    }
}
