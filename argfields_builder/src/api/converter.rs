use std::rc::Rc;

use thiserror::Error;

use crate::constant::{FALSY, TRUTHY};
use crate::model::Value;
use crate::types::{CustomType, EnumType, TypeDescriptor};

/// Error when a token cannot be converted into a value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// The token is not a valid representation of the type.
    #[error("cannot convert '{token}' to {type_name}.")]
    InvalidValue {
        /// The input token.
        token: String,
        /// The targeted type.
        type_name: String,
    },
    /// A constructor or user function rejected the token.
    #[error("cannot convert '{token}' to {type_name}: {message}.")]
    Rejected {
        /// The input token.
        token: String,
        /// The targeted type.
        type_name: String,
        /// The reason given for the rejection.
        message: String,
    },
}

/// Parse a boolean from one of the (case-insensitive) truthy or falsy tokens.
///
/// Truthy: `yes`, `true`, `t`, `y`, `1`.
/// Falsy: `no`, `false`, `f`, `n`, `0`.
pub fn str2bool(token: &str) -> Result<bool, ConversionError> {
    let lowered = token.to_lowercase();

    if TRUTHY.contains(&lowered.as_str()) {
        Ok(true)
    } else if FALSY.contains(&lowered.as_str()) {
        Ok(false)
    } else {
        Err(ConversionError::InvalidValue {
            token: token.to_string(),
            type_name: "bool".to_string(),
        })
    }
}

/// The sequence produced by a container converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    /// Produces `Value::List`.
    List,
    /// Produces `Value::Tuple`.
    Tuple,
}

type ConvertFn = dyn Fn(&str) -> Result<Value, String>;

/// The value-converter of an argument: turns a single input token into a `Value`.
#[derive(Clone)]
pub enum Converter {
    /// Keep the token as a string.
    Str,
    /// Parse an integer.
    Int,
    /// Parse a floating point number.
    Float,
    /// Parse a boolean via [`str2bool`].
    Bool,
    /// Look up an enumeration member by name.
    Enum(Rc<EnumType>),
    /// Call the constructor of a custom type; a failure is a conversion error.
    Custom(Rc<CustomType>),
    /// Parse a bracketed segment, such as `[1,2]` or `(a,b)`, into one sequence value.
    /// A bare token converts as the single element at its position.
    Container {
        /// The element converters, by position.
        /// The last one is used for any position beyond.
        elements: Vec<Converter>,
        /// The sequence to produce.
        kind: ContainerKind,
    },
    /// One segment per instance of a reused container field.
    /// Like the wrapped [`Converter::Container`], except that a bare token converts to a one element sequence.
    Segments(Box<Converter>),
    /// A user supplied conversion.
    Function {
        /// The name shown in messages.
        name: String,
        /// The conversion.
        function: Rc<ConvertFn>,
    },
}

impl Converter {
    /// The converter for a field of the type `ty`.
    ///
    /// Non-builtin types (unions, nested and custom types) are kept as strings; they are built later, during post-processing.
    pub fn for_type(ty: &TypeDescriptor) -> Self {
        match ty.effective() {
            TypeDescriptor::Custom(_) => Converter::Str,
            other => Converter::element(other),
        }
    }

    /// The converter for an element of a container.
    /// Unlike [`Converter::for_type`], custom types are constructed on the spot.
    pub fn element(ty: &TypeDescriptor) -> Self {
        match ty.effective() {
            TypeDescriptor::Str | TypeDescriptor::NoneType => Converter::Str,
            TypeDescriptor::Int => Converter::Int,
            TypeDescriptor::Float => Converter::Float,
            TypeDescriptor::Bool => Converter::Bool,
            TypeDescriptor::Enum(enum_type) => Converter::Enum(enum_type.clone()),
            TypeDescriptor::Custom(custom_type) => Converter::Custom(custom_type.clone()),
            container @ (TypeDescriptor::List(_) | TypeDescriptor::Tuple { .. }) => {
                Converter::container(container)
            }
            TypeDescriptor::Union(_) | TypeDescriptor::Nested(_) => Converter::Str,
        }
    }

    /// The bracket-aware converter of a list or tuple type.
    /// Any other type converts as a single element.
    pub fn container(ty: &TypeDescriptor) -> Self {
        match ty.effective() {
            TypeDescriptor::List(element) => Converter::Container {
                elements: vec![Converter::element(element)],
                kind: ContainerKind::List,
            },
            TypeDescriptor::Tuple { elements, .. } => Converter::Container {
                elements: elements.iter().map(Converter::element).collect(),
                kind: ContainerKind::Tuple,
            },
            other => Converter::element(other),
        }
    }

    /// The converter of a reused list or tuple field, where each token (or bracketed segment) is the value of one instance.
    pub fn segments(ty: &TypeDescriptor) -> Self {
        Converter::Segments(Box::new(Converter::container(ty)))
    }

    /// A user supplied conversion.
    pub fn function(
        name: impl Into<String>,
        function: impl Fn(&str) -> Result<Value, String> + 'static,
    ) -> Self {
        Converter::Function {
            name: name.into(),
            function: Rc::new(function),
        }
    }

    /// Convert the `token`, found at `position` within its option's values.
    pub fn convert(&self, position: usize, token: &str) -> Result<Value, ConversionError> {
        match self {
            Converter::Str => Ok(Value::str(token)),
            Converter::Int => token
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| self.invalid(token)),
            Converter::Float => token
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| self.invalid(token)),
            Converter::Bool => str2bool(token).map(Value::Bool),
            Converter::Enum(enum_type) => enum_type
                .lookup(token)
                .map(Value::Enum)
                .ok_or_else(|| self.invalid(token)),
            Converter::Custom(custom_type) => custom_type
                .construct(&Value::str(token))
                .map_err(|message| self.rejected(token, message)),
            Converter::Container { elements, kind } => {
                let trimmed = token.trim();

                match strip_brackets(trimmed) {
                    Some(inner) => {
                        let items: Vec<&str> = if inner.trim().is_empty() {
                            Vec::default()
                        } else {
                            inner.split(',').map(str::trim).collect()
                        };
                        let values = items
                            .iter()
                            .enumerate()
                            .map(|(index, item)| match element_at(elements, index) {
                                Some(converter) => converter.convert(index, item),
                                None => Ok(Value::str(*item)),
                            })
                            .collect::<Result<Vec<Value>, ConversionError>>()?;

                        Ok(match kind {
                            ContainerKind::List => Value::List(values),
                            ContainerKind::Tuple => Value::Tuple(values),
                        })
                    }
                    None => match element_at(elements, position) {
                        Some(converter) => converter.convert(position, trimmed),
                        None => Ok(Value::str(trimmed)),
                    },
                }
            }
            Converter::Segments(container) => {
                if strip_brackets(token.trim()).is_some() {
                    return container.convert(0, token);
                }

                let element = container.convert(0, token)?;
                Ok(match container.as_ref() {
                    Converter::Container {
                        kind: ContainerKind::Tuple,
                        ..
                    } => Value::Tuple(vec![element]),
                    _ => Value::List(vec![element]),
                })
            }
            Converter::Function { function, .. } => {
                function(token).map_err(|message| self.rejected(token, message))
            }
        }
    }

    /// The name of the converted type, in the `List[int]` style.
    pub fn type_name(&self) -> String {
        match self {
            Converter::Str => "str".to_string(),
            Converter::Int => "int".to_string(),
            Converter::Float => "float".to_string(),
            Converter::Bool => "bool".to_string(),
            Converter::Enum(enum_type) => enum_type.name().to_string(),
            Converter::Custom(custom_type) => custom_type.name().to_string(),
            Converter::Container { elements, kind } => {
                let names: Vec<String> = elements.iter().map(Converter::type_name).collect();
                match kind {
                    ContainerKind::List => format!("List[{}]", names.join(", ")),
                    ContainerKind::Tuple => format!("Tuple[{}]", names.join(", ")),
                }
            }
            Converter::Segments(container) => container.type_name(),
            Converter::Function { name, .. } => name.clone(),
        }
    }

    fn invalid(&self, token: &str) -> ConversionError {
        ConversionError::InvalidValue {
            token: token.to_string(),
            type_name: self.type_name(),
        }
    }

    fn rejected(&self, token: &str, message: String) -> ConversionError {
        ConversionError::Rejected {
            token: token.to_string(),
            type_name: self.type_name(),
            message,
        }
    }
}

fn element_at(elements: &[Converter], position: usize) -> Option<&Converter> {
    elements.get(position).or_else(|| elements.last())
}

fn strip_brackets(token: &str) -> Option<&str> {
    token
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .or_else(|| {
            token
                .strip_prefix('(')
                .and_then(|rest| rest.strip_suffix(')'))
        })
}

impl std::fmt::Debug for Converter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Converter({})", self.type_name())
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Converter::Str, Converter::Str)
            | (Converter::Int, Converter::Int)
            | (Converter::Float, Converter::Float)
            | (Converter::Bool, Converter::Bool) => true,
            (Converter::Enum(a), Converter::Enum(b)) => a == b,
            (Converter::Custom(a), Converter::Custom(b)) => a == b,
            (
                Converter::Container {
                    elements: a,
                    kind: i,
                },
                Converter::Container {
                    elements: b,
                    kind: j,
                },
            ) => a == b && i == j,
            (Converter::Segments(a), Converter::Segments(b)) => a == b,
            (Converter::Function { function: a, .. }, Converter::Function { function: b, .. }) => {
                Rc::ptr_eq(a, b)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("yes", true)]
    #[case("TRUE", true)]
    #[case("t", true)]
    #[case("Y", true)]
    #[case("1", true)]
    #[case("no", false)]
    #[case("False", false)]
    #[case("f", false)]
    #[case("N", false)]
    #[case("0", false)]
    fn str2bool_accepts(#[case] token: &str, #[case] expected: bool) {
        assert_eq!(str2bool(token).unwrap(), expected);
    }

    #[rstest]
    #[case("maybe")]
    #[case("")]
    #[case("2")]
    #[case("yess")]
    fn str2bool_rejects(#[case] token: &str) {
        assert_matches!(
            str2bool(token),
            Err(ConversionError::InvalidValue { type_name, .. }) if type_name == "bool"
        );
    }

    #[rstest]
    #[case(Converter::Str, "abc", Value::str("abc"))]
    #[case(Converter::Int, "-3", Value::Int(-3))]
    #[case(Converter::Float, "1.5", Value::Float(1.5))]
    #[case(Converter::Bool, "yes", Value::Bool(true))]
    fn primitives(#[case] converter: Converter, #[case] token: &str, #[case] expected: Value) {
        assert_eq!(converter.convert(0, token).unwrap(), expected);
    }

    #[rstest]
    #[case(Converter::Int, "abc")]
    #[case(Converter::Int, "1.5")]
    #[case(Converter::Float, "one")]
    fn primitives_invalid(#[case] converter: Converter, #[case] token: &str) {
        assert_matches!(
            converter.convert(0, token),
            Err(ConversionError::InvalidValue { .. })
        );
    }

    #[test]
    fn for_type() {
        assert_eq!(Converter::for_type(&TypeDescriptor::Int), Converter::Int);
        assert_eq!(
            Converter::for_type(&TypeDescriptor::optional(TypeDescriptor::Float)),
            Converter::Float
        );
        let custom = TypeDescriptor::custom(CustomType::new("Path", |v| Ok(v.clone())));
        assert_eq!(Converter::for_type(&custom), Converter::Str);
        assert_matches!(Converter::element(&custom), Converter::Custom(_));
    }

    #[test]
    fn enumeration() {
        let enum_type = Rc::new(
            EnumType::new("Color")
                .member("RED", Value::Int(1))
                .member("BLUE", Value::Int(2)),
        );
        let converter = Converter::Enum(enum_type.clone());
        assert_eq!(
            converter.convert(0, "BLUE").unwrap(),
            Value::Enum(enum_type.lookup("BLUE").unwrap())
        );
        assert_matches!(
            converter.convert(0, "GREEN"),
            Err(ConversionError::InvalidValue { type_name, .. }) if type_name == "Color"
        );
    }

    #[test]
    fn custom_rejected() {
        let converter = Converter::element(&TypeDescriptor::custom(CustomType::new(
            "Even",
            |value| match value {
                Value::Str(s) if s.len() % 2 == 0 => Ok(value.clone()),
                _ => Err("odd length".to_string()),
            },
        )));
        assert_eq!(converter.convert(0, "ab").unwrap(), Value::str("ab"));
        assert_eq!(
            converter.convert(0, "abc").unwrap_err(),
            ConversionError::Rejected {
                token: "abc".to_string(),
                type_name: "Even".to_string(),
                message: "odd length".to_string(),
            }
        );
    }

    #[rstest]
    #[case("[1,2,3]", Value::List(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))]
    #[case("( 4, 5 )", Value::List(vec![Value::Int(4), Value::Int(5)]))]
    #[case("[]", Value::List(vec![]))]
    #[case("7", Value::Int(7))]
    fn list_container(#[case] token: &str, #[case] expected: Value) {
        let converter = Converter::container(&TypeDescriptor::list(TypeDescriptor::Int));
        assert_eq!(converter.convert(0, token).unwrap(), expected);
    }

    #[test]
    fn tuple_container_positional() {
        let converter = Converter::container(&TypeDescriptor::tuple(vec![
            TypeDescriptor::Str,
            TypeDescriptor::Int,
        ]));
        assert_eq!(
            converter.convert(0, "(a,1)").unwrap(),
            Value::Tuple(vec![Value::str("a"), Value::Int(1)])
        );
        assert_eq!(converter.convert(0, "a").unwrap(), Value::str("a"));
        assert_eq!(converter.convert(1, "2").unwrap(), Value::Int(2));
        assert_matches!(
            converter.convert(1, "b"),
            Err(ConversionError::InvalidValue { .. })
        );
        assert_eq!(converter.type_name(), "Tuple[str, int]");
    }

    #[rstest]
    #[case(TypeDescriptor::list(TypeDescriptor::Int), "7", Value::List(vec![Value::Int(7)]))]
    #[case(TypeDescriptor::list(TypeDescriptor::Int), "[1,2]", Value::List(vec![Value::Int(1), Value::Int(2)]))]
    #[case(TypeDescriptor::tuple(vec![TypeDescriptor::Str, TypeDescriptor::Int]), "x", Value::Tuple(vec![Value::str("x")]))]
    #[case(TypeDescriptor::tuple(vec![TypeDescriptor::Str, TypeDescriptor::Int]), "(x,2)", Value::Tuple(vec![Value::str("x"), Value::Int(2)]))]
    fn segments(#[case] ty: TypeDescriptor, #[case] token: &str, #[case] expected: Value) {
        // Setup
        let converter = Converter::segments(&ty);

        // Execute
        let value = converter.convert(1, token).unwrap();

        // Verify
        assert_eq!(value, expected);
        assert_eq!(converter.type_name(), Converter::container(&ty).type_name());
    }

    #[test]
    fn function() {
        let converter = Converter::function("upper", |token| Ok(Value::str(token.to_uppercase())));
        assert_eq!(converter.convert(0, "abc").unwrap(), Value::str("ABC"));
        assert_eq!(converter, converter.clone());
        assert_ne!(
            converter,
            Converter::function("upper", |token| Ok(Value::str(token)))
        );
    }
}
