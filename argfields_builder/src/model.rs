use std::collections::BTreeMap;

/// The cardinality of inputs to match for an option.
///
/// Inspired by argparse: <https://docs.python.org/3/library/argparse.html#nargs>
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    /// `N`: Precisely `N` values.
    Precisely(u8),
    /// `?`: Either `0` or `1` values.
    Optional,
    /// `*`: May be any number of values, including `0`.
    Any,
    /// `+`: At least one value must be specified.
    AtLeastOne,
}

impl std::fmt::Display for Nargs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Nargs::Precisely(n) => write!(f, "{n}"),
            Nargs::Optional => write!(f, "?"),
            Nargs::Any => write!(f, "*"),
            Nargs::AtLeastOne => write!(f, "+"),
        }
    }
}

/// The effect an option has when it is matched on the Cli.
///
/// Mirrors the argparse action names: <https://docs.python.org/3/library/argparse.html#action>
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    /// `store`: Store the converted value(s).
    Store,
    /// `store_const`: Store the `const` value.
    StoreConst,
    /// `store_true`: Store `true`.
    StoreTrue,
    /// `store_false`: Store `false`.
    StoreFalse,
    /// `append`: Append the converted value(s) to a list.
    Append,
    /// `append_const`: Append the `const` value to a list.
    AppendConst,
    /// `count`: Count the number of occurrences.
    Count,
    /// `help`: Render the help message.
    Help,
    /// `version`: Render the version message.
    Version,
    /// `parsers`: Dispatch to a sub-command.
    Parsers,
    /// An action unknown to `argfields`.
    /// Its options are passed through untouched.
    Custom(String),
}

impl Action {
    /// The argparse name of this action.
    pub fn name(&self) -> &str {
        match self {
            Action::Store => "store",
            Action::StoreConst => "store_const",
            Action::StoreTrue => "store_true",
            Action::StoreFalse => "store_false",
            Action::Append => "append",
            Action::AppendConst => "append_const",
            Action::Count => "count",
            Action::Help => "help",
            Action::Version => "version",
            Action::Parsers => "parsers",
            Action::Custom(name) => name.as_str(),
        }
    }

    /// Whether this is one of the `store_*` actions, none of which require a value.
    pub fn is_store_variant(&self) -> bool {
        self.name().starts_with("store_")
    }

    /// Whether this action consumes no tokens after its option string.
    pub fn takes_no_values(&self) -> bool {
        matches!(
            self,
            Action::StoreConst
                | Action::StoreTrue
                | Action::StoreFalse
                | Action::AppendConst
                | Action::Count
                | Action::Help
                | Action::Version
        )
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A member of an enumeration, as produced by the post-processing of an enum field.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumValue {
    /// Name of the enumeration type.
    pub enum_name: String,
    /// Name of the member.
    pub name: String,
    /// The value associated with the member.
    pub value: Box<Value>,
}

/// A constructed structure.
///
/// Used for the default instances of an owning structure, and for the result of a sub-command.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Instance {
    /// Name of the structure type.
    pub type_name: String,
    /// The attributes of the instance.
    pub attributes: BTreeMap<String, Value>,
}

impl Instance {
    /// Create an instance with no attributes.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            attributes: BTreeMap::default(),
        }
    }

    /// Set an attribute on this instance.
    pub fn with(mut self, attribute: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(attribute.into(), value);
        self
    }

    /// Get an attribute of this instance.
    pub fn get(&self, attribute: &str) -> Option<&Value> {
        self.attributes.get(attribute)
    }
}

/// A typed value, either parsed from the Cli or declared as a default.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absence of a value.
    None,
    /// A boolean.
    Bool(bool),
    /// An integer.
    Int(i64),
    /// A floating point number.
    Float(f64),
    /// A string.
    Str(String),
    /// A dynamically sized sequence.
    List(Vec<Value>),
    /// A fixed size sequence.
    Tuple(Vec<Value>),
    /// An enumeration member.
    Enum(EnumValue),
    /// A constructed structure.
    Struct(Instance),
}

impl Value {
    /// Shorthand for `Value::Str(..)`.
    pub fn str(value: impl Into<String>) -> Self {
        Value::Str(value.into())
    }

    /// Whether this is `Value::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// The items of a `List` or `Tuple`.
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) | Value::Tuple(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// How deeply sequences are nested within this value.
    /// A scalar is `0`, an empty sequence is `1`.
    pub fn nesting_level(&self) -> usize {
        match self.as_sequence() {
            None => 0,
            Some(items) => {
                1 + items
                    .iter()
                    .map(Value::nesting_level)
                    .max()
                    .unwrap_or_default()
            }
        }
    }

    /// The truthiness of this value: `None`, `false`, zero and empty values are false.
    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) | Value::Tuple(items) => !items.is_empty(),
            Value::Enum(_) | Value::Struct(_) => true,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::None => write!(f, "None"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => write!(f, "[{}]", join(items)),
            Value::Tuple(items) => write!(f, "({})", join(items)),
            Value::Enum(member) => write!(f, "{}", member.name),
            Value::Struct(instance) => write!(f, "{}", instance.type_name),
        }
    }
}

fn join(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<String>>()
        .join(", ")
}

/// The resolved default of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldDefault {
    /// One default, when the owning structure is instantiated once.
    Single(Value),
    /// One default slot per destination, when the owning structure is reused.
    /// `None` marks a missing default.
    PerInstance(Vec<Option<Value>>),
}

impl FieldDefault {
    /// Whether a usable default is present.
    /// A `Single(Value::None)` counts as absent.
    pub fn is_present(&self) -> bool {
        match self {
            FieldDefault::Single(value) => !value.is_none(),
            FieldDefault::PerInstance(_) => true,
        }
    }

    /// Whether any per-instance slot is missing its default.
    pub fn any_missing(&self) -> bool {
        match self {
            FieldDefault::Single(value) => value.is_none(),
            FieldDefault::PerInstance(values) => values.iter().any(Option::is_none),
        }
    }

    /// The default for the destination at `index`.
    pub fn at(&self, index: usize) -> Option<&Value> {
        match self {
            FieldDefault::Single(value) => Some(value),
            FieldDefault::PerInstance(values) => values.get(index).and_then(Option::as_ref),
        }
    }

    /// Apply `f` to each default value.
    pub fn map(&self, f: impl Fn(&Value) -> Value) -> Self {
        match self {
            FieldDefault::Single(value) => FieldDefault::Single(f(value)),
            FieldDefault::PerInstance(values) => FieldDefault::PerInstance(
                values.iter().map(|value| value.as_ref().map(&f)).collect(),
            ),
        }
    }

    /// Flatten into a single `Value` (per-instance defaults become a `List`).
    pub fn to_value(&self) -> Value {
        match self {
            FieldDefault::Single(value) => value.clone(),
            FieldDefault::PerInstance(values) => Value::List(
                values
                    .iter()
                    .map(|value| value.clone().unwrap_or(Value::None))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for FieldDefault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_value())
    }
}
