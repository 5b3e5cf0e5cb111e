use std::rc::Rc;

use crate::model::{EnumValue, Nargs, Value};
use crate::schema::StructSchema;

/// A closed set of named values.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumType {
    name: String,
    members: Vec<(String, Value)>,
}

impl EnumType {
    /// Create an enumeration type without members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::default(),
        }
    }

    /// Add a member to the enumeration.
    /// Members keep their declaration order.
    pub fn member(mut self, name: impl Into<String>, value: Value) -> Self {
        self.members.push((name.into(), value));
        self
    }

    /// Name of the enumeration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The member names, in declaration order.
    pub fn names(&self) -> Vec<String> {
        self.members.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Look up a member by name.
    pub fn lookup(&self, name: &str) -> Option<EnumValue> {
        self.members
            .iter()
            .find(|(member, _)| member == name)
            .map(|(member, value)| EnumValue {
                enum_name: self.name.clone(),
                name: member.clone(),
                value: Box::new(value.clone()),
            })
    }

    /// All the members, in declaration order.
    pub fn members(&self) -> Vec<EnumValue> {
        self.members
            .iter()
            .filter_map(|(name, _)| self.lookup(name))
            .collect()
    }
}

type Constructor = dyn Fn(&Value) -> Result<Value, String>;

/// A non-builtin type, built by calling its single argument constructor.
pub struct CustomType {
    name: String,
    constructor: Box<Constructor>,
}

impl CustomType {
    /// Create a custom type from its name and constructor.
    pub fn new(
        name: impl Into<String>,
        constructor: impl Fn(&Value) -> Result<Value, String> + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            constructor: Box::new(constructor),
        }
    }

    /// Name of the type.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call the constructor on `value`.
    pub fn construct(&self, value: &Value) -> Result<Value, String> {
        (self.constructor)(value)
    }
}

impl std::fmt::Debug for CustomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomType")
            .field("name", &self.name)
            .finish()
    }
}

impl PartialEq for CustomType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// The declared type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    /// A string.
    Str,
    /// An integer.
    Int,
    /// A floating point number.
    Float,
    /// A boolean.
    Bool,
    /// The absence-of-value type.
    NoneType,
    /// A dynamically sized sequence of `T`.
    List(Box<TypeDescriptor>),
    /// A fixed size sequence, or a homogeneous variadic one (`Tuple[T, ...]`).
    Tuple {
        /// The element types.
        elements: Vec<TypeDescriptor>,
        /// Whether the tuple accepts any number of `elements[0]`.
        variadic: bool,
    },
    /// An enumeration.
    Enum(Rc<EnumType>),
    /// A sum of alternatives.
    Union(Vec<TypeDescriptor>),
    /// A nested structure.
    Nested(Rc<StructSchema>),
    /// A non-builtin type.
    Custom(Rc<CustomType>),
}

impl TypeDescriptor {
    /// `Optional[T]`: the union of `T` and the absence-of-value type.
    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Union(vec![inner, TypeDescriptor::NoneType])
    }

    /// `List[T]`.
    pub fn list(element: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(element))
    }

    /// `Tuple[T1, .., Tn]`.
    pub fn tuple(elements: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Tuple {
            elements,
            variadic: false,
        }
    }

    /// `Tuple[T, ...]`.
    pub fn variadic_tuple(element: TypeDescriptor) -> Self {
        TypeDescriptor::Tuple {
            elements: vec![element],
            variadic: true,
        }
    }

    /// Wrap an enumeration.
    pub fn enumeration(enum_type: EnumType) -> Self {
        TypeDescriptor::Enum(Rc::new(enum_type))
    }

    /// Wrap a nested structure.
    pub fn nested(schema: Rc<StructSchema>) -> Self {
        TypeDescriptor::Nested(schema)
    }

    /// Wrap a custom type.
    pub fn custom(custom_type: CustomType) -> Self {
        TypeDescriptor::Custom(Rc::new(custom_type))
    }

    /// Whether this is a union which includes the absence-of-value type.
    pub fn is_optional(&self) -> bool {
        match self {
            TypeDescriptor::Union(alternatives) => alternatives
                .iter()
                .any(|alternative| matches!(alternative, TypeDescriptor::NoneType)),
            _ => false,
        }
    }

    /// Whether this is a `List[T]`.
    pub fn is_list(&self) -> bool {
        matches!(self, TypeDescriptor::List(_))
    }

    /// Whether this is a `Tuple[..]`.
    pub fn is_tuple(&self) -> bool {
        matches!(self, TypeDescriptor::Tuple { .. })
    }

    /// Whether this is exactly the boolean primitive.
    pub fn is_bool(&self) -> bool {
        matches!(self, TypeDescriptor::Bool)
    }

    /// Whether this is an enumeration.
    pub fn is_enum(&self) -> bool {
        matches!(self, TypeDescriptor::Enum(_))
    }

    /// Whether this is a nested structure.
    pub fn is_nested(&self) -> bool {
        matches!(self, TypeDescriptor::Nested(_))
    }

    /// Whether this is a union of structures, in other words a sub-command dispatch.
    pub fn is_subparser(&self) -> bool {
        match self {
            TypeDescriptor::Union(alternatives) => {
                !alternatives.is_empty() && alternatives.iter().all(TypeDescriptor::is_nested)
            }
            _ => false,
        }
    }

    /// Whether this type is one of the builtin primitives or containers.
    pub fn is_builtin(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::Str
                | TypeDescriptor::Int
                | TypeDescriptor::Float
                | TypeDescriptor::Bool
                | TypeDescriptor::NoneType
                | TypeDescriptor::List(_)
                | TypeDescriptor::Tuple { .. }
        )
    }

    /// The enumeration, if this is one.
    pub fn as_enum(&self) -> Option<&Rc<EnumType>> {
        match self {
            TypeDescriptor::Enum(enum_type) => Some(enum_type),
            _ => None,
        }
    }

    /// The type arguments: the element of a list, the elements of a tuple, or the alternatives of a union.
    pub fn type_arguments(&self) -> Vec<&TypeDescriptor> {
        match self {
            TypeDescriptor::List(element) => vec![element.as_ref()],
            TypeDescriptor::Tuple { elements, .. } => elements.iter().collect(),
            TypeDescriptor::Union(alternatives) => alternatives.iter().collect(),
            _ => Vec::default(),
        }
    }

    /// The type used for conversion.
    ///
    /// For an optional type, this is the non-absence alternative.
    /// When `Str` is amongst the alternatives it is always preferred.
    /// Otherwise, an optional with several present alternatives resolves to the first one declared;
    /// this is a known ambiguity rather than a considered choice.
    pub fn effective(&self) -> &TypeDescriptor {
        match self {
            TypeDescriptor::Union(alternatives) if self.is_optional() => {
                if let Some(string) = alternatives
                    .iter()
                    .find(|alternative| matches!(alternative, TypeDescriptor::Str))
                {
                    return string;
                }

                alternatives
                    .iter()
                    .find(|alternative| !matches!(alternative, TypeDescriptor::NoneType))
                    .unwrap_or(self)
            }
            _ => self,
        }
    }

    /// The element type used to convert the items of a list or tuple.
    pub fn container_element(&self) -> Option<&TypeDescriptor> {
        match self {
            TypeDescriptor::List(element) => Some(element),
            TypeDescriptor::Tuple { elements, .. } => elements.first(),
            _ => None,
        }
    }

    /// The cardinality of a tuple: precisely its arity, or any amount when variadic.
    pub fn container_nargs(&self) -> Option<Nargs> {
        match self {
            TypeDescriptor::Tuple { variadic: true, .. } => Some(Nargs::Any),
            TypeDescriptor::Tuple { elements, .. } => {
                Some(Nargs::Precisely(u8::try_from(elements.len()).unwrap_or(u8::MAX)))
            }
            TypeDescriptor::List(_) => Some(Nargs::Any),
            _ => None,
        }
    }

    /// Display name, in the `List[int]` style.
    pub fn type_name(&self) -> String {
        match self {
            TypeDescriptor::Str => "str".to_string(),
            TypeDescriptor::Int => "int".to_string(),
            TypeDescriptor::Float => "float".to_string(),
            TypeDescriptor::Bool => "bool".to_string(),
            TypeDescriptor::NoneType => "None".to_string(),
            TypeDescriptor::List(element) => format!("List[{}]", element.type_name()),
            TypeDescriptor::Tuple { elements, variadic } => {
                let mut names: Vec<String> = elements.iter().map(|e| e.type_name()).collect();
                if *variadic {
                    names.push("...".to_string());
                }
                format!("Tuple[{}]", names.join(", "))
            }
            TypeDescriptor::Enum(enum_type) => enum_type.name().to_string(),
            TypeDescriptor::Union(alternatives) => format!(
                "Union[{}]",
                alternatives
                    .iter()
                    .map(|a| a.type_name())
                    .collect::<Vec<String>>()
                    .join(", ")
            ),
            TypeDescriptor::Nested(schema) => schema.name().to_string(),
            TypeDescriptor::Custom(custom_type) => custom_type.name().to_string(),
        }
    }
}
