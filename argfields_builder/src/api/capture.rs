use thiserror::Error;

/// Error raised by a field while capturing its parsed values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The count of values is neither 1 nor the count of destinations.
    #[error("the field '{field}' contains {received} values, but either 1 or {expected} values were expected.")]
    InconsistentArgument {
        /// The field name.
        field: String,
        /// The count of values received.
        received: usize,
        /// The count of destinations.
        expected: usize,
    },

    /// The constructor of a custom type failed, under a strict construction policy.
    #[error("cannot construct the field '{field}' of type '{type_name}': {message}.")]
    Construction {
        /// The field name.
        field: String,
        /// The declared type.
        type_name: String,
        /// The reason given by the constructor.
        message: String,
    },

    /// The value of an enumeration field does not name any member.
    #[error("'{name}' is not a member of '{enum_name}' (field '{field}').")]
    UnknownMember {
        /// The field name.
        field: String,
        /// The enumeration.
        enum_name: String,
        /// The unmatched name.
        name: String,
    },

    /// The values of a field were spread over its destinations, but it has fewer than 2.
    #[error("the field '{field}' has {instances} destinations, so its values cannot be duplicated.")]
    NotReused {
        /// The field name.
        field: String,
        /// The count of destinations.
        instances: usize,
    },
}
