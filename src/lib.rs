//! `argfields` derives command line options from declared structure fields, and rebuilds typed values from the parsed input.
//!
//! A structure is declared once, as a [`StructSchema`] of typed [`FieldSpec`]s.
//! Each field is then translated into a command line option:
//! * *Option strings*:
//! The attribute name becomes `--name` (or `-n` and `--n` for a single character), plus any aliases, behind an optional prefix.
//! * *Option descriptor*:
//! The field's type decides the value-converter, the multiplicity (`nargs`), the choices, and whether the option is required.
//! The help text comes from the attribute's documentation.
//! * *Post-processing*:
//! The parsed values are converted back into the declared type (enumeration members, tuples, booleans, custom types), and written into a shared [`ConstructorArguments`] table.
//!
//! A structure may be *reused*, meaning it is instantiated under several destinations from a single option.
//! In that case, an option takes either one value for all the instances, or one value per instance.
//!
//! # Usage
//! ```
//! use std::rc::Rc;
//! use argfields::*;
//!
//! let schema = Rc::new(
//!     StructSchema::new("Config")
//!         .field(FieldSpec::new("count", TypeDescriptor::Int).default_value(Value::Int(1)))
//!         .field(FieldSpec::new("verbose", TypeDescriptor::Bool).default_value(Value::Bool(false)))
//!         .doc("count", AttributeDocString::below("How many times to run.")),
//! );
//! let wrapper = DataclassWrapper::builder(schema).build();
//! let mut parser = ArgumentParser::new("runner");
//! wrapper.register(&mut parser).unwrap();
//!
//! match parser.parse_tokens(&["--count", "3", "--verbose"]).unwrap() {
//!     ParseOutcome::Complete(arguments) => {
//!         assert_eq!(arguments.get("config", "count"), Some(&Value::Int(3)));
//!         assert_eq!(arguments.get("config", "verbose"), Some(&Value::Bool(true)));
//!     }
//!     _ => unreachable!(),
//! }
//! ```
//!
//! # Fields
//! The [`FieldWrapper`] of each field exposes the derived properties used for registration:
//! [`FieldWrapper::option_strings`], [`FieldWrapper::arg_options`], [`FieldWrapper::required`], [`FieldWrapper::default`], [`FieldWrapper::help`] and [`FieldWrapper::dest`].
//! Each is computed on first use, and cached.
//! The `default`, `required`, `help` and `metavar` may be overridden before registration, via [`DataclassWrapper::field_mut`].
//!
//! Explicit overrides are declared on the [`FieldSpec`] (aliases, custom [`ArgOptions`], proxies, and sub-commands).
//! They always win over the inferred behaviour.
//!
//! # Logging
//! `argfields` emits [`tracing`](https://docs.rs/tracing) events: `debug` for the translation and parse steps, and `warn` when a custom type cannot be constructed from its parsed value.
//! No subscriber is installed; applications choose their own.
#![deny(missing_docs)]

pub use argfields_builder::*;
