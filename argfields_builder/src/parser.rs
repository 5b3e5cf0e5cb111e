mod base;
mod matcher;
mod printer;

pub use base::{ArgumentParser, ConfigError, ParseError, ParseOutcome, Subparsers};
