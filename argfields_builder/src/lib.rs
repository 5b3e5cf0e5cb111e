//! Engine module for `argfields`.
//! See [documentation root](https://docs.rs/argfields/latest/argfields/index.html) for full details.
#![warn(missing_docs)]
mod api;
mod config;
mod constant;
mod docstring;
mod model;
mod parser;
#[allow(missing_docs)]
pub mod prelude;
mod schema;
mod table;
mod types;

pub use api::*;
pub use config::*;
pub use docstring::{AttributeDocString, DocstringError};
pub use model::*;
pub use parser::*;
pub use schema::*;
pub use table::*;
pub use types::*;

#[cfg(test)]
#[macro_use]
extern crate assert_matches;

#[cfg(test)]
pub(crate) mod test {
    macro_rules! assert_contains {
        ($base:expr, $sub:expr) => {
            assert!(
                $base.contains($sub),
                "'{b}' does not contain '{s}'",
                b = $base,
                s = $sub,
            );
        };
    }

    pub(crate) use assert_contains;
}
