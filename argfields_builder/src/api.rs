mod capture;
mod converter;
mod field;
mod multiplicity;
mod naming;
mod options;
mod postprocess;
mod structure;

pub use capture::*;
pub use converter::*;
pub use field::*;
pub use naming::option_strings;
pub use options::*;
pub use structure::*;
