pub(crate) const TRUTHY: [&str; 5] = ["yes", "true", "t", "y", "1"];
pub(crate) const FALSY: [&str; 5] = ["no", "false", "f", "n", "0"];

pub(crate) const HELP_SHORT: &str = "-h";
pub(crate) const HELP_LONG: &str = "--help";
pub(crate) const HELP_DEST: &str = "help";
pub(crate) const HELP_MESSAGE: &str = "Show this help message and exit.";

pub(crate) const TERMINATOR: &str = "--";
pub(crate) const DEST_SEPARATOR: char = '.';

pub(crate) const DEFAULT_WIDTH: usize = 80;
pub(crate) const LEFT_PAD: usize = 2;
pub(crate) const COLUMN_GAP: usize = 2;
pub(crate) const MAX_LEFT_COLUMN: usize = 24;
