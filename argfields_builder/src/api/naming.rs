use std::collections::BTreeSet;

use crate::api::FieldWrapper;

impl FieldWrapper {
    /// The option strings (flags) of this field, such as `-x`, `--x` or `--prefix_name`.
    /// Sorted by length, shortest first.
    pub fn option_strings(&self) -> &[String] {
        self.option_strings.get_or_init(|| {
            option_strings(
                self.name(),
                self.prefix(),
                self.aliases(),
                self.config().add_dash_variants(),
            )
        })
    }
}

/// Generate the option strings for the attribute `name`.
///
/// A one character name uses a single dash, and also gets the double dash form.
/// An alias keeps any leading dashes it is declared with; otherwise it follows the same rule as the name.
/// Every spelling is prefixed by `prefix`.
pub fn option_strings(
    name: &str,
    prefix: &str,
    aliases: &[String],
    add_dash_variants: bool,
) -> Vec<String> {
    // (dashes, prefixed name)
    let mut spellings: Vec<(&str, String)> = Vec::default();
    let dash = dashes_for(name);
    spellings.push((dash, format!("{prefix}{name}")));

    if dash == "-" {
        spellings.push(("--", format!("{prefix}{name}")));
    }

    for alias in aliases {
        let (dash, bare) = if let Some(bare) = alias.strip_prefix("--") {
            ("--", bare)
        } else if let Some(bare) = alias.strip_prefix('-') {
            ("-", bare)
        } else {
            (dashes_for(alias), alias.as_str())
        };
        spellings.push((dash, format!("{prefix}{bare}")));
    }

    if add_dash_variants {
        let variants: Vec<(&str, String)> = spellings
            .iter()
            .filter(|(_, option)| option.contains('_'))
            .map(|(dash, option)| (*dash, option.replace('_', "-")))
            .collect();
        spellings.extend(variants);
    }

    let unique: BTreeSet<String> = spellings
        .into_iter()
        .map(|(dash, option)| format!("{dash}{option}"))
        .collect();
    let mut option_strings: Vec<String> = unique.into_iter().collect();
    option_strings.sort_by_key(|option| option.len());
    option_strings
}

fn dashes_for(name: &str) -> &'static str {
    if name.chars().count() == 1 {
        "-"
    } else {
        "--"
    }
}
