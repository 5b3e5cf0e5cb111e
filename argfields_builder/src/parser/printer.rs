use terminal_size::{terminal_size, Width};

use crate::constant::*;
use crate::model::Nargs;

/// One option of the help message.
pub(super) struct HelpEntry {
    pub option_strings: Vec<String>,
    pub value_name: String,
    pub nargs: Option<Nargs>,
    pub help: Option<String>,
    pub default: Option<String>,
    pub required: bool,
}

pub(super) struct HelpSubcommands {
    pub title: String,
    pub description: Option<String>,
    pub names: Vec<String>,
    pub required: bool,
}

pub(super) struct Printer {
    program: String,
    description: Option<String>,
    entries: Vec<HelpEntry>,
    subcommands: Option<HelpSubcommands>,
    width: usize,
}

impl Printer {
    pub(super) fn terminal(
        program: String,
        description: Option<String>,
        entries: Vec<HelpEntry>,
        subcommands: Option<HelpSubcommands>,
    ) -> Self {
        let width = if let Some((Width(terminal_width), _)) = terminal_size() {
            terminal_width as usize
        } else {
            DEFAULT_WIDTH
        };

        Self::new(program, description, entries, subcommands, width)
    }

    pub(super) fn new(
        program: String,
        description: Option<String>,
        entries: Vec<HelpEntry>,
        subcommands: Option<HelpSubcommands>,
        width: usize,
    ) -> Self {
        Self {
            program,
            description,
            entries,
            subcommands,
            width,
        }
    }

    pub(super) fn render(&self) -> String {
        let mut lines = self.usage();

        if let Some(description) = &self.description {
            lines.push(String::default());
            lines.extend(wrap(description, self.width));
        }

        lines.push(String::default());
        lines.push("options:".to_string());
        let lefts: Vec<String> = self.entries.iter().map(left_column).collect();
        let left_width = std::cmp::min(
            lefts.iter().map(String::len).max().unwrap_or_default(),
            MAX_LEFT_COLUMN,
        );
        let help_start = LEFT_PAD + left_width + COLUMN_GAP;
        // Keep the help column legible on a narrow terminal.
        let help_width = std::cmp::max(self.width.saturating_sub(help_start), 20);

        for (entry, left) in self.entries.iter().zip(&lefts) {
            let help = help_text(entry);
            let mut help_lines = match &help {
                Some(help) => wrap(help, help_width),
                None => Vec::default(),
            }
            .into_iter();

            if left.len() <= left_width {
                match help_lines.next() {
                    Some(first) => lines.push(format!(
                        "{:pad$}{left:<left_width$}{:gap$}{first}",
                        "",
                        "",
                        pad = LEFT_PAD,
                        gap = COLUMN_GAP
                    )),
                    None => lines.push(format!("{:pad$}{left}", "", pad = LEFT_PAD)),
                };
            } else {
                lines.push(format!("{:pad$}{left}", "", pad = LEFT_PAD));
            }

            for line in help_lines {
                lines.push(format!("{:help_start$}{line}", ""));
            }
        }

        if let Some(subcommands) = &self.subcommands {
            lines.push(String::default());
            lines.push(format!("{}:", subcommands.title));

            if let Some(description) = &subcommands.description {
                for line in wrap(description, self.width.saturating_sub(LEFT_PAD)) {
                    lines.push(format!("{:pad$}{line}", "", pad = LEFT_PAD));
                }
            }

            lines.push(format!(
                "{:pad$}{{{}}}",
                "",
                subcommands.names.join(","),
                pad = LEFT_PAD
            ));
        }

        lines.join("\n")
    }

    fn usage(&self) -> Vec<String> {
        let head = format!("usage: {}", self.program);
        let mut pieces: Vec<String> = self
            .entries
            .iter()
            .map(|entry| {
                let option = entry
                    .option_strings
                    .first()
                    .map(String::as_str)
                    .unwrap_or_default();
                let grammar = grammar(&entry.value_name, entry.nargs);

                if entry.required {
                    format!("{option}{grammar}")
                } else {
                    format!("[{option}{grammar}]")
                }
            })
            .collect();

        if let Some(subcommands) = &self.subcommands {
            let names = format!("{{{}}}", subcommands.names.join(","));

            if subcommands.required {
                pieces.push(format!("{names} ..."));
            } else {
                pieces.push(format!("[{names} ...]"));
            }
        }

        let indent = head.len() + 1;
        let mut lines = vec![head];

        for piece in pieces {
            let last = lines.len() - 1;

            if lines[last].len() + 1 + piece.len() > self.width && lines[last].len() > indent {
                lines.push(format!("{:indent$}{piece}", ""));
            } else {
                lines[last].push(' ');
                lines[last].push_str(&piece);
            }
        }

        lines
    }
}

fn grammar(value_name: &str, nargs: Option<Nargs>) -> String {
    match nargs {
        None => format!(" {value_name}"),
        Some(Nargs::Precisely(0)) => String::default(),
        Some(Nargs::Precisely(n)) => format!(
            " {}",
            (0..n)
                .map(|_| value_name)
                .collect::<Vec<&str>>()
                .join(" ")
        ),
        Some(Nargs::Optional) => format!(" [{value_name}]"),
        Some(Nargs::Any) => format!(" [{value_name} ...]"),
        Some(Nargs::AtLeastOne) => format!(" {value_name} [{value_name} ...]"),
    }
}

fn left_column(entry: &HelpEntry) -> String {
    let grammar = grammar(&entry.value_name, entry.nargs);
    entry
        .option_strings
        .iter()
        .map(|option| format!("{option}{grammar}"))
        .collect::<Vec<String>>()
        .join(", ")
}

fn help_text(entry: &HelpEntry) -> Option<String> {
    match (&entry.help, &entry.default) {
        (Some(help), Some(default)) => Some(format!("{help} (default: {default})")),
        (Some(help), None) => Some(help.clone()),
        (None, Some(default)) => Some(format!("(default: {default})")),
        (None, None) => None,
    }
}

/// Greedily wrap the words of `text` into lines of at most `width` characters.
/// A word longer than `width` takes a line of its own.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::default();
    let mut current = String::default();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current.push_str(word);
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    lines
}
