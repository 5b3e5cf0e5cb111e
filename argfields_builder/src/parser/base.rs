use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ArgOptions, ConversionError, Converter, FieldError};
use crate::constant::*;
use crate::model::{Action, Nargs, Value};
use crate::parser::matcher::{Bound, Feed, MatchError, MatchTokens, TokenMatcher};
use crate::parser::printer::{HelpEntry, HelpSubcommands, Printer};
use crate::prelude::ArgumentCallback;
use crate::table::ConstructorArguments;

/// Error for an invalid registration of an argument or sub-command.
#[derive(Debug, Error)]
#[error("Config error: {0}")]
pub struct ConfigError(pub(crate) String);

/// Error while parsing the input tokens.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// The token looks like an option, but none is registered under that name.
    #[error("unrecognized option '{0}'.")]
    UnrecognizedOption(String),

    /// A positional token, where none is accepted.
    #[error("unexpected argument '{0}'.")]
    UnexpectedArgument(String),

    /// The option received fewer values than its multiplicity (`nargs`) allows.
    #[error("too few values provided for '{option}' (provided={provided}, expected={expected}).")]
    TooFewValues {
        /// The option string.
        option: String,
        /// The count of values provided.
        provided: usize,
        /// The minimum count of values.
        expected: u8,
    },

    /// The option received more values than its multiplicity (`nargs`) allows.
    #[error("too many values provided for '{option}' (provided={provided}, expected={expected}).")]
    TooManyValues {
        /// The option string.
        option: String,
        /// The count of values provided.
        provided: usize,
        /// The maximum count of values.
        expected: u8,
    },

    /// The value is not one of the choices.
    #[error("invalid choice '{value}' for '{option}' (choose from {choices}).")]
    InvalidChoice {
        /// The option string.
        option: String,
        /// The input token.
        value: String,
        /// The accepted choices, comma separated.
        choices: String,
    },

    /// The value could not be converted.
    #[error("invalid value for '{option}': {source}")]
    InvalidValue {
        /// The option string.
        option: String,
        /// The conversion failure.
        source: ConversionError,
    },

    /// A required option was not specified.
    #[error("the option '{0}' is required.")]
    MissingRequired(String),

    /// A required sub-command was not specified.
    #[error("a sub-command is required (choose from {0}).")]
    MissingSubcommand(String),

    /// The sub-command is not registered.
    #[error("unknown sub-command '{name}' (choose from {choices}).")]
    UnknownSubcommand {
        /// The input token.
        name: String,
        /// The registered sub-commands, comma separated.
        choices: String,
    },

    /// A field callback failed.
    #[error(transparent)]
    Field(#[from] FieldError),
}

impl From<MatchError> for ParseError {
    fn from(error: MatchError) -> Self {
        match error {
            MatchError::UnrecognizedOption(option) => ParseError::UnrecognizedOption(option),
            MatchError::UnexpectedArgument(token) => ParseError::UnexpectedArgument(token),
            MatchError::TooFewValues {
                option,
                provided,
                expected,
            } => ParseError::TooFewValues {
                option,
                provided,
                expected,
            },
            MatchError::TooManyValues {
                option,
                provided,
                expected,
            } => ParseError::TooManyValues {
                option,
                provided,
                expected,
            },
        }
    }
}

/// The result of a successful parse.
#[derive(Debug, PartialEq)]
pub enum ParseOutcome {
    /// Every argument was parsed, and delivered to its callback.
    Complete(ConstructorArguments),
    /// The help was requested; contains the rendered help message.
    Help(String),
    /// The version was requested; contains the version message.
    Version(String),
}

struct Argument {
    option_strings: Vec<String>,
    options: ArgOptions,
    action: Action,
    dest: String,
    callback: Option<Rc<dyn ArgumentCallback>>,
}

impl Argument {
    fn bound(&self) -> Bound {
        if self.action.takes_no_values() {
            Bound::Range(0, 0)
        } else {
            self.options
                .nargs
                .map(Bound::from)
                .unwrap_or(Bound::Range(1, 1))
        }
    }

    fn long_name(&self) -> &str {
        self.option_strings
            .iter()
            .find(|option| option.starts_with("--"))
            .or_else(|| self.option_strings.first())
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// The sub-commands of an [`ArgumentParser`].
pub struct Subparsers {
    program: String,
    title: String,
    description: Option<String>,
    dest: String,
    required: bool,
    callback: Option<Rc<dyn ArgumentCallback>>,
    parsers: Vec<(String, ArgumentParser)>,
}

impl Subparsers {
    /// Add the sub-command `name`, and return its parser.
    pub fn add_parser(&mut self, name: impl Into<String>) -> &mut ArgumentParser {
        let name = name.into();
        let parser = ArgumentParser::new(format!("{} {name}", self.program));
        self.parsers.push((name, parser));
        let last = self.parsers.len() - 1;
        &mut self.parsers[last].1
    }

    /// The names of the sub-commands, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|(name, _)| name.as_str()).collect()
    }

    fn get(&self, name: &str) -> Option<&ArgumentParser> {
        self.parsers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, parser)| parser)
    }
}

impl std::fmt::Debug for Subparsers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subparsers")
            .field("title", &self.title)
            .field("dest", &self.dest)
            .field("names", &self.names())
            .finish()
    }
}

/// A minimal `argparse`-style option parser.
///
/// Arguments are registered with option strings, [`ArgOptions`], and a callback.
/// After a parse, every destination is delivered to the callback of the argument that matched it (or the first one registered for it).
pub struct ArgumentParser {
    program: String,
    description: Option<String>,
    arguments: Vec<Argument>,
    subparsers: Option<Subparsers>,
    structures: Vec<(String, String)>,
}

impl std::fmt::Debug for ArgumentParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArgumentParser")
            .field("program", &self.program)
            .field("arguments", &self.arguments.len())
            .finish()
    }
}

impl ArgumentParser {
    /// Create a parser for the `program`, with the `-h/--help` option.
    pub fn new(program: impl Into<String>) -> Self {
        let help = Argument {
            option_strings: vec![HELP_SHORT.to_string(), HELP_LONG.to_string()],
            options: ArgOptions::default()
                .with_action(Action::Help)
                .with_help(HELP_MESSAGE),
            action: Action::Help,
            dest: HELP_DEST.to_string(),
            callback: None,
        };

        Self {
            program: program.into(),
            description: None,
            arguments: vec![help],
            subparsers: None,
            structures: Vec::default(),
        }
    }

    /// Document the parser.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The program name.
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Register an argument under the `option_strings`.
    ///
    /// Without an explicit `dest`, the destination is derived from the first long option string.
    pub fn add_argument(
        &mut self,
        option_strings: Vec<String>,
        options: ArgOptions,
        callback: Option<Rc<dyn ArgumentCallback>>,
    ) -> Result<(), ConfigError> {
        if option_strings.is_empty() {
            return Err(ConfigError(
                "Cannot register an argument without option strings.".to_string(),
            ));
        }

        for option in &option_strings {
            if !option.starts_with('-') || option == "-" {
                return Err(ConfigError(format!(
                    "The option string '{option}' must start with a dash."
                )));
            }

            if self
                .arguments
                .iter()
                .any(|argument| argument.option_strings.contains(option))
            {
                return Err(ConfigError(format!(
                    "Cannot duplicate the option string '{option}'."
                )));
            }
        }

        let action = options.action.clone().unwrap_or(Action::Store);
        let dest = match &options.dest {
            Some(dest) => dest.clone(),
            None => derive_dest(&option_strings),
        };
        debug!(
            "Adding argument {option_strings:?} with action '{action}' and dest '{dest}'."
        );
        self.arguments.push(Argument {
            option_strings,
            options,
            action,
            dest,
            callback,
        });
        Ok(())
    }

    /// Add the sub-commands of this parser, whose parse result is delivered to the `callback` under `dest`.
    pub fn add_subparsers(
        &mut self,
        title: impl Into<String>,
        description: Option<String>,
        dest: impl Into<String>,
        required: bool,
        callback: Option<Rc<dyn ArgumentCallback>>,
    ) -> Result<&mut Subparsers, ConfigError> {
        if self.subparsers.is_some() {
            return Err(ConfigError(format!(
                "Cannot add multiple sub-commands to the parser '{}'.",
                self.program
            )));
        }

        Ok(self.subparsers.insert(Subparsers {
            program: self.program.clone(),
            title: title.into(),
            description,
            dest: dest.into(),
            required,
            callback,
            parsers: Vec::default(),
        }))
    }

    /// Declare that the structure `type_name` is constructed at `dest`.
    pub fn declare_structure(&mut self, dest: impl Into<String>, type_name: impl Into<String>) {
        self.structures.push((dest.into(), type_name.into()));
    }

    /// Parse the input tokens (excluding the program name).
    pub fn parse_tokens(&self, tokens: &[&str]) -> Result<ParseOutcome, ParseError> {
        let mut arguments = ConstructorArguments::default();

        match self.parse_into(tokens, &mut arguments)? {
            Some(outcome) => Ok(outcome),
            None => Ok(ParseOutcome::Complete(arguments)),
        }
    }

    /// Render the help message.
    pub fn help(&self) -> String {
        self.printer().render()
    }

    fn parse_into(
        &self,
        tokens: &[&str],
        arguments: &mut ConstructorArguments,
    ) -> Result<Option<ParseOutcome>, ParseError> {
        // 1. Match the raw token strings against the options.
        let mut token_matcher = TokenMatcher::new(self.option_bounds(), self.command_names());
        let mut dispatch = None;

        for (offset, token) in tokens.iter().enumerate() {
            match token_matcher.feed(offset, token) {
                Ok(Feed::Consumed) => {}
                Ok(Feed::Dispatch) => {
                    dispatch = Some(offset);
                    break;
                }
                Err(error) => return self.help_or(token_matcher.matched(0), error.into()),
            }
        }

        let help_matched = token_matcher.matched(0);
        let matches = match token_matcher.close() {
            Ok(matches) => matches,
            Err(error) => return self.help_or(help_matched, error.into()),
        };

        if help_matched {
            return Ok(Some(ParseOutcome::Help(self.help())));
        }

        // 2. Seed the namespace with the defaults; the first registration of a destination wins.
        let mut namespace: BTreeMap<String, Value> = BTreeMap::default();

        for argument in &self.arguments {
            if let Some(default) = &argument.options.default {
                namespace
                    .entry(argument.dest.clone())
                    .or_insert_with(|| default.to_value());
            }
        }

        // 3. Execute the action of each match.
        let mut matched_by: HashMap<String, (usize, String)> = HashMap::default();
        let mut touched: HashSet<String> = HashSet::default();

        for match_tokens in matches {
            let argument = &self.arguments[match_tokens.index];

            if let Some(outcome) = self.execute(argument, &match_tokens, &mut namespace, &touched)? {
                return Ok(Some(outcome));
            }

            touched.insert(argument.dest.clone());
            matched_by.insert(
                argument.dest.clone(),
                (match_tokens.index, match_tokens.option),
            );
        }

        // 4. Dispatch to the sub-command.
        if let Some(subparsers) = &self.subparsers {
            let choices = subparsers.names().join(", ");

            match dispatch {
                Some(offset) => {
                    let name = tokens[offset];
                    let subparser = subparsers.get(name).ok_or_else(|| {
                        ParseError::UnknownSubcommand {
                            name: name.to_string(),
                            choices: choices.clone(),
                        }
                    })?;
                    debug!("Dispatching to the sub-command '{name}'.");

                    if let Some(outcome) = subparser.parse_into(&tokens[offset + 1..], arguments)? {
                        return Ok(Some(outcome));
                    }

                    let value = arguments
                        .instance(&subparsers.dest)
                        .map(Value::Struct)
                        .unwrap_or(Value::None);
                    namespace.insert(subparsers.dest.clone(), value);
                }
                None if subparsers.required => {
                    return Err(ParseError::MissingSubcommand(choices));
                }
                None => {}
            }
        }

        // 5. Validate the required options.
        for argument in &self.arguments {
            if argument.options.required == Some(true) && !touched.contains(&argument.dest) {
                return Err(ParseError::MissingRequired(argument.long_name().to_string()));
            }
        }

        // 6. Deliver each destination to its callback.
        let mut delivered: HashSet<&str> = HashSet::default();

        for argument in &self.arguments {
            if !delivered.insert(argument.dest.as_str()) {
                continue;
            }

            let (chosen, option_string) = match matched_by.get(&argument.dest) {
                Some((index, option)) => (&self.arguments[*index], Some(option.as_str())),
                None => (argument, None),
            };

            if let Some(callback) = &chosen.callback {
                let value = namespace
                    .get(&chosen.dest)
                    .cloned()
                    .unwrap_or(Value::None);
                callback.invoke(arguments, value, option_string)?;
            }
        }

        if let Some(subparsers) = &self.subparsers {
            if let (Some(callback), Some(value)) =
                (&subparsers.callback, namespace.get(&subparsers.dest))
            {
                callback.invoke(arguments, value.clone(), None)?;
            }
        }

        // 7. Declare the structures, so they may be assembled from the table.
        for (dest, type_name) in &self.structures {
            arguments.declare(dest, type_name);
        }

        Ok(None)
    }

    fn execute(
        &self,
        argument: &Argument,
        match_tokens: &MatchTokens,
        namespace: &mut BTreeMap<String, Value>,
        touched: &HashSet<String>,
    ) -> Result<Option<ParseOutcome>, ParseError> {
        let dest = argument.dest.clone();
        let constant = || argument.options.constant.clone().unwrap_or(Value::None);
        // The default is replaced, rather than accumulated onto, by the first occurrence.
        let accumulated = |namespace: &BTreeMap<String, Value>| -> Option<Value> {
            if touched.contains(&dest) {
                namespace.get(&dest).cloned()
            } else {
                argument.options.default.as_ref().map(|d| d.to_value())
            }
        };

        match &argument.action {
            Action::Store | Action::Custom(_) => {
                let value = self.convert_values(argument, match_tokens)?;
                namespace.insert(dest, value);
            }
            Action::StoreConst => {
                namespace.insert(dest, constant());
            }
            Action::StoreTrue => {
                namespace.insert(dest, Value::Bool(true));
            }
            Action::StoreFalse => {
                namespace.insert(dest, Value::Bool(false));
            }
            Action::Append | Action::AppendConst => {
                let item = match argument.action {
                    Action::Append => self.convert_values(argument, match_tokens)?,
                    _ => constant(),
                };
                let mut items = match accumulated(&*namespace) {
                    Some(Value::List(items)) => items,
                    _ => Vec::default(),
                };
                items.push(item);
                namespace.insert(dest, Value::List(items));
            }
            Action::Count => {
                let count = match accumulated(&*namespace) {
                    Some(Value::Int(count)) => count,
                    _ => 0,
                };
                namespace.insert(dest, Value::Int(count + 1));
            }
            Action::Help => return Ok(Some(ParseOutcome::Help(self.help()))),
            Action::Version => {
                let version = argument.options.version.clone().unwrap_or_default();
                return Ok(Some(ParseOutcome::Version(version)));
            }
            Action::Parsers => {}
        };

        Ok(None)
    }

    fn convert_values(
        &self,
        argument: &Argument,
        match_tokens: &MatchTokens,
    ) -> Result<Value, ParseError> {
        let converter = argument.options.converter.clone().unwrap_or(Converter::Str);
        let mut values = Vec::default();

        for (position, (_, token)) in match_tokens.values.iter().enumerate() {
            if let Some(choices) = &argument.options.choices {
                if !choices.contains(token) {
                    return Err(ParseError::InvalidChoice {
                        option: match_tokens.option.clone(),
                        value: token.clone(),
                        choices: choices.join(", "),
                    });
                }
            }

            let value =
                converter
                    .convert(position, token)
                    .map_err(|source| ParseError::InvalidValue {
                        option: match_tokens.option.clone(),
                        source,
                    })?;
            values.push(value);
        }

        Ok(match argument.options.nargs {
            None => values.into_iter().next().unwrap_or(Value::None),
            Some(Nargs::Optional) => match values.into_iter().next() {
                Some(value) => value,
                None => argument.options.constant.clone().unwrap_or(Value::None),
            },
            Some(_) => Value::List(values),
        })
    }

    fn option_bounds(&self) -> HashMap<String, (usize, Bound)> {
        let mut bounds = HashMap::default();

        for (index, argument) in self.arguments.iter().enumerate() {
            for option in &argument.option_strings {
                bounds.insert(option.clone(), (index, argument.bound()));
            }
        }

        bounds
    }

    fn command_names(&self) -> HashSet<String> {
        match &self.subparsers {
            Some(subparsers) => subparsers
                .names()
                .into_iter()
                .map(str::to_string)
                .collect(),
            None => HashSet::default(),
        }
    }

    fn help_or(
        &self,
        help_matched: bool,
        error: ParseError,
    ) -> Result<Option<ParseOutcome>, ParseError> {
        if help_matched {
            Ok(Some(ParseOutcome::Help(self.help())))
        } else {
            Err(error)
        }
    }

    fn printer(&self) -> Printer {
        let entries = self
            .arguments
            .iter()
            .map(|argument| HelpEntry {
                option_strings: argument.option_strings.clone(),
                value_name: value_name(argument),
                nargs: if argument.action.takes_no_values() {
                    Some(Nargs::Precisely(0))
                } else {
                    argument.options.nargs
                },
                help: argument.options.help.clone(),
                default: match argument.action {
                    Action::Help | Action::Version => None,
                    _ => argument.options.default.as_ref().map(|d| d.to_string()),
                },
                required: argument.options.required == Some(true),
            })
            .collect();
        let subcommands = self.subparsers.as_ref().map(|subparsers| HelpSubcommands {
            title: subparsers.title.clone(),
            description: subparsers.description.clone(),
            names: subparsers.names().into_iter().map(str::to_string).collect(),
            required: subparsers.required,
        });

        Printer::terminal(
            self.program.clone(),
            self.description.clone(),
            entries,
            subcommands,
        )
    }
}

fn derive_dest(option_strings: &[String]) -> String {
    let chosen = option_strings
        .iter()
        .find(|option| option.starts_with("--"))
        .or_else(|| option_strings.first())
        .map(String::as_str)
        .unwrap_or_default();
    chosen.trim_start_matches('-').replace('-', "_")
}

fn value_name(argument: &Argument) -> String {
    if let Some(metavar) = &argument.options.metavar {
        return metavar.clone();
    }

    if let Some(choices) = &argument.options.choices {
        return format!("{{{}}}", choices.join(","));
    }

    let segment = argument
        .dest
        .rsplit(DEST_SEPARATOR)
        .next()
        .unwrap_or_default();
    segment.to_uppercase()
}
