use std::collections::BTreeSet;

use tracing::debug;

use crate::api::{Converter, FieldWrapper};
use crate::model::{Action, FieldDefault, Nargs, Value};

/// The name of a key in the [`ArgOptions`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptionKey {
    /// `action`
    Action,
    /// `type`, the value-converter.
    Type,
    /// `help`
    Help,
    /// `required`
    Required,
    /// `dest`
    Dest,
    /// `default`
    Default,
    /// `choices`
    Choices,
    /// `nargs`
    Nargs,
    /// `metavar`
    Metavar,
    /// `const`
    Const,
    /// `version`
    Version,
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptionKey::Action => "action",
            OptionKey::Type => "type",
            OptionKey::Help => "help",
            OptionKey::Required => "required",
            OptionKey::Dest => "dest",
            OptionKey::Default => "default",
            OptionKey::Choices => "choices",
            OptionKey::Nargs => "nargs",
            OptionKey::Metavar => "metavar",
            OptionKey::Const => "const",
            OptionKey::Version => "version",
        };
        write!(f, "{name}")
    }
}

impl Action {
    /// The option keys accepted when registering an argument with this action.
    /// `None` for a custom action, which accepts anything.
    pub fn accepted_keys(&self) -> Option<BTreeSet<OptionKey>> {
        use OptionKey as K;

        let keys: &[OptionKey] = match self {
            Action::Store | Action::Append => &[
                K::Dest,
                K::Nargs,
                K::Const,
                K::Default,
                K::Type,
                K::Choices,
                K::Required,
                K::Help,
                K::Metavar,
            ],
            Action::StoreConst | Action::AppendConst => &[
                K::Dest,
                K::Const,
                K::Default,
                K::Required,
                K::Help,
                K::Metavar,
            ],
            Action::StoreTrue | Action::StoreFalse | Action::Count => {
                &[K::Dest, K::Default, K::Required, K::Help]
            }
            Action::Help => &[K::Dest, K::Default, K::Help],
            Action::Version => &[K::Version, K::Dest, K::Default, K::Help],
            Action::Parsers => &[K::Dest, K::Required, K::Help, K::Metavar],
            Action::Custom(_) => return None,
        };

        Some(
            keys.iter()
                .copied()
                .chain(std::iter::once(OptionKey::Action))
                .collect(),
        )
    }
}

/// The options to register an argument with, in the style of `argparse`'s `add_argument(..)`.
///
/// Every key is optional; unset keys fall back to the parser's behaviour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOptions {
    /// The action-kind.
    pub action: Option<Action>,
    /// The value-converter.
    pub converter: Option<Converter>,
    /// The help text.
    pub help: Option<String>,
    /// Whether the argument must be specified.
    pub required: Option<bool>,
    /// The destination key.
    pub dest: Option<String>,
    /// The default value.
    pub default: Option<FieldDefault>,
    /// The accepted input tokens.
    pub choices: Option<Vec<String>>,
    /// The multiplicity (`nargs`).
    pub nargs: Option<Nargs>,
    /// The name of the value shown in the help message.
    pub metavar: Option<String>,
    /// The constant stored by the `*_const` actions.
    pub constant: Option<Value>,
    /// The version message of the `version` action.
    pub version: Option<String>,
}

impl ArgOptions {
    /// Set the action-kind.
    pub fn with_action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Set the value-converter.
    pub fn with_converter(mut self, converter: Converter) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Set whether the argument is required.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Set the destination key.
    pub fn with_dest(mut self, dest: impl Into<String>) -> Self {
        self.dest = Some(dest.into());
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(FieldDefault::Single(default));
        self
    }

    /// Set the accepted input tokens.
    pub fn with_choices<S: Into<String>>(mut self, choices: impl IntoIterator<Item = S>) -> Self {
        self.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Set the multiplicity (`nargs`).
    pub fn with_nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    /// Set the metavar.
    pub fn with_metavar(mut self, metavar: impl Into<String>) -> Self {
        self.metavar = Some(metavar.into());
        self
    }

    /// Set the constant of the `*_const` actions.
    pub fn with_constant(mut self, constant: Value) -> Self {
        self.constant = Some(constant);
        self
    }

    /// Set the version message.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// The keys which are set.
    pub fn keys(&self) -> BTreeSet<OptionKey> {
        let mut keys = BTreeSet::default();
        let mut mark = |present: bool, key: OptionKey| {
            if present {
                keys.insert(key);
            }
        };

        mark(self.action.is_some(), OptionKey::Action);
        mark(self.converter.is_some(), OptionKey::Type);
        mark(self.help.is_some(), OptionKey::Help);
        mark(self.required.is_some(), OptionKey::Required);
        mark(self.dest.is_some(), OptionKey::Dest);
        mark(self.default.is_some(), OptionKey::Default);
        mark(self.choices.is_some(), OptionKey::Choices);
        mark(self.nargs.is_some(), OptionKey::Nargs);
        mark(self.metavar.is_some(), OptionKey::Metavar);
        mark(self.constant.is_some(), OptionKey::Const);
        mark(self.version.is_some(), OptionKey::Version);
        keys
    }

    /// Overwrite with every key set in `other`.
    pub fn merge(&mut self, other: ArgOptions) {
        let ArgOptions {
            action,
            converter,
            help,
            required,
            dest,
            default,
            choices,
            nargs,
            metavar,
            constant,
            version,
        } = other;

        if action.is_some() {
            self.action = action;
        }
        if converter.is_some() {
            self.converter = converter;
        }
        if help.is_some() {
            self.help = help;
        }
        if required.is_some() {
            self.required = required;
        }
        if dest.is_some() {
            self.dest = dest;
        }
        if default.is_some() {
            self.default = default;
        }
        if choices.is_some() {
            self.choices = choices;
        }
        if nargs.is_some() {
            self.nargs = nargs;
        }
        if metavar.is_some() {
            self.metavar = metavar;
        }
        if constant.is_some() {
            self.constant = constant;
        }
        if version.is_some() {
            self.version = version;
        }
    }

    /// Unset every key not in `keep`.
    pub fn retain(&mut self, keep: &BTreeSet<OptionKey>) {
        if !keep.contains(&OptionKey::Action) {
            self.action = None;
        }
        if !keep.contains(&OptionKey::Type) {
            self.converter = None;
        }
        if !keep.contains(&OptionKey::Help) {
            self.help = None;
        }
        if !keep.contains(&OptionKey::Required) {
            self.required = None;
        }
        if !keep.contains(&OptionKey::Dest) {
            self.dest = None;
        }
        if !keep.contains(&OptionKey::Default) {
            self.default = None;
        }
        if !keep.contains(&OptionKey::Choices) {
            self.choices = None;
        }
        if !keep.contains(&OptionKey::Nargs) {
            self.nargs = None;
        }
        if !keep.contains(&OptionKey::Metavar) {
            self.metavar = None;
        }
        if !keep.contains(&OptionKey::Const) {
            self.constant = None;
        }
        if !keep.contains(&OptionKey::Version) {
            self.version = None;
        }
    }

    /// Whether no key is set.
    pub fn is_empty(&self) -> bool {
        self.keys().is_empty()
    }
}

/// Prune the `options` down to the keys accepted by the `action`.
/// A custom action keeps everything.
pub fn only_keep_action_args(mut options: ArgOptions, action: &Action) -> ArgOptions {
    match action.accepted_keys() {
        None => options,
        Some(accepted) => {
            let removed: Vec<String> = options
                .keys()
                .difference(&accepted)
                .map(|key| key.to_string())
                .collect();

            if !removed.is_empty() {
                debug!(
                    "Removed options not accepted by the '{action}' action: {}.",
                    removed.join(", ")
                );
            }

            options.retain(&accepted);
            options
        }
    }
}

impl FieldWrapper {
    /// The options to register this field's argument with.
    ///
    /// Inferred from the field's type, then replaced by any custom options, and finally pruned to the keys accepted by the action.
    /// Computed once; subsequent calls return the same object.
    pub fn arg_options(&self) -> &ArgOptions {
        self.arg_options.get_or_init(|| {
            let mut options = self.get_arg_options();
            let mut custom = self.custom_arg_options().clone();

            if self.is_proxy() {
                custom.dest = None;
            }

            options.merge(custom);
            let action = options.action.clone().unwrap_or(Action::Store);
            only_keep_action_args(options, &action)
        })
    }

    /// The options inferred from the field's type, before any custom options are applied.
    pub fn get_arg_options(&self) -> ArgOptions {
        if !self.field().init() {
            return ArgOptions::default();
        }

        let mut options = ArgOptions {
            converter: Some(Converter::for_type(self.ty())),
            help: self.help().map(str::to_string),
            required: Some(self.required()),
            dest: Some(self.dest()),
            default: self.default().cloned(),
            ..ArgOptions::default()
        };

        if let Some(enum_type) = self.ty().as_enum() {
            // Enums are parsed by name, and converted back during post-processing.
            options.choices = Some(enum_type.names());
            options.converter = Some(Converter::Str);

            if let Some(default) = self.default().filter(|default| default.is_present()) {
                options.default = Some(default.map(enum_to_name));
            }
        } else if self.is_list() {
            debug!(
                "Adding a list attribute '{}' with items of type '{}'.",
                self.name(),
                self.ty()
                    .container_element()
                    .map(|element| element.type_name())
                    .unwrap_or_default()
            );
            options.nargs = Some(Nargs::Any);
            options.converter = Some(if self.is_reused() {
                Converter::segments(self.ty())
            } else {
                self.ty()
                    .container_element()
                    .map(Converter::element)
                    .unwrap_or(Converter::Str)
            });
        } else if self.is_tuple() {
            debug!(
                "Adding a tuple attribute '{}' of type '{}'.",
                self.name(),
                self.ty().type_name()
            );
            options.nargs = self.ty().container_nargs();
            options.converter = Some(if self.is_reused() {
                Converter::segments(self.ty())
            } else {
                Converter::container(self.ty())
            });
        } else if self.is_bool() {
            options.converter = Some(Converter::Bool);
            options.nargs = Some(Nargs::Optional);
        }

        if self.is_reused() {
            options.nargs = Some(if self.required() {
                Nargs::AtLeastOne
            } else {
                Nargs::Any
            });
        }

        options
    }
}

fn enum_to_name(value: &Value) -> Value {
    match value {
        Value::Enum(member) => Value::str(member.name.clone()),
        other => other.clone(),
    }
}
