use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::constant::TERMINATOR;
use crate::model::Nargs;

pub(super) type OffsetValue = (usize, String);

/// The number of values an option may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(super) enum Bound {
    Range(u8, u8),
    Lower(u8),
}

impl From<Nargs> for Bound {
    fn from(value: Nargs) -> Self {
        match value {
            Nargs::Precisely(n) => Bound::Range(n, n),
            Nargs::Optional => Bound::Range(0, 1),
            Nargs::Any => Bound::Lower(0),
            Nargs::AtLeastOne => Bound::Lower(1),
        }
    }
}

#[cfg(test)]
impl rand::distributions::Distribution<Bound> for rand::distributions::Standard {
    fn sample<R: rand::Rng + ?Sized>(&self, rng: &mut R) -> Bound {
        match rng.gen_range(0..2) {
            0 => {
                let upper: u8 = rng.gen();

                if upper == 0 {
                    Bound::Range(0, upper)
                } else {
                    Bound::Range(rng.gen_range(0..upper), upper)
                }
            }
            1 => Bound::Lower(rng.gen()),
            _ => unreachable!("internal error - outside gen_range"),
        }
    }
}

/// The values matched by one occurrence of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct MatchTokens {
    pub index: usize,
    pub option: String,
    pub values: Vec<OffsetValue>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub(super) enum MatchError {
    #[error("unrecognized option '{0}'.")]
    UnrecognizedOption(String),

    #[error("unexpected argument '{0}'.")]
    UnexpectedArgument(String),

    #[error("too few values provided for '{option}' (provided={provided}, expected={expected}).")]
    TooFewValues {
        option: String,
        provided: usize,
        expected: u8,
    },

    #[error("too many values provided for '{option}' (provided={provided}, expected={expected}).")]
    TooManyValues {
        option: String,
        provided: usize,
        expected: u8,
    },
}

#[derive(Debug)]
struct MatchBuffer {
    index: usize,
    option: String,
    bound: Bound,
    values: Vec<OffsetValue>,
}

impl MatchBuffer {
    fn new(index: usize, option: impl Into<String>, bound: Bound) -> Self {
        Self {
            index,
            option: option.into(),
            bound,
            values: Vec::default(),
        }
    }

    fn push(&mut self, offset: usize, value: String) {
        self.values.push((offset, value));
    }

    fn is_open(&self) -> bool {
        match self.bound {
            Bound::Range(_, n) => self.values.len() < n as usize,
            Bound::Lower(_) => true,
        }
    }

    fn can_close(&self) -> bool {
        let n = match self.bound {
            Bound::Range(n, _) => n,
            Bound::Lower(n) => n,
        };
        self.values.len() >= n as usize
    }

    fn close(self) -> Result<MatchTokens, MatchError> {
        match self.bound {
            Bound::Lower(n) => {
                if self.values.len() < n as usize {
                    return Err(MatchError::TooFewValues {
                        option: self.option,
                        provided: self.values.len(),
                        expected: n,
                    });
                }
            }
            Bound::Range(i, j) => {
                if self.values.len() < i as usize {
                    return Err(MatchError::TooFewValues {
                        option: self.option,
                        provided: self.values.len(),
                        expected: i,
                    });
                } else if self.values.len() > j as usize {
                    return Err(MatchError::TooManyValues {
                        option: self.option,
                        provided: self.values.len(),
                        expected: j,
                    });
                }
            }
        };

        Ok(MatchTokens {
            index: self.index,
            option: self.option,
            values: self.values,
        })
    }
}

/// What the matcher did with a token.
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Feed {
    Consumed,
    /// The token is positional, and names a sub-command: matching stops here.
    Dispatch,
}

/// Matches the input tokens against option strings.
///
/// Options may repeat, and take values in the `--name value` or `--name=value` forms.
/// Every token after the `--` terminator is a value.
pub(super) struct TokenMatcher {
    options: HashMap<String, (usize, Bound)>,
    commands: HashSet<String>,
    matches: Vec<MatchTokens>,
    buffer: Option<MatchBuffer>,
    terminated: bool,
}

impl TokenMatcher {
    /// Match against the `options`, keyed by option string.
    /// When there are sub-`commands`, the first positional token stops the matching.
    pub(super) fn new(options: HashMap<String, (usize, Bound)>, commands: HashSet<String>) -> Self {
        Self {
            options,
            commands,
            matches: Vec::default(),
            buffer: None,
            terminated: false,
        }
    }

    pub(super) fn feed(&mut self, offset: usize, token: &str) -> Result<Feed, MatchError> {
        if self.terminated {
            return self.match_value(offset, token);
        }

        if token == TERMINATOR {
            self.terminated = true;
            return Ok(Feed::Consumed);
        }

        if is_option(token) {
            return self.match_option(offset, split_equals_delimiter(token));
        }

        self.match_value(offset, token)
    }

    fn match_option(
        &mut self,
        offset: usize,
        (left, right): (&str, Option<&str>),
    ) -> Result<Feed, MatchError> {
        let (index, bound) = match self.options.get(left) {
            Some(entry) => *entry,
            None => return Err(MatchError::UnrecognizedOption(left.to_string())),
        };
        let mut match_buffer = MatchBuffer::new(index, left, bound);
        self.update_buffer(None)?;

        match right {
            Some(value) => {
                match_buffer.push(offset, value.to_string());
                // Options using k=v syntax cannot follow up with more values afterwards.
                self.matches.push(match_buffer.close()?);
            }
            None => self.buffer = Some(match_buffer),
        };

        Ok(Feed::Consumed)
    }

    fn match_value(&mut self, offset: usize, token: &str) -> Result<Feed, MatchError> {
        if let Some(match_buffer) = self.buffer.as_mut() {
            // A sub-command name ends a greedy option, once it has enough values.
            let yields = self.commands.contains(token) && match_buffer.can_close();

            if match_buffer.is_open() && !yields {
                match_buffer.push(offset, token.to_string());
                return Ok(Feed::Consumed);
            }
        }

        self.update_buffer(None)?;

        if self.commands.is_empty() {
            Err(MatchError::UnexpectedArgument(token.to_string()))
        } else {
            Ok(Feed::Dispatch)
        }
    }

    fn update_buffer(&mut self, next_buffer: Option<MatchBuffer>) -> Result<(), MatchError> {
        let previous_buffer = std::mem::replace(&mut self.buffer, next_buffer);

        if let Some(match_buffer) = previous_buffer {
            self.matches.push(match_buffer.close()?);
        }

        Ok(())
    }

    /// Whether the argument at `index` has been matched so far.
    pub(super) fn matched(&self, index: usize) -> bool {
        self.matches.iter().any(|m| m.index == index)
            || self.buffer.as_ref().map_or(false, |b| b.index == index)
    }

    /// The matches, in input order.
    pub(super) fn close(mut self) -> Result<Vec<MatchTokens>, MatchError> {
        self.update_buffer(None)?;
        Ok(self.matches)
    }
}

fn is_option(token: &str) -> bool {
    match token.strip_prefix('-') {
        // A lone dash is a value (conventionally, stdin).
        Some("") | None => false,
        // Negative numbers are values.
        Some(rest) => rest.parse::<f64>().is_err(),
    }
}

fn split_equals_delimiter(token: &str) -> (&str, Option<&str>) {
    match token.split_once('=') {
        Some((n, v)) => (n, Some(v)),
        None => (token, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{thread_rng, Rng};
    use rstest::rstest;

    fn matcher(bounds: &[(&str, Bound)], commands: &[&str]) -> TokenMatcher {
        let options = bounds
            .iter()
            .enumerate()
            .map(|(index, (option, bound))| (option.to_string(), (index, *bound)))
            .collect();
        TokenMatcher::new(options, commands.iter().map(|c| c.to_string()).collect())
    }

    fn values(tokens: &[String], start: usize) -> Vec<OffsetValue> {
        tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (start + i, token.clone()))
            .collect()
    }

    #[rstest]
    #[case(Nargs::Precisely(2), Bound::Range(2, 2))]
    #[case(Nargs::Optional, Bound::Range(0, 1))]
    #[case(Nargs::Any, Bound::Lower(0))]
    #[case(Nargs::AtLeastOne, Bound::Lower(1))]
    fn bound_from(#[case] nargs: Nargs, #[case] expected: Bound) {
        assert_eq!(Bound::from(nargs), expected);
    }

    #[rstest]
    #[case(Bound::Lower(0), 0, true)]
    #[case(Bound::Lower(0), 1, true)]
    #[case(Bound::Lower(1), 0, false)]
    #[case(Bound::Lower(1), 1, true)]
    #[case(Bound::Lower(1), 2, true)]
    #[case(Bound::Lower(10), 2, false)]
    #[case(Bound::Range(0, 2), 0, true)]
    #[case(Bound::Range(0, 2), 1, true)]
    #[case(Bound::Range(1, 2), 0, false)]
    #[case(Bound::Range(1, 2), 1, true)]
    #[case(Bound::Range(1, 2), 2, true)]
    #[case(Bound::Range(10, 20), 2, false)]
    fn match_buffer_lower(#[case] bound: Bound, #[case] feed: u8, #[case] expected_ok: bool) {
        let lower = match &bound {
            &Bound::Range(lower, _) => lower,
            &Bound::Lower(lower) => lower,
        };
        let remains_open = match &bound {
            &Bound::Range(_, upper) => upper > feed,
            _ => true,
        };
        let mut pb = MatchBuffer::new(0, "--name", bound);
        assert!(pb.is_open());
        let tokens: Vec<(usize, String)> = (0..feed)
            .map(|i| (thread_rng().gen(), i.to_string()))
            .collect();

        for (offset, token) in &tokens {
            pb.push(*offset, token.clone());
        }

        assert_eq!(pb.is_open(), remains_open);

        if expected_ok {
            assert!(pb.can_close());
            assert_eq!(
                pb.close().unwrap(),
                MatchTokens {
                    index: 0,
                    option: "--name".to_string(),
                    values: tokens,
                }
            );
        } else {
            assert!(!pb.can_close());
            assert_eq!(
                pb.close().unwrap_err(),
                MatchError::TooFewValues {
                    option: "--name".to_string(),
                    provided: feed as usize,
                    expected: lower,
                }
            );
        }
    }

    #[rstest]
    #[case(Bound::Range(0, 0), 1)]
    #[case(Bound::Range(0, 1), 2)]
    #[case(Bound::Range(0, 10), 20)]
    fn match_buffer_upper(#[case] bound: Bound, #[case] feed: u8) {
        let upper = match &bound {
            &Bound::Range(_, upper) => upper,
            _ => unreachable!("un-planned test case"),
        };
        let mut pb = MatchBuffer::new(0, "--name", bound);

        for i in 0..feed {
            pb.push(i as usize, i.to_string());
        }

        assert!(!pb.is_open());
        assert!(pb.can_close());
        assert_eq!(
            pb.close().unwrap_err(),
            MatchError::TooManyValues {
                option: "--name".to_string(),
                provided: feed as usize,
                expected: upper,
            }
        );
    }

    #[test]
    fn match_buffer_random() {
        for _ in 0..100 {
            let bound: Bound = thread_rng().gen();
            let pb = MatchBuffer::new(0, "--name", bound);
            let lower = match bound {
                Bound::Range(lower, _) => lower,
                Bound::Lower(lower) => lower,
            };
            assert_eq!(pb.can_close(), lower == 0);
        }
    }

    #[rstest]
    #[case(Bound::Range(1, 1), 1)]
    #[case(Bound::Range(2, 2), 2)]
    #[case(Bound::Lower(0), 0)]
    #[case(Bound::Lower(0), 5)]
    #[case(Bound::Lower(1), 3)]
    fn option_values(#[case] bound: Bound, #[case] feed: u8) {
        // Setup
        let mut tm = matcher(&[("--initial", bound)], &[]);
        let tokens: Vec<String> = (0..feed).map(|i| i.to_string()).collect();

        // Execute
        assert_eq!(tm.feed(0, "--initial").unwrap(), Feed::Consumed);
        for (i, token) in tokens.iter().enumerate() {
            assert_eq!(tm.feed(i + 1, token).unwrap(), Feed::Consumed);
        }

        // Verify
        assert_eq!(
            tm.close().unwrap(),
            vec![MatchTokens {
                index: 0,
                option: "--initial".to_string(),
                values: values(&tokens, 1),
            }]
        );
    }

    #[test]
    fn option_too_few() {
        let mut tm = matcher(&[("--pair", Bound::Range(2, 2))], &[]);
        tm.feed(0, "--pair").unwrap();
        tm.feed(1, "a").unwrap();

        assert_eq!(
            tm.close().unwrap_err(),
            MatchError::TooFewValues {
                option: "--pair".to_string(),
                provided: 1,
                expected: 2,
            }
        );
    }

    #[test]
    fn option_equals() {
        let mut tm = matcher(&[("--count", Bound::Range(1, 1))], &[]);
        tm.feed(0, "--count=3").unwrap();

        assert_eq!(
            tm.close().unwrap(),
            vec![MatchTokens {
                index: 0,
                option: "--count".to_string(),
                values: vec![(0, "3".to_string())],
            }]
        );
    }

    #[test]
    fn option_unmatched() {
        let mut tm = matcher(&[("--verbose", Bound::Lower(0))], &[]);
        assert_eq!(
            tm.feed(0, "--moot"),
            Err(MatchError::UnrecognizedOption("--moot".to_string()))
        );
    }

    #[test]
    fn option_repeat() {
        let mut tm = matcher(&[("-v", Bound::Range(0, 0)), ("--verbose", Bound::Range(0, 0))], &[]);
        tm.feed(0, "-v").unwrap();
        tm.feed(1, "--verbose").unwrap();
        tm.feed(2, "-v").unwrap();

        let matches = tm.close().unwrap();
        assert_eq!(matches.len(), 3);
        assert_eq!(
            matches.iter().map(|m| m.option.as_str()).collect::<Vec<&str>>(),
            vec!["-v", "--verbose", "-v"]
        );
    }

    #[rstest]
    #[case("-1")]
    #[case("-2.5")]
    #[case("-")]
    fn negative_and_dash_values(#[case] token: &str) {
        let mut tm = matcher(&[("--x", Bound::Range(1, 1))], &[]);
        tm.feed(0, "--x").unwrap();
        tm.feed(1, token).unwrap();

        assert_eq!(tm.close().unwrap()[0].values, vec![(1, token.to_string())]);
    }

    #[test]
    fn terminator() {
        let mut tm = matcher(&[("--names", Bound::Lower(0))], &[]);
        tm.feed(0, "--names").unwrap();
        tm.feed(1, "--").unwrap();
        tm.feed(2, "--not-an-option").unwrap();

        assert_eq!(
            tm.close().unwrap()[0].values,
            vec![(2, "--not-an-option".to_string())]
        );
    }

    #[test]
    fn unexpected_argument() {
        let mut tm = matcher(&[("--x", Bound::Range(1, 1))], &[]);
        tm.feed(0, "--x").unwrap();
        tm.feed(1, "1").unwrap();

        assert_eq!(
            tm.feed(2, "2"),
            Err(MatchError::UnexpectedArgument("2".to_string()))
        );
    }

    #[test]
    fn dispatch() {
        let mut tm = matcher(&[("--x", Bound::Range(1, 1))], &["train"]);
        tm.feed(0, "--x").unwrap();
        tm.feed(1, "1").unwrap();

        assert_eq!(tm.feed(2, "train").unwrap(), Feed::Dispatch);
        assert!(tm.matched(0));
        assert!(!tm.matched(1));
        assert_eq!(tm.close().unwrap().len(), 1);
    }

    #[test]
    fn dispatch_ends_greedy_option() {
        let mut tm = matcher(&[("--values", Bound::Lower(1))], &["train"]);
        tm.feed(0, "--values").unwrap();
        tm.feed(1, "train").unwrap();
        assert_eq!(tm.feed(2, "1").unwrap(), Feed::Consumed);
        assert_eq!(tm.feed(3, "train").unwrap(), Feed::Dispatch);

        assert_eq!(
            tm.close().unwrap()[0].values,
            vec![(1, "train".to_string()), (2, "1".to_string())]
        );
    }

    #[test]
    fn equals_after_pending_option() {
        let mut tm = matcher(&[("--a", Bound::Lower(0)), ("--b", Bound::Range(1, 1))], &[]);
        tm.feed(0, "--a").unwrap();
        tm.feed(1, "--b=2").unwrap();

        let options: Vec<String> = tm.close().unwrap().into_iter().map(|m| m.option).collect();
        assert_eq!(options, vec!["--a".to_string(), "--b".to_string()]);
    }

    #[test]
    fn empty_input() {
        let mut tm = matcher(&[("--x", Bound::Range(1, 1))], &[]);
        let tokens: &[&str] = &[];
        for (offset, token) in tokens.iter().enumerate() {
            tm.feed(offset, token).unwrap();
        }
        assert_eq!(tm.close().unwrap(), vec![]);
    }
}
