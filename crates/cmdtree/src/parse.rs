//! Single-pass argument scanning.
//!
//! The scanner walks the argument vector once, left to right:
//! - `-` is always a positional
//! - `--` ends flag parsing, everything after it is positional
//! - any other token starting with `-` is a flag, resolved innermost-command-first
//! - a plain token descends into a matching child while no positional has been
//!   seen yet, otherwise it becomes a positional
//!
//! The result is a [`Resolution`]: the definition tree is never mutated.

use indexmap::IndexMap;

use crate::args::Args;
use crate::command::Command;
use crate::error::Result;
use crate::flag::{self, Flag, FlagKind, FlagValue};

/// Identity of a flag within one resolution: declaring depth and index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FlagKey {
    pub depth: usize,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FlagState {
    pub value: FlagValue,
    pub explicit: bool,
}

/// How the scanner treats a value flag with nothing left to consume.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Strict,
    Lookahead,
}

pub(crate) struct Scanner<'t> {
    mode: Mode,
    path: Vec<&'t Command>,
    states: IndexMap<FlagKey, FlagState>,
    matched: Vec<FlagKey>,
    positionals: Args,
    separator: bool,
    /// Lookahead only: flag still waiting for its value.
    pub pending: Option<FlagKey>,
}

impl<'t> Scanner<'t> {
    pub fn new(root: &'t Command, mode: Mode) -> Self {
        Self {
            mode,
            path: vec![root],
            states: IndexMap::new(),
            matched: Vec::new(),
            positionals: Args::new(),
            separator: false,
            pending: None,
        }
    }

    pub fn path(&self) -> &[&'t Command] {
        &self.path
    }

    pub fn current(&self) -> &'t Command {
        self.path[self.path.len() - 1]
    }

    pub fn positionals(&self) -> &Args {
        &self.positionals
    }

    /// Whether `--` has been seen: every later token is positional.
    pub fn separated(&self) -> bool {
        self.separator
    }

    /// Whether a plain token could still select a subcommand.
    pub fn can_descend(&self) -> bool {
        !self.separator && self.positionals.is_empty()
    }

    pub fn is_set(&self, key: FlagKey) -> bool {
        self.states.get(&key).is_some_and(|s| s.explicit)
    }

    pub fn flag_at(&self, key: FlagKey) -> &'t Flag {
        &self.path[key.depth].flags()[key.index]
    }

    /// Scan `tokens` (program name already removed).
    pub fn feed(&mut self, tokens: &[String]) -> Result<()> {
        let mut iter = tokens.iter();
        while let Some(token) = iter.next() {
            tracing::trace!(token = %token, "scan");

            if self.separator || token == "-" {
                self.positionals.push(token.as_str());
                continue;
            }

            if token == "--" {
                self.separator = true;
                continue;
            }

            if token.starts_with('-') {
                let found = flag::resolve(token, &self.path)?;
                let key = FlagKey {
                    depth: found.depth,
                    index: found.index,
                };
                let (_, inline) = flag::split_token(token);
                let value = match (found.flag.kind(), inline) {
                    (FlagKind::Bool, None) => FlagValue::Bool(true),
                    (_, Some(raw)) => found.flag.coerce(raw)?,
                    (_, None) => match iter.next() {
                        Some(raw) => found.flag.coerce(raw)?,
                        None if self.mode == Mode::Lookahead => {
                            self.pending = Some(key);
                            return Ok(());
                        }
                        None => {
                            return Err(found.flag.invalid("", "value expected".to_string()));
                        }
                    },
                };
                tracing::debug!(
                    flag = found.flag.name(),
                    command = self.path[found.depth].name(),
                    value = %value,
                    "flag matched"
                );
                self.states.insert(
                    key,
                    FlagState {
                        value,
                        explicit: true,
                    },
                );
                self.matched.push(key);
                continue;
            }

            if self.positionals.is_empty() {
                if let Some(child) = self.current().child(token) {
                    tracing::debug!(command = child.name(), "descend");
                    self.path.push(child);
                    continue;
                }
            }
            self.positionals.push(token.as_str());
        }
        Ok(())
    }

    /// Apply environment values and produce the resolution.
    pub fn finish(mut self, env: &[(String, String)]) -> Result<Resolution<'t>> {
        for (depth, cmd) in self.path.iter().enumerate() {
            for (index, flag) in cmd.flags().iter().enumerate() {
                let key = FlagKey { depth, index };
                if self.states.contains_key(&key) {
                    continue;
                }
                let Some(var) = flag.env_var() else {
                    continue;
                };
                let Some(raw) = env_lookup(env, var) else {
                    continue;
                };
                let value = flag.coerce(raw)?;
                self.states.insert(
                    key,
                    FlagState {
                        value,
                        explicit: false,
                    },
                );
            }
        }

        let resolution = Resolution {
            path: self.path,
            states: self.states,
            matched: self.matched,
            args: self.positionals,
        };
        tracing::debug!(
            path = %resolution.command_path(),
            args = ?resolution.args(),
            "resolved"
        );
        Ok(resolution)
    }
}

fn env_lookup<'e>(env: &'e [(String, String)], key: &str) -> Option<&'e str> {
    env.iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Parse `argv` (first element is the program name) against `root`.
///
/// The tree is validated first, so duplicate names fail here rather than
/// resolving to whichever declaration comes first.
pub fn parse<'t>(
    root: &'t Command,
    argv: &[String],
    env: &[(String, String)],
) -> Result<Resolution<'t>> {
    root.validate()?;
    let mut scanner = Scanner::new(root, Mode::Strict);
    scanner.feed(argv.get(1..).unwrap_or_default())?;
    scanner.finish(env)
}

/// Outcome of one parse: the selected path with its flag values and args.
#[derive(Debug, Clone)]
pub struct Resolution<'t> {
    path: Vec<&'t Command>,
    states: IndexMap<FlagKey, FlagState>,
    matched: Vec<FlagKey>,
    args: Args,
}

/// A flag as seen from a resolution.
#[derive(Debug, Clone, Copy)]
pub struct FlagView<'r> {
    flag: &'r Flag,
    value: &'r FlagValue,
    explicit: bool,
    depth: usize,
}

impl<'r> FlagView<'r> {
    pub fn flag(&self) -> &'r Flag {
        self.flag
    }

    /// Effective value: command line, then environment, then default.
    pub fn value(&self) -> &'r FlagValue {
        self.value
    }

    /// Whether the flag was given on the command line.
    pub fn is_set(&self) -> bool {
        self.explicit
    }

    /// Depth of the declaring command on the path.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl<'t> Resolution<'t> {
    /// Commands from the root to the selected one.
    pub fn path(&self) -> &[&'t Command] {
        &self.path
    }

    pub fn leaf(&self) -> &'t Command {
        self.path[self.path.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.path.len() - 1
    }

    /// Canonical names of the path joined by spaces.
    pub fn command_path(&self) -> String {
        flag::chain_path(&self.path)
    }

    /// Positionals bound to the selected command.
    pub fn args(&self) -> &Args {
        &self.args
    }

    /// Args for the command at `depth`: the selected command gets the scanned
    /// positionals, ancestors keep their declared defaults. `None` past the leaf.
    pub fn args_at(&self, depth: usize) -> Option<&Args> {
        if depth == self.depth() {
            Some(&self.args)
        } else {
            self.path.get(depth).map(|c| c.args())
        }
    }

    /// Flag visible from the selected command.
    pub fn flag(&self, name: &str) -> Option<FlagView<'_>> {
        self.flag_at(self.depth(), name)
    }

    /// Flag visible from the command at `depth` (searching outward).
    pub fn flag_at(&self, depth: usize, name: &str) -> Option<FlagView<'_>> {
        let chain = self.path.get(..=depth)?;
        let found = flag::lookup(chain, name)?;
        Some(self.view(FlagKey {
            depth: found.depth,
            index: found.index,
        }))
    }

    pub fn is_set(&self, name: &str) -> bool {
        self.flag(name).is_some_and(|f| f.is_set())
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.flag(name).and_then(|f| f.value().as_bool())
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.flag(name).and_then(|f| f.value().as_int())
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.flag(name).and_then(|f| f.value().as_str())
    }

    /// Every flag match, in command-line order.
    pub(crate) fn matched(&self) -> impl Iterator<Item = FlagView<'_>> + '_ {
        self.matched.iter().map(|key| self.view(*key))
    }

    fn view(&self, key: FlagKey) -> FlagView<'_> {
        let flag = &self.path[key.depth].flags()[key.index];
        match self.states.get(&key) {
            Some(state) => FlagView {
                flag,
                value: &state.value,
                explicit: state.explicit,
                depth: key.depth,
            },
            None => FlagView {
                flag,
                value: flag.default_value(),
                explicit: false,
                depth: key.depth,
            },
        }
    }
}
