//! Flag declarations, value coercion and chain resolution.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::command::{Command, CompletionHook};
use crate::complete::Completion;
use crate::error::{Error, Result};
use crate::exec::Context;

/// Hook fired when a flag is matched on the command line.
pub type FlagHook = Arc<dyn Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Name list for a command or a flag: the first entry is the canonical name.
///
/// Accepts a single name or multiple names via array/slice/vec.
pub trait Names {
    fn into_names(self) -> Vec<String>;
}

impl Names for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Names for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl Names for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> Names for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl Names for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlagKind {
    Bool,
    Int,
    String,
}

impl FlagKind {
    /// Placeholder shown next to value-taking flags.
    pub fn placeholder(self) -> &'static str {
        match self {
            Self::Bool => "",
            Self::Int => "<INT>",
            Self::String => "<STRING>",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Int(i64),
    String(String),
}

impl FlagValue {
    pub fn kind(&self) -> FlagKind {
        match self {
            Self::Bool(_) => FlagKind::Bool,
            Self::Int(_) => FlagKind::Int,
            Self::String(_) => FlagKind::String,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(n) => write!(f, "{n}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for FlagValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for FlagValue {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for FlagValue {
    fn from(n: i32) -> Self {
        Self::Int(n.into())
    }
}

impl From<&str> for FlagValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FlagValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

/// A typed, possibly aliased option attached to a command.
///
/// The kind of the default value decides how values are coerced:
///
/// ```
/// use cmdtree::{Flag, FlagValue};
///
/// let flag = Flag::new(["max", "M"], 100, "upper bound");
/// assert_eq!(flag.name(), "max");
/// assert_eq!(flag.coerce("42").unwrap(), FlagValue::Int(42));
/// assert!(flag.coerce("lots").is_err());
/// ```
#[derive(Clone)]
pub struct Flag {
    names: Vec<String>,
    description: String,
    default: FlagValue,
    hidden: bool,
    env: Option<String>,
    choices: Vec<String>,
    hook: Option<FlagHook>,
    completion: Option<CompletionHook>,
}

impl Flag {
    pub fn new(
        names: impl Names,
        default: impl Into<FlagValue>,
        description: impl Into<String>,
    ) -> Self {
        let names = names
            .into_names()
            .into_iter()
            .map(|n| n.trim().trim_start_matches('-').to_string())
            .collect();
        Self {
            names,
            description: description.into(),
            default: default.into(),
            hidden: false,
            env: None,
            choices: Vec::new(),
            hook: None,
            completion: None,
        }
    }

    /// Hide the flag from help and completion.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Read the value from `key` when the flag is not given on the command line.
    pub fn env(mut self, key: impl Into<String>) -> Self {
        self.env = Some(key.into());
        self
    }

    /// Restrict values to `choices`; also used as completion candidates.
    pub fn choices<I, S>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }

    /// Run `hook` each time the flag is matched.
    pub fn on_match<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.hook = Some(Arc::new(hook));
        self
    }

    /// Suggest values for this flag during completion, in place of its choices.
    pub fn completion<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Completion<'_>) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.completion = Some(Arc::new(hook));
        self
    }

    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn aliases(&self) -> &[String] {
        self.names.get(1..).unwrap_or_default()
    }

    /// Canonical name followed by aliases.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn matches(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn default_value(&self) -> &FlagValue {
        &self.default
    }

    pub fn kind(&self) -> FlagKind {
        self.default.kind()
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn env_var(&self) -> Option<&str> {
        self.env.as_deref()
    }

    pub fn choice_list(&self) -> &[String] {
        &self.choices
    }

    pub(crate) fn hook(&self) -> Option<&FlagHook> {
        self.hook.as_ref()
    }

    pub(crate) fn completion_hook(&self) -> Option<&CompletionHook> {
        self.completion.as_ref()
    }

    /// Convert a raw string to a value of this flag's kind.
    pub fn coerce(&self, raw: &str) -> Result<FlagValue> {
        let value = match self.kind() {
            FlagKind::Bool => parse_bool(raw).map(FlagValue::Bool).ok_or_else(|| {
                self.invalid(raw, "expected a boolean (true/false/1/0)".to_string())
            })?,
            FlagKind::Int => raw
                .parse::<i64>()
                .map(FlagValue::Int)
                .map_err(|e| self.invalid(raw, format!("expected an integer: {e}")))?,
            FlagKind::String => FlagValue::String(raw.to_string()),
        };
        if !self.choices.is_empty() && !self.choices.iter().any(|c| c == raw) {
            return Err(self.invalid(
                raw,
                format!("possible values: {}", self.choices.join(", ")),
            ));
        }
        Ok(value)
    }

    pub(crate) fn invalid(&self, raw: &str, reason: String) -> Error {
        Error::InvalidFlagValue {
            flag: self.name().to_string(),
            value: raw.to_string(),
            reason,
        }
    }
}

impl fmt::Debug for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flag")
            .field("names", &self.names)
            .field("default", &self.default)
            .field("hidden", &self.hidden)
            .field("env", &self.env)
            .field("choices", &self.choices)
            .field("hook", &self.hook.is_some())
            .field("completion", &self.completion.is_some())
            .finish()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Render a flag name the way it is typed: `-x` for single characters, `--name` otherwise.
pub fn display_name(name: &str) -> String {
    if name.chars().count() == 1 {
        format!("-{name}")
    } else {
        format!("--{name}")
    }
}

/// Split a flag token into its name and optional inline value.
///
/// `--name=value` => `("name", Some("value"))`, `-n` => `("n", None)`.
pub fn split_token(token: &str) -> (&str, Option<&str>) {
    let stripped = token.trim_start_matches('-');
    match stripped.split_once('=') {
        Some((name, value)) => (name, Some(value)),
        None => (stripped, None),
    }
}

/// A flag found on the active chain.
#[derive(Debug, Clone, Copy)]
pub struct Resolved<'t> {
    /// Depth of the declaring command in the chain (root = 0).
    pub depth: usize,
    /// Index in the declaring command's own flag list.
    pub index: usize,
    pub flag: &'t Flag,
}

/// Flags in scope on `chain` (root first), nearest declaration first.
///
/// A flag sharing any name with a flag declared nearer the leaf is shadowed
/// as a whole, aliases included.
pub(crate) fn in_scope<'t>(chain: &[&'t Command]) -> Vec<Resolved<'t>> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut out = Vec::new();
    for (depth, &cmd) in chain.iter().enumerate().rev() {
        let flags: &'t [Flag] = cmd.flags();
        out.extend(
            flags
                .iter()
                .enumerate()
                .filter(|(_, f)| !f.names().iter().any(|n| seen.contains(n.as_str())))
                .map(|(index, flag)| Resolved { depth, index, flag }),
        );
        seen.extend(flags.iter().flat_map(|f| f.names()).map(String::as_str));
    }
    out
}

/// Look `name` up among the flags in scope on `chain`.
pub(crate) fn lookup<'t>(chain: &[&'t Command], name: &str) -> Option<Resolved<'t>> {
    in_scope(chain).into_iter().find(|r| r.flag.matches(name))
}

/// Resolve a flag token against the active chain (root first).
///
/// The nearest declaration wins. A descendant flag reusing any of an
/// ancestor flag's names hides that ancestor flag under all of its names.
pub fn resolve<'t>(token: &str, chain: &[&'t Command]) -> Result<Resolved<'t>> {
    let (name, _) = split_token(token);
    lookup(chain, name).ok_or_else(|| Error::NoSuchFlag {
        flag: token.split_once('=').map_or(token, |(f, _)| f).to_string(),
        path: chain_path(chain),
    })
}

pub(crate) fn chain_path(chain: &[&Command]) -> String {
    chain
        .iter()
        .map(|c| c.name())
        .collect::<Vec<_>>()
        .join(" ")
}
