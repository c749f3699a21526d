//! Command tree declaration.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::args::Args;
use crate::complete::Completion;
use crate::error::{Error, Result};
use crate::exec::Context;
use crate::flag::{Flag, Names};

/// Before/Action/After hook.
pub type Hook = Arc<dyn Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync>;

/// Completion callback: returns candidates for the word being completed.
pub type CompletionHook = Arc<dyn Fn(&Completion<'_>) -> anyhow::Result<Vec<String>> + Send + Sync>;

/// A named, possibly nested unit with its own flags, hooks and positionals.
///
/// ```
/// use cmdtree::{Command, Flag};
///
/// let root = Command::new("app")
///     .flag(Flag::new(["verbose", "v"], false, "print more"))
///     .command(Command::new(["remove", "rm"]).description("remove things"));
///
/// assert_eq!(root.child("rm").map(|c| c.name()), Some("remove"));
/// assert!(root.child("rem").is_none());
/// ```
#[derive(Clone, Default)]
pub struct Command {
    names: Vec<String>,
    description: String,
    help_text: String,
    hidden: bool,
    commands: Vec<Command>,
    flags: Vec<Flag>,
    before: Option<Hook>,
    action: Option<Hook>,
    after: Option<Hook>,
    completion: Option<CompletionHook>,
    default_args: Args,
}

impl Command {
    pub fn new(names: impl Names) -> Self {
        Self {
            names: names
                .into_names()
                .into_iter()
                .map(|n| n.trim().to_string())
                .collect(),
            ..Default::default()
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Long, possibly multi-line help shown by `help`.
    pub fn help_text(mut self, text: impl Into<String>) -> Self {
        self.help_text = text.into();
        self
    }

    /// Hide the command from help and completion. It can still be invoked.
    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn command(mut self, child: Command) -> Self {
        self.commands.push(child);
        self
    }

    pub fn commands<I: IntoIterator<Item = Command>>(mut self, children: I) -> Self {
        self.commands.extend(children);
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn with_flags<I: IntoIterator<Item = Flag>>(mut self, flags: I) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn before<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.before = Some(Arc::new(hook));
        self
    }

    pub fn action<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.action = Some(Arc::new(hook));
        self
    }

    pub fn after<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.after = Some(Arc::new(hook));
        self
    }

    pub fn completion<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Completion<'_>) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        self.completion = Some(Arc::new(hook));
        self
    }

    /// Args reported when this command is on the path but not selected.
    pub fn default_args(mut self, args: impl Into<Args>) -> Self {
        self.default_args = args.into();
        self
    }

    pub fn name(&self) -> &str {
        self.names.first().map(String::as_str).unwrap_or_default()
    }

    pub fn aliases(&self) -> &[String] {
        self.names.get(1..).unwrap_or_default()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn matches(&self, token: &str) -> bool {
        self.names.iter().any(|n| n == token)
    }

    pub fn about(&self) -> &str {
        &self.description
    }

    pub fn help(&self) -> &str {
        &self.help_text
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn children(&self) -> &[Command] {
        &self.commands
    }

    pub fn flags(&self) -> &[Flag] {
        &self.flags
    }

    pub fn args(&self) -> &Args {
        &self.default_args
    }

    /// Direct child whose name or alias equals `token` exactly.
    pub fn child(&self, token: &str) -> Option<&Command> {
        self.commands.iter().find(|c| c.matches(token))
    }

    /// Follow `path` (names or aliases) down from this command.
    pub fn find<S: AsRef<str>>(&self, path: &[S]) -> Option<&Command> {
        path.iter()
            .try_fold(self, |cmd, name| cmd.child(name.as_ref()))
    }

    /// Flag declared on this command itself (ancestors are not searched).
    pub fn own_flag(&self, name: &str) -> Option<&Flag> {
        self.flags.iter().find(|f| f.matches(name))
    }

    pub(crate) fn before_hook(&self) -> Option<&Hook> {
        self.before.as_ref()
    }

    pub(crate) fn action_hook(&self) -> Option<&Hook> {
        self.action.as_ref()
    }

    pub(crate) fn after_hook(&self) -> Option<&Hook> {
        self.after.as_ref()
    }

    pub(crate) fn completion_hook(&self) -> Option<&CompletionHook> {
        self.completion.as_ref()
    }

    pub(crate) fn push_flag(&mut self, flag: Flag) {
        self.flags.push(flag);
    }

    pub(crate) fn push_command(&mut self, child: Command) {
        self.commands.push(child);
    }

    /// Check the tree for build errors: empty or malformed names, duplicate
    /// flag names within one command, duplicate child names among siblings.
    pub fn validate(&self) -> Result<()> {
        self.validate_at(self.name())
    }

    fn validate_at(&self, path: &str) -> Result<()> {
        if self.names.is_empty() {
            return Err(Error::InvalidName {
                owner: path.to_string(),
                name: String::new(),
                reason: "command has no name",
            });
        }
        for name in &self.names {
            check_name(path, name)?;
        }

        let mut flag_names: HashSet<&str> = HashSet::new();
        for flag in &self.flags {
            if flag.names().is_empty() {
                return Err(Error::InvalidName {
                    owner: path.to_string(),
                    name: String::new(),
                    reason: "flag has no name",
                });
            }
            for name in flag.names() {
                check_name(path, name)?;
                if !flag_names.insert(name) {
                    return Err(Error::DuplicateFlag {
                        command: path.to_string(),
                        name: name.clone(),
                    });
                }
            }
        }

        let mut child_names: HashSet<&str> = HashSet::new();
        for child in &self.commands {
            for name in child.names() {
                if !child_names.insert(name) {
                    return Err(Error::DuplicateCommand {
                        command: path.to_string(),
                        name: name.clone(),
                    });
                }
            }
        }

        for child in &self.commands {
            child.validate_at(&format!("{path} {}", child.name()))?;
        }
        Ok(())
    }
}

fn check_name(owner: &str, name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains('=') {
        "name contains '='"
    } else if name.chars().any(char::is_whitespace) {
        "name contains whitespace"
    } else if name.starts_with('-') {
        "name starts with '-'"
    } else {
        return Ok(());
    };
    Err(Error::InvalidName {
        owner: owner.to_string(),
        name: name.to_string(),
        reason,
    })
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("names", &self.names)
            .field("hidden", &self.hidden)
            .field("flags", &self.flags)
            .field("commands", &self.commands)
            .field("default_args", &self.default_args)
            .finish_non_exhaustive()
    }
}
