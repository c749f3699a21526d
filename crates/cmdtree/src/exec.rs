//! Lifecycle execution: flag hooks, then Before (root to leaf), Action on the
//! selected command, After (leaf to root) for every command that was entered.

use std::cell::RefCell;
use std::io::{self, Write};

use crate::args::Args;
use crate::command::{Command, Hook};
use crate::error::{Error, Result};
use crate::parse::{FlagView, Resolution};

/// Output stream shared by the hooks of one run.
pub(crate) trait Sink {
    fn emit(&self, text: &str) -> io::Result<()>;
}

impl<W: Write> Sink for RefCell<W> {
    fn emit(&self, text: &str) -> io::Result<()> {
        self.borrow_mut().write_all(text.as_bytes())
    }
}

/// What a hook sees: the command it belongs to plus the whole resolution.
pub struct Context<'a> {
    resolution: &'a Resolution<'a>,
    depth: usize,
    out: &'a dyn Sink,
}

impl<'a> Context<'a> {
    pub(crate) fn new(resolution: &'a Resolution<'a>, depth: usize, out: &'a dyn Sink) -> Self {
        Self {
            resolution,
            depth,
            out,
        }
    }

    /// The command this hook is attached to.
    pub fn command(&self) -> &'a Command {
        self.resolution.path()[self.depth]
    }

    /// Depth of [`Context::command`] on the path (root = 0).
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn resolution(&self) -> &'a Resolution<'a> {
        self.resolution
    }

    /// The selected (deepest) command.
    pub fn leaf(&self) -> &'a Command {
        self.resolution.leaf()
    }

    /// Positionals of this command: scanned args for the leaf, defaults otherwise.
    pub fn args(&self) -> &'a Args {
        self.resolution
            .args_at(self.depth)
            .unwrap_or_else(|| self.resolution.args())
    }

    /// Flag visible from this command (its own first, then ancestors).
    pub fn flag(&self, name: &str) -> Option<FlagView<'a>> {
        self.resolution.flag_at(self.depth, name)
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

    pub fn string(&self, name: &str) -> Option<&'a str> {
        self.flag(name).and_then(|f| f.value().as_str())
    }

    pub fn print(&self, text: impl AsRef<str>) -> anyhow::Result<()> {
        self.out.emit(text.as_ref())?;
        Ok(())
    }

    pub fn println(&self, text: impl AsRef<str>) -> anyhow::Result<()> {
        self.out.emit(text.as_ref())?;
        self.out.emit("\n")?;
        Ok(())
    }
}

fn call(hook: &Hook, resolution: &Resolution<'_>, depth: usize, out: &dyn Sink) -> Result<()> {
    let ctx = Context::new(resolution, depth, out);
    hook(&ctx).map_err(Error::from_hook)
}

/// Commands whose Before succeeded. Dropping the scope runs their After hooks
/// in reverse order, so every exit path releases what was entered.
struct Scope<'r, 'a> {
    resolution: &'r Resolution<'a>,
    out: &'r dyn Sink,
    entered: Vec<usize>,
}

impl<'r, 'a> Scope<'r, 'a> {
    fn new(resolution: &'r Resolution<'a>, out: &'r dyn Sink) -> Self {
        Self {
            resolution,
            out,
            entered: Vec::new(),
        }
    }

    fn enter(&mut self, depth: usize) -> Result<()> {
        let cmd = self.resolution.path()[depth];
        if let Some(before) = cmd.before_hook() {
            tracing::debug!(command = cmd.name(), "before");
            call(before, self.resolution, depth, self.out)?;
        }
        self.entered.push(depth);
        Ok(())
    }

    /// Run After hooks leaf to root; returns the first error.
    fn release(&mut self) -> Result<()> {
        let mut first: Option<Error> = None;
        while let Some(depth) = self.entered.pop() {
            let cmd = self.resolution.path()[depth];
            let Some(after) = cmd.after_hook() else {
                continue;
            };
            tracing::debug!(command = cmd.name(), "after");
            if let Err(err) = call(after, self.resolution, depth, self.out) {
                if first.is_none() {
                    first = Some(err);
                } else {
                    tracing::warn!(command = cmd.name(), error = %err, "after hook failed");
                }
            }
        }
        first.map_or(Ok(()), Err)
    }
}

impl Drop for Scope<'_, '_> {
    fn drop(&mut self) {
        if self.entered.is_empty() || std::thread::panicking() {
            return;
        }
        if let Err(err) = self.release() {
            tracing::warn!(error = %err, "after hook failed during unwind");
        }
    }
}

/// Run the lifecycle for a successful parse.
///
/// Returns the Action error if there is one, otherwise the first After error.
/// A failing Before stops forward progress; already entered commands are still
/// released and the Before error is returned.
pub fn execute(resolution: &Resolution<'_>, out: &mut dyn Write) -> Result<()> {
    let sink = RefCell::new(out);
    run(resolution, &sink)
}

pub(crate) fn run(resolution: &Resolution<'_>, out: &dyn Sink) -> Result<()> {
    for matched in resolution.matched() {
        if let Some(hook) = matched.flag().hook() {
            tracing::debug!(flag = matched.flag().name(), "flag hook");
            call(hook, resolution, matched.depth(), out)?;
        }
    }

    let mut scope = Scope::new(resolution, out);
    for depth in 0..resolution.path().len() {
        // Dropping `scope` on the error path releases entered commands.
        scope.enter(depth)?;
    }

    let leaf = resolution.leaf();
    let result = match leaf.action_hook() {
        Some(action) => {
            tracing::debug!(command = leaf.name(), "action");
            call(action, resolution, resolution.depth(), out)
        }
        None => Ok(()),
    };

    let released = scope.release();
    result.and(released)
}
