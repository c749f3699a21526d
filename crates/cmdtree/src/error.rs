use thiserror::Error;

/// Errors surfaced by the engine.
///
/// Build errors come from [`Command::validate`](crate::Command::validate),
/// parse errors from the dispatcher, `Hook` wraps whatever a user hook returned.
#[derive(Debug, Error)]
pub enum Error {
    #[error("duplicate flag name '{name}' in command '{command}'")]
    DuplicateFlag { command: String, name: String },

    #[error("duplicate command name '{name}' under '{command}'")]
    DuplicateCommand { command: String, name: String },

    #[error("invalid name '{name}' in '{owner}': {reason}")]
    InvalidName {
        owner: String,
        name: String,
        reason: &'static str,
    },

    #[error("no such flag: {flag} (command: {path})")]
    NoSuchFlag { flag: String, path: String },

    #[error("invalid value '{value}' for flag --{flag}: {reason}")]
    InvalidFlagValue {
        flag: String,
        value: String,
        reason: String,
    },

    /// Processing stopped on purpose (help, version, ...). Not a failure.
    #[error("exit requested")]
    Exit,

    #[error(transparent)]
    Hook(anyhow::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn is_exit(&self) -> bool {
        matches!(self, Self::Exit)
    }

    /// Whether the error is caused by the tree definition or the argument vector.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Self::DuplicateFlag { .. }
                | Self::DuplicateCommand { .. }
                | Self::InvalidName { .. }
                | Self::NoSuchFlag { .. }
                | Self::InvalidFlagValue { .. }
        )
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        if self.is_exit() {
            0
        } else if self.is_usage() {
            2
        } else {
            1
        }
    }

    /// Classify an error returned by a hook.
    pub(crate) fn from_hook(err: anyhow::Error) -> Self {
        if err.is::<ExitNow>() {
            return Self::Exit;
        }
        match err.downcast::<Error>() {
            Ok(inner) => inner,
            Err(err) => Self::Hook(err),
        }
    }
}

/// Sentinel a hook returns to stop processing cleanly.
///
/// ```
/// # use cmdtree::ExitNow;
/// fn hook() -> anyhow::Result<()> {
///     Err(ExitNow.into())
/// }
/// assert!(hook().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("exit requested")]
pub struct ExitNow;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Exit code for the result of [`App::run`](crate::App::run).
pub fn exit_code(result: &Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => err.exit_code(),
    }
}
