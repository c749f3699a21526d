//! Command-tree dispatch and flag resolution.
//!
//! A program declares a tree of [`Command`]s, each with its own [`Flag`]s,
//! lifecycle hooks and child commands. One scan over the argument vector
//! selects the command path, binds flag values (command line, then environment,
//! then default) and collects positionals into a [`Resolution`]. Execution then
//! runs flag hooks, Before hooks root to leaf, the leaf's Action and After hooks
//! leaf to root. The same tree answers completion queries.
//!
//! ```
//! use cmdtree::{App, Command, Flag};
//!
//! let app = App::new(
//!     Command::new("app").command(
//!         Command::new(["greet", "g"])
//!             .flag(Flag::new(["name", "n"], "world", "who to greet"))
//!             .action(|ctx| ctx.println(format!("hello {}", ctx.string("name").unwrap_or_default()))),
//!     ),
//! )
//! .with_help();
//!
//! let argv: Vec<String> = ["app", "g", "-n", "moon"].iter().map(|s| s.to_string()).collect();
//! let mut out = Vec::new();
//! let mut diag = Vec::new();
//! app.run_with_env(&argv, &[], &mut out, &mut diag).unwrap();
//! assert_eq!(out, b"hello moon\n");
//! ```

pub mod app;
pub mod args;
pub mod command;
pub mod complete;
pub mod error;
pub mod exec;
pub mod flag;
pub mod help;
pub mod meta;
pub mod parse;

pub use app::{App, COMPLETE_FLAG};
pub use args::Args;
pub use command::{Command, CompletionHook, Hook};
pub use complete::{Completion, alternatives, complete, no_arguments};
pub use error::{Error, ExitNow, Result, exit_code};
pub use exec::{Context, execute};
pub use flag::{Flag, FlagHook, FlagKind, FlagValue, Names};
pub use meta::{CommandMeta, FlagMeta};
pub use parse::{FlagView, Resolution, parse};
