//! Application entry: validation, the built-in help surface, completion
//! requests and error reporting around parse + execute.

use std::io::{self, Write};

use anyhow::bail;

use crate::command::Command;
use crate::complete::{self, Completion};
use crate::error::{Error, ExitNow, Result};
use crate::exec::{self, Context};
use crate::flag::Flag;
use crate::help;
use crate::parse::{self, Mode, Resolution, Scanner};

/// Hidden root flag that turns an invocation into a completion request:
/// `prog --_complete <words>...`.
pub const COMPLETE_FLAG: &str = "_complete";

pub struct App {
    root: Command,
    help: bool,
    completion: bool,
}

impl App {
    pub fn new(root: Command) -> Self {
        Self {
            root,
            help: false,
            completion: false,
        }
    }

    /// Add a `--help, -h` flag to the root and a `help [COMMAND]...` command.
    ///
    /// The flag is inherited by every command that does not declare its own
    /// `help`/`h` flag.
    pub fn with_help(mut self) -> Self {
        self.root.push_flag(
            Flag::new(["help", "h"], false, "Print help").on_match(|ctx: &Context<'_>| {
                ctx.print(help::render(ctx.resolution().path()))?;
                Err(ExitNow.into())
            }),
        );
        self.root.push_command(
            Command::new("help")
                .description("Print help for a command")
                .action(help_command)
                .completion(help_completion),
        );
        self.help = true;
        self
    }

    /// Accept `--_complete <words>...` as a completion request.
    pub fn with_completion(mut self) -> Self {
        self.root
            .push_flag(Flag::new(COMPLETE_FLAG, false, "Print completion candidates").hidden());
        self.completion = true;
        self
    }

    pub fn root(&self) -> &Command {
        &self.root
    }

    pub fn parse(&self, argv: &[String], env: &[(String, String)]) -> Result<Resolution<'_>> {
        parse::parse(&self.root, argv, env)
    }

    /// Candidates for the last of `words` (program name excluded).
    pub fn complete(&self, words: &[String]) -> Result<Vec<String>> {
        complete::complete(&self.root, words)
    }

    /// Run against the process environment.
    pub fn run(&self, argv: &[String], out: &mut dyn Write, diag: &mut dyn Write) -> Result<()> {
        let env: Vec<(String, String)> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        self.run_with_env(argv, &env, out, diag)
    }

    /// Parse and execute `argv`, reporting failures on `diag`.
    pub fn run_with_env(
        &self,
        argv: &[String],
        env: &[(String, String)],
        out: &mut dyn Write,
        diag: &mut dyn Write,
    ) -> Result<()> {
        let result = self.dispatch(argv, env, out);
        if let Err(err) = &result
            && !err.is_exit()
        {
            if let Err(io_err) = self.report(err, argv, diag) {
                tracing::warn!(error = %io_err, "failed to report error");
            }
        }
        result
    }

    fn dispatch(&self, argv: &[String], env: &[(String, String)], out: &mut dyn Write) -> Result<()> {
        if self.completion
            && argv
                .get(1)
                .is_some_and(|a| a.strip_prefix("--") == Some(COMPLETE_FLAG))
        {
            let words = argv.get(2..).unwrap_or_default();
            let candidates = complete::complete(&self.root, words)?;
            tracing::debug!(count = candidates.len(), "completion");
            for candidate in candidates {
                writeln!(out, "{candidate}")?;
            }
            return Ok(());
        }

        let resolution = parse::parse(&self.root, argv, env)?;
        exec::execute(&resolution, out)?;
        out.flush()?;
        Ok(())
    }

    fn report(&self, err: &Error, argv: &[String], diag: &mut dyn Write) -> io::Result<()> {
        writeln!(diag, "error: {err}")?;
        if err.is_usage() {
            let path = reached(&self.root, argv);
            writeln!(diag)?;
            writeln!(diag, "{}", help::usage(&path))?;
            if self.help {
                writeln!(diag)?;
                writeln!(diag, "For more information, try '--help'.")?;
            }
        }
        diag.flush()
    }
}

/// Commands selected by `argv` up to the point where scanning stopped, for the
/// usage line of an error report.
fn reached<'t>(root: &'t Command, argv: &[String]) -> Vec<&'t Command> {
    let mut scanner = Scanner::new(root, Mode::Lookahead);
    // The error itself is already known; only the path matters here.
    let _ = scanner.feed(argv.get(1..).unwrap_or_default());
    scanner.path().to_vec()
}

fn help_command(ctx: &Context<'_>) -> anyhow::Result<()> {
    let root = ctx.resolution().path()[0];
    let mut path = vec![root];
    for name in ctx.args() {
        match path[path.len() - 1].child(name) {
            Some(child) => path.push(child),
            None => bail!(
                "unknown command '{name}' (command: {})",
                path.iter().map(|c| c.name()).collect::<Vec<_>>().join(" ")
            ),
        }
    }
    ctx.print(help::render(&path))
}

fn help_completion(c: &Completion<'_>) -> anyhow::Result<Vec<String>> {
    let root = c.path()[0];
    let named: &[String] = c.args();
    let Some(target) = root.find(named) else {
        return Ok(Vec::new());
    };
    Ok(target
        .children()
        .iter()
        .filter(|child| !child.is_hidden())
        .flat_map(|child| child.names().iter().cloned())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::exit_code;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn app() -> App {
        App::new(
            Command::new("app")
                .description("demo app")
                .command(
                    Command::new(["random", "rnd"])
                        .description("print a number")
                        .flag(Flag::new("max", 100, "upper bound"))
                        .action(|ctx| ctx.println(ctx.int("max").unwrap_or_default().to_string())),
                )
                .command(
                    Command::new("secret")
                        .hidden()
                        .flag(Flag::new(["help", "h"], false, ""))
                        .action(|ctx| ctx.println(format!("help={:?}", ctx.bool("help")))),
                ),
        )
        .with_help()
        .with_completion()
    }

    fn run(app: &App, items: &[&str]) -> (Result<()>, String, String) {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let result = app.run_with_env(&argv(items), &[], &mut out, &mut diag);
        (
            result,
            String::from_utf8(out).unwrap(),
            String::from_utf8(diag).unwrap(),
        )
    }

    #[test]
    fn runs_selected_action() {
        let (result, out, diag) = run(&app(), &["app", "rnd", "--max=7"]);
        result.unwrap();
        assert_eq!(out, "7\n");
        assert!(diag.is_empty());
    }

    #[test]
    fn help_flag_prints_leaf_help_and_exits_cleanly() {
        let (result, out, diag) = run(&app(), &["app", "random", "-h"]);
        let err = result.unwrap_err();
        assert!(err.is_exit());
        assert_eq!(exit_code(&Err(err)), 0);
        assert!(out.starts_with("random - print a number\n"));
        assert!(out.contains("--max <INT>"));
        assert!(out.contains("Global options:"));
        assert!(diag.is_empty());
    }

    #[test]
    fn shadowed_help_flag_is_a_plain_flag() {
        let (result, out, _) = run(&app(), &["app", "secret", "--help"]);
        result.unwrap();
        assert_eq!(out, "help=Some(true)\n");
    }

    #[test]
    fn help_command_walks_its_args() {
        let (result, out, _) = run(&app(), &["app", "help", "rnd"]);
        result.unwrap();
        assert!(out.starts_with("random - print a number\n"));

        let (result, _, diag) = run(&app(), &["app", "help", "nope"]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::Hook(_)));
        assert_eq!(err.exit_code(), 1);
        assert!(diag.starts_with("error: unknown command 'nope'"));
    }

    #[test]
    fn parse_errors_are_reported_with_usage() {
        let (result, out, diag) = run(&app(), &["app", "random", "--nope"]);
        let err = result.unwrap_err();
        assert!(matches!(err, Error::NoSuchFlag { .. }));
        assert_eq!(err.exit_code(), 2);
        assert!(out.is_empty());
        assert!(diag.starts_with("error: no such flag: --nope (command: app random)\n"));
        assert!(diag.contains("Usage: app random [OPTIONS] [ARGS]..."));
        assert!(diag.contains("try '--help'"));
    }

    #[test]
    fn usage_follows_flag_values_not_command_names() {
        let app = App::new(
            Command::new("app")
                .flag(Flag::new("name", "world", ""))
                .command(Command::new("greeting").command(Command::new("hello"))),
        )
        .with_help();

        let (result, _, diag) = run(&app, &["app", "--name", "greeting", "--bogus"]);
        assert!(matches!(result.unwrap_err(), Error::NoSuchFlag { .. }));
        assert!(diag.contains("(command: app)"));
        assert!(diag.contains("Usage: app [OPTIONS] [COMMAND] [ARGS]..."), "{diag}");

        let (_, _, diag) = run(&app, &["app", "greeting", "--name=x", "hello", "--bogus"]);
        assert!(diag.contains("Usage: app greeting hello [OPTIONS] [ARGS]..."), "{diag}");
    }

    #[test]
    fn build_errors_surface_before_parsing() {
        let app = App::new(Command::new("app").flag(Flag::new(["help", "h"], false, ""))).with_help();
        let (result, _, _) = run(&app, &["app"]);
        assert!(matches!(result.unwrap_err(), Error::DuplicateFlag { .. }));
    }

    #[test]
    fn completion_request_prints_candidates() {
        let (result, out, _) = run(&app(), &["app", "--_complete", "r"]);
        result.unwrap();
        assert_eq!(out, "random\nrnd\n");

        let (result, out, _) = run(&app(), &["app", "--_complete", "help", ""]);
        result.unwrap();
        assert_eq!(out, "random\nrnd\nhelp\n");

        let (result, out, _) = run(&app(), &["app", "--_complete", "--"]);
        result.unwrap();
        assert!(!out.contains("--_complete"));
        assert!(out.contains("--help"));
    }
}
