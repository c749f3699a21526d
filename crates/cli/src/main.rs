mod commands;
mod greeting;

use std::io;

use cmdtree::{App, Command, help};
use tracing_subscriber::{EnvFilter, fmt};

fn app() -> App {
    let root = Command::new("cmdtree-demo")
        .description("Example application built on cmdtree")
        .help_text(
            "Commands may be abbreviated only by their aliases.\n\
             Flags declared on a command are available to all of its subcommands.",
        )
        .flag(commands::version_flag())
        .action(help::action())
        .command(greeting::command())
        .command(commands::random())
        .command(commands::echo())
        .command(commands::choose())
        .command(commands::secret())
        .command(commands::describe());

    App::new(root).with_help().with_completion()
}

fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let argv: Vec<String> = std::env::args_os()
        .map(|a| a.to_string_lossy().into_owned())
        .collect();

    let stdout = io::stdout();
    let stderr = io::stderr();
    let result = app().run(&argv, &mut stdout.lock(), &mut stderr.lock());
    if let Err(err) = &result {
        tracing::debug!(error = %err, "finished with error");
    }
    std::process::exit(cmdtree::exit_code(&result));
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .compact()
        .init();
}
