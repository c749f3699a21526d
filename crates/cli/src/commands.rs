use anyhow::{Context as _, Result, bail};
use cmdtree::{Command, Completion, Context, Flag, alternatives, no_arguments};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const CHOICES: [&str; 3] = ["apple", "orange", "box of candies"];
const PLURALS: [&str; 3] = ["apples", "oranges", "boxes of candies"];

pub fn random() -> Command {
    Command::new(["random", "rnd"])
        .description("Generates a random number")
        .flag(Flag::new(["min", "m"], 0, "lower bound (inclusive)"))
        .flag(Flag::new(["max", "M"], 100, "upper bound (inclusive)"))
        .flag(Flag::new(["seed", "s"], 0, "seed for a reproducible number"))
        .flag(Flag::new(["crypto", "c"], false, "draw from OS randomness (ignores --seed)"))
        .completion(no_arguments())
        .action(|ctx| {
            let min = ctx.int("min").unwrap_or_default();
            let max = ctx.int("max").unwrap_or_default();
            if min > max {
                bail!("--min ({min}) is greater than --max ({max})");
            }
            let n = if ctx.bool("crypto").unwrap_or_default() {
                StdRng::try_from_os_rng()
                    .context("OS randomness is unavailable")?
                    .random_range(min..=max)
            } else if ctx.is_set("seed") {
                let seed = ctx.int("seed").unwrap_or_default();
                StdRng::seed_from_u64(seed as u64).random_range(min..=max)
            } else {
                rand::rng().random_range(min..=max)
            };
            ctx.println(n.to_string())
        })
}

pub fn echo() -> Command {
    Command::new(["echo", "say"])
        .description("Prints its arguments")
        .help_text("Arguments are joined with --sep and printed --times times.")
        .flag(Flag::new(["times", "n"], 1, "how many times to print"))
        .flag(Flag::new(["upper", "u"], false, "convert to upper case"))
        .flag(Flag::new("sep", " ", "argument separator").env("DEMO_SEP"))
        .action(|ctx| {
            let times = ctx.int("times").unwrap_or(1);
            if times < 0 {
                bail!("--times must not be negative, got {times}");
            }
            let mut line = ctx.args().join(ctx.string("sep").unwrap_or(" "));
            if ctx.bool("upper").unwrap_or_default() {
                line = line.to_uppercase();
            }
            for _ in 0..times {
                ctx.println(&line)?;
            }
            Ok(())
        })
}

fn choose_completion(c: &Completion<'_>) -> Result<Vec<String>> {
    if c.args().is_empty() {
        alternatives(CHOICES)(c)
    } else {
        no_arguments()(c)
    }
}

pub fn choose() -> Command {
    Command::new("choose")
        .description("Gives you a choice")
        .completion(choose_completion)
        .action(|ctx| {
            let Some(arg) = ctx.args().first() else {
                return ctx.println("choose something");
            };
            if arg == "left" {
                return ctx.println("Have a good day!");
            }
            match CHOICES.iter().position(|c| *c == arg) {
                Some(i) => ctx.println(format!("Oh! Sorry, there are no more {}", PLURALS[i])),
                None => ctx.println(format!("Sorry, we don't have {arg}")),
            }
        })
}

/// Hidden command; its own `help` flag shadows the global one.
pub fn secret() -> Command {
    Command::new("secret")
        .hidden()
        .description("Shows you a secret")
        .flag(Flag::new(["help", "h"], false, ""))
        .completion(no_arguments())
        .action(|ctx| ctx.println("Congratulations!! You've found a secret!!"))
}

/// Dump the command tree as JSON.
pub fn describe() -> Command {
    Command::new("describe")
        .hidden()
        .description("Prints the command tree as JSON")
        .completion(no_arguments())
        .action(|ctx: &Context<'_>| {
            let root = ctx.resolution().path()[0];
            ctx.println(root.meta().to_json()?)
        })
}

/// Prints the version and stops.
pub fn version_flag() -> Flag {
    Flag::new(["version", "V"], false, "Print version").on_match(|ctx| {
        ctx.println(format!("cmdtree-demo {}", env!("CARGO_PKG_VERSION")))?;
        Err(cmdtree::ExitNow.into())
    })
}
