//! `greeting` command group: greetings kept one per line in a text file.
//!
//! The group's Before hook opens the file for the selected subcommand and the
//! After hook closes it, so every subcommand works on an already open handle.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context as _, Result, anyhow, bail};
use cmdtree::{Command, Completion, Context, ExitNow, Flag, no_arguments};
use rand::Rng;

#[derive(Default)]
struct Store {
    file: Mutex<Option<File>>,
}

impl Store {
    fn handle(&self) -> Result<MutexGuard<'_, Option<File>>> {
        self.file
            .lock()
            .map_err(|_| anyhow!("greeting store lock poisoned"))
    }

    fn open(&self, ctx: &Context<'_>) -> Result<()> {
        let path = ctx.string("file").unwrap_or_default();
        let writable = match ctx.leaf().name() {
            "clean" => return Ok(()),
            "new" => true,
            _ => false,
        };

        let file = match OpenOptions::new()
            .read(true)
            .write(writable)
            .append(writable)
            .create(writable)
            .open(path)
        {
            Ok(file) => file,
            Err(err) if !writable && err.kind() == std::io::ErrorKind::NotFound => {
                ctx.println("no greetings saved")?;
                return Err(ExitNow.into());
            }
            Err(err) => {
                return Err(anyhow::Error::new(err).context(format!("failed to open {path}")));
            }
        };
        tracing::debug!(path, writable, "greetings opened");
        *self.handle()? = Some(file);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(mut file) = self.handle()?.take() {
            file.flush().context("failed to flush greetings")?;
            tracing::debug!("greetings closed");
        }
        Ok(())
    }

    fn lines(&self) -> Result<Vec<String>> {
        let mut guard = self.handle()?;
        let file = guard.as_mut().context("greetings file is not open")?;
        file.rewind()?;
        let mut lines = Vec::new();
        for line in BufReader::new(&*file).lines() {
            let line = line.context("failed to read greetings")?;
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
        Ok(lines)
    }

    fn append(&self, greeting: &str) -> Result<()> {
        let mut guard = self.handle()?;
        let file = guard.as_mut().context("greetings file is not open")?;
        writeln!(file, "{greeting}").context("failed to write greeting")
    }
}

fn hello(store: &Store, ctx: &Context<'_>) -> Result<()> {
    let lines = store.lines()?;
    if lines.is_empty() {
        ctx.println("no greetings saved")?;
        return Ok(());
    }
    let line = &lines[rand::rng().random_range(0..lines.len())];
    let name = ctx.string("name").unwrap_or_default();
    ctx.println(line.replace("%s", name))
}

fn add(store: &Store, ctx: &Context<'_>) -> Result<()> {
    let greeting = ctx.args().first().unwrap_or_default().trim();
    if greeting.is_empty() {
        bail!("argument expected");
    }
    if store.lines()?.iter().any(|line| line == greeting) {
        return ctx.println("already have this greeting");
    }
    store.append(greeting)?;
    ctx.println("greeting added")
}

fn all(store: &Store, ctx: &Context<'_>) -> Result<()> {
    for line in store.lines()? {
        ctx.println(line)?;
    }
    Ok(())
}

fn clean(ctx: &Context<'_>) -> Result<()> {
    let path = ctx.string("file").unwrap_or_default();
    match fs::remove_file(path) {
        Ok(()) => ctx.println("greetings removed"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => ctx.println("no greetings saved"),
        Err(err) => Err(err).with_context(|| format!("failed to remove {path}")),
    }
}

/// Files and directories matching the partial path being completed.
fn complete_file(c: &Completion<'_>) -> Result<Vec<String>> {
    let word = c.word();
    let (dir, shown, base) = match word.rfind('/') {
        Some(i) => (&word[..=i], &word[..=i], &word[i + 1..]),
        None => (".", "", word),
    };
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            tracing::debug!(dir, error = %err, "cannot list directory");
            return Ok(Vec::new());
        }
    };

    let mut out = Vec::new();
    for entry in entries.flatten() {
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if name.starts_with('.') && !base.starts_with('.') {
            continue;
        }
        let slash = if entry.file_type().is_ok_and(|t| t.is_dir()) { "/" } else { "" };
        out.push(format!("{shown}{name}{slash}"));
    }
    out.sort();
    Ok(out)
}

pub fn command() -> Command {
    let store = Arc::new(Store::default());
    let action = |f: fn(&Store, &Context<'_>) -> Result<()>| {
        let store = Arc::clone(&store);
        move |ctx: &Context<'_>| f(&store, ctx)
    };

    Command::new("greeting")
        .description("Greets you with one of the saved greetings, or edits them")
        .flag(
            Flag::new("file", "greetings.txt", "file to store greetings at")
                .env("DEMO_GREETINGS")
                .completion(complete_file),
        )
        .flag(Flag::new("name", "world", "your name to greet you").env("DEMO_NAME"))
        .before({
            let store = Arc::clone(&store);
            move |ctx| store.open(ctx)
        })
        .after({
            let store = Arc::clone(&store);
            move |_| store.close()
        })
        .action(action(hello))
        .command(
            Command::new(["new", "add"])
                .description("Saves a new greeting (use %s for the name)")
                .action(action(add)),
        )
        .command(
            Command::new(["hello", "hi"])
                .description("Greets you with one of the saved greetings")
                .action(action(hello))
                .completion(no_arguments()),
        )
        .command(
            Command::new(["all", "dump"])
                .description("Prints all saved greetings")
                .action(action(all))
                .completion(no_arguments()),
        )
        .command(
            Command::new(["clean", "drop"])
                .description("Removes the greetings file")
                .action(clean)
                .completion(no_arguments()),
        )
}
