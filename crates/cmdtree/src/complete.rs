//! Completion: scan everything but the word being completed, then suggest
//! candidates for that word from the same tree metadata the parser uses.

use std::collections::HashSet;

use crate::args::Args;
use crate::command::Command;
use crate::error::{Error, Result};
use crate::flag::{self, Flag, FlagKind};
use crate::parse::{FlagKey, Mode, Scanner};

/// What a completion callback sees.
pub struct Completion<'a> {
    command: &'a Command,
    path: &'a [&'a Command],
    args: &'a Args,
    word: &'a str,
}

impl<'a> Completion<'a> {
    /// Command reached by the words before the one being completed.
    pub fn command(&self) -> &'a Command {
        self.command
    }

    pub fn path(&self) -> &'a [&'a Command] {
        self.path
    }

    /// Positionals already typed before the word being completed.
    pub fn args(&self) -> &'a Args {
        self.args
    }

    /// The partial word (possibly empty). For `--name=part` this is `part`.
    pub fn word(&self) -> &'a str {
        self.word
    }
}

/// Callback suggesting a fixed list of alternatives.
pub fn alternatives<I, S>(items: I) -> impl Fn(&Completion<'_>) -> anyhow::Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let items: Vec<String> = items.into_iter().map(Into::into).collect();
    move |_| Ok(items.clone())
}

/// Callback for commands that take no positionals.
pub fn no_arguments() -> impl Fn(&Completion<'_>) -> anyhow::Result<Vec<String>> {
    |_| Ok(Vec::new())
}

/// Candidates for the last element of `words` (program name already removed).
///
/// An empty `words` completes an empty word at the root. Nothing is written to
/// the tree; a fresh scanner is used for the lookahead. The tree is validated
/// first.
pub fn complete(root: &Command, words: &[String]) -> Result<Vec<String>> {
    root.validate()?;

    let (word, prefix) = match words.split_last() {
        Some((word, prefix)) => (word.as_str(), prefix),
        None => ("", words),
    };

    let mut scanner = Scanner::new(root, Mode::Lookahead);
    if let Err(err) = scanner.feed(prefix) {
        tracing::debug!(error = %err, "completion prefix does not scan");
        return Ok(Vec::new());
    }

    let candidates = if let Some(key) = scanner.pending {
        value_candidates(scanner.flag_at(key), &scanner, word)?
    } else if word.starts_with('-') && !scanner.separated() {
        match word.split_once('=') {
            Some((token, value)) => {
                let (name, _) = flag::split_token(token);
                match flag::lookup(scanner.path(), name) {
                    Some(found) => value_candidates(found.flag, &scanner, value)?
                        .into_iter()
                        .map(|c| format!("{token}={c}"))
                        .collect(),
                    None => Vec::new(),
                }
            }
            None => flag_candidates(&scanner),
        }
    } else {
        let current = scanner.current();
        match current.completion_hook() {
            Some(hook) => {
                let ctx = Completion {
                    command: current,
                    path: scanner.path(),
                    args: scanner.positionals(),
                    word,
                };
                hook(&ctx).map_err(Error::from_hook)?
            }
            None if scanner.can_descend() => current
                .children()
                .iter()
                .filter(|c| !c.is_hidden())
                .flat_map(|c| c.names().iter().cloned())
                .collect(),
            None => Vec::new(),
        }
    };

    Ok(filter(candidates, word))
}

/// Values for `flag`: its completion callback if it has one, else its choices.
fn value_candidates(flag: &Flag, scanner: &Scanner<'_>, word: &str) -> Result<Vec<String>> {
    let Some(hook) = flag.completion_hook() else {
        return Ok(flag.choice_list().to_vec());
    };
    let ctx = Completion {
        command: scanner.current(),
        path: scanner.path(),
        args: scanner.positionals(),
        word,
    };
    hook(&ctx).map_err(Error::from_hook)
}

/// Visible flag names in scope, nearest declaration first; boolean flags
/// already given are left out.
fn flag_candidates(scanner: &Scanner<'_>) -> Vec<String> {
    flag::in_scope(scanner.path())
        .into_iter()
        .filter(|r| !r.flag.is_hidden())
        .filter(|r| {
            let key = FlagKey {
                depth: r.depth,
                index: r.index,
            };
            r.flag.kind() != FlagKind::Bool || !scanner.is_set(key)
        })
        .flat_map(|r| r.flag.names().iter().map(|n| flag::display_name(n)))
        .collect()
}

fn filter(candidates: Vec<String>, word: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| c.starts_with(word))
        .filter(|c| seen.insert(c.clone()))
        .collect()
}
