//! Help and usage rendering.

use crate::command::Command;
use crate::exec::Context;
use crate::flag::{self, FlagKind, FlagValue, display_name};
use crate::meta::FlagMeta;

fn format_flag_left(f: &FlagMeta) -> String {
    let mut out = f.names().map(display_name).collect::<Vec<_>>().join(", ");
    if f.kind != FlagKind::Bool {
        out.push(' ');
        out.push_str(f.kind.placeholder());
    }
    out
}

fn format_flag_help(f: &FlagMeta) -> String {
    let mut parts: Vec<String> = Vec::new();
    if !f.description.trim().is_empty() {
        parts.push(f.description.trim().to_string());
    }
    match &f.default {
        FlagValue::Bool(false) => {}
        FlagValue::String(s) if s.is_empty() => {}
        value => parts.push(format!("[default: {value}]")),
    }
    if let Some(env) = &f.env {
        parts.push(format!("[env: {env}]"));
    }
    if !f.choices.is_empty() {
        parts.push(format!("[possible values: {}]", f.choices.join(", ")));
    }
    parts.join(" ")
}

fn push_rows(out: &mut String, title: &str, rows: Vec<(String, String)>) {
    if rows.is_empty() {
        return;
    }
    out.push_str(&format!("\n{title}:\n"));
    let width = rows.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("  {}\n", left));
        } else {
            out.push_str(&format!("  {:width$}  {}\n", left, help, width = width));
        }
    }
}

/// One-line usage for a command path.
pub fn usage(path: &[&Command]) -> String {
    let names = path.iter().map(|c| c.name()).collect::<Vec<_>>().join(" ");
    let mut out = format!("Usage: {names} [OPTIONS]");
    if path
        .last()
        .is_some_and(|c| c.children().iter().any(|child| !child.is_hidden()))
    {
        out.push_str(" [COMMAND]");
    }
    out.push_str(" [ARGS]...");
    out
}

/// Render help for the last command of `path` (root first).
///
/// Options declared by ancestors are listed as global options unless a nearer
/// command shadows them.
pub fn render(path: &[&Command]) -> String {
    let Some(leaf) = path.last() else {
        return String::new();
    };
    let meta = leaf.meta();

    let mut out = String::new();
    if meta.description.trim().is_empty() {
        out.push_str(&meta.name);
        out.push('\n');
    } else {
        out.push_str(&format!("{} - {}\n", meta.name, meta.description.trim()));
    }

    out.push('\n');
    out.push_str(&usage(path));
    out.push('\n');

    if !meta.help_text.trim().is_empty() {
        out.push('\n');
        out.push_str(meta.help_text.trim_end());
        out.push('\n');
    }

    let commands = meta
        .commands
        .iter()
        .filter(|c| !c.hidden)
        .map(|c| (c.names().collect::<Vec<_>>().join(", "), c.description.trim().to_string()))
        .collect();
    push_rows(&mut out, "Commands", commands);

    let mut options = Vec::new();
    let mut globals = Vec::new();
    for found in flag::in_scope(path) {
        if found.flag.is_hidden() {
            continue;
        }
        let f = FlagMeta::from(found.flag);
        let row = (format_flag_left(&f), format_flag_help(&f));
        if found.depth + 1 == path.len() {
            options.push(row);
        } else {
            globals.push(row);
        }
    }
    push_rows(&mut out, "Options", options);
    push_rows(&mut out, "Global options", globals);

    tracing::trace!(command = leaf.name(), "help rendered");
    out
}

/// Action printing help for the selected command.
pub fn action() -> impl Fn(&Context<'_>) -> anyhow::Result<()> {
    |ctx| ctx.print(render(ctx.resolution().path()))
}
