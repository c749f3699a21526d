use std::sync::{Arc, Mutex};

use cmdtree::{App, Command, Context, Error, ExitNow, Flag, complete, execute, parse};

type Log = Arc<Mutex<Vec<String>>>;

fn argv(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn record(log: &Log, entry: &str) -> impl Fn(&Context<'_>) -> anyhow::Result<()> + use<> {
    let log = log.clone();
    let entry = entry.to_string();
    move |_| {
        log.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

const HELP_TEXT: &str = "Some long descriptive help message here.
Possible multiline.
    With paddings.";

fn must_not_run(what: &'static str) -> impl Fn(&Context<'_>) -> anyhow::Result<()> {
    move |_| panic!("{what} called")
}

#[test]
fn root_action_gets_positionals_and_flags() {
    let log = Log::default();
    let root = Command::new(["long", "l"])
        .description("test command")
        .help_text(HELP_TEXT)
        .action(record(&log, "root"))
        .flag(Flag::new(["flag", "f", "ff"], false, "some flag"))
        .command(
            Command::new(["sub", "s", "alias"])
                .description("subcommand")
                .action(must_not_run("subcommand"))
                .flag(Flag::new("subflag", 3, "some sub flag")),
        );

    let r = parse(&root, &argv(&["base", "first", "second", "--flag", "-"]), &[]).unwrap();
    assert_eq!(r.leaf().name(), "long");
    assert_eq!(*r.args(), ["first", "second", "-"]);
    assert!(r.is_set("flag"));
    assert_eq!(r.bool("ff"), Some(true));

    let mut out = Vec::new();
    execute(&r, &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(entries(&log), ["root"]);
}

fn sub_tree(log: &Log) -> Command {
    Command::new(["long", "l"])
        .description("test command")
        .help_text(HELP_TEXT)
        .action(must_not_run("command"))
        .default_args(vec!["root-default".to_string()])
        .flag(Flag::new(["flag", "f", "ff"], "empty", "some flag"))
        .command(
            Command::new(["sub", "s", "alias"])
                .description("subcommand")
                .action(record(log, "sub"))
                .flag(Flag::new("subflag", 3, "some sub flag")),
        )
}

#[test]
fn subcommand_selected_by_any_alias() {
    for name in ["sub", "s", "alias"] {
        let log = Log::default();
        let root = sub_tree(&log);
        let r = parse(
            &root,
            &argv(&["base", name, "first", "second", "--flag=value", "-", "--subflag", "4"]),
            &[],
        )
        .unwrap();
        assert_eq!(r.command_path(), "long sub");
        assert_eq!(*r.args(), ["first", "second", "-"]);
        assert_eq!(*r.args_at(0).unwrap(), ["root-default"]);
        assert_eq!(r.string("flag"), Some("value"));
        assert_eq!(r.int("subflag"), Some(4));

        execute(&r, &mut Vec::new()).unwrap();
        assert_eq!(entries(&log), ["sub"]);
    }
}

#[test]
fn unknown_flag_aborts_before_any_hook() {
    let log = Log::default();
    let root = sub_tree(&log).before(record(&log, "before root"));
    let err = parse(
        &root,
        &argv(&["base", "sub", "first", "second", "--flag=value", "-", "--subflag", "4", "--nonexisted"]),
        &[],
    )
    .unwrap_err();
    match err {
        Error::NoSuchFlag { flag, path } => {
            assert_eq!(flag, "--nonexisted");
            assert_eq!(path, "long sub");
        }
        other => panic!("expected NoSuchFlag, got: {other:?}"),
    }
    assert!(entries(&log).is_empty());
}

#[test]
fn inline_and_separate_values_are_equivalent() {
    let root = Command::new("app")
        .flag(Flag::new(["name", "n"], "", ""))
        .flag(Flag::new(["count", "c"], 1, ""));
    for tokens in [
        ["app", "--name=x y", "--count=7"].as_slice(),
        ["app", "--name", "x y", "--count", "7"].as_slice(),
        ["app", "-n", "x y", "-c=7"].as_slice(),
    ] {
        let r = parse(&root, &argv(tokens), &[]).unwrap();
        assert_eq!(r.string("name"), Some("x y"));
        assert_eq!(r.int("count"), Some(7));
    }
}

#[test]
fn descendant_flag_shadows_ancestor_hook() {
    let log = Log::default();
    let root = Command::new("app")
        .flag(Flag::new(["help", "h"], false, "").on_match(record(&log, "root help")))
        .command(
            Command::new("secret")
                .flag(Flag::new(["help", "h"], false, ""))
                .action(record(&log, "secret")),
        );

    let r = parse(&root, &argv(&["app", "secret", "-h"]), &[]).unwrap();
    assert_eq!(r.flag("help").map(|f| f.depth()), Some(1));
    execute(&r, &mut Vec::new()).unwrap();
    assert_eq!(entries(&log), ["secret"]);

    // Before descending the ancestor's flag is the one matched.
    let log2 = Log::default();
    let root = Command::new("app")
        .flag(Flag::new(["help", "h"], false, "").on_match(record(&log2, "root help")))
        .command(Command::new("secret").flag(Flag::new(["help", "h"], false, "")));
    let r = parse(&root, &argv(&["app", "-h", "secret"]), &[]).unwrap();
    execute(&r, &mut Vec::new()).unwrap();
    assert_eq!(entries(&log2), ["root help"]);
}

#[test]
fn after_hooks_run_when_action_fails() {
    let log = Log::default();
    let root = Command::new("app")
        .before(record(&log, "before app"))
        .after(record(&log, "after app"))
        .command(
            Command::new("run")
                .before(record(&log, "before run"))
                .after(record(&log, "after run"))
                .action({
                    let log = log.clone();
                    move |_| {
                        log.lock().unwrap().push("action".to_string());
                        anyhow::bail!("boom")
                    }
                }),
        );
    let r = parse(&root, &argv(&["app", "run"]), &[]).unwrap();
    let err = execute(&r, &mut Vec::new()).unwrap_err();
    assert!(matches!(err, Error::Hook(_)));
    assert_eq!(err.to_string(), "boom");
    assert_eq!(
        entries(&log),
        ["before app", "before run", "action", "after run", "after app"]
    );
}

#[test]
fn exit_from_flag_hook_skips_command_hooks() {
    let log = Log::default();
    let root = Command::new("app")
        .flag(Flag::new("version", false, "").on_match(|ctx| {
            ctx.println("app 1.0")?;
            Err(ExitNow.into())
        }))
        .before(record(&log, "before"))
        .after(record(&log, "after"))
        .action(record(&log, "action"));
    let r = parse(&root, &argv(&["app", "--version"]), &[]).unwrap();
    let mut out = Vec::new();
    let err = execute(&r, &mut out).unwrap_err();
    assert!(err.is_exit());
    assert_eq!(out, b"app 1.0\n");
    assert!(entries(&log).is_empty());
}

#[test]
fn environment_sits_between_argv_and_default() {
    let root = Command::new("app").command(
        Command::new("echo").flag(Flag::new("sep", " ", "separator").env("DEMO_SEP")),
    );
    let env = vec![("DEMO_SEP".to_string(), ",".to_string())];

    let r = parse(&root, &argv(&["app", "echo"]), &[]).unwrap();
    assert_eq!(r.string("sep"), Some(" "));

    let r = parse(&root, &argv(&["app", "echo"]), &env).unwrap();
    assert_eq!(r.string("sep"), Some(","));
    assert!(!r.is_set("sep"));

    let r = parse(&root, &argv(&["app", "echo", "--sep", ";"]), &env).unwrap();
    assert_eq!(r.string("sep"), Some(";"));

    let bad = vec![("N".to_string(), "many".to_string())];
    let root = Command::new("app").flag(Flag::new("n", 1, "").env("N"));
    assert!(matches!(
        parse(&root, &argv(&["app"]), &bad),
        Err(Error::InvalidFlagValue { .. })
    ));
}

#[test]
fn completion_does_not_disturb_a_later_run() {
    let log = Log::default();
    let app = App::new(
        Command::new("app").command(
            Command::new(["random", "rnd"])
                .flag(Flag::new(["min", "m"], 0, ""))
                .flag(Flag::new(["max", "M"], 100, ""))
                .action(record(&log, "random")),
        ),
    )
    .with_help()
    .with_completion();

    let words = argv(&["rnd", "-m", "5", "--ma"]);
    assert_eq!(complete(app.root(), &words).unwrap(), ["--max"]);
    assert_eq!(app.complete(&words[..2]).unwrap(), ["-m"]);
    assert!(entries(&log).is_empty());

    let r = app.parse(&argv(&["app", "rnd", "-m", "5"]), &[]).unwrap();
    assert_eq!(r.int("min"), Some(5));
    assert_eq!(r.int("max"), Some(100));
    assert!(!r.is_set("max"));
}

#[test]
fn shadowing_agrees_across_parse_help_and_completion() {
    let root = Command::new(["long", "l"])
        .flag(Flag::new(["flag", "f", "ff"], false, "some flag"))
        .command(Command::new("sub").flag(Flag::new(["format", "f"], "plain", "output format")));
    let sub = root.child("sub").unwrap();

    for token in ["--flag", "--ff"] {
        let err = parse(&root, &argv(&["base", "sub", token]), &[]).unwrap_err();
        assert!(matches!(err, Error::NoSuchFlag { .. }), "{token}: {err:?}");
    }
    let r = parse(&root, &argv(&["base", "sub", "-f", "json"]), &[]).unwrap();
    assert_eq!(r.string("format"), Some("json"));

    let text = cmdtree::help::render(&[&root, sub]);
    assert!(text.contains("--format"));
    assert!(!text.contains("--flag"));

    assert_eq!(complete(&root, &argv(&["sub", "--f"])).unwrap(), ["--format"]);
}

#[test]
fn duplicate_alias_fails_every_entry_point() {
    let root = Command::new("app")
        .flag(Flag::new(["force", "f"], false, ""))
        .flag(Flag::new(["file", "f"], "x", ""));
    assert!(matches!(
        parse(&root, &argv(&["app", "-f"]), &[]),
        Err(Error::DuplicateFlag { .. })
    ));
    assert!(matches!(
        complete(&root, &argv(&["-"])),
        Err(Error::DuplicateFlag { .. })
    ));
    assert!(App::new(root).parse(&argv(&["app"]), &[]).is_err());
}
