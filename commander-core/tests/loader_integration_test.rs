//! # Loader Integration Tests
//!
//! Loads the fixtures through the registry and runs what comes out.

use std::fs;
use std::path::PathBuf;

use commander_core::loader::LoaderError;
use commander_core::script::ScriptErrorKind;
use commander_core::{
    CommandOption, FileLoader, Output, PluginLoader, PluginSource, RawLoader, Registry, Value,
};
use tempfile::TempDir;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Point the named command at an in-memory output
fn capture(registry: &mut Registry, name: &str) -> Output {
    let output = Output::memory();
    let mut command = registry.find(name).unwrap().clone();
    command.set_output(output.clone());
    registry.register_command(command);
    output
}

#[test]
fn test_faq_fixture_defaults_and_overrides() {
    let mut registry = Registry::new();
    let result = registry.load::<FileLoader>(fixture("faq.gcmd"));
    assert!(result.is_success(), "{:?}", result.errors);

    let output = capture(&mut registry, "faq");
    registry
        .run("faq", &[CommandOption::new("question").with_value("Why")])
        .unwrap();
    registry
        .run(
            "faq",
            &[
                CommandOption::new("question").with_value("Why"),
                CommandOption::new("answer").with_value("Because."),
                CommandOption::new("with_question").with_value(true),
                CommandOption::new("loud").with_value(true),
            ],
        )
        .unwrap();

    assert_eq!(
        output.lines(),
        vec![
            "Answer: Because racecar.",
            "Question: Why?",
            "Answer: BECAUSE.",
        ]
    );
}

#[test]
fn test_faq_help_text() {
    let mut registry = Registry::new();
    registry.load::<FileLoader>(fixture("faq.gcmd"));
    let text = registry.find("faq").unwrap().help_text();

    assert!(text.contains("git-cmd faq [command options] [question] [answer]"));
    assert!(text.contains("This is way too much information about a simple FAQ section."));
    assert!(text.contains("-w WITH_QUESTION, --with-question=WITH_QUESTION"));
    assert!(text.contains("-l, --[no-]loud"));
}

#[test]
fn test_workflow_helpers_and_invoke() {
    let mut registry = Registry::new();
    let result = registry.load::<FileLoader>(fixture("Workflow"));
    assert!(result.is_success(), "{:?}", result.errors);
    assert_eq!(registry.command_names(), vec!["start", "wtf"]);

    let wtf = capture(&mut registry, "wtf");
    let start = capture(&mut registry, "start");
    registry.run("start", &[]).unwrap();

    assert_eq!(wtf.lines(), vec!["SALUTATIONS", "WOOT"]);
    assert_eq!(start.lines(), vec!["Ready"]);
}

#[test]
fn test_git_helpers_plugin_is_namespaced() {
    let mut registry = Registry::new();
    let result = registry.load::<PluginLoader>(PluginSource::from(fixture("plugins/git_helpers.gcmd")));
    assert!(result.is_success(), "{:?}", result.errors);

    assert_eq!(registry.plugin_names(), vec!["git_helpers", "system"]);
    let command = registry.find("git-helpers:current").unwrap();
    assert_eq!(
        command.arguments()[0].default(),
        Some(&Value::str("master"))
    );
    assert!(registry.executor("git_helpers").unwrap().responds_to("branch"));

    let plugin = registry.find_plugin("git_helpers").unwrap();
    assert_eq!(plugin.find_command("current").unwrap().name(), "git-helpers:current");
}

#[test]
fn test_plugin_executor_dispatch_from_run_block() {
    let dir = TempDir::new().unwrap();
    let plugin = dir.path().join("echoer.gcmd");
    fs::write(
        &plugin,
        r#"
        plugin(:system)
        #{ echo: |text| system.run("echo #{text}", silent: true) }
        "#,
    )
    .unwrap();

    let mut registry = Registry::new();
    let result = registry.load::<RawLoader>(format!(
        r#"
        plugin("{}")
        command(:shout, |cmd| {{
            cmd.argument(:text, default: "hey")
            cmd.on_run(|options| say(echoer.echo(options[:text]).upcase()))
        }})
        "#,
        plugin.display()
    ));
    assert!(result.is_success(), "{:?}", result.errors);

    let output = capture(&mut registry, "shout");
    registry.run("shout", &[]).unwrap();
    assert_eq!(output.lines(), vec!["HEY"]);
}

#[test]
fn test_undefined_call_propagates() {
    let mut registry = Registry::new();
    registry.load::<RawLoader>("command(:broken, |cmd| { cmd.on_run(|options| github.login()) })");

    let err = registry.run("broken", &[]).unwrap_err();
    match err {
        commander_core::CommanderError::Script(script) => {
            assert_eq!(script.kind, ScriptErrorKind::UndefinedCall);
            assert!(script.message.contains("github"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_failed_loads_are_not_committed() {
    let dir = TempDir::new().unwrap();
    let mut registry = Registry::new();

    let missing = registry.load::<FileLoader>(dir.path().join("Workflow"));
    assert!(matches!(missing.errors[0], LoaderError::FileNotFound(_)));

    let path = dir.path().join("broken.gcmd");
    fs::write(&path, "command(:hello d |cmd| { })").unwrap();
    let broken = registry.load::<FileLoader>(path);
    assert_eq!(broken.errors.len(), 1);
    assert!(matches!(broken.errors[0], LoaderError::CommandParse(_)));

    let plugin = registry.load::<PluginLoader>(PluginSource::Native("nope".into()));
    assert_eq!(plugin.errors[0].kind_name(), "LoadError");

    assert!(registry.command_names().is_empty());
    assert!(registry.plugin_names().is_empty());
}

#[test]
fn test_deep_recursion_is_bounded() {
    let mut registry = Registry::new();
    let result = registry.load::<RawLoader>(
        r#"
        command(:forever, |cmd| {
            cmd.helper(:again, |n| again(n + 1))
            cmd.on_run(|options| again(0))
        })
        "#,
    );
    assert!(result.is_success(), "{:?}", result.errors);

    let err = registry.run("forever", &[]).unwrap_err();
    assert!(err.to_string().contains("stack level too deep"));
}
