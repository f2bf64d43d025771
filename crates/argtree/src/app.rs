//! The application root.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Write};

use crate::command::{ActionFn, Command, CompleteFn, Node};
use crate::context::Context;
use crate::dispatch;
use crate::error::{Error, Result};
use crate::flag::Flag;
use crate::help;
use crate::source::Environment;

/// Root of a command tree.
///
/// ```no_run
/// use argtree::{App, Command, Flag};
///
/// let app = App::new("greet")
///     .version("1.0.0")
///     .flag(Flag::string("name, n", "World").usage("who to greet"))
///     .command(Command::new("hello").action(|ctx| {
///         println!("Hello, {}!", ctx.global_string("name"));
///         Ok(())
///     }));
/// app.run(std::env::args())?;
/// # Ok::<(), argtree::Error>(())
/// ```
pub struct App {
    name: String,
    usage: String,
    version: String,
    author: String,
    email: String,
    flags: Vec<Flag>,
    commands: Vec<Command>,
    enable_bash_completion: bool,
    bash_complete: Option<CompleteFn>,
    before: Option<ActionFn>,
    action: Option<ActionFn>,
    hide_help: bool,
    hide_version: bool,
    writer: RefCell<Box<dyn Write>>,
    env: Environment,
    help_command: Command,
}

impl App {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            usage: "A new cli application".to_string(),
            version: "0.0.0".to_string(),
            author: String::new(),
            email: String::new(),
            flags: Vec::new(),
            commands: Vec::new(),
            enable_bash_completion: false,
            bash_complete: None,
            before: None,
            action: None,
            hide_help: false,
            hide_version: false,
            writer: RefCell::new(Box::new(io::stdout())),
            env: Environment::Process,
            help_command: Command::new("help")
                .short_name("h")
                .usage("Shows a list of commands or help for one command")
                .action(help::show_help_topic),
        }
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn author(mut self, author: impl Into<String>) -> Self {
        self.author = author.into();
        self
    }

    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    pub fn flags(mut self, flags: impl IntoIterator<Item = Flag>) -> Self {
        self.flags.extend(flags);
        self
    }

    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    pub fn commands(mut self, commands: impl IntoIterator<Item = Command>) -> Self {
        self.commands.extend(commands);
        self
    }

    /// Register the hidden `--generate-bash-completion` flag at every level.
    pub fn enable_bash_completion(mut self) -> Self {
        self.enable_bash_completion = true;
        self
    }

    pub fn bash_complete<F>(mut self, complete: F) -> Self
    where
        F: Fn(&Context<'_>) + 'static,
    {
        self.bash_complete = Some(Box::new(complete));
        self
    }

    pub fn before<F>(mut self, before: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.before = Some(Box::new(before));
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    pub fn hide_help(mut self) -> Self {
        self.hide_help = true;
        self
    }

    pub fn hide_version(mut self) -> Self {
        self.hide_version = true;
        self
    }

    /// Where help, version and completion output goes. Defaults to stdout.
    pub fn writer(mut self, writer: impl Write + 'static) -> Self {
        self.writer = RefCell::new(Box::new(writer));
        self
    }

    /// Read env-sourced flag values from `env` instead of the process.
    pub fn environment(mut self, env: Environment) -> Self {
        self.env = env;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn version_text(&self) -> &str {
        &self.version
    }

    pub fn author_text(&self) -> &str {
        &self.author
    }

    pub fn email_text(&self) -> &str {
        &self.email
    }

    pub fn flag_list(&self) -> &[Flag] {
        &self.flags
    }

    pub fn command_list(&self) -> &[Command] {
        &self.commands
    }

    pub fn completion_enabled(&self) -> bool {
        self.enable_bash_completion
    }

    pub(crate) fn hides_help(&self) -> bool {
        self.hide_help
    }

    pub(crate) fn hides_version(&self) -> bool {
        self.hide_version
    }

    pub(crate) fn env(&self) -> &Environment {
        &self.env
    }

    pub(crate) fn action_fn(&self) -> Option<&ActionFn> {
        self.action.as_ref()
    }

    pub(crate) fn before_fn(&self) -> Option<&ActionFn> {
        self.before.as_ref()
    }

    pub(crate) fn bash_complete_fn(&self) -> Option<&CompleteFn> {
        self.bash_complete.as_ref()
    }

    pub(crate) fn help_command(&self) -> &Command {
        &self.help_command
    }

    /// Write display text to the configured writer.
    pub fn emit(&self, text: &str) {
        let mut writer = self.writer.borrow_mut();
        if let Err(err) = writer.write_all(text.as_bytes()).and_then(|()| writer.flush()) {
            tracing::warn!(error = %err, "failed to write output");
        }
    }

    /// Dispatch `args`, whose first element is the program name.
    pub fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let args: Vec<String> = args.into_iter().map(Into::into).collect();
        self.validate()?;
        tracing::debug!(app = %self.name, argc = args.len(), "running app");
        dispatch::run(self, Node::Root(self), &args, self.name.clone(), None)
    }

    /// Reject trees that can never dispatch.
    pub fn validate(&self) -> Result<()> {
        validate_level(&self.name, &self.commands)
    }
}

fn validate_level(path: &str, commands: &[Command]) -> Result<()> {
    let mut seen: HashMap<&str, &str> = HashMap::new();
    for command in commands {
        let short = command.short().filter(|s| *s != command.name());
        for name in std::iter::once(command.name()).chain(short) {
            if let Some(prev) = seen.insert(name, command.name()) {
                return Err(Error::Config(format!(
                    "'{path} {name}' refers to both '{prev}' and '{}'",
                    command.name()
                )));
            }
        }
    }

    for command in commands {
        let child_path = format!("{path} {}", command.name());
        if command.is_leaf() && !command.has_action() {
            return Err(Error::Config(format!(
                "'{child_path}' has neither an action nor subcommands"
            )));
        }
        validate_level(&child_path, command.subcommands())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_leaf_without_action() {
        let app = App::new("app").command(Command::new("list").subcommand(Command::new("items")));
        let err = app.validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid configuration: 'app list items' has neither an action nor subcommands"
        );
    }

    #[test]
    fn validate_rejects_sibling_name_clash() {
        let app = App::new("app")
            .command(Command::new("hello").short_name("h").action(|_| Ok(())))
            .command(Command::new("h").action(|_| Ok(())));
        let err = app.validate().unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("refers to both 'hello' and 'h'")));
    }

    #[test]
    fn same_name_at_different_levels_is_fine() {
        let app = App::new("app")
            .command(Command::new("items").action(|_| Ok(())))
            .command(Command::new("list").subcommand(Command::new("items").action(|_| Ok(()))));
        app.validate().unwrap();
    }

    #[test]
    fn validation_runs_before_dispatch() {
        let app = App::new("app")
            .writer(io::sink())
            .command(Command::new("broken"));
        let err = app.run(["app", "--help"]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
