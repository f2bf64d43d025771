//! Command tree nodes.

use crate::app::App;
use crate::context::Context;
use crate::flag::Flag;

/// Before hooks and actions.
pub type ActionFn = Box<dyn Fn(&Context<'_>) -> anyhow::Result<()>>;

/// Completion hooks.
pub type CompleteFn = Box<dyn Fn(&Context<'_>)>;

/// A named node below the root.
///
/// A command with subcommands is an interior node: it parses its own flags
/// and hands the remaining arguments to the matching child. A command without
/// subcommands is a leaf and must have an action.
pub struct Command {
    name: String,
    short_name: Option<String>,
    usage: String,
    description: String,
    flags: Vec<Flag>,
    subcommands: Vec<Command>,
    action: Option<ActionFn>,
    before: Option<ActionFn>,
    bash_complete: Option<CompleteFn>,
    skip_flag_parsing: bool,
    hide_help: bool,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            short_name: None,
            usage: String::new(),
            description: String::new(),
            flags: Vec::new(),
            subcommands: Vec::new(),
            action: None,
            before: None,
            bash_complete: None,
            skip_flag_parsing: false,
            hide_help: false,
        }
    }

    pub fn short_name(mut self, short_name: impl Into<String>) -> Self {
        self.short_name = Some(short_name.into());
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
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

    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    pub fn action<F>(mut self, action: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.action = Some(Box::new(action));
        self
    }

    /// Runs after flags are resolved and before recursing or acting.
    pub fn before<F>(mut self, before: F) -> Self
    where
        F: Fn(&Context<'_>) -> anyhow::Result<()> + 'static,
    {
        self.before = Some(Box::new(before));
        self
    }

    pub fn bash_complete<F>(mut self, complete: F) -> Self
    where
        F: Fn(&Context<'_>) + 'static,
    {
        self.bash_complete = Some(Box::new(complete));
        self
    }

    /// Treat every argument after the command name as positional.
    pub fn skip_flag_parsing(mut self) -> Self {
        self.skip_flag_parsing = true;
        self
    }

    pub fn hide_help(mut self) -> Self {
        self.hide_help = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn short(&self) -> Option<&str> {
        self.short_name.as_deref()
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.name == name || self.short_name.as_deref() == Some(name)
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn description_text(&self) -> &str {
        &self.description
    }

    pub fn flag_list(&self) -> &[Flag] {
        &self.flags
    }

    pub fn subcommands(&self) -> &[Command] {
        &self.subcommands
    }

    pub fn is_leaf(&self) -> bool {
        self.subcommands.is_empty()
    }

    pub(crate) fn has_action(&self) -> bool {
        self.action.is_some()
    }
}

/// Either the application root or one of its commands.
#[derive(Clone, Copy)]
pub(crate) enum Node<'a> {
    Root(&'a App),
    Command(&'a Command),
}

impl<'a> Node<'a> {
    pub(crate) fn is_root(&self) -> bool {
        matches!(self, Self::Root(_))
    }

    pub(crate) fn flags(&self) -> &'a [Flag] {
        match *self {
            Self::Root(app) => app.flag_list(),
            Self::Command(command) => &command.flags,
        }
    }

    pub(crate) fn subcommands(&self) -> &'a [Command] {
        match *self {
            Self::Root(app) => app.command_list(),
            Self::Command(command) => &command.subcommands,
        }
    }

    pub(crate) fn hide_help(&self) -> bool {
        match *self {
            Self::Root(app) => app.hides_help(),
            Self::Command(command) => command.hide_help,
        }
    }

    /// Non-root leaves move leading positionals behind their flags.
    pub(crate) fn reorders_args(&self) -> bool {
        match *self {
            Self::Root(_) => false,
            Self::Command(command) => command.is_leaf(),
        }
    }

    pub(crate) fn skips_flag_parsing(&self) -> bool {
        match *self {
            Self::Root(_) => false,
            Self::Command(command) => command.skip_flag_parsing,
        }
    }

    pub(crate) fn action(&self) -> Option<&'a ActionFn> {
        match *self {
            Self::Root(app) => app.action_fn(),
            Self::Command(command) => command.action.as_ref(),
        }
    }

    pub(crate) fn before(&self) -> Option<&'a ActionFn> {
        match *self {
            Self::Root(app) => app.before_fn(),
            Self::Command(command) => command.before.as_ref(),
        }
    }

    pub(crate) fn bash_complete(&self) -> Option<&'a CompleteFn> {
        match *self {
            Self::Root(app) => app.bash_complete_fn(),
            Self::Command(command) => command.bash_complete.as_ref(),
        }
    }

    /// Whether this node offers the built-in `help` command.
    pub(crate) fn has_help_command(&self) -> bool {
        !self.hide_help() && !self.subcommands().is_empty()
    }

    /// Children addressable by name: user commands first, then `help`.
    pub(crate) fn children(&self, app: &'a App) -> impl Iterator<Item = &'a Command> + use<'a> {
        let help = self.has_help_command().then(|| app.help_command());
        self.subcommands().iter().chain(help)
    }

    pub(crate) fn find_child(&self, app: &'a App, name: &str) -> Option<&'a Command> {
        self.children(app).find(|c| c.has_name(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> App {
        App::new("app").command(
            Command::new("list")
                .subcommand(Command::new("items").short_name("i").action(|_| Ok(())))
                .subcommand(Command::new("hosts").action(|_| Ok(()))),
        )
    }

    #[test]
    fn has_name_matches_primary_and_short() {
        let cmd = Command::new("hello").short_name("h");
        assert!(cmd.has_name("hello"));
        assert!(cmd.has_name("h"));
        assert!(!cmd.has_name("hel"));
    }

    #[test]
    fn user_commands_win_over_builtin_help() {
        let app = App::new("app")
            .command(Command::new("hello").short_name("h").action(|_| Ok(())));
        let root = Node::Root(&app);
        assert_eq!(root.find_child(&app, "h").map(Command::name), Some("hello"));
        assert_eq!(root.find_child(&app, "help").map(Command::name), Some("help"));
        assert!(root.find_child(&app, "nope").is_none());
    }

    #[test]
    fn only_non_root_leaves_reorder() {
        let app = tree();
        let list = &app.command_list()[0];
        assert!(!Node::Root(&app).reorders_args());
        assert!(!Node::Command(list).reorders_args());
        assert!(Node::Command(&list.subcommands()[0]).reorders_args());
    }

    #[test]
    fn help_command_only_under_interior_nodes() {
        let app = tree();
        let list = &app.command_list()[0];
        let items = &list.subcommands()[0];
        assert!(Node::Command(list).find_child(&app, "help").is_some());
        assert!(Node::Command(items).find_child(&app, "help").is_none());

        let hidden = App::new("app").hide_help().command(Command::new("x").action(|_| Ok(())));
        assert!(Node::Root(&hidden).find_child(&hidden, "help").is_none());
    }
}
