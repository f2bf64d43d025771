//! Plain-text help, version and completion output.

use crate::app::App;
use crate::command::{Command, Node};
use crate::context::Context;
use crate::dispatch::implicit_flags;
use crate::flag::Flag;

/// Render help for `node`, addressed on the command line as `path`.
pub(crate) fn render(app: &App, node: Node<'_>, path: &str) -> String {
    let children: Vec<&Command> = node.children(app).collect();
    let usage = match node {
        Node::Root(app) => app.usage_text(),
        Node::Command(command) => command.usage_text(),
    };

    let mut out = String::new();
    section(&mut out, "NAME", &name_line(path, usage));

    let synopsis = match node {
        Node::Root(_) if children.is_empty() => format!("{path} [global options] [arguments...]"),
        Node::Root(_) => format!("{path} [global options] command [command options] [arguments...]"),
        Node::Command(_) if children.is_empty() => format!("{path} [command options] [arguments...]"),
        Node::Command(_) => format!("{path} command [command options] [arguments...]"),
    };
    section(&mut out, "USAGE", &synopsis);

    match node {
        Node::Root(app) => {
            if !app.version_text().trim().is_empty() {
                section(&mut out, "VERSION", app.version_text().trim());
            }
            if !app.author_text().trim().is_empty() {
                let author = if app.email_text().trim().is_empty() {
                    app.author_text().trim().to_string()
                } else {
                    format!("{} <{}>", app.author_text().trim(), app.email_text().trim())
                };
                section(&mut out, "AUTHOR", &author);
            }
        }
        Node::Command(command) => {
            if !command.description_text().trim().is_empty() {
                section(&mut out, "DESCRIPTION", command.description_text().trim_end());
            }
        }
    }

    if !children.is_empty() {
        let rows: Vec<(String, String)> = children
            .iter()
            .map(|c| (command_names(c), c.usage_text().trim().to_string()))
            .collect();
        section(&mut out, "COMMANDS", &table(rows));
    }

    let implicit = implicit_flags(app, node);
    let rows: Vec<(String, String)> = node
        .flags()
        .iter()
        .chain(&implicit)
        .filter(|f| !f.is_hidden())
        .map(flag_row)
        .collect();
    if !rows.is_empty() {
        let title = if node.is_root() { "GLOBAL OPTIONS" } else { "OPTIONS" };
        section(&mut out, title, &table(rows));
    }

    out
}

fn name_line(path: &str, usage: &str) -> String {
    if usage.trim().is_empty() {
        path.to_string()
    } else {
        format!("{path} - {}", usage.trim())
    }
}

/// Append a titled block, blank-line separated, body indented three spaces.
fn section(out: &mut String, title: &str, body: &str) {
    if !out.is_empty() {
        out.push('\n');
    }
    out.push_str(title);
    out.push_str(":\n");
    for line in body.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("   {line}\n"));
        }
    }
}

fn table(rows: Vec<(String, String)>) -> String {
    let width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let mut out = String::new();
    for (left, help) in rows {
        if help.is_empty() {
            out.push_str(&format!("{left}\n"));
        } else {
            out.push_str(&format!("{:width$}  {}\n", left, help, width = width));
        }
    }
    out
}

fn command_names(command: &Command) -> String {
    match command.short() {
        Some(short) => format!("{}, {short}", command.name()),
        None => command.name().to_string(),
    }
}

fn flag_row(flag: &Flag) -> (String, String) {
    let d = flag.describe();
    (d.names, d.usage)
}

pub(crate) fn version(app: &App) -> String {
    format!("{} version {}\n", app.name(), app.version_text())
}

/// One addressable child name per line.
pub(crate) fn default_completions(app: &App, node: Node<'_>) -> String {
    let mut out = String::new();
    for child in node.children(app) {
        out.push_str(child.name());
        out.push('\n');
        if let Some(short) = child.short() {
            out.push_str(short);
            out.push('\n');
        }
    }
    out
}

/// Action of the built-in `help` command.
///
/// Shows help for the level that owns the command, or for the child named
/// by the first argument.
pub(crate) fn show_help_topic(ctx: &Context<'_>) -> anyhow::Result<()> {
    let owner = ctx.parent().unwrap_or(ctx);
    let app = ctx.app();
    let text = match ctx.args().first() {
        Some(name) => match owner.node().find_child(app, name) {
            Some(child) => render(
                app,
                Node::Command(child),
                &format!("{} {}", owner.path(), child.name()),
            ),
            None => format!("No help topic for '{name}'\n"),
        },
        None => render(app, owner.node(), owner.path()),
    };
    app.emit(&text);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> App {
        App::new("greet")
            .usage("say hello")
            .version("1.0.0")
            .author("Ada")
            .email("ada@example.com")
            .flag(Flag::string("name, n", "World").usage("who to greet"))
            .flag(Flag::bool("secret").hidden())
            .command(Command::new("hello").short_name("h").usage("greet someone").action(|_| Ok(())))
            .command(
                Command::new("list")
                    .usage("list things")
                    .subcommand(Command::new("items").action(|_| Ok(()))),
            )
    }

    #[test]
    fn app_help_lists_commands_and_global_options() {
        let app = sample();
        let text = render(&app, Node::Root(&app), "greet");
        let expected = "\
NAME:
   greet - say hello

USAGE:
   greet [global options] command [command options] [arguments...]

VERSION:
   1.0.0

AUTHOR:
   Ada <ada@example.com>

COMMANDS:
   hello, h  greet someone
   list      list things
   help, h   Shows a list of commands or help for one command

GLOBAL OPTIONS:
   --name value, -n value  who to greet (default: \"World\")
   --help, -h              show help
   --version, -v           print the version
";
        assert_eq!(text, expected);
    }

    #[test]
    fn leaf_help_uses_the_full_path() {
        let app = sample();
        let hello = &app.command_list()[0];
        let text = render(&app, Node::Command(hello), "greet hello");
        assert!(text.starts_with("NAME:\n   greet hello - greet someone\n"));
        assert!(text.contains("USAGE:\n   greet hello [command options] [arguments...]\n"));
        assert!(text.contains("OPTIONS:\n   --help, -h  show help\n"));
        assert!(!text.contains("COMMANDS:"));
        assert!(!text.contains("--version"));
    }

    #[test]
    fn interior_help_lists_subcommands() {
        let app = sample();
        let list = &app.command_list()[1];
        let text = render(&app, Node::Command(list), "greet list");
        assert!(text.contains("greet list command [command options] [arguments...]"));
        assert!(text.contains("   items\n"));
        assert!(text.contains("   help, h  Shows a list of commands or help for one command\n"));
    }

    #[test]
    fn completions_include_short_names() {
        let app = sample();
        assert_eq!(
            default_completions(&app, Node::Root(&app)),
            "hello\nh\nlist\nhelp\nh\n"
        );
        let hello = &app.command_list()[0];
        assert_eq!(default_completions(&app, Node::Command(hello)), "");
    }

    #[test]
    fn version_line() {
        assert_eq!(version(&sample()), "greet version 1.0.0\n");
    }

    #[test]
    fn table_pads_by_characters() {
        let rows = vec![
            ("grüße".to_string(), "say hi".to_string()),
            ("hello".to_string(), "say hello".to_string()),
        ];
        assert_eq!(table(rows), "grüße  say hi\nhello  say hello\n");
    }
}
