//! Recursive dispatch through the command tree.
//!
//! Each level builds its own registry, parses its slice of the arguments,
//! reconciles aliases, answers completion/help/version requests, checks
//! required flags, runs its before hook and then either hands the remaining
//! positionals to a child or runs its action.

use std::collections::HashSet;

use crate::app::App;
use crate::command::Node;
use crate::context::Context;
use crate::error::{Error, Result};
use crate::flag::{Flag, completion_flag, help_flag, version_flag};
use crate::help;
use crate::registry::FlagRegistry;

/// Flags every level gets on top of its declared ones.
///
/// An implicit alias is dropped when a declared flag already uses it.
pub(crate) fn implicit_flags(app: &App, node: Node<'_>) -> Vec<Flag> {
    let taken: HashSet<&str> = node.flags().iter().flat_map(Flag::names).collect();
    let mut implicit = Vec::new();
    if !node.hide_help() {
        implicit.push(help_flag());
    }
    if node.is_root() && !app.hides_version() {
        implicit.push(version_flag());
    }
    if app.completion_enabled() {
        implicit.push(completion_flag());
    }
    implicit
        .into_iter()
        .filter_map(|flag| flag.retain_names(|name| !taken.contains(name)))
        .collect()
}

/// Whether the surviving aliases of an implicit flag were set.
fn requested(ctx: &Context<'_>, implicit: &[Flag], which: &Flag) -> bool {
    implicit
        .iter()
        .filter(|flag| flag.names().any(|name| which.has_name(name)))
        .any(|flag| flag.names().any(|name| ctx.bool(name)))
}

/// Order the tokens this level parses.
///
/// `args[0]` names the level. Non-root leaves move leading positionals behind
/// the first flag so `cmd a b --flag v` parses like `cmd --flag v a b`.
fn arrange(node: Node<'_>, args: &[String]) -> Vec<String> {
    let tail = args.get(1..).unwrap_or_default();
    if node.skips_flag_parsing() {
        return std::iter::once("--".to_string())
            .chain(tail.iter().cloned())
            .collect();
    }
    if !node.reorders_args() {
        return tail.to_vec();
    }
    match tail.iter().position(|arg| arg.starts_with('-')) {
        Some(first_flag) => tail[first_flag..]
            .iter()
            .chain(&tail[..first_flag])
            .cloned()
            .collect(),
        None => tail.to_vec(),
    }
}

pub(crate) fn run<'a>(
    app: &'a App,
    node: Node<'a>,
    args: &[String],
    path: String,
    parent: Option<&'a Context<'a>>,
) -> Result<()> {
    let span = tracing::debug_span!("dispatch", path = %path);
    let _enter = span.enter();

    let implicit = implicit_flags(app, node);
    let registry = FlagRegistry::build(path.clone(), node.flags().iter().chain(&implicit), app.env())?;

    let tokens = arrange(node, args);
    tracing::trace!(?tokens, "arranged arguments");
    let positionals = match registry.parse(&tokens) {
        Ok(rest) => rest,
        Err(err) => {
            tracing::debug!(error = %err, "parse failed");
            app.emit(&format!("Incorrect Usage.\n\n{}", help::render(app, node, &path)));
            return Err(err);
        }
    };

    if let Err(err) = registry.normalize() {
        tracing::debug!(error = %err, "alias normalization failed");
        app.emit(&format!("{err}\n\n{}", help::render(app, node, &path)));
        return Err(err);
    }

    let ctx = Context::new(app, node, path, registry, positionals, parent);

    if requested(&ctx, &implicit, &completion_flag()) {
        tracing::debug!("completion requested");
        match node.bash_complete() {
            Some(complete) => complete(&ctx),
            None => app.emit(&help::default_completions(app, node)),
        }
        return Ok(());
    }

    if requested(&ctx, &implicit, &help_flag()) {
        tracing::debug!("help requested");
        app.emit(&help::render(app, node, ctx.path()));
        return Ok(());
    }

    if requested(&ctx, &implicit, &version_flag()) {
        tracing::debug!("version requested");
        app.emit(&help::version(app));
        return Ok(());
    }

    let missing = ctx.registry().missing_required();
    if !missing.is_empty() {
        tracing::debug!(?missing, "required flags not set");
        app.emit(&help::render(app, node, ctx.path()));
        return Err(Error::MissingRequired(missing));
    }

    if let Some(before) = node.before() {
        tracing::debug!("running before hook");
        before(&ctx).map_err(Error::Hook)?;
    }

    if let Some(name) = ctx.args().first() {
        if let Some(child) = node.find_child(app, name) {
            tracing::debug!(child = child.name(), "descending");
            let child_path = format!("{} {}", ctx.path(), child.name());
            return run(app, Node::Command(child), ctx.args().as_slice(), child_path, Some(&ctx));
        }
    }

    match node.action() {
        Some(action) => {
            tracing::debug!("running action");
            action(&ctx).map_err(Error::Hook)
        }
        None => {
            tracing::debug!("no action; showing help");
            app.emit(&help::render(app, node, ctx.path()));
            Ok(())
        }
    }
}
