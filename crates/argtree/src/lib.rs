//! Scoped flag registry and hierarchical command dispatch.
//!
//! An [`App`] owns a tree of [`Command`]s. Every level of the tree declares
//! its own [`Flag`]s; dispatch builds one [`FlagRegistry`] per level, parses
//! that level's slice of the arguments and hands the rest to the matching
//! child. Actions receive a [`Context`] that can read flags from its own
//! level or from any enclosing one.
//!
//! Flag values resolve as environment variable > file contents > default,
//! and the command line overrides all of them.

mod app;
mod command;
mod context;
mod dispatch;
mod error;
mod flag;
mod help;
mod normalize;
mod parser;
mod registry;
mod source;
mod value;

pub use app::App;
pub use command::{ActionFn, Command, CompleteFn};
pub use context::{Args, Context, FromFlagValue, Lookup};
pub use error::{Error, Result};
pub use flag::{COMPLETION_FLAG, Destination, DestinationSlot, Flag, FlagDescription, FlagKind};
pub use registry::FlagRegistry;
pub use source::{Environment, Origin};
pub use value::{Accumulator, FlagValue, GenericValue};
