//! Per-level view of resolved flags and positional arguments.

use std::any::Any;
use std::cell::RefCell;

use indexmap::IndexSet;

use crate::app::App;
use crate::command::{Command, Node};
use crate::error::Result;
use crate::registry::FlagRegistry;
use crate::value::{FlagValue, GenericValue, narrow, parse_bool, parse_f64, parse_i64, parse_u64};

/// Which scopes a typed lookup consults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Only the current level.
    Local,
    /// The nearest enclosing level that registers the name, starting one
    /// level up (or at the current level when it is the root).
    Global,
}

/// Conversion from a registered value to an accessor's return type.
///
/// Scalars go through the value's text form, so a string flag holding
/// `"12"` reads as the integer 12. `None` becomes the type's zero value.
pub trait FromFlagValue: Sized + Default {
    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

impl FromFlagValue for bool {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_bool(&value.to_text()).ok()
    }
}

impl FromFlagValue for String {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        Some(value.to_text())
    }
}

impl FromFlagValue for isize {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_i64(&value.to_text()).ok().and_then(|v| narrow(v).ok())
    }
}

impl FromFlagValue for i64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_i64(&value.to_text()).ok()
    }
}

impl FromFlagValue for usize {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_u64(&value.to_text()).ok().and_then(|v| narrow(v).ok())
    }
}

impl FromFlagValue for u64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_u64(&value.to_text()).ok()
    }
}

impl FromFlagValue for f64 {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        parse_f64(&value.to_text()).ok()
    }
}

impl FromFlagValue for Vec<String> {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::StringSlice(acc) => Some(acc.resolved()),
            _ => None,
        }
    }
}

impl FromFlagValue for Vec<isize> {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::IntSlice(acc) => Some(acc.resolved()),
            _ => None,
        }
    }
}

impl FromFlagValue for Vec<i64> {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Int64Slice(acc) => Some(acc.resolved()),
            _ => None,
        }
    }
}

/// Positional arguments left after flag parsing.
#[derive(Debug, Clone, Copy)]
pub struct Args<'a>(&'a [String]);

impl<'a> Args<'a> {
    pub fn first(&self) -> Option<&'a str> {
        self.get(0)
    }

    /// Everything after the first argument.
    pub fn tail(&self) -> &'a [String] {
        self.0.get(1..).unwrap_or_default()
    }

    pub fn get(&self, index: usize) -> Option<&'a str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a str> + use<'a> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &'a [String] {
        self.0
    }
}

/// One dispatch level: its registry, its positionals and its parent.
///
/// Contexts borrow their parent, so a child never outlives the level that
/// dispatched it.
pub struct Context<'a> {
    app: &'a App,
    node: Node<'a>,
    path: String,
    registry: FlagRegistry,
    args: Vec<String>,
    parent: Option<&'a Context<'a>>,
    set_flags: RefCell<Option<IndexSet<String>>>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(
        app: &'a App,
        node: Node<'a>,
        path: String,
        registry: FlagRegistry,
        args: Vec<String>,
        parent: Option<&'a Context<'a>>,
    ) -> Self {
        Self {
            app,
            node,
            path,
            registry,
            args,
            parent,
            set_flags: RefCell::new(None),
        }
    }

    pub fn app(&self) -> &'a App {
        self.app
    }

    /// The command this level runs for; `None` at the root.
    pub fn command(&self) -> Option<&'a Command> {
        match self.node {
            Node::Root(_) => None,
            Node::Command(command) => Some(command),
        }
    }

    pub fn parent(&self) -> Option<&'a Context<'a>> {
        self.parent
    }

    pub(crate) fn node(&self) -> Node<'a> {
        self.node
    }

    /// Space-separated names from the root down to this level.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn registry(&self) -> &FlagRegistry {
        &self.registry
    }

    pub fn args(&self) -> Args<'_> {
        Args(&self.args)
    }

    fn root(&self) -> &Context<'a> {
        let mut ctx = self;
        while let Some(parent) = ctx.parent {
            ctx = parent;
        }
        ctx
    }

    fn scope_for(&self, name: &str, lookup: Lookup) -> Option<&FlagRegistry> {
        match lookup {
            Lookup::Local => Some(&self.registry).filter(|r| r.contains(name)),
            Lookup::Global => {
                let start: &Context<'a> = match self.parent {
                    Some(parent) => parent,
                    None => self,
                };
                let mut scope = Some(start);
                while let Some(ctx) = scope {
                    if ctx.registry.contains(name) {
                        return Some(&ctx.registry);
                    }
                    scope = ctx.parent;
                }
                None
            }
        }
    }

    /// Typed lookup; unknown names and unparsable values read as zero.
    pub fn get<T: FromFlagValue>(&self, name: &str, lookup: Lookup) -> T {
        self.scope_for(name, lookup)
            .and_then(|registry| registry.value(name).and_then(|v| T::from_flag_value(&v)))
            .unwrap_or_default()
    }

    pub fn bool(&self, name: &str) -> bool {
        self.get(name, Lookup::Local)
    }

    /// Same lookup as [`Context::bool`]; the default-true behavior lives in
    /// the flag declaration.
    pub fn bool_t(&self, name: &str) -> bool {
        self.get(name, Lookup::Local)
    }

    pub fn string(&self, name: &str) -> String {
        self.get(name, Lookup::Local)
    }

    pub fn int(&self, name: &str) -> isize {
        self.get(name, Lookup::Local)
    }

    pub fn int64(&self, name: &str) -> i64 {
        self.get(name, Lookup::Local)
    }

    pub fn uint(&self, name: &str) -> usize {
        self.get(name, Lookup::Local)
    }

    pub fn uint64(&self, name: &str) -> u64 {
        self.get(name, Lookup::Local)
    }

    pub fn float64(&self, name: &str) -> f64 {
        self.get(name, Lookup::Local)
    }

    pub fn string_slice(&self, name: &str) -> Vec<String> {
        self.get(name, Lookup::Local)
    }

    pub fn int_slice(&self, name: &str) -> Vec<isize> {
        self.get(name, Lookup::Local)
    }

    pub fn int64_slice(&self, name: &str) -> Vec<i64> {
        self.get(name, Lookup::Local)
    }

    pub fn global_bool(&self, name: &str) -> bool {
        self.get(name, Lookup::Global)
    }

    pub fn global_bool_t(&self, name: &str) -> bool {
        self.get(name, Lookup::Global)
    }

    pub fn global_string(&self, name: &str) -> String {
        self.get(name, Lookup::Global)
    }

    pub fn global_int(&self, name: &str) -> isize {
        self.get(name, Lookup::Global)
    }

    pub fn global_int64(&self, name: &str) -> i64 {
        self.get(name, Lookup::Global)
    }

    pub fn global_uint(&self, name: &str) -> usize {
        self.get(name, Lookup::Global)
    }

    pub fn global_uint64(&self, name: &str) -> u64 {
        self.get(name, Lookup::Global)
    }

    pub fn global_float64(&self, name: &str) -> f64 {
        self.get(name, Lookup::Global)
    }

    pub fn global_string_slice(&self, name: &str) -> Vec<String> {
        self.get(name, Lookup::Global)
    }

    pub fn global_int_slice(&self, name: &str) -> Vec<isize> {
        self.get(name, Lookup::Global)
    }

    pub fn global_int64_slice(&self, name: &str) -> Vec<i64> {
        self.get(name, Lookup::Global)
    }

    /// Clone of a generic flag's value, if it holds a `T`.
    pub fn generic<T: GenericValue + Clone>(&self, name: &str) -> Option<T> {
        self.generic_in(name, Lookup::Local)
    }

    pub fn global_generic<T: GenericValue + Clone>(&self, name: &str) -> Option<T> {
        self.generic_in(name, Lookup::Global)
    }

    fn generic_in<T: GenericValue + Clone>(&self, name: &str, lookup: Lookup) -> Option<T> {
        let registry = self.scope_for(name, lookup)?;
        let value = registry.value(name)?;
        match &*value {
            FlagValue::Generic(boxed) => {
                let inner: &dyn GenericValue = &**boxed;
                let any: &dyn Any = inner;
                any.downcast_ref::<T>().cloned()
            }
            _ => None,
        }
    }

    /// Number of flags given on the command line at this level.
    pub fn num_flags(&self) -> usize {
        self.registry.visited().len()
    }

    /// Whether `name` was given on the command line or sourced from env/file.
    pub fn is_set(&self, name: &str) -> bool {
        self.with_set_flags(|names| names.contains(name))
    }

    pub fn global_is_set(&self, name: &str) -> bool {
        let mut scope = Some(match self.parent {
            Some(parent) => parent,
            None => self,
        });
        while let Some(ctx) = scope {
            if ctx.is_set(name) {
                return true;
            }
            scope = ctx.parent;
        }
        false
    }

    /// Every alias that counts as set at this level.
    pub fn flag_names(&self) -> Vec<String> {
        self.with_set_flags(|names| names.iter().cloned().collect())
    }

    fn with_set_flags<R>(&self, f: impl FnOnce(&IndexSet<String>) -> R) -> R {
        let mut cache = self.set_flags.borrow_mut();
        let names = cache.get_or_insert_with(|| self.registry.set_names());
        f(names)
    }

    /// Assign a flag at this level as if it had been parsed.
    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        self.set_flags.replace(None);
        self.registry.set(name, value)
    }

    /// Assign a flag at the root level.
    pub fn global_set(&self, name: &str, value: &str) -> Result<()> {
        self.root().set(name, value)
    }
}
