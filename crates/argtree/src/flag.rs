//! Flag declarations.
//!
//! A [`Flag`] is static configuration: one logical flag, possibly reachable
//! through several comma-separated aliases (`"name, n"`). Values live in the
//! [`FlagRegistry`](crate::FlagRegistry) built from these declarations.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::value::{
    Accumulator, FlagValue, GenericValue, narrow, parse_bool, parse_decimal, parse_f64, parse_i64,
    parse_u64,
};

const DEFAULT_PLACEHOLDER: &str = "value";

/// Name of the hidden flag that requests completion output.
pub const COMPLETION_FLAG: &str = "generate-bash-completion";

/// The closed set of flag types and their compiled defaults.
#[derive(Debug, Clone)]
pub enum FlagKind {
    Bool,
    /// Boolean that defaults to `true`.
    BoolT,
    String(String),
    Int(isize),
    Int64(i64),
    Uint(usize),
    Uint64(u64),
    Float64(f64),
    Generic(Box<dyn GenericValue>),
    StringSlice(Vec<String>),
    IntSlice(Vec<isize>),
    Int64Slice(Vec<i64>),
}

impl FlagKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Bool | Self::BoolT => "bool",
            Self::String(_) => "string",
            Self::Int(_) => "int",
            Self::Int64(_) => "int64",
            Self::Uint(_) => "uint",
            Self::Uint64(_) => "uint64",
            Self::Float64(_) => "float64",
            Self::Generic(_) => "generic",
            Self::StringSlice(_) => "string slice",
            Self::IntSlice(_) => "int slice",
            Self::Int64Slice(_) => "int64 slice",
        }
    }

    pub fn takes_value(&self) -> bool {
        !matches!(self, Self::Bool | Self::BoolT)
    }

    pub fn is_accumulator(&self) -> bool {
        matches!(
            self,
            Self::StringSlice(_) | Self::IntSlice(_) | Self::Int64Slice(_)
        )
    }

    /// The value a fresh registry starts from when no env/file source is set.
    pub(crate) fn initial_value(&self) -> FlagValue {
        match self {
            Self::Bool => FlagValue::Bool(false),
            Self::BoolT => FlagValue::Bool(true),
            Self::String(v) => FlagValue::String(v.clone()),
            Self::Int(v) => FlagValue::Int(*v),
            Self::Int64(v) => FlagValue::Int64(*v),
            Self::Uint(v) => FlagValue::Uint(*v),
            Self::Uint64(v) => FlagValue::Uint64(*v),
            Self::Float64(v) => FlagValue::Float64(*v),
            Self::Generic(v) => FlagValue::Generic(v.clone()),
            Self::StringSlice(v) => FlagValue::StringSlice(Accumulator::new(v.clone())),
            Self::IntSlice(v) => FlagValue::IntSlice(Accumulator::new(v.clone())),
            Self::Int64Slice(v) => FlagValue::Int64Slice(Accumulator::new(v.clone())),
        }
    }

    /// Interpret env/file text as this kind's initial value.
    pub(crate) fn value_from_source(&self, raw: &str) -> Result<FlagValue, String> {
        let value = match self {
            Self::Bool | Self::BoolT => FlagValue::Bool(!raw.is_empty() && parse_bool(raw)?),
            Self::String(_) => FlagValue::String(raw.to_string()),
            Self::Int(_) => FlagValue::Int(narrow(parse_i64(raw)?)?),
            Self::Int64(_) => FlagValue::Int64(parse_i64(raw)?),
            Self::Uint(_) => FlagValue::Uint(narrow(parse_u64(raw)?)?),
            Self::Uint64(_) => FlagValue::Uint64(parse_u64(raw)?),
            Self::Float64(_) => FlagValue::Float64(parse_f64(raw)?),
            Self::Generic(prototype) => {
                let mut value = prototype.clone();
                value.set(raw)?;
                FlagValue::Generic(value)
            }
            Self::StringSlice(_) => FlagValue::StringSlice(Accumulator::new(
                split_list(raw).map(str::to_string).collect(),
            )),
            Self::IntSlice(_) => FlagValue::IntSlice(Accumulator::new(
                split_list(raw)
                    .map(|s| parse_decimal(s).and_then(|v| narrow(v)))
                    .collect::<Result<_, _>>()?,
            )),
            Self::Int64Slice(_) => FlagValue::Int64Slice(Accumulator::new(
                split_list(raw).map(parse_decimal).collect::<Result<_, _>>()?,
            )),
        };
        Ok(value)
    }

    fn default_text(&self) -> Option<String> {
        match self {
            Self::Bool | Self::BoolT => None,
            Self::String(v) if v.is_empty() => None,
            Self::String(v) => Some(format!("{v:?}")),
            Self::Int(v) => Some(v.to_string()),
            Self::Int64(v) => Some(v.to_string()),
            Self::Uint(v) => Some(v.to_string()),
            Self::Uint64(v) => Some(v.to_string()),
            Self::Float64(v) => Some(v.to_string()),
            Self::Generic(v) => Some(v.to_string()).filter(|s| !s.is_empty()),
            Self::StringSlice(v) => join_defaults(
                v.iter()
                    .filter(|s| !s.is_empty())
                    .map(|s| format!("{s:?}")),
            ),
            Self::IntSlice(v) => join_defaults(v.iter().map(ToString::to_string)),
            Self::Int64Slice(v) => join_defaults(v.iter().map(ToString::to_string)),
        }
    }
}

fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(',').map(str::trim)
}

fn join_defaults(items: impl Iterator<Item = String>) -> Option<String> {
    let items: Vec<String> = items.collect();
    if items.is_empty() {
        None
    } else {
        Some(items.join(", "))
    }
}

/// A caller-owned cell that mirrors a flag's resolved value.
#[derive(Debug, Default)]
pub struct Destination<T>(Rc<RefCell<T>>);

impl<T> Clone for Destination<T> {
    fn clone(&self) -> Self {
        Self(Rc::clone(&self.0))
    }
}

impl<T: Clone> Destination<T> {
    pub fn new(initial: T) -> Self {
        Self(Rc::new(RefCell::new(initial)))
    }

    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }

    pub(crate) fn store(&self, value: T) {
        *self.0.borrow_mut() = value;
    }
}

/// Type-erased [`Destination`] for the scalar flag kinds.
#[derive(Debug, Clone)]
pub enum DestinationSlot {
    Bool(Destination<bool>),
    String(Destination<String>),
    Int(Destination<isize>),
    Int64(Destination<i64>),
    Uint(Destination<usize>),
    Uint64(Destination<u64>),
    Float64(Destination<f64>),
}

macro_rules! destination_from {
    ($($variant:ident => $ty:ty),* $(,)?) => {
        $(
            impl From<Destination<$ty>> for DestinationSlot {
                fn from(d: Destination<$ty>) -> Self {
                    Self::$variant(d)
                }
            }

            impl From<&Destination<$ty>> for DestinationSlot {
                fn from(d: &Destination<$ty>) -> Self {
                    Self::$variant(d.clone())
                }
            }
        )*
    };
}

destination_from! {
    Bool => bool,
    String => String,
    Int => isize,
    Int64 => i64,
    Uint => usize,
    Uint64 => u64,
    Float64 => f64,
}

impl DestinationSlot {
    /// Copy `value` out; returns false when the kinds don't line up.
    pub(crate) fn write(&self, value: &FlagValue) -> bool {
        match (self, value) {
            (Self::Bool(d), FlagValue::Bool(v)) => d.store(*v),
            (Self::String(d), FlagValue::String(v)) => d.store(v.clone()),
            (Self::Int(d), FlagValue::Int(v)) => d.store(*v),
            (Self::Int64(d), FlagValue::Int64(v)) => d.store(*v),
            (Self::Uint(d), FlagValue::Uint(v)) => d.store(*v),
            (Self::Uint64(d), FlagValue::Uint64(v)) => d.store(*v),
            (Self::Float64(d), FlagValue::Float64(v)) => d.store(*v),
            _ => return false,
        }
        true
    }
}

/// One logical flag.
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    usage: String,
    kind: FlagKind,
    required: bool,
    hidden: bool,
    env_vars: Vec<String>,
    file_paths: Vec<String>,
    destination: Option<DestinationSlot>,
}

impl Flag {
    pub fn new(name: impl Into<String>, kind: FlagKind) -> Self {
        Self {
            name: name.into(),
            usage: String::new(),
            kind,
            required: false,
            hidden: false,
            env_vars: Vec::new(),
            file_paths: Vec::new(),
            destination: None,
        }
    }

    pub fn bool(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::Bool)
    }

    pub fn bool_t(name: impl Into<String>) -> Self {
        Self::new(name, FlagKind::BoolT)
    }

    pub fn string(name: impl Into<String>, default: impl Into<String>) -> Self {
        Self::new(name, FlagKind::String(default.into()))
    }

    pub fn int(name: impl Into<String>, default: isize) -> Self {
        Self::new(name, FlagKind::Int(default))
    }

    pub fn int64(name: impl Into<String>, default: i64) -> Self {
        Self::new(name, FlagKind::Int64(default))
    }

    pub fn uint(name: impl Into<String>, default: usize) -> Self {
        Self::new(name, FlagKind::Uint(default))
    }

    pub fn uint64(name: impl Into<String>, default: u64) -> Self {
        Self::new(name, FlagKind::Uint64(default))
    }

    pub fn float64(name: impl Into<String>, default: f64) -> Self {
        Self::new(name, FlagKind::Float64(default))
    }

    pub fn generic(name: impl Into<String>, value: impl GenericValue) -> Self {
        Self::new(name, FlagKind::Generic(Box::new(value)))
    }

    pub fn string_slice<I, S>(name: impl Into<String>, defaults: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            name,
            FlagKind::StringSlice(defaults.into_iter().map(Into::into).collect()),
        )
    }

    pub fn int_slice(name: impl Into<String>, defaults: impl IntoIterator<Item = isize>) -> Self {
        Self::new(name, FlagKind::IntSlice(defaults.into_iter().collect()))
    }

    pub fn int64_slice(name: impl Into<String>, defaults: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, FlagKind::Int64Slice(defaults.into_iter().collect()))
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    /// Add an environment variable source. Earlier calls take priority.
    pub fn env(mut self, key: impl Into<String>) -> Self {
        self.env_vars.push(key.into());
        self
    }

    pub fn envs<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_vars.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Add a file source. Consulted only when no env var is defined.
    pub fn file(mut self, path: impl Into<String>) -> Self {
        self.file_paths.push(path.into());
        self
    }

    pub fn files<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_paths.extend(paths.into_iter().map(Into::into));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn destination(mut self, destination: impl Into<DestinationSlot>) -> Self {
        self.destination = Some(destination.into());
        self
    }

    /// The full alias string as declared, e.g. `"name, n"`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Individual aliases, trimmed, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.name.split(',').map(str::trim).filter(|n| !n.is_empty())
    }

    pub fn has_name(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn usage_text(&self) -> &str {
        &self.usage
    }

    pub fn kind(&self) -> &FlagKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn env_vars(&self) -> &[String] {
        &self.env_vars
    }

    pub fn file_paths(&self) -> &[String] {
        &self.file_paths
    }

    pub(crate) fn destination_slot(&self) -> Option<&DestinationSlot> {
        self.destination.as_ref()
    }

    /// Drop aliases rejected by `keep`; `None` when nothing is left.
    pub(crate) fn retain_names(mut self, keep: impl Fn(&str) -> bool) -> Option<Self> {
        let names: Vec<&str> = self.names().filter(|n| keep(n)).collect();
        if names.is_empty() {
            return None;
        }
        self.name = names.join(", ");
        Some(self)
    }

    /// Structured help record for this flag.
    pub fn describe(&self) -> FlagDescription {
        let (quoted, usage) = unquote_usage(&self.usage);
        let placeholder = match quoted {
            Some(name) => Some(name),
            None if self.kind.takes_value() => Some(DEFAULT_PLACEHOLDER.to_string()),
            None => None,
        };
        let default_text = self.kind.default_text();

        let mut text = usage;
        if let Some(default) = &default_text {
            text.push_str(&format!(" (default: {default})"));
        }
        let mut text = text.trim().to_string();
        if !self.env_vars.is_empty() {
            let vars: Vec<String> = self.env_vars.iter().map(|v| format!("${}", v.trim())).collect();
            text.push_str(&format!(" [{}]", vars.join(", ")));
        }
        if !self.file_paths.is_empty() {
            text.push_str(&format!(" [{}]", self.file_paths.join(",")));
        }

        FlagDescription {
            names: prefixed_names(self.names(), placeholder.as_deref()),
            placeholder,
            default_text,
            usage: text,
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let d = self.describe();
        write!(f, "{}\t{}", d.names, d.usage)
    }
}

/// What help output needs to know about a flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct FlagDescription {
    /// Dash-prefixed aliases with placeholders, e.g. `--name value, -n value`.
    pub names: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_text: Option<String>,
    /// Usage with default, env and file hints appended.
    pub usage: String,
}

/// Pull a back-quoted placeholder name out of the usage text.
fn unquote_usage(usage: &str) -> (Option<String>, String) {
    if let Some(start) = usage.find('`') {
        if let Some(len) = usage[start + 1..].find('`') {
            let end = start + 1 + len;
            let name = &usage[start + 1..end];
            let rewritten = format!("{}{}{}", &usage[..start], name, &usage[end + 1..]);
            return (Some(name.to_string()), rewritten);
        }
    }
    (None, usage.to_string())
}

fn prefixed_names<'a>(names: impl Iterator<Item = &'a str>, placeholder: Option<&str>) -> String {
    names
        .map(|name| {
            let prefix = if name.chars().count() == 1 { "-" } else { "--" };
            match placeholder {
                Some(p) => format!("{prefix}{name} {p}"),
                None => format!("{prefix}{name}"),
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn help_flag() -> Flag {
    Flag::bool("help, h").usage("show help")
}

pub(crate) fn version_flag() -> Flag {
    Flag::bool("version, v").usage("print the version")
}

pub(crate) fn completion_flag() -> Flag {
    Flag::bool(COMPLETION_FLAG).hidden()
}
