//! Alias-keyed value table for one scope.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use indexmap::{IndexMap, IndexSet};

use crate::error::{Error, Result};
use crate::flag::{DestinationSlot, Flag};
use crate::source::{self, Environment, Origin};
use crate::value::FlagValue;

#[derive(Debug)]
struct Entry {
    cell: Rc<RefCell<FlagValue>>,
    group: usize,
}

/// Every alias of one declared flag.
#[derive(Debug)]
pub(crate) struct AliasGroup {
    pub(crate) names: Vec<String>,
    pub(crate) required: bool,
    pub(crate) accumulator: bool,
    pub(crate) origin: Option<Origin>,
    destination: Option<DestinationSlot>,
}

/// Resolved flag values for a single dispatch level.
///
/// Built once per dispatch from the level's flag declarations. Scalar aliases
/// each own a cell seeded from one resolved initial value; accumulator and
/// generic aliases share a single cell. Cells are `Rc<RefCell<_>>`, so a
/// registry never crosses threads.
#[derive(Debug)]
pub struct FlagRegistry {
    scope: String,
    entries: IndexMap<String, Entry>,
    pub(crate) groups: Vec<AliasGroup>,
    visited: RefCell<IndexSet<String>>,
}

impl FlagRegistry {
    /// Register `flags`, resolving each initial value as env > file > default.
    ///
    /// Fails on the first env/file value that does not parse, or on an alias
    /// declared twice in the same scope.
    pub fn build<'f, I>(scope: impl Into<String>, flags: I, env: &Environment) -> Result<Self>
    where
        I: IntoIterator<Item = &'f Flag>,
    {
        let scope = scope.into();
        let mut entries: IndexMap<String, Entry> = IndexMap::new();
        let mut groups = Vec::new();

        for flag in flags {
            let (initial, origin) =
                match source::lookup(env, flag.env_vars(), flag.file_paths()) {
                    Some((raw, origin)) => {
                        let value = flag.kind().value_from_source(&raw).map_err(|reason| {
                            Error::TypeConversion {
                                flag: flag.name().to_string(),
                                kind: flag.kind().type_name(),
                                value: raw.clone(),
                                reason,
                            }
                        })?;
                        tracing::debug!(scope = %scope, flag = flag.name(), origin = ?origin, "initial value from source");
                        (value, Some(origin))
                    }
                    None => (flag.kind().initial_value(), None),
                };

            if let Some(slot) = flag.destination_slot() {
                write_destination(flag.name(), slot, &initial);
            }

            let group = groups.len();
            let shared = initial.is_shared().then(|| Rc::new(RefCell::new(initial.clone())));
            let mut names = Vec::new();
            for name in flag.names() {
                if entries.contains_key(name) {
                    return Err(Error::Config(format!("{scope} flag redefined: {name}")));
                }
                let cell = match &shared {
                    Some(cell) => Rc::clone(cell),
                    None => Rc::new(RefCell::new(initial.clone())),
                };
                entries.insert(name.to_string(), Entry { cell, group });
                names.push(name.to_string());
            }

            groups.push(AliasGroup {
                names,
                required: flag.is_required(),
                accumulator: flag.kind().is_accumulator(),
                origin,
                destination: flag.destination_slot().cloned(),
            });
        }

        tracing::debug!(scope = %scope, aliases = entries.len(), "built flag registry");
        Ok(Self {
            scope,
            entries,
            groups,
            visited: RefCell::new(IndexSet::new()),
        })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Every registered alias, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Borrow the current value behind an alias.
    pub fn value(&self, name: &str) -> Option<Ref<'_, FlagValue>> {
        self.entries.get(name).map(|e| e.cell.borrow())
    }

    pub(crate) fn is_bool_flag(&self, name: &str) -> Option<bool> {
        self.value(name).map(|v| v.is_bool_flag())
    }

    /// Assign `raw` to an alias and record it as explicitly set.
    pub fn set(&self, name: &str, raw: &str) -> Result<()> {
        if !self.contains(name) {
            return Err(Error::parse(format!("no such flag -{name}")));
        }
        self.assign(name, raw)
            .map_err(|reason| Error::parse(format!("invalid value {raw:?} for flag -{name}: {reason}")))
    }

    /// Like [`FlagRegistry::set`] but hands back the bare parse failure so
    /// callers can word the error themselves.
    pub(crate) fn assign(&self, name: &str, raw: &str) -> std::result::Result<(), String> {
        let Some(entry) = self.entries.get(name) else {
            return Err("no such flag".to_string());
        };
        entry.cell.borrow_mut().set(raw)?;
        if let Some(slot) = &self.groups[entry.group].destination {
            write_destination(name, slot, &entry.cell.borrow());
        }
        self.mark_visited(name);
        Ok(())
    }

    pub(crate) fn mark_visited(&self, name: &str) {
        self.visited.borrow_mut().insert(name.to_string());
    }

    /// Aliases set on the command line (or via [`FlagRegistry::set`]), in order.
    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().iter().cloned().collect()
    }

    pub fn is_visited(&self, name: &str) -> bool {
        self.visited.borrow().contains(name)
    }

    /// Whether the alias' initial value came from an env var or a file.
    pub fn is_sourced(&self, name: &str) -> bool {
        self.entries
            .get(name)
            .is_some_and(|e| self.groups[e.group].origin.is_some())
    }

    /// Aliases that count as set: visited ones, then every alias of a
    /// sourced flag.
    pub fn set_names(&self) -> IndexSet<String> {
        let mut names = self.visited.borrow().clone();
        for group in self.groups.iter().filter(|g| g.origin.is_some()) {
            names.extend(group.names.iter().cloned());
        }
        names
    }

    pub(crate) fn shares_cell(&self, a: &str, b: &str) -> bool {
        match (self.entries.get(a), self.entries.get(b)) {
            (Some(a), Some(b)) => Rc::ptr_eq(&a.cell, &b.cell),
            _ => false,
        }
    }

    /// Display names of required flags that nothing has set.
    ///
    /// A flag counts as set when any alias was visited or sourced. It is
    /// reported by its last multi-character alias.
    pub fn missing_required(&self) -> Vec<String> {
        self.groups
            .iter()
            .filter(|g| g.required)
            .filter(|g| {
                g.origin.is_none() && !g.names.iter().any(|n| self.is_visited(n))
            })
            .filter_map(|g| {
                g.names
                    .iter()
                    .rev()
                    .find(|n| n.chars().count() > 1)
                    .or_else(|| g.names.last())
                    .cloned()
            })
            .collect()
    }
}

fn write_destination(flag: &str, slot: &DestinationSlot, value: &FlagValue) {
    if !slot.write(value) {
        tracing::warn!(flag, "destination type does not match flag type; not written");
    }
}
