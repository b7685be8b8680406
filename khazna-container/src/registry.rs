//! Binding registry — maps identifiers to bindings and aliases.
//!
//! The registry is pure data: it stores, replaces and looks up bindings,
//! and follows alias chains. All resolution logic lives in the resolver.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::binding::{Binding, Lifetime};
use crate::error::{KhaznaError, Result};
use crate::instance::Instance;

/// A stored binding with the revision it was written at.
#[derive(Debug, Clone)]
struct Entry {
    binding: Binding,
    revision: u64,
}

/// Stores all bindings and aliases of a container.
#[derive(Debug, Default)]
pub struct Registry {
    bindings: HashMap<String, Entry>,
    aliases: HashMap<String, String>,
    revision: u64,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `binding` under `id`, replacing any prior entry.
    ///
    /// An alias named `id` is dropped so the new binding is reachable.
    pub fn bind(&mut self, id: impl Into<String>, binding: Binding) {
        let id = id.into();
        if let Some(target) = self.aliases.remove(&id) {
            debug!(alias = %id, target = %target, "Dropped alias shadowing new binding");
        }

        self.revision += 1;
        debug!(id = %id, lifetime = %binding.lifetime(), "Registered binding");
        self.bindings.insert(
            id,
            Entry {
                binding,
                revision: self.revision,
            },
        );
    }

    /// Registers an alias: resolving `alias` will resolve `target` instead.
    pub fn alias(&mut self, alias: impl Into<String>, target: impl Into<String>) {
        let (alias, target) = (alias.into(), target.into());
        debug!(alias = %alias, target = %target, "Registered alias");
        self.aliases.insert(alias, target);
    }

    /// Follows the alias chain from `id` to an identifier without an alias.
    ///
    /// # Errors
    /// [`KhaznaError::AliasCycle`] if the chain returns to an identifier
    /// it already visited.
    pub fn resolve_alias(&self, id: &str) -> Result<String> {
        let mut current = id;
        let mut chain: Vec<&str> = vec![id];

        while let Some(next) = self.aliases.get(current) {
            trace!(from = %current, to = %next, "Following alias");
            if chain.contains(&next.as_str()) {
                chain.push(next);
                return Err(KhaznaError::AliasCycle {
                    chain: chain.into_iter().map(str::to_string).collect(),
                });
            }
            chain.push(next);
            current = next;
        }

        Ok(current.to_string())
    }

    /// Removes every alias pointing at `target`.
    pub fn remove_alias(&mut self, target: &str) {
        let before = self.aliases.len();
        self.aliases.retain(|_, aliased| aliased != target);
        debug!(target, removed = before - self.aliases.len(), "Removed aliases");
    }

    /// Deletes the binding for `id`. Aliases pointing at it stay.
    pub fn remove_binding(&mut self, id: &str) {
        if self.bindings.remove(id).is_some() {
            debug!(id, "Removed binding");
        }
    }

    /// Binding stored under `id` exactly (no alias resolution).
    pub fn get(&self, id: &str) -> Option<&Binding> {
        self.bindings.get(id).map(|entry| &entry.binding)
    }

    /// Binding for `id` together with its revision.
    pub(crate) fn get_revision(&self, id: &str) -> Option<(Binding, u64)> {
        self.bindings
            .get(id)
            .map(|entry| (entry.binding.clone(), entry.revision))
    }

    /// `true` iff a binding exists for the alias-resolved `id`.
    pub fn has(&self, id: &str) -> bool {
        self.resolve_alias(id)
            .map(|canonical| self.bindings.contains_key(&canonical))
            .unwrap_or(false)
    }

    /// `true` if `id` is an alias.
    pub fn is_alias(&self, id: &str) -> bool {
        self.aliases.contains_key(id)
    }

    /// Replaces the binding under `id` with a built instance.
    ///
    /// Only happens while the entry is still the one the instance was
    /// built from (`observed`, `None` for "no binding"); a binding written
    /// in the meantime wins. Returns whether the instance was stored.
    pub(crate) fn cache(&mut self, id: &str, instance: Instance, observed: Option<u64>) -> bool {
        let current = self.bindings.get(id).map(|entry| entry.revision);
        if current != observed {
            debug!(id, "Binding changed during construction, not caching");
            return false;
        }

        self.revision += 1;
        trace!(id, "Cached singleton instance");
        self.bindings.insert(
            id.to_string(),
            Entry {
                binding: Binding::Instance(instance),
                revision: self.revision,
            },
        );
        true
    }

    /// Returns the number of bindings.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Every bound identifier and alias.
    pub fn identifiers(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.bindings.keys().cloned().collect();
        ids.extend(self.aliases.keys().cloned());
        ids
    }

    /// Read-only copy of the registry for diagnostics.
    pub fn snapshot(&self) -> BindingsSnapshot {
        BindingsSnapshot {
            bindings: self
                .bindings
                .iter()
                .map(|(id, entry)| (id.clone(), BindingSummary::of(&entry.binding)))
                .collect(),
            aliases: self
                .aliases
                .iter()
                .map(|(alias, target)| (alias.clone(), target.clone()))
                .collect(),
        }
    }
}

/// Serializable description of one binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BindingSummary {
    Class { concrete: String, lifetime: Lifetime },
    Factory { parameters: Vec<String>, lifetime: Lifetime },
    Method { target: String, method: String, lifetime: Lifetime },
    Instance { type_name: String },
}

impl BindingSummary {
    fn of(binding: &Binding) -> Self {
        match binding {
            Binding::Class { concrete, lifetime } => BindingSummary::Class {
                concrete: concrete.clone(),
                lifetime: *lifetime,
            },
            Binding::Factory { factory, lifetime } => BindingSummary::Factory {
                parameters: factory
                    .parameters()
                    .iter()
                    .map(|p| p.name().to_string())
                    .collect(),
                lifetime: *lifetime,
            },
            Binding::Method {
                target,
                method,
                lifetime,
            } => BindingSummary::Method {
                target: target.clone(),
                method: method.clone(),
                lifetime: *lifetime,
            },
            Binding::Instance(instance) => BindingSummary::Instance {
                type_name: instance.type_name().to_string(),
            },
        }
    }
}

/// Read-only snapshot of bindings and aliases, sorted by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsSnapshot {
    pub bindings: BTreeMap<String, BindingSummary>,
    pub aliases: BTreeMap<String, String>,
}

impl fmt::Display for BindingsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, summary) in &self.bindings {
            match summary {
                BindingSummary::Class { concrete, lifetime } => {
                    writeln!(f, "{id} => class {concrete} ({lifetime})")?
                }
                BindingSummary::Factory { parameters, lifetime } => {
                    writeln!(f, "{id} => factory({}) ({lifetime})", parameters.join(", "))?
                }
                BindingSummary::Method { target, method, lifetime } => {
                    writeln!(f, "{id} => {target}::{method} ({lifetime})")?
                }
                BindingSummary::Instance { type_name } => {
                    writeln!(f, "{id} => instance of {type_name}")?
                }
            }
        }
        for (alias, target) in &self.aliases {
            writeln!(f, "{alias} -> {target}")?;
        }
        Ok(())
    }
}
