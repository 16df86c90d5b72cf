// SPDX-FileCopyrightText: 2026 Gantry Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session-scoped tool registry, indexed by tool name.
//!
//! The registry is plain data behind an `RwLock` owned by the session; all
//! methods take `&self` or `&mut self` and never block on I/O. Entries are
//! stored as `Arc<ToolEntry>` so lookups hand out cheap clones that stay
//! valid while a call is in flight, even if the entry is replaced meanwhile.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use crate::error::GantryError;
use crate::tool::{ToolEntry, ToolKind, ToolKindTag};

/// Whether dynamic registration augments eligible tools with payment gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMode {
    #[default]
    Disabled,
    Required,
}

/// Registry of the tools exposed to one session.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<ToolEntry>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry unless the name is already taken.
    ///
    /// Returns `true` if the entry was added. Adding a duplicate name is not
    /// an error; the existing entry wins and `false` is returned.
    pub fn insert(&mut self, entry: ToolEntry) -> bool {
        if self.tools.contains_key(&entry.name) {
            return false;
        }
        self.tools.insert(entry.name.clone(), Arc::new(entry));
        true
    }

    /// Add or replace entries, applying payment augmentation when asked.
    ///
    /// With [`PaymentMode::Required`], each payment-eligible entry is
    /// replaced by its augmented copy before registration; augmentation is
    /// idempotent, so re-upserting an already augmented entry is harmless.
    /// Returns the entries as registered, in input order.
    pub fn upsert(
        &mut self,
        entries: Vec<ToolEntry>,
        payment: PaymentMode,
    ) -> Result<Vec<Arc<ToolEntry>>, GantryError> {
        let mut registered = Vec::with_capacity(entries.len());
        for entry in entries {
            let entry = if payment == PaymentMode::Required && entry.payment_eligible {
                entry.with_payment_token()?
            } else {
                entry
            };
            let entry = Arc::new(entry);
            self.tools.insert(entry.name.clone(), Arc::clone(&entry));
            registered.push(entry);
        }
        Ok(registered)
    }

    /// Remove entries by name, ignoring names that are not registered.
    ///
    /// Returns the names actually removed.
    pub fn remove(&mut self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|name| self.tools.remove(name.as_str()).is_some())
            .cloned()
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<ToolEntry>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// All registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Names of entries with the given kind, sorted.
    pub fn names_by_kind(&self, tag: ToolKindTag) -> Vec<String> {
        let mut names: Vec<String> = self
            .tools
            .values()
            .filter(|entry| entry.kind.tag() == tag)
            .map(|entry| entry.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Distinct owner actor ids across all proxied entries, sorted.
    pub fn proxied_owner_ids(&self) -> Vec<String> {
        let owners: BTreeSet<String> = self
            .tools
            .values()
            .filter_map(|entry| match &entry.kind {
                ToolKind::Proxied { owner_id, .. } => Some(owner_id.clone()),
                _ => None,
            })
            .collect();
        owners.into_iter().collect()
    }

    /// All entries sorted by name, for wire listings.
    pub fn entries(&self) -> Vec<Arc<ToolEntry>> {
        let mut entries: Vec<Arc<ToolEntry>> = self.tools.values().cloned().collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        entries
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
