use std::collections::HashMap;
use std::hash::Hash;

/// A record addressable by composite key: owning entity + period scope.
/// Attendance scopes by date, grades by (student, periodo, anio), payments by
/// invoice month.
pub trait Scoped {
    type Scope: Clone + Eq + Hash;

    fn entity_id(&self) -> &str;
    fn scope(&self) -> Self::Scope;
}

/// Authoritative set of committed records for one session. At most one record
/// per (entity, scope) key; a re-commit of a scope replaces that scope
/// wholesale.
pub struct RecordStore<R: Scoped> {
    records: HashMap<(String, R::Scope), R>,
}

impl<R: Scoped> Default for RecordStore<R> {
    fn default() -> Self {
        RecordStore {
            records: HashMap::new(),
        }
    }
}

impl<R: Scoped + Clone> RecordStore<R> {
    /// Committed record for a key, ignoring drafts. Absent key is not an
    /// error.
    pub fn get(&self, entity_id: &str, scope: &R::Scope) -> Option<&R> {
        self.records.get(&(entity_id.to_string(), scope.clone()))
    }

    /// Draft-precedence lookup: an unsaved edit for the key shadows the
    /// committed value until commit or discard.
    pub fn get_effective<'a>(
        &'a self,
        drafts: &'a DraftOverlay<R>,
        entity_id: &str,
        scope: &R::Scope,
    ) -> Option<&'a R> {
        drafts
            .get(scope, entity_id)
            .or_else(|| self.get(entity_id, scope))
    }

    pub fn all<F>(&self, filter: F) -> Vec<&R>
    where
        F: Fn(&R) -> bool,
    {
        self.records.values().filter(|r| filter(r)).collect()
    }

    pub fn in_scope(&self, scope: &R::Scope) -> Vec<&R> {
        self.records
            .values()
            .filter(|r| r.scope() == *scope)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Single-record upsert, used by hydration and by flows that commit one
    /// record at a time (payments).
    pub fn upsert(&mut self, record: R) {
        self.records
            .insert((record.entity_id().to_string(), record.scope()), record);
    }

    /// Bulk replace of one scope: every committed record in `scope` is
    /// dropped, then `records` are inserted. Records in other scopes are
    /// untouched. A record omitted from `records` for an already-committed
    /// scope does not survive.
    pub fn replace_scope(&mut self, scope: &R::Scope, records: Vec<R>) {
        self.records.retain(|(_, s), _| s != scope);
        for r in records {
            self.upsert(r);
        }
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// Transient edit buffer for the scope currently open in an editor. Entries
/// share the record shape; id and actor stay empty until materialization.
/// Never touches the store.
pub struct DraftOverlay<R: Scoped> {
    open_scope: Option<R::Scope>,
    entries: HashMap<String, R>,
}

impl<R: Scoped> Default for DraftOverlay<R> {
    fn default() -> Self {
        DraftOverlay {
            open_scope: None,
            entries: HashMap::new(),
        }
    }
}

impl<R: Scoped + Clone> DraftOverlay<R> {
    /// Opens an editing session for `scope`, discarding any previous one.
    pub fn open(&mut self, scope: R::Scope) {
        self.open_scope = Some(scope);
        self.entries.clear();
    }

    pub fn open_scope(&self) -> Option<&R::Scope> {
        self.open_scope.as_ref()
    }

    pub fn is_open(&self, scope: &R::Scope) -> bool {
        self.open_scope.as_ref() == Some(scope)
    }

    pub fn get(&self, scope: &R::Scope, entity_id: &str) -> Option<&R> {
        if !self.is_open(scope) {
            return None;
        }
        self.entries.get(entity_id)
    }

    pub fn get_mut(&mut self, entity_id: &str) -> Option<&mut R> {
        self.entries.get_mut(entity_id)
    }

    pub fn put(&mut self, record: R) {
        self.entries.insert(record.entity_id().to_string(), record);
    }

    /// Field-level edit helper: mutates the existing entry or seeds one from
    /// `seed` first, preserving the other fields either way.
    pub fn upsert_with<F>(&mut self, entity_id: &str, seed: impl FnOnce() -> R, edit: F)
    where
        F: FnOnce(&mut R),
    {
        let entry = self
            .entries
            .entry(entity_id.to_string())
            .or_insert_with(seed);
        edit(entry);
    }

    pub fn entries(&self) -> impl Iterator<Item = &R> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Discards all pending edits; called after a successful commit or an
    /// explicit cancel.
    pub fn clear(&mut self) {
        self.open_scope = None;
        self.entries.clear();
    }
}
