use uuid::Uuid;

use crate::records::{AttendanceRecord, GradeRecord, PaymentRecord};
use crate::store::{DraftOverlay, RecordStore, Scoped};

/// Stamping applied when a draft entry becomes a committed record.
pub trait Materialize {
    fn stamp(&mut self, id: String, actor: &str);
}

impl Materialize for AttendanceRecord {
    fn stamp(&mut self, id: String, actor: &str) {
        self.id = id;
        self.registrado_por = actor.to_string();
    }
}

impl Materialize for GradeRecord {
    fn stamp(&mut self, id: String, actor: &str) {
        self.id = id;
        self.registrado_por = actor.to_string();
    }
}

impl Materialize for PaymentRecord {
    fn stamp(&mut self, id: String, actor: &str) {
        self.id = id;
        self.registrado_por = actor.to_string();
    }
}

/// Turns the overlay's entries into committed records: fresh id per record,
/// actor stamped, nested objects carried over as-is. Does not mutate the
/// store or the overlay, so the caller can persist first and only then apply;
/// a failed persist leaves the user's edits intact.
pub fn materialize_scope<R>(drafts: &DraftOverlay<R>, actor: &str) -> Vec<R>
where
    R: Scoped + Clone + Materialize,
{
    let mut records: Vec<R> = drafts.entries().cloned().collect();
    for r in &mut records {
        r.stamp(Uuid::new_v4().to_string(), actor);
    }
    records
}

/// Second half of a successful commit: bulk-replace exactly the committed
/// scope in the store, then drop the overlay. Single synchronous state
/// replacement; no partial-scope result is observable.
pub fn apply_commit<R>(
    store: &mut RecordStore<R>,
    drafts: &mut DraftOverlay<R>,
    scope: &R::Scope,
    records: Vec<R>,
) where
    R: Scoped + Clone,
{
    store.replace_scope(scope, records);
    drafts.clear();
}
