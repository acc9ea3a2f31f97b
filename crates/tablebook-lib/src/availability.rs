//! Pure interval arithmetic used to decide whether a slot is free.
//!
//! Slots are half-open: `[start, end)`. Two slots overlap iff
//! `s1 < e2 && s2 < e1`, so a booking ending at 18:00 and one starting at
//! 18:00 can sit back to back on the same table.

use crate::model::Slot;

/// Whether `candidate` and `existing` share any instant.
pub fn overlaps(candidate: &Slot, existing: &Slot) -> bool {
    candidate.start() < existing.end() && existing.start() < candidate.end()
}

/// Earliest slot in `existing` that overlaps `candidate`, if any.
///
/// The result does not depend on the order of `existing`.
pub fn find_conflict<'a, I>(candidate: &Slot, existing: I) -> Option<&'a Slot>
where
    I: IntoIterator<Item = &'a Slot>,
{
    existing
        .into_iter()
        .filter(|slot| overlaps(candidate, slot))
        .min()
}

/// All slots in `existing` that overlap `candidate`, ordered by start time.
pub fn find_conflicts<'a, I>(candidate: &Slot, existing: I) -> Vec<&'a Slot>
where
    I: IntoIterator<Item = &'a Slot>,
{
    let mut conflicts: Vec<&Slot> = existing
        .into_iter()
        .filter(|slot| overlaps(candidate, slot))
        .collect();
    conflicts.sort();
    conflicts
}

/// Shorthand for `find_conflict(..).is_none()`.
pub fn is_available<'a, I>(candidate: &Slot, existing: I) -> bool
where
    I: IntoIterator<Item = &'a Slot>,
{
    find_conflict(candidate, existing).is_none()
}
