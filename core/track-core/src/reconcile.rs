//! Folds snapshot, ephemeral and persisted rows into one history list.
//!
//! Priority is fixed: prepended rows, then ephemeral rows, then persisted
//! rows sorted newest first. The first row with a given [`ActivityKey`] wins,
//! so a locally known row shadows a persisted twin. The result is capped.

use std::collections::HashSet;

use crate::timeline::{sort_newest_first, ActivityKey, ActivityRow};

pub const MAX_ACTIVITY_ROWS: usize = 10;

pub fn reconcile(
    persisted: &[ActivityRow],
    prepend: &[ActivityRow],
    ephemeral: &[ActivityRow],
) -> Vec<ActivityRow> {
    reconcile_with_limit(persisted, prepend, ephemeral, MAX_ACTIVITY_ROWS)
}

pub fn reconcile_with_limit(
    persisted: &[ActivityRow],
    prepend: &[ActivityRow],
    ephemeral: &[ActivityRow],
    limit: usize,
) -> Vec<ActivityRow> {
    let mut history = persisted.to_vec();
    sort_newest_first(&mut history);

    let mut seen: HashSet<ActivityKey> = HashSet::new();
    prepend
        .iter()
        .chain(ephemeral.iter())
        .chain(history.iter())
        .filter(|row| seen.insert(row.key()))
        .take(limit)
        .cloned()
        .collect()
}
