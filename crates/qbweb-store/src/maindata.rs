//! Incremental merge of `/sync/maindata` payloads into the cached snapshot.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use qbweb_models::{Category, MainData, MainDataUpdate, Torrent};

use crate::error::{StoreError, StoreResult};

/// Compute the snapshot that results from applying `update` to `current`.
///
/// A full update replaces everything. A delta needs a populated snapshot and
/// is merged onto a copy of it, leaving `current` untouched.
///
/// # Errors
///
/// Returns [`StoreError::NotPopulated`] when a delta arrives with no snapshot.
pub fn apply_update(current: Option<&MainData>, update: MainDataUpdate) -> StoreResult<MainData> {
    if update.full_update {
        return Ok(MainData::from(update));
    }
    let current = current.ok_or(StoreError::NotPopulated { rid: update.rid })?;
    Ok(merge_delta(current, update))
}

/// Merge a delta onto a copy of `current`.
///
/// Removals are applied before additions, so a key that is both removed and
/// redefined in the same delta is recreated from the delta's fields alone.
#[must_use]
pub fn merge_delta(current: &MainData, update: MainDataUpdate) -> MainData {
    let MainDataUpdate {
        rid,
        full_update: _,
        torrents,
        torrents_removed,
        categories,
        categories_removed,
        tags,
        tags_removed,
        server_state,
    } = update;

    let mut next = current.clone();

    for hash in &torrents_removed {
        next.torrents.remove(hash);
    }
    for name in &categories_removed {
        next.categories.remove(name);
    }
    if !tags_removed.is_empty() {
        next.tags.retain(|tag| !tags_removed.contains(tag));
    }

    // Tags are append-only in a delta; duplicates are kept as sent.
    next.tags.extend(tags);

    merge_records(&mut next.torrents, torrents, Torrent::apply);
    merge_records(&mut next.categories, categories, Category::apply);
    if let Some(patch) = server_state {
        next.server_state.apply(patch);
    }

    next.rid = rid;
    next
}

fn merge_records<R, P>(
    records: &mut BTreeMap<String, R>,
    patches: BTreeMap<String, P>,
    apply: fn(&mut R, P),
)
where
    R: From<P>,
{
    for (key, patch) in patches {
        match records.entry(key) {
            Entry::Occupied(mut entry) => apply(entry.get_mut(), patch),
            Entry::Vacant(entry) => {
                entry.insert(R::from(patch));
            }
        }
    }
}
