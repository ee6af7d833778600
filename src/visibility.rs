// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Viewer-scoped filtering of trips and expenses.
//!
//! A record is visible when it is public or when the viewer created it.
//! Callers pass the viewer explicitly; `None` means an anonymous caller,
//! who only ever sees public records.

use crate::models::Visibility;
use crate::storage::CreatedResource;

/// Records carrying a visibility policy.
pub trait Visible: CreatedResource {
    fn visibility(&self) -> Visibility;
}

/// Whether `viewer_id` may read `record`.
pub fn is_visible<T: Visible + ?Sized>(record: &T, viewer_id: Option<&str>) -> bool {
    record.visibility() == Visibility::Public || record.is_created_by(viewer_id)
}

/// Keep the records `viewer_id` may read, preserving their order.
pub fn filter<T: Visible + Clone>(records: &[T], viewer_id: Option<&str>) -> Vec<T> {
    records
        .iter()
        .filter(|record| is_visible(*record, viewer_id))
        .cloned()
        .collect()
}
