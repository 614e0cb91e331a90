use std::borrow::Cow;

use shared::{domain::SortField, protocol::CatalogEntry};

/// Comparable text for `field`. Years compare by their decimal rendering; an
/// entry without a year has an empty key and sorts first.
pub fn sort_key(entry: &CatalogEntry, field: SortField) -> Cow<'_, str> {
    match field {
        SortField::Title => Cow::Borrowed(entry.title.as_str()),
        SortField::Year => match entry.year {
            Some(year) => Cow::Owned(year.to_string()),
            None => Cow::Borrowed(""),
        },
    }
}

/// Returns a reordered copy; `entries` is left untouched. Equal keys keep their input order.
pub fn sorted_entries(entries: &[CatalogEntry], field: SortField) -> Vec<CatalogEntry> {
    let mut sorted = entries.to_vec();
    // `sort_by` is stable.
    sorted.sort_by(|a, b| sort_key(a, field).cmp(&sort_key(b, field)));
    sorted
}
