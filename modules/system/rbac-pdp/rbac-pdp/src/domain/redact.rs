//! Field-level redaction of collection payloads.

use rbac_pdp_sdk::{CollectionData, Record};

/// Keep only the keys of each record that appear in `allowed_fields`.
///
/// Record key order, record order and collection order are those of `data`;
/// values are copied unchanged.
#[must_use]
pub fn redact(data: &CollectionData, allowed_fields: &[String]) -> CollectionData {
    data.map_records(|record| {
        record
            .iter()
            .filter(|(key, _)| allowed_fields.iter().any(|f| f == *key))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect::<Record>()
    })
}
