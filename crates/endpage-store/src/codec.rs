//! Flat-field encoding: `;`-joined lists and a JSON object inside a
//! single CSV cell. The empty list encodes as the empty string and must
//! decode back to an empty vector, never `[""]`.

use uuid::Uuid;

use endpage_types::models::CustomTheme;

use crate::StoreError;

pub fn join(values: &[String]) -> String {
    values.join(";")
}

pub fn split(field: &str) -> Vec<String> {
    if field.is_empty() {
        Vec::new()
    } else {
        field.split(';').map(str::to_string).collect()
    }
}

pub fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(Uuid::to_string)
        .collect::<Vec<_>>()
        .join(";")
}

pub fn split_ids(field: &str) -> Result<Vec<Uuid>, StoreError> {
    if field.is_empty() {
        return Ok(Vec::new());
    }
    field
        .split(';')
        .map(|s| {
            s.parse::<Uuid>()
                .map_err(|e| StoreError::Field(format!("bad user id '{s}': {e}")))
        })
        .collect()
}

pub fn encode_theme(theme: Option<&CustomTheme>) -> String {
    theme
        .map(|t| serde_json::to_string(t).unwrap_or_default())
        .unwrap_or_default()
}

pub fn decode_theme(field: &str) -> Result<Option<CustomTheme>, StoreError> {
    if field.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(field)
        .map(Some)
        .map_err(|e| StoreError::Field(format!("bad theme json: {e}")))
}
