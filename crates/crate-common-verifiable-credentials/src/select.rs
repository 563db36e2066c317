//! Sparse selection of a JSON-LD document by JSON pointers.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use serde_json::Map;
use serde_json::Value;

use common_types::log_error;
use common_types::ProofError;

use crate::json_pointer::JsonPointer;
use crate::json_pointer::JsonPointerBuf;

enum Selection {
    /// Copied whole from the source.
    Full(Value),
    Object(BTreeMap<String, Selection>),
    /// Keyed by source index so the result keeps the source order once made dense.
    Array(BTreeMap<usize, Selection>),
}

impl Selection {
    fn initial_for(source: &Value) -> Self {
        match source {
            Value::Array(_) => Selection::Array(BTreeMap::new()),
            Value::Object(map) => {
                let mut selection = BTreeMap::new();
                if let Some(id) = map.get("id") {
                    if !id.as_str().is_some_and(|id| id.starts_with("_:")) {
                        selection.insert("id".into(), Selection::Full(id.clone()));
                    }
                }
                if let Some(t) = map.get("type") {
                    selection.insert("type".into(), Selection::Full(t.clone()));
                }
                Selection::Object(selection)
            }
            other => Selection::Full(other.clone()),
        }
    }

    fn into_value(self) -> Value {
        match self {
            Selection::Full(v) => v,
            Selection::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.into_value()))
                    .collect::<Map<String, Value>>(),
            ),
            Selection::Array(items) => {
                Value::Array(items.into_values().map(Selection::into_value).collect())
            }
        }
    }
}

fn pointer_mismatch(pointer: &JsonPointer) -> ProofError {
    log_error!(ProofError::MalformedInput(format!(
        "JSON pointer \"{pointer}\" does not match document"
    )))
}

fn select_path(
    document: &Value,
    pointer: &JsonPointer,
    root: &mut Selection,
) -> Result<(), ProofError> {
    let mut value = document;
    let mut selected = root;
    for token in pointer {
        // a fully copied ancestor already contains everything below it
        if matches!(selected, Selection::Full(_)) {
            return Ok(());
        }
        let (child, slot) = match (value, selected) {
            (Value::Object(map), Selection::Object(sel)) => {
                let key = token.to_str();
                let child = map.get(key.as_ref()).ok_or_else(|| pointer_mismatch(pointer))?;
                let slot = sel
                    .entry(key.into_owned())
                    .or_insert_with(|| Selection::initial_for(child));
                (child, slot)
            }
            (Value::Array(items), Selection::Array(sel)) => {
                let index = token
                    .as_array_index()
                    .ok_or_else(|| pointer_mismatch(pointer))?;
                let child = items.get(index).ok_or_else(|| pointer_mismatch(pointer))?;
                let slot = sel
                    .entry(index)
                    .or_insert_with(|| Selection::initial_for(child));
                (child, slot)
            }
            _ => return Err(pointer_mismatch(pointer)),
        };
        value = child;
        selected = slot;
    }
    *selected = Selection::Full(value.clone());
    Ok(())
}

/// Builds the sub-document holding exactly the branches `pointers` name.
///
/// Every object along a selected path keeps its `id` (unless it is a blank node id) and `type`
/// so the selection describes the same graph nodes as the source. Returns `None` when nothing is
/// selected.
pub fn select_json_ld(
    document: &Value,
    pointers: &[JsonPointerBuf],
) -> Result<Option<Value>, ProofError> {
    if !document.is_object() {
        return Err(log_error!(ProofError::MalformedInput(
            "document to select from is not an object".into()
        )));
    }
    if pointers.is_empty() {
        return Ok(None);
    }
    if pointers.iter().any(|p| p.is_root()) {
        return Ok(Some(document.clone()));
    }

    let mut root = Selection::initial_for(document);
    for pointer in pointers {
        select_path(document, pointer, &mut root)?;
    }

    let mut selection = root.into_value();
    if let (Some(context), Value::Object(map)) = (document.get("@context"), &mut selection) {
        map.insert("@context".into(), context.clone());
    }
    Ok(Some(selection))
}

/// Top level properties other than the ones every credential must disclose, as pointers. Used
/// when a holder does not name what to reveal.
pub fn default_selective_pointers(document: &Value) -> Result<Vec<JsonPointerBuf>, ProofError> {
    let map = document.as_object().ok_or_else(|| {
        log_error!(ProofError::MalformedInput("document is not an object".into()))
    })?;
    map.keys()
        .filter(|k| !matches!(k.as_str(), "id" | "type" | "issuer" | "proof" | "@context"))
        .map(|k| JsonPointerBuf::new(format!("/{}", k.replace('~', "~0").replace('/', "~1"))))
        .collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::json_pointer::parse_pointers;

    fn windsurf() -> Value {
        json!({
            "@context": ["https://www.w3.org/ns/credentials/v2", {"@vocab": "https://windsurf.grotto-networking.com/selective#"}],
            "type": ["VerifiableCredential"],
            "issuer": "https://vc.example/windsurf/racecommittee",
            "credentialSubject": {
                "id": "_:subject",
                "sailNumber": "Earth101",
                "sails": [
                    {"size": 5.5, "sailName": "Kihei", "year": 2023},
                    {"size": 6.1, "sailName": "Lahaina", "year": 2023},
                    {"size": 7.0, "sailName": "Lahaina", "year": 2020}
                ],
                "boards": [
                    {"boardName": "CompFoil170", "brand": "Wailea", "year": 2022}
                ]
            }
        })
    }

    #[test]
    fn test_select_paths() {
        let pointers = parse_pointers([
            "/issuer",
            "/credentialSubject/sails/2",
            "/credentialSubject/sails/0/year",
            "/credentialSubject/boards/0/year",
        ])
        .unwrap();
        let selected = select_json_ld(&windsurf(), &pointers).unwrap().unwrap();
        assert_eq!(
            selected,
            json!({
                "@context": ["https://www.w3.org/ns/credentials/v2", {"@vocab": "https://windsurf.grotto-networking.com/selective#"}],
                "type": ["VerifiableCredential"],
                "issuer": "https://vc.example/windsurf/racecommittee",
                "credentialSubject": {
                    "sails": [
                        {"year": 2023},
                        {"size": 7.0, "sailName": "Lahaina", "year": 2020}
                    ],
                    "boards": [{"year": 2022}]
                }
            })
        );
    }

    #[test]
    fn test_select_nothing_or_everything() {
        assert_eq!(select_json_ld(&windsurf(), &[]).unwrap(), None);
        let all = parse_pointers(["", "/issuer"]).unwrap();
        assert_eq!(select_json_ld(&windsurf(), &all).unwrap(), Some(windsurf()));
    }

    #[test]
    fn test_select_keeps_named_ids() {
        let doc = json!({
            "@context": "https://www.w3.org/ns/credentials/v2",
            "id": "urn:uuid:1",
            "credentialSubject": {"id": "did:example:1", "type": "Person", "name": "x", "age": 3}
        });
        let pointers = parse_pointers(["/credentialSubject/age"]).unwrap();
        let selected = select_json_ld(&doc, &pointers).unwrap().unwrap();
        assert_eq!(
            selected,
            json!({
                "@context": "https://www.w3.org/ns/credentials/v2",
                "id": "urn:uuid:1",
                "credentialSubject": {"id": "did:example:1", "type": "Person", "age": 3}
            })
        );
    }

    #[test]
    fn test_select_missing_path() {
        for p in ["/nope", "/credentialSubject/sails/9", "/credentialSubject/sails/01", "/issuer/x"] {
            let pointers = parse_pointers([p]).unwrap();
            assert!(matches!(
                select_json_ld(&windsurf(), &pointers),
                Err(ProofError::MalformedInput(_))
            ));
        }
    }

    #[test]
    fn test_default_selective_pointers() {
        let pointers = default_selective_pointers(&json!({
            "@context": [], "id": "x", "type": [], "issuer": "y", "proof": {},
            "credentialSubject": {}, "a/b": 1
        }))
        .unwrap();
        let pointers: Vec<_> = pointers.iter().map(|p| p.as_str()).collect();
        assert_eq!(pointers, ["/a~1b", "/credentialSubject"]);
    }
}
