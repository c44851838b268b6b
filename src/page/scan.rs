//! Locating marker-tagged objects in a page.

use serde_json::Value;

use super::path::JsonPath;
use super::walker::walk;
use crate::table::MarkerEntry;

/// Key holding an object's name
pub const NAME_KEY: &str = "name";
/// Key of the nested object that carries an object's displayed text
pub const TEXT_CONTAINER_KEY: &str = "attributedString";
/// Key of the displayed text inside [`TEXT_CONTAINER_KEY`]
pub const TEXT_KEY: &str = "string";

/// A `name` field whose value starts with the marker prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedName {
    /// Path of the object owning the `name` field
    pub owner: JsonPath,
    pub label: String,
}

/// Every marker-tagged `name` in the page, in document order.
pub fn marked_names(page: &Value, prefix: &str) -> Vec<MarkedName> {
    walk(page)
        .filter(|(path, _)| path.last().is_some_and(|c| c.is_key(NAME_KEY)))
        .filter_map(|(path, value)| {
            let label = value.as_str().filter(|name| name.starts_with(prefix))?;
            Some(MarkedName {
                owner: path.parent()?,
                label: label.to_string(),
            })
        })
        .collect()
}

/// The displayed text of an object, if it has one
pub fn displayed_text(object: &Value) -> Option<&str> {
    object.get(TEXT_CONTAINER_KEY)?.get(TEXT_KEY)?.as_str()
}

/// Mutable access to the displayed text of an object, if it has one
pub fn displayed_text_mut(object: &mut Value) -> Option<&mut String> {
    match object.get_mut(TEXT_CONTAINER_KEY)?.get_mut(TEXT_KEY)? {
        Value::String(text) => Some(text),
        _ => None,
    }
}

/// Marker entries of one page: every marker-tagged object that also has
/// displayed text, in document order. Duplicates are kept.
pub fn collect_entries(page: &Value, prefix: &str) -> Vec<MarkerEntry> {
    marked_names(page, prefix)
        .into_iter()
        .filter_map(|marked| {
            let owner = marked.owner.resolve(page)?;
            match displayed_text(owner) {
                Some(text) => Some(MarkerEntry::new(marked.label, text)),
                None => {
                    log::debug!("'{}' at {} has no displayed text", marked.label, marked.owner);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page() -> Value {
        json!({
            "name": "Page 1",
            "layers": [
                {
                    "name": "%%greeting",
                    "attributedString": {"string": "Hello"},
                    "layers": [
                        {"name": "%%nested", "attributedString": {"string": "Deep"}}
                    ]
                },
                {"name": "%%shape", "frame": {"x": 1}},
                {"name": "Plain text", "attributedString": {"string": "skip me"}},
                {"name": 42, "attributedString": {"string": "number name"}},
                {"overrides": [{"name": "%%override", "attributedString": {"string": "Inside"}}]}
            ]
        })
    }

    #[test]
    fn finds_marked_names_anywhere() {
        let names: Vec<_> = marked_names(&page(), "%%")
            .into_iter()
            .map(|m| (m.owner.to_string(), m.label))
            .collect();
        assert_eq!(
            names,
            [
                ("/layers/0".to_string(), "%%greeting".to_string()),
                ("/layers/0/layers/0".to_string(), "%%nested".to_string()),
                ("/layers/1".to_string(), "%%shape".to_string()),
                ("/layers/4/overrides/0".to_string(), "%%override".to_string()),
            ]
        );
    }

    #[test]
    fn entries_require_displayed_text() {
        let entries = collect_entries(&page(), "%%");
        assert_eq!(
            entries,
            [
                MarkerEntry::new("%%greeting", "Hello"),
                MarkerEntry::new("%%nested", "Deep"),
                MarkerEntry::new("%%override", "Inside"),
            ]
        );
    }

    #[test]
    fn custom_prefix_is_honoured() {
        let doc = json!({"layers": [
            {"name": "##a", "attributedString": {"string": "A"}},
            {"name": "%%b", "attributedString": {"string": "B"}}
        ]});
        assert_eq!(collect_entries(&doc, "##"), [MarkerEntry::new("##a", "A")]);
    }

    #[test]
    fn displayed_text_ignores_non_strings() {
        let mut doc = json!({"attributedString": {"string": 5}});
        assert_eq!(displayed_text(&doc), None);
        assert!(displayed_text_mut(&mut doc).is_none());
    }
}
