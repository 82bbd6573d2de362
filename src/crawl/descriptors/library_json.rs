use super::LOG_TARGET;
use serde_json::{Map, Value};

/// Fields of a PlatformIO `library.json` file.
///
/// List-valued fields are flattened into a single comma-separated string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LibraryManifest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub keywords: Option<String>,
    pub authors: Option<String>,
    pub repository: Option<String>,
    pub version: Option<String>,
    pub license: Option<String>,
    pub download_url: Option<String>,
    pub homepage: Option<String>,
    pub frameworks: Option<String>,
    pub platforms: Option<String>,
}

#[derive(Debug, Clone, Copy)]
enum Shape {
    Scalar,
    List,
    Authors,
    Repository,
}

impl LibraryManifest {
    /// Fill fields from a decoded `library.json` document.
    ///
    /// Fields of an unexpected shape are skipped with a warning naming `context`.
    pub fn parse(&mut self, doc: &Value, context: &str) {
        let Value::Object(fields) = doc else {
            log::warn!(target: LOG_TARGET, "Ignoring library.json of '{context}', the document is not an object");
            return;
        };

        fill(&mut self.name, extract(fields, "name", Shape::Scalar, context));
        fill(&mut self.description, extract(fields, "description", Shape::Scalar, context));
        fill(&mut self.keywords, extract(fields, "keywords", Shape::List, context));
        fill(&mut self.authors, extract(fields, "authors", Shape::Authors, context));
        fill(&mut self.repository, extract(fields, "repository", Shape::Repository, context));
        fill(&mut self.version, extract(fields, "version", Shape::Scalar, context));
        fill(&mut self.license, extract(fields, "license", Shape::Scalar, context));
        fill(&mut self.download_url, extract(fields, "downloadUrl", Shape::Scalar, context));
        fill(&mut self.homepage, extract(fields, "homepage", Shape::Scalar, context));
        fill(&mut self.frameworks, extract(fields, "frameworks", Shape::List, context));
        fill(&mut self.platforms, extract(fields, "platforms", Shape::List, context));
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *slot = value;
    }
}

fn extract(fields: &Map<String, Value>, key: &str, shape: Shape, context: &str) -> Option<String> {
    let value = fields.get(key)?;

    let text = match shape {
        Shape::Scalar => scalar_text(value),
        Shape::List => joined(value, scalar_text),
        Shape::Authors => match value {
            Value::Object(_) => author_name(value),
            _ => joined(value, author_name),
        },
        Shape::Repository => value.get("url").and_then(scalar_text),
    };

    if text.is_none() {
        log::warn!(target: LOG_TARGET, "Can't handle type of library.json {key} field for '{context}'");
    }

    text
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn author_name(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(fields) => fields.get("name").and_then(scalar_text),
        _ => None,
    }
}

/// A single item, or every item of a list joined with `", "`.
fn joined(value: &Value, item: fn(&Value) -> Option<String>) -> Option<String> {
    match value {
        Value::Array(items) => items.iter().map(item).collect::<Option<Vec<_>>>().map(|parts| parts.join(", ")),
        _ => item(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(doc: &Value) -> LibraryManifest {
        let mut manifest = LibraryManifest::default();
        manifest.parse(doc, "https://github.com/octo/blink");
        manifest
    }

    #[test]
    fn test_authors_list_of_strings() {
        assert_eq!(parse(&json!({ "authors": ["A", "B"] })).authors.as_deref(), Some("A, B"));
    }

    #[test]
    fn test_authors_object() {
        assert_eq!(parse(&json!({ "authors": { "name": "A", "email": "a@x" } })).authors.as_deref(), Some("A"));
    }

    #[test]
    fn test_authors_list_of_objects() {
        let doc = json!({ "authors": [{ "name": "A", "maintainer": true }, { "name": "B" }] });
        assert_eq!(parse(&doc).authors.as_deref(), Some("A, B"));
    }

    #[test]
    fn test_authors_string() {
        assert_eq!(parse(&json!({ "authors": "Jane Doe" })).authors.as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_authors_object_without_name_is_skipped() {
        assert_eq!(parse(&json!({ "authors": { "email": "a@x" } })).authors, None);
    }

    #[test]
    fn test_string_or_list_fields() {
        let doc = json!({
            "frameworks": "arduino",
            "platforms": ["atmelavr", "espressif8266"],
            "keywords": ["servo", "motor"],
        });
        let manifest = parse(&doc);

        assert_eq!(manifest.frameworks.as_deref(), Some("arduino"));
        assert_eq!(manifest.platforms.as_deref(), Some("atmelavr, espressif8266"));
        assert_eq!(manifest.keywords.as_deref(), Some("servo, motor"));
    }

    #[test]
    fn test_keywords_string_kept_verbatim() {
        assert_eq!(parse(&json!({ "keywords": "servo, motor" })).keywords.as_deref(), Some("servo, motor"));
    }

    #[test]
    fn test_scalars() {
        let doc = json!({
            "name": "Blink",
            "description": "Blinks things",
            "version": 1.5,
            "license": "MIT",
            "downloadUrl": "https://example.com/blink.zip",
            "homepage": "https://example.com",
            "repository": { "type": "git", "url": "https://github.com/octo/blink.git" },
        });
        let manifest = parse(&doc);

        assert_eq!(manifest.name.as_deref(), Some("Blink"));
        assert_eq!(manifest.description.as_deref(), Some("Blinks things"));
        assert_eq!(manifest.version.as_deref(), Some("1.5"));
        assert_eq!(manifest.license.as_deref(), Some("MIT"));
        assert_eq!(manifest.download_url.as_deref(), Some("https://example.com/blink.zip"));
        assert_eq!(manifest.homepage.as_deref(), Some("https://example.com"));
        assert_eq!(manifest.repository.as_deref(), Some("https://github.com/octo/blink.git"));
    }

    #[test]
    fn test_unexpected_shapes_are_skipped() {
        let doc = json!({
            "name": ["not", "a", "scalar"],
            "repository": "https://github.com/octo/blink",
            "frameworks": [{ "name": "arduino" }],
            "version": null,
            "homepage": "https://example.com",
        });
        let manifest = parse(&doc);

        assert_eq!(manifest.name, None);
        assert_eq!(manifest.repository, None);
        assert_eq!(manifest.frameworks, None);
        assert_eq!(manifest.version, None);
        assert_eq!(manifest.homepage.as_deref(), Some("https://example.com"));
    }

    #[test]
    fn test_non_object_document() {
        assert_eq!(parse(&json!(["name", "Blink"])), LibraryManifest::default());
        assert_eq!(parse(&Value::Null), LibraryManifest::default());
    }

    #[test]
    fn test_missing_fields_keep_previous_values() {
        let mut manifest = LibraryManifest {
            name: Some("Earlier".to_string()),
            ..LibraryManifest::default()
        };
        manifest.parse(&json!({ "version": "2.0.0" }), "ctx");

        assert_eq!(manifest.name.as_deref(), Some("Earlier"));
        assert_eq!(manifest.version.as_deref(), Some("2.0.0"));
    }
}
