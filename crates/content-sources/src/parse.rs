// FILE: crates/content-sources/src/parse.rs
//! Lenient provider response parsing
//!
//! Field names seen across providers are accepted (`authors`, `seriesPart`,
//! `image`, ...). People lists may be strings or `{ "name": .. }` objects.
//! Anything of the wrong shape is dropped.

use serde_json::Value;
use shelfsort_core::Metadata;

/// Parses a raw response body; malformed JSON or no usable record yields `None`
pub fn parse_response(body: &str) -> Option<Metadata> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            log::debug!("Discarding malformed resolver response: {}", e);
            return None;
        }
    };

    match &value {
        Value::Array(items) => items.iter().find_map(metadata_from_value),
        Value::Object(map) => ["results", "products", "items"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
            .map(|items| items.iter().find_map(metadata_from_value))
            .unwrap_or_else(|| metadata_from_value(&value)),
        _ => None,
    }
}

/// Builds metadata from one record; `None` when no title is present
pub fn metadata_from_value(value: &Value) -> Option<Metadata> {
    let obj = value.as_object()?;
    let field = |names: &[&str]| names.iter().find_map(|n| obj.get(*n));

    let title = field(&["title", "name"]).and_then(text)?;
    let author = field(&["author", "authors"]).and_then(people).unwrap_or_default();

    let mut meta = Metadata::new(title, author);
    meta.narrator = field(&["narrator", "narrators"]).and_then(people);
    meta.description = field(&["description", "summary"]).and_then(text);
    meta.cover = field(&["cover", "image", "cover_url", "coverUrl"]).and_then(text);
    meta.asin = field(&["asin", "id"]).and_then(text);

    match field(&["series"]) {
        Some(Value::Array(list)) => {
            if let Some((name, part)) = list.iter().find_map(series_entry) {
                meta.series = Some(name);
                meta.series_part = part;
            }
        }
        Some(other) => {
            if let Some((name, part)) = series_entry(other) {
                meta.series = Some(name);
                meta.series_part = part;
            }
        }
        None => {}
    }

    if let Some(part) = field(&["series_part", "seriesPart", "position"]).and_then(number) {
        meta.series_part = Some(part);
    }

    Some(meta)
}

fn text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f32> {
    let parsed = match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.trim().parse::<f32>().ok(),
        _ => None,
    }?;
    (parsed.is_finite() && parsed >= 0.0).then_some(parsed)
}

fn person(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => map.get("name").and_then(text),
        other => text(other),
    }
}

fn people(value: &Value) -> Option<String> {
    match value {
        Value::Array(list) => {
            let names: Vec<String> = list.iter().filter_map(person).collect();
            (!names.is_empty()).then(|| names.join(", "))
        }
        other => person(other),
    }
}

fn series_entry(value: &Value) -> Option<(String, Option<f32>)> {
    match value {
        Value::Object(map) => {
            let name = map.get("name").or_else(|| map.get("title")).and_then(text)?;
            let part = ["part", "position", "sequence"]
                .iter()
                .find_map(|k| map.get(*k).and_then(number));
            Some((name, part))
        }
        other => text(other).map(|name| (name, None)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_record() {
        let meta = metadata_from_value(&json!({
            "title": "The Final Empire",
            "authors": [{"name": "Brandon Sanderson"}],
            "narrators": ["Michael Kramer"],
            "series": [{"name": "Mistborn", "position": "1"}],
            "image": "https://example.invalid/cover.jpg",
            "description": "Ash falls.",
            "asin": "B002UZMLXM"
        }))
        .unwrap();

        assert_eq!(meta.title, "The Final Empire");
        assert_eq!(meta.author, "Brandon Sanderson");
        assert_eq!(meta.narrator.as_deref(), Some("Michael Kramer"));
        assert_eq!(meta.series.as_deref(), Some("Mistborn"));
        assert_eq!(meta.series_part, Some(1.0));
        assert_eq!(meta.asin.as_deref(), Some("B002UZMLXM"));
    }

    #[test]
    fn test_wrong_types_are_absent() {
        let meta = metadata_from_value(&json!({
            "title": "Dune",
            "author": 42.5,
            "narrator": {"unexpected": true},
            "series": null,
            "series_part": "two",
            "cover": []
        }))
        .unwrap();

        assert_eq!(meta.title, "Dune");
        assert_eq!(meta.author, "42.5");
        assert!(meta.narrator.is_none());
        assert!(meta.series.is_none());
        assert!(meta.series_part.is_none());
        assert!(meta.cover.is_none());
    }

    #[test]
    fn test_fractional_and_negative_parts() {
        let meta = metadata_from_value(&json!({"title": "T", "series": "S", "seriesPart": 2.5}))
            .unwrap();
        assert_eq!(meta.series_part, Some(2.5));

        let meta = metadata_from_value(&json!({"title": "T", "series_part": -1})).unwrap();
        assert!(meta.series_part.is_none());
    }

    #[test]
    fn test_no_title_is_none() {
        assert!(metadata_from_value(&json!({"author": "Someone"})).is_none());
        assert!(metadata_from_value(&json!({"title": "   "})).is_none());
        assert!(metadata_from_value(&json!("just a string")).is_none());
    }

    #[test]
    fn test_parse_response_shapes() {
        assert!(parse_response("not json {").is_none());
        assert!(parse_response("[]").is_none());
        assert!(parse_response(r#"{"results": []}"#).is_none());

        let meta = parse_response(r#"{"products": [{"nope": 1}, {"title": "Second"}]}"#).unwrap();
        assert_eq!(meta.title, "Second");

        let meta = parse_response(r#"{"title": "Bare", "author": "A"}"#).unwrap();
        assert_eq!(meta.author, "A");
    }
}
