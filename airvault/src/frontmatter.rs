//! YAML frontmatter assembly and parsing.
//!
//! Frontmatter is built from an [`IndexMap`] so property order is a
//! deterministic function of schema order: identical inputs produce
//! byte-identical notes on re-import.

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde_json::Value;

/// Ordered frontmatter properties, as written.
pub type Frontmatter = IndexMap<String, Value>;

/// Ordered frontmatter properties, as read back from a note.
pub type ParsedFrontmatter = IndexMap<String, serde_yaml::Value>;

/// Renders a note: frontmatter block (if any properties) followed by the
/// body. An empty map yields the body alone, with no delimiters.
pub fn compose(frontmatter: &Frontmatter, body: &str) -> Result<String> {
    if frontmatter.is_empty() {
        return Ok(body.to_string());
    }
    let yaml = serde_yaml::to_string(frontmatter).context("serializing frontmatter")?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Splits a note into its frontmatter map and body. Content without a
/// leading frontmatter block parses as an empty map plus the whole text.
pub fn parse(content: &str) -> Result<(ParsedFrontmatter, String)> {
    let Some(rest) = content.strip_prefix("---\n") else {
        return Ok((IndexMap::new(), content.to_string()));
    };
    let Some(end) = rest.find("\n---\n").map(|i| i + 1).or_else(|| {
        // frontmatter-only note with no newline after the closing fence
        rest.strip_suffix("\n---").map(|yaml| yaml.len() + 1)
    }) else {
        return Ok((IndexMap::new(), content.to_string()));
    };
    let yaml = &rest[..end];
    let body = rest
        .get(end + "---\n".len()..)
        .unwrap_or_default()
        .to_string();
    let map: ParsedFrontmatter = serde_yaml::from_str(yaml).context("parsing frontmatter")?;
    Ok((map, body))
}

/// Removes one property from a note's frontmatter, rewriting the block.
/// Notes without the property (or without frontmatter) pass through
/// unchanged; a block emptied by the removal is dropped entirely.
pub fn strip_key(content: &str, key: &str) -> Result<String> {
    let (mut map, body) = parse(content)?;
    if map.shift_remove(key).is_none() {
        return Ok(content.to_string());
    }
    if map.is_empty() {
        return Ok(body);
    }
    let yaml = serde_yaml::to_string(&map).context("serializing frontmatter")?;
    Ok(format!("---\n{yaml}---\n{body}"))
}

/// Makes a record title safe to use as a file name: path separators and
/// characters that break wiki links become spaces, runs of whitespace
/// collapse, and a blank result falls back to "Untitled".
pub fn sanitize_file_name(name: &str) -> String {
    const FORBIDDEN: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|', '#', '^', '[', ']'];
    let cleaned: String = name
        .chars()
        .map(|ch| if FORBIDDEN.contains(&ch) { ' ' } else { ch })
        .collect();
    let collapsed = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        "Untitled".to_string()
    } else {
        collapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> Frontmatter {
        let mut map = Frontmatter::new();
        map.insert("airtable-id".to_string(), json!("rec001"));
        map.insert("airtable-created".to_string(), json!("2024-03-01T10:30:00+00:00"));
        map.insert("Tags".to_string(), json!(["a", "b"]));
        map
    }

    #[test]
    fn compose_then_parse_round_trips() {
        let content = compose(&sample(), "body text\n").unwrap();
        assert!(content.starts_with("---\n"));
        let (map, body) = parse(&content).unwrap();
        assert_eq!(body, "body text\n");
        assert_eq!(
            map.get("airtable-id").and_then(|v| v.as_str()),
            Some("rec001")
        );
        assert_eq!(map.keys().collect::<Vec<_>>()[2], "Tags");
    }

    #[test]
    fn compose_is_deterministic() {
        let a = compose(&sample(), "").unwrap();
        let b = compose(&sample(), "").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn content_without_frontmatter_parses_as_plain_body() {
        let (map, body) = parse("just text").unwrap();
        assert!(map.is_empty());
        assert_eq!(body, "just text");
    }

    #[test]
    fn strip_key_removes_only_the_named_property() {
        let content = compose(&sample(), "body\n").unwrap();
        let stripped = strip_key(&content, "airtable-id").unwrap();
        assert!(!stripped.contains("airtable-id"));
        assert!(stripped.contains("airtable-created"));
        assert!(stripped.ends_with("body\n"));
    }

    #[test]
    fn strip_key_drops_an_emptied_block() {
        let mut map = Frontmatter::new();
        map.insert("airtable-id".to_string(), json!("rec001"));
        let content = compose(&map, "body\n").unwrap();
        assert_eq!(strip_key(&content, "airtable-id").unwrap(), "body\n");
    }

    #[test]
    fn strip_key_is_a_no_op_without_the_property() {
        let content = compose(&sample(), "body\n").unwrap();
        assert_eq!(strip_key(&content, "missing").unwrap(), content);
    }

    #[test]
    fn sanitize_replaces_forbidden_characters() {
        assert_eq!(sanitize_file_name("a/b: c*?"), "a b c");
        assert_eq!(sanitize_file_name("link [x] #tag"), "link x tag");
        assert_eq!(sanitize_file_name("   "), "Untitled");
        assert_eq!(sanitize_file_name("plain name"), "plain name");
    }
}
