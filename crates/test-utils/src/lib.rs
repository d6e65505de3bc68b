//! Launchpad test utilities.
//!
//! Helpers for integration testing: payload builders for the three content
//! kinds, generated article bodies, and JSON assertion helpers.

use serde_json::{Map, Value as JsonValue, json};

/// Generate `words` words of filler text wrapped in paragraphs of 50 words.
pub fn article_body(words: usize) -> String {
    let filler: Vec<&str> = (0..words).map(|_| "lorem").collect();
    filler
        .chunks(50)
        .map(|chunk| format!("<p>{}</p>", chunk.join(" ")))
        .collect()
}

/// Create a test post with default values.
pub fn test_post(title: &str) -> TestPost {
    TestPost {
        title: title.to_string(),
        slug: slugify(title),
        fields: Map::new(),
    }
}

/// Lowercase a title and join its words with '-'.
pub fn slugify(title: &str) -> String {
    title
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_ascii_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

/// A blog post payload builder.
#[derive(Debug, Clone)]
pub struct TestPost {
    pub title: String,
    pub slug: String,
    pub fields: Map<String, JsonValue>,
}

impl TestPost {
    /// Set a custom slug.
    pub fn with_slug(mut self, slug: &str) -> Self {
        self.slug = slug.to_string();
        self
    }

    /// Set the HTML body.
    pub fn with_content(self, content: &str) -> Self {
        self.with_field("content", json!(content))
    }

    /// Set a generated body of `words` words.
    pub fn with_words(self, words: usize) -> Self {
        self.with_content(&article_body(words))
    }

    /// Set an explicit read time.
    pub fn with_read_time(self, minutes: i64) -> Self {
        self.with_field("readTime", json!(minutes))
    }

    /// Mark as featured.
    pub fn featured(self) -> Self {
        self.with_field("featured", json!(true))
    }

    /// Reference a category by id.
    pub fn in_category(self, id: i64) -> Self {
        self.with_field("category", json!(id))
    }

    /// Reference tags by id.
    pub fn with_tags(self, ids: &[i64]) -> Self {
        self.with_field("tags", json!(ids))
    }

    /// Set an arbitrary attribute.
    pub fn with_field(mut self, name: &str, value: JsonValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// The attribute object.
    pub fn attributes(&self) -> Map<String, JsonValue> {
        let mut attrs = self.fields.clone();
        attrs.insert("title".into(), json!(self.title));
        attrs.insert("slug".into(), json!(self.slug));
        attrs
    }

    /// A REST write body: `{ "data": { ... } }`.
    pub fn body(&self) -> JsonValue {
        json!({ "data": self.attributes() })
    }
}

/// Category creation body.
pub fn category_body(name: &str) -> JsonValue {
    json!({ "data": { "name": name, "slug": slugify(name) } })
}

/// Tag creation body.
pub fn tag_body(label: &str) -> JsonValue {
    json!({ "data": { "label": label, "slug": slugify(label) } })
}

/// A post entry for [`seed_yaml`]: title, category slug, tag slugs.
pub type SeedPost<'a> = (&'a str, &'a str, &'a [&'a str]);

/// Build a seed file. Names are slugified; posts get a 50-word body and no
/// explicit read time.
pub fn seed_yaml(categories: &[&str], tags: &[&str], posts: &[SeedPost<'_>]) -> String {
    let mut yaml = String::from("categories:\n");
    for name in categories {
        yaml.push_str(&format!(
            "  - name: {name}\n    slug: {}\n    description: About {name}.\n",
            slugify(name)
        ));
    }

    yaml.push_str("tags:\n");
    for label in tags {
        yaml.push_str(&format!(
            "  - label: {label}\n    slug: {}\n",
            slugify(label)
        ));
    }

    yaml.push_str("posts:\n");
    for (title, category, post_tags) in posts {
        yaml.push_str(&format!(
            "  - title: {title}\n    slug: {}\n    excerpt: Excerpt of {title}.\n    content: \"{}\"\n    category: {category}\n    tags: [{}]\n",
            slugify(title),
            article_body(50),
            post_tags.join(", ")
        ));
    }

    yaml
}

/// Assertion helpers for JSON responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected key '{key}' in JSON: {value}"
        );
    }

    /// Assert a Strapi-style error envelope with the given status.
    pub fn error_status(value: &Value, status: u16) {
        assert!(value["data"].is_null(), "Expected null data in: {value}");
        assert_eq!(
            value["error"]["status"], status,
            "Unexpected error status in: {value}"
        );
    }

    /// Collect the `slug` of every entry in a list response.
    pub fn slugs(value: &Value) -> Vec<String> {
        value["data"]
            .as_array()
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|e| e["slug"].as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }
}
