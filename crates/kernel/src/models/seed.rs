//! Seed content loaded from YAML.
//!
//! The fixed seed lists live in `seed/launchpad.yml` and are compiled into the
//! binary. A different file can be supplied at runtime (`SEED_FILE`); it must
//! have the same shape.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use super::Attributes;

/// Seed file compiled into the binary.
const EMBEDDED_SEED: &str = include_str!("../../seed/launchpad.yml");

/// Maximum seed file size (1 MB).
const MAX_SEED_FILE_SIZE: u64 = 1024 * 1024;

/// A category to ensure on first boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    pub slug: String,
    pub description: String,
}

/// A tag to ensure on first boot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagSeed {
    pub label: String,
    pub slug: String,
}

/// A blog post to ensure on first boot.
///
/// `category` and `tags` hold slugs; they are resolved to ids of the seeded
/// categories and tags before the post is written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostSeed {
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_time: Option<i64>,
}

/// The complete set of seed lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub categories: Vec<CategorySeed>,
    #[serde(default)]
    pub tags: Vec<TagSeed>,
    #[serde(default)]
    pub posts: Vec<BlogPostSeed>,
}

impl CategorySeed {
    /// Creation payload for this category.
    pub fn attributes(&self) -> Attributes {
        to_attributes(self)
    }
}

impl TagSeed {
    /// Creation payload for this tag.
    pub fn attributes(&self) -> Attributes {
        to_attributes(self)
    }
}

impl BlogPostSeed {
    /// Scalar attributes of the post. Relations and `publishedAt` are added
    /// by the seeder once references are resolved.
    pub fn attributes(&self) -> Attributes {
        let mut attrs = to_attributes(self);
        attrs.remove("category");
        attrs.remove("tags");
        attrs
    }
}

impl SeedData {
    /// Parse the seed lists compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_yaml(EMBEDDED_SEED).context("embedded seed file is invalid")
    }

    /// Parse seed lists from YAML text.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let data: SeedData = serde_yml::from_str(yaml).context("failed to parse seed YAML")?;
        data.validate()?;
        Ok(data)
    }

    /// Read seed lists from a file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path)
            .with_context(|| format!("failed to stat seed file {}", path.display()))?;
        if metadata.len() > MAX_SEED_FILE_SIZE {
            bail!(
                "seed file {} is {} bytes, limit is {MAX_SEED_FILE_SIZE}",
                path.display(),
                metadata.len()
            );
        }

        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read seed file {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("invalid seed file {}", path.display()))
    }

    /// Load from `path` when given, otherwise the embedded seed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_path(p),
            None => Self::embedded(),
        }
    }

    /// Reject duplicate and empty slugs within each list.
    ///
    /// References from posts to categories and tags are not checked here;
    /// the seeder reports those against what actually exists.
    pub fn validate(&self) -> Result<()> {
        check_slugs("category", self.categories.iter().map(|c| c.slug.as_str()))?;
        check_slugs("tag", self.tags.iter().map(|t| t.slug.as_str()))?;
        check_slugs("post", self.posts.iter().map(|p| p.slug.as_str()))?;
        Ok(())
    }
}

fn check_slugs<'a>(list: &str, slugs: impl Iterator<Item = &'a str>) -> Result<()> {
    let mut seen = HashSet::new();
    for slug in slugs {
        if slug.trim().is_empty() {
            bail!("{list} seed has an empty slug");
        }
        if !seen.insert(slug) {
            bail!("duplicate {list} seed slug '{slug}'");
        }
    }
    Ok(())
}

fn to_attributes<T: Serialize>(value: &T) -> Attributes {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::Object(map)) => map,
        // Plain structs of strings, bools and integers always serialize to objects.
        _ => Attributes::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn embedded_seed_parses() {
        let seed = SeedData::embedded().unwrap();
        assert_eq!(seed.categories.len(), 3);
        assert_eq!(seed.tags.len(), 5);
        assert_eq!(seed.posts.len(), 3);

        let welcome = &seed.posts[0];
        assert_eq!(welcome.slug, "welcome-to-launchpad-journal");
        assert_eq!(welcome.category, "product-updates");
        assert_eq!(welcome.tags, vec!["strapi", "launch"]);
        assert!(welcome.featured);
        assert_eq!(welcome.read_time, Some(4));
    }

    #[test]
    fn post_attributes_exclude_relations() {
        let seed = SeedData::embedded().unwrap();
        let attrs = seed.posts[1].attributes();
        assert!(!attrs.contains_key("category"));
        assert!(!attrs.contains_key("tags"));
        assert_eq!(attrs["readTime"], 6);
        assert_eq!(attrs["featured"], false);
    }

    #[test]
    fn read_time_is_optional() {
        let yaml = r#"
posts:
  - title: Untimed
    slug: untimed
    excerpt: No estimate supplied
    content: "<p>one two three</p>"
    category: learning
"#;
        let seed = SeedData::from_yaml(yaml).unwrap();
        assert_eq!(seed.posts[0].read_time, None);
        assert!(!seed.posts[0].attributes().contains_key("readTime"));
        assert!(seed.categories.is_empty());
    }

    #[test]
    fn duplicate_slugs_are_rejected() {
        let yaml = r#"
tags:
  - { label: Rust, slug: rust }
  - { label: Rust again, slug: rust }
"#;
        let err = SeedData::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("duplicate tag seed slug"));
    }
}
