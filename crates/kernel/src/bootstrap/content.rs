//! Content seeding.

use chrono::{SecondsFormat, Utc};
use futures_util::future::try_join_all;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use super::SeedError;
use crate::content::{EntityError, EntityService};
use crate::models::{Attributes, BlogPostSeed, EntityKind, Entry, SeedData};
use crate::store::EntryQuery;

/// Result of the content seeding step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SeedOutcome {
    /// Blog posts already existed; nothing was checked or written.
    Skipped { existing_posts: u64 },

    /// Every seed was ensured. Counts include entries that already existed.
    Seeded {
        categories: usize,
        tags: usize,
        posts: usize,
    },
}

/// Return the first entry of `kind` matching `filter`, or create one from
/// `data`.
///
/// Creation goes through the entity service, so lifecycle hooks and
/// validation apply. Two concurrent callers can both miss and both create;
/// the store's unique slug constraint is the only guard.
pub async fn ensure_seed(
    entities: &EntityService,
    kind: EntityKind,
    filter: Attributes,
    data: Attributes,
) -> Result<Entry, EntityError> {
    let query = EntryQuery::new().with_filters(filter).with_limit(1);
    if let Some(existing) = entities.find_many(kind, &query).await?.into_iter().next() {
        debug!(kind = %kind, id = existing.id, "seed entry already present");
        return Ok(existing);
    }

    entities.create(kind, data).await
}

fn slug_filter(slug: &str) -> Attributes {
    let mut filter = Attributes::new();
    filter.insert("slug".into(), Value::from(slug));
    filter
}

/// Seed categories, tags and posts unless any blog post already exists.
///
/// Categories and tags are each ensured as one concurrent batch; posts follow
/// once both batches are done. All post references are resolved before the
/// first post is written, so a bad reference leaves no posts behind.
pub async fn seed_content(
    entities: &EntityService,
    seed: &SeedData,
) -> Result<SeedOutcome, SeedError> {
    let existing_posts = entities.count(EntityKind::BlogPost).await?;
    if existing_posts > 0 {
        info!(existing_posts, "blog posts exist, skipping content seed");
        return Ok(SeedOutcome::Skipped { existing_posts });
    }

    let categories = try_join_all(seed.categories.iter().map(|category| {
        ensure_seed(
            entities,
            EntityKind::Category,
            slug_filter(&category.slug),
            category.attributes(),
        )
    }))
    .await?;

    let tags = try_join_all(seed.tags.iter().map(|tag| {
        ensure_seed(
            entities,
            EntityKind::Tag,
            slug_filter(&tag.slug),
            tag.attributes(),
        )
    }))
    .await?;

    let payloads = seed
        .posts
        .iter()
        .map(|post| post_payload(post, &categories, &tags))
        .collect::<Result<Vec<_>, SeedError>>()?;

    let posts = try_join_all(
        seed.posts
            .iter()
            .zip(payloads)
            .map(|(post, data)| {
                ensure_seed(entities, EntityKind::BlogPost, slug_filter(&post.slug), data)
            }),
    )
    .await?;

    info!(
        categories = categories.len(),
        tags = tags.len(),
        posts = posts.len(),
        "seed content ensured"
    );

    Ok(SeedOutcome::Seeded {
        categories: categories.len(),
        tags: tags.len(),
        posts: posts.len(),
    })
}

/// Build a post's creation payload with its references resolved to ids.
///
/// Tag ids keep the order of `tags`; requested slugs that did not resolve are
/// dropped as long as at least one did.
fn post_payload(
    post: &BlogPostSeed,
    categories: &[Entry],
    tags: &[Entry],
) -> Result<Attributes, SeedError> {
    let category = categories
        .iter()
        .find(|c| c.slug() == Some(post.category.as_str()))
        .ok_or_else(|| SeedError::MissingCategory {
            post: post.slug.clone(),
            slug: post.category.clone(),
        })?;

    let tag_ids: Vec<Value> = tags
        .iter()
        .filter(|t| t.slug().is_some_and(|s| post.tags.iter().any(|want| want == s)))
        .map(|t| Value::from(t.id))
        .collect();
    if tag_ids.is_empty() {
        return Err(SeedError::MissingTags {
            post: post.slug.clone(),
            slugs: post.tags.clone(),
        });
    }

    let mut data = post.attributes();
    data.insert("category".into(), Value::from(category.id));
    data.insert("tags".into(), Value::Array(tag_ids));
    data.insert(
        "publishedAt".into(),
        Value::from(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
    );

    Ok(data)
}
