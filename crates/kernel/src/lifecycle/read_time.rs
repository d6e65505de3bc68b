//! Read-time estimation for blog posts.
//!
//! On create, a missing or falsy `readTime` is derived from `content`; an
//! explicit value is kept. On update, any truthy `content` in the payload
//! recomputes `readTime`, overwriting whatever the caller sent alongside it.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use super::{Lifecycle, LifecycleEvent, is_truthy};

/// Reading speed used for the estimate.
pub const WORDS_PER_MINUTE: f64 = 180.0;

#[allow(clippy::expect_used)]
static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]+>").expect("valid regex literal"));

#[allow(clippy::expect_used)]
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\s\x{FEFF}]+").expect("valid regex literal"));

/// Replace every tag with a space, collapse whitespace runs, and trim.
pub fn strip_html(value: &str) -> String {
    let without_tags = HTML_TAG.replace_all(value, " ");
    WHITESPACE.replace_all(&without_tags, " ").trim().to_string()
}

/// Number of words in `content` once markup is stripped.
pub fn count_words(content: Option<&str>) -> usize {
    content.map_or(0, |c| {
        strip_html(c).split(' ').filter(|w| !w.is_empty()).count()
    })
}

/// Estimated reading minutes: `max(1, round(words / 180))`.
pub fn compute_read_time(content: Option<&str>) -> i64 {
    let minutes = (count_words(content) as f64 / WORDS_PER_MINUTE).round() as i64;
    minutes.max(1)
}

/// Text to estimate from. Non-string content is estimated as its JSON text.
fn content_text(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s.as_str()),
        other => Cow::Owned(other.to_string()),
    }
}

/// Fills in `readTime` on blog post writes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadTimeLifecycle;

impl Lifecycle for ReadTimeLifecycle {
    fn name(&self) -> &'static str {
        "read-time"
    }

    fn before_create(&self, event: &mut LifecycleEvent) {
        let Some(data) = event.params.data.as_mut() else {
            return;
        };

        if is_truthy(data.get("readTime")) || !is_truthy(data.get("content")) {
            return;
        }

        let minutes = data
            .get("content")
            .map(|c| compute_read_time(Some(&*content_text(c))))
            .unwrap_or(1);
        data.insert("readTime".into(), Value::from(minutes));
    }

    fn before_update(&self, event: &mut LifecycleEvent) {
        let Some(data) = event.params.data.as_mut() else {
            return;
        };

        let Some(content) = data.get("content").filter(|c| is_truthy(Some(*c))) else {
            return;
        };

        let minutes = compute_read_time(Some(&*content_text(content)));
        data.insert("readTime".into(), Value::from(minutes));
    }
}
