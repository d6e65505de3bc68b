//! Content collection REST endpoints.
//!
//! `/api/{collection}` and `/api/{collection}/{id}` for every entity kind.
//! Responses wrap entries in `{ "data": ... }`; lists add
//! `meta.pagination`. Public requests are checked against the public role's
//! grants for the matching action (`find`, `findOne`, `create`, `update`,
//! `delete`).

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::error::{AppError, AppResult};
use crate::middleware::Requester;
use crate::models::{Attributes, EntityKind, Entry, action_for};
use crate::state::AppState;
use crate::store::EntryQuery;

/// Page size when `pagination[limit]` is absent.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Largest accepted `pagination[limit]`.
pub const MAX_PAGE_SIZE: usize = 100;

/// Create the content router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/{collection}",
            get(list_entries).post(create_entry),
        )
        .route(
            "/api/{collection}/{id}",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
}

/// Pagination metadata.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct Pagination {
    pub start: usize,
    pub limit: usize,
    pub total: u64,
}

/// List query parsed from `filters[...]` and `pagination[...]` parameters.
#[derive(Debug, PartialEq)]
struct ListParams {
    filters: Attributes,
    start: usize,
    limit: usize,
}

impl ListParams {
    fn parse(params: &HashMap<String, String>) -> AppResult<Self> {
        let mut filters = Attributes::new();
        let mut start = 0;
        let mut limit = DEFAULT_PAGE_SIZE;

        for (key, value) in params {
            if let Some(rest) = key.strip_prefix("filters[") {
                let attr = filter_attribute(rest).ok_or_else(|| {
                    AppError::BadRequest(format!("unsupported filter '{key}'"))
                })?;
                filters.insert(attr.to_string(), coerce(value));
            } else if key == "pagination[start]" {
                // Offsets are bound as BIGINT.
                start = value
                    .parse::<usize>()
                    .ok()
                    .filter(|s| i64::try_from(*s).is_ok())
                    .ok_or_else(|| {
                        AppError::BadRequest(
                            "pagination[start] must be a non-negative integer".into(),
                        )
                    })?;
            } else if key == "pagination[limit]" {
                let requested: usize = value.parse().map_err(|_| {
                    AppError::BadRequest("pagination[limit] must be a positive integer".into())
                })?;
                limit = requested.clamp(1, MAX_PAGE_SIZE);
            }
        }

        Ok(Self {
            filters,
            start,
            limit,
        })
    }
}

/// Attribute name from the remainder of `filters[<attr>]` or
/// `filters[<attr>][$eq]`.
fn filter_attribute(rest: &str) -> Option<&str> {
    let attr = rest
        .strip_suffix("][$eq]")
        .or_else(|| rest.strip_suffix(']'))?;
    if attr.is_empty() || attr.contains('[') || attr.contains(']') {
        return None;
    }
    Some(attr)
}

/// Query strings carry text; booleans and integers are matched as such.
fn coerce(value: &str) -> Value {
    match value {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        other => other
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::from(other)),
    }
}

fn resolve_kind(collection: &str) -> AppResult<EntityKind> {
    EntityKind::from_collection(collection)
        .ok_or_else(|| AppError::NotFound(format!("unknown collection '{collection}'")))
}

fn parse_id(kind: EntityKind, id: &str) -> AppResult<i64> {
    id.parse()
        .map_err(|_| AppError::NotFound(format!("{kind} {id} not found")))
}

/// Deny public requests whose role lacks an enabled grant for the action.
async fn authorize(
    state: &AppState,
    requester: Requester,
    kind: EntityKind,
    operation: &str,
) -> AppResult<()> {
    let Some(role) = requester.role_type() else {
        return Ok(());
    };

    let action = action_for(kind, operation);
    if state.permissions().role_allows(role, &action).await? {
        Ok(())
    } else {
        tracing::debug!(role, action = %action, "permission denied");
        Err(AppError::Forbidden)
    }
}

/// Extract `data` from a write body.
fn payload(body: Value) -> AppResult<Attributes> {
    match body {
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Object(data)) => Ok(data),
            _ => Err(AppError::BadRequest(
                "missing \"data\" object in the request body".into(),
            )),
        },
        _ => Err(AppError::BadRequest("request body must be an object".into())),
    }
}

fn single(entry: Entry) -> Json<Value> {
    Json(json!({ "data": entry, "meta": {} }))
}

/// `GET /api/{collection}`
async fn list_entries(
    State(state): State<AppState>,
    requester: Requester,
    Path(collection): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> AppResult<Json<Value>> {
    let kind = resolve_kind(&collection)?;
    authorize(&state, requester, kind, "find").await?;

    let params = ListParams::parse(&params)?;
    let entities = state.entities();

    let total = if params.filters.is_empty() {
        entities.count(kind).await?
    } else {
        let all = EntryQuery::new().with_filters(params.filters.clone());
        entities.find_many(kind, &all).await?.len() as u64
    };

    let query = EntryQuery::new()
        .with_filters(params.filters)
        .with_offset(params.start)
        .with_limit(params.limit);
    let entries = entities.find_many(kind, &query).await?;

    Ok(Json(json!({
        "data": entries,
        "meta": {
            "pagination": Pagination {
                start: params.start,
                limit: params.limit,
                total,
            }
        }
    })))
}

/// `GET /api/{collection}/{id}`
async fn get_entry(
    State(state): State<AppState>,
    requester: Requester,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let kind = resolve_kind(&collection)?;
    authorize(&state, requester, kind, "findOne").await?;
    let id = parse_id(kind, &id)?;

    let entry = state
        .entities()
        .find_one(kind, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{kind} {id} not found")))?;

    Ok(single(entry))
}

/// `POST /api/{collection}`
async fn create_entry(
    State(state): State<AppState>,
    requester: Requester,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> AppResult<impl IntoResponse> {
    let kind = resolve_kind(&collection)?;
    authorize(&state, requester, kind, "create").await?;

    let entry = state.entities().create(kind, payload(body)?).await?;
    Ok((StatusCode::CREATED, single(entry)))
}

/// `PUT /api/{collection}/{id}`
async fn update_entry(
    State(state): State<AppState>,
    requester: Requester,
    Path((collection, id)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> AppResult<Json<Value>> {
    let kind = resolve_kind(&collection)?;
    authorize(&state, requester, kind, "update").await?;
    let id = parse_id(kind, &id)?;

    let entry = state.entities().update(kind, id, payload(body)?).await?;
    Ok(single(entry))
}

/// `DELETE /api/{collection}/{id}`
async fn delete_entry(
    State(state): State<AppState>,
    requester: Requester,
    Path((collection, id)): Path<(String, String)>,
) -> AppResult<Json<Value>> {
    let kind = resolve_kind(&collection)?;
    authorize(&state, requester, kind, "delete").await?;
    let id = parse_id(kind, &id)?;

    let entry = state.entities().delete(kind, id).await?;
    Ok(single(entry))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn filters_accept_both_spellings() {
        let parsed = ListParams::parse(&params(&[
            ("filters[slug]", "launch"),
            ("filters[featured][$eq]", "true"),
            ("filters[readTime]", "4"),
        ]))
        .unwrap();

        assert_eq!(parsed.filters["slug"], "launch");
        assert_eq!(parsed.filters["featured"], true);
        assert_eq!(parsed.filters["readTime"], 4);
        assert_eq!(parsed.start, 0);
        assert_eq!(parsed.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn unsupported_operators_are_rejected() {
        let err = ListParams::parse(&params(&[("filters[title][$contains]", "x")])).unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn pagination_is_clamped() {
        let parsed = ListParams::parse(&params(&[
            ("pagination[start]", "10"),
            ("pagination[limit]", "500"),
        ]))
        .unwrap();
        assert_eq!(parsed.start, 10);
        assert_eq!(parsed.limit, MAX_PAGE_SIZE);

        let parsed = ListParams::parse(&params(&[("pagination[limit]", "0")])).unwrap();
        assert_eq!(parsed.limit, 1);

        assert!(ListParams::parse(&params(&[("pagination[start]", "-1")])).is_err());
    }

    #[test]
    fn start_beyond_bigint_is_rejected() {
        let parsed =
            ListParams::parse(&params(&[("pagination[start]", "9223372036854775807")])).unwrap();
        assert_eq!(parsed.start as u64, i64::MAX as u64);

        let err = ListParams::parse(&params(&[("pagination[start]", "9223372036854775808")]))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = ListParams::parse(&params(&[("pagination[start]", "18446744073709551615")]))
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn unrelated_parameters_are_ignored() {
        let parsed = ListParams::parse(&params(&[("populate", "*"), ("sort", "id")])).unwrap();
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn payload_requires_data_object() {
        let data = payload(json!({"data": {"label": "X"}})).unwrap();
        assert_eq!(data["label"], "X");

        assert!(payload(json!({"label": "X"})).is_err());
        assert!(payload(json!({"data": [1]})).is_err());
        assert!(payload(json!("data")).is_err());
    }
}
