//! In-memory implementation of the record repository
//!
//! The reference repository used by the test suites and by embedders that
//! do not need durable storage. Enforces the same contract a SQL-backed
//! repository must: server-owned ids and timestamps, a uniqueness
//! constraint on the stored name, deterministic cursor pagination, and
//! filter-query evaluation.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::error::RegistryError;
use crate::domain::filter::{matches, parse_filter_query};
use crate::domain::mapper::keys;
use crate::domain::record::Record;
use crate::domain::repository::{ListOptions, OrderBy, Page, RecordRepository, SortOrder};

const DEFAULT_PAGE_SIZE: i32 = 32;

#[derive(Debug, Clone)]
struct Stored {
    record: Record,
    parent_id: Option<i32>,
}

#[derive(Debug, Default)]
struct State {
    records: HashMap<i32, Stored>,
    next_id: i32,
}

/// In-memory record repository; one instance per entity kind (the
/// artifact family shares one instance across its kinds).
#[derive(Debug, Default)]
pub struct InMemoryRecordRepository {
    state: RwLock<State>,
}

impl InMemoryRecordRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort key of a record under a given ordering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum CursorKey {
    Int(i64),
    Str(String),
}

/// Opaque continuation cursor: the sort key and id of the last item of
/// the previous page
#[derive(Debug, Serialize, Deserialize)]
struct PageCursor {
    key: CursorKey,
    id: i32,
}

fn sort_key(record: &Record, order_by: OrderBy) -> CursorKey {
    match order_by {
        OrderBy::Id => CursorKey::Int(record.id.unwrap_or(0) as i64),
        OrderBy::Name => CursorKey::Str(record.name.clone()),
        OrderBy::CreateTime => CursorKey::Int(record.create_time_since_epoch),
        OrderBy::LastUpdateTime => CursorKey::Int(record.last_update_time_since_epoch),
    }
}

/// Total order over (key, id); ties on the key always break by id so a
/// cursor walk is gap-free and duplicate-free.
fn compare(
    left: (&CursorKey, i32),
    right: (&CursorKey, i32),
    sort_order: SortOrder,
) -> std::cmp::Ordering {
    let by_key = match (left.0, right.0) {
        (CursorKey::Int(a), CursorKey::Int(b)) => a.cmp(b),
        (CursorKey::Str(a), CursorKey::Str(b)) => a.cmp(b),
        // mixed keys cannot happen under a single ordering
        (CursorKey::Int(_), CursorKey::Str(_)) => std::cmp::Ordering::Less,
        (CursorKey::Str(_), CursorKey::Int(_)) => std::cmp::Ordering::Greater,
    };
    let ordering = by_key.then(left.1.cmp(&right.1));
    match sort_order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

fn encode_cursor(cursor: &PageCursor) -> String {
    // the cursor shape is a plain serializable struct and cannot fail
    let bytes = serde_json::to_vec(cursor).unwrap_or_default();
    BASE64.encode(bytes)
}

fn decode_cursor(token: &str) -> Result<PageCursor, RegistryError> {
    let bytes = BASE64
        .decode(token)
        .map_err(|_| RegistryError::bad_request("invalid next page token"))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| RegistryError::bad_request("invalid next page token"))
}

#[async_trait]
impl RecordRepository for InMemoryRecordRepository {
    async fn save(&self, record: Record, parent_id: Option<i32>) -> Result<Record, RegistryError> {
        let mut state = self
            .state
            .write()
            .map_err(|e| RegistryError::internal(format!("failed to acquire write lock: {}", e)))?;
        let now = Utc::now().timestamp_millis();

        match record.id {
            Some(id) => {
                let existing = state.records.get(&id).ok_or_else(|| {
                    RegistryError::not_found(format!("record with id {} not found", id))
                })?;
                let create_time = existing.record.create_time_since_epoch;
                let kept_parent = existing.parent_id;

                let collision = state.records.values().any(|stored| {
                    stored.record.id != Some(id) && stored.record.name == record.name
                });
                if collision {
                    return Err(RegistryError::conflict(format!(
                        "record with name '{}' already exists",
                        record.name
                    )));
                }

                let mut record = record;
                record.create_time_since_epoch = create_time;
                record.last_update_time_since_epoch = now;
                state.records.insert(
                    id,
                    Stored {
                        record: record.clone(),
                        parent_id: parent_id.or(kept_parent),
                    },
                );
                Ok(record)
            }
            None => {
                if state
                    .records
                    .values()
                    .any(|stored| stored.record.name == record.name)
                {
                    return Err(RegistryError::conflict(format!(
                        "record with name '{}' already exists",
                        record.name
                    )));
                }

                state.next_id += 1;
                let id = state.next_id;
                let mut record = record;
                record.id = Some(id);
                record.create_time_since_epoch = now;
                record.last_update_time_since_epoch = now;
                state.records.insert(
                    id,
                    Stored {
                        record: record.clone(),
                        parent_id,
                    },
                );
                tracing::debug!(id, name = %record.name, "created record");
                Ok(record)
            }
        }
    }

    async fn get_by_id(&self, id: i32) -> Result<Record, RegistryError> {
        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::internal(format!("failed to acquire read lock: {}", e)))?;
        state
            .records
            .get(&id)
            .map(|stored| stored.record.clone())
            .ok_or_else(|| RegistryError::not_found(format!("record with id {} not found", id)))
    }

    async fn list(&self, options: ListOptions) -> Result<Page<Record>, RegistryError> {
        let filter = options
            .pagination
            .filter_query
            .as_deref()
            .filter(|q| !q.trim().is_empty())
            .map(parse_filter_query)
            .transpose()?;
        let order_by = options
            .pagination
            .order_by
            .as_deref()
            .map(OrderBy::parse)
            .transpose()?
            .unwrap_or(OrderBy::Id);
        let sort_order = options.pagination.sort_order.unwrap_or_default();
        let page_size = options.pagination.page_size.unwrap_or(DEFAULT_PAGE_SIZE).max(0);
        let cursor = options
            .pagination
            .next_page_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(decode_cursor)
            .transpose()?;

        let state = self
            .state
            .read()
            .map_err(|e| RegistryError::internal(format!("failed to acquire read lock: {}", e)))?;

        let mut matching: Vec<&Record> = state
            .records
            .values()
            .filter(|stored| {
                if let Some(parent) = options.parent_resource_id {
                    if stored.parent_id != Some(parent) {
                        return false;
                    }
                }
                let record = &stored.record;
                if let Some(type_ids) = &options.type_ids {
                    if !type_ids.contains(&record.type_id) {
                        return false;
                    }
                }
                if let Some(name) = &options.name {
                    if &record.name != name {
                        return false;
                    }
                }
                if let Some(prefix) = &options.name_prefix {
                    if !record.name.starts_with(prefix.as_str()) {
                        return false;
                    }
                }
                if let Some(external_id) = &options.external_id {
                    if record.external_id.as_ref() != Some(external_id) {
                        return false;
                    }
                }
                if let Some(runtime) = &options.runtime {
                    let record_runtime = record
                        .properties
                        .get(keys::RUNTIME)
                        .and_then(|v| v.as_str());
                    if record_runtime != Some(runtime.as_str()) {
                        return false;
                    }
                }
                if let Some(expr) = &filter {
                    if !matches(expr, record) {
                        return false;
                    }
                }
                true
            })
            .map(|stored| &stored.record)
            .collect();

        matching.sort_by(|a, b| {
            let ka = sort_key(a, order_by);
            let kb = sort_key(b, order_by);
            compare((&ka, a.id.unwrap_or(0)), (&kb, b.id.unwrap_or(0)), sort_order)
        });

        let start = match &cursor {
            None => 0,
            Some(cursor) => matching
                .iter()
                .position(|record| {
                    let key = sort_key(record, order_by);
                    compare(
                        (&key, record.id.unwrap_or(0)),
                        (&cursor.key, cursor.id),
                        sort_order,
                    ) == std::cmp::Ordering::Greater
                })
                .unwrap_or(matching.len()),
        };

        let items: Vec<Record> = matching
            .iter()
            .skip(start)
            .take(page_size as usize)
            .map(|record| (*record).clone())
            .collect();

        let next_page_token = if start + items.len() < matching.len() {
            items
                .last()
                .map(|last| {
                    encode_cursor(&PageCursor {
                        key: sort_key(last, order_by),
                        id: last.id.unwrap_or(0),
                    })
                })
                .unwrap_or_default()
        } else {
            String::new()
        };

        let size = items.len() as i32;
        Ok(Page {
            items,
            next_page_token,
            page_size,
            size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repository::Pagination;
    use crate::domain::value::PropertyValue;
    use std::collections::HashSet;

    fn record(type_id: i32, name: &str) -> Record {
        Record::new(type_id, name)
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_timestamps() {
        let repo = InMemoryRecordRepository::new();
        let mut input = record(1, "mnist");
        input.create_time_since_epoch = 12345;
        input.last_update_time_since_epoch = 67890;

        let saved = repo.save(input, None).await.unwrap();
        assert!(saved.id.is_some());
        // caller-supplied timestamps are ignored
        assert_ne!(saved.create_time_since_epoch, 12345);
        assert_eq!(saved.create_time_since_epoch, saved.last_update_time_since_epoch);
    }

    #[tokio::test]
    async fn test_update_keeps_create_time_and_bumps_last_update() {
        let repo = InMemoryRecordRepository::new();
        let saved = repo.save(record(1, "mnist"), None).await.unwrap();
        let create_time = saved.create_time_since_epoch;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let mut update = saved.clone();
        update.create_time_since_epoch = 1;
        let updated = repo.save(update, None).await.unwrap();

        assert_eq!(updated.create_time_since_epoch, create_time);
        assert!(updated.last_update_time_since_epoch > create_time);
    }

    #[tokio::test]
    async fn test_duplicate_name_conflicts() {
        let repo = InMemoryRecordRepository::new();
        repo.save(record(1, "mnist"), None).await.unwrap();

        let err = repo.save(record(1, "mnist"), None).await.unwrap_err();
        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_update_missing_record_is_not_found() {
        let repo = InMemoryRecordRepository::new();
        let mut input = record(1, "mnist");
        input.id = Some(99);

        let err = repo.save(input, None).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let repo = InMemoryRecordRepository::new();
        let saved = repo.save(record(1, "mnist"), None).await.unwrap();

        let fetched = repo.get_by_id(saved.id.unwrap()).await.unwrap();
        assert_eq!(fetched.name, "mnist");

        assert!(repo.get_by_id(12345).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_parent_scope_filter() {
        let repo = InMemoryRecordRepository::new();
        repo.save(record(2, "1:v1"), Some(1)).await.unwrap();
        repo.save(record(2, "1:v2"), Some(1)).await.unwrap();
        repo.save(record(2, "2:v1"), Some(2)).await.unwrap();

        let page = repo
            .list(ListOptions::new().with_parent_resource_id(1))
            .await
            .unwrap();
        assert_eq!(page.size, 2);
    }

    #[tokio::test]
    async fn test_name_prefix_filter() {
        let repo = InMemoryRecordRepository::new();
        repo.save(record(2, "7:loss__100"), Some(7)).await.unwrap();
        repo.save(record(2, "7:loss__200"), Some(7)).await.unwrap();
        repo.save(record(2, "7:loss2__100"), Some(7)).await.unwrap();

        let page = repo
            .list(ListOptions::new().with_name_prefix("7:loss__"))
            .await
            .unwrap();
        assert_eq!(page.size, 2);
        assert!(page.items.iter().all(|r| r.name.starts_with("7:loss__")));
    }

    #[tokio::test]
    async fn test_pagination_walk_visits_each_item_exactly_once() {
        let repo = InMemoryRecordRepository::new();
        for i in 0..15 {
            repo.save(record(3, &format!("artifact-{:02}", i)), None)
                .await
                .unwrap();
        }

        let mut seen = HashSet::new();
        let mut token = String::new();
        let mut pages = 0;
        loop {
            let mut pagination = Pagination::new()
                .with_page_size(5)
                .with_order_by("NAME")
                .with_sort_order(SortOrder::Asc);
            if !token.is_empty() {
                pagination = pagination.with_next_page_token(token.clone());
            }
            let page = repo
                .list(ListOptions::new().with_pagination(pagination))
                .await
                .unwrap();
            pages += 1;
            assert_eq!(page.page_size, 5);
            assert_eq!(page.size, page.items.len() as i32);
            for item in &page.items {
                assert!(seen.insert(item.id.unwrap()), "duplicate item across pages");
            }
            if page.next_page_token.is_empty() {
                break;
            }
            token = page.next_page_token;
        }

        assert_eq!(pages, 3);
        assert_eq!(seen.len(), 15);
    }

    #[tokio::test]
    async fn test_ordering_by_name_ascending() {
        let repo = InMemoryRecordRepository::new();
        for name in ["charlie", "alpha", "bravo"] {
            repo.save(record(1, name), None).await.unwrap();
        }

        let page = repo
            .list(ListOptions::new().with_pagination(
                Pagination::new().with_order_by("NAME").with_sort_order(SortOrder::Asc),
            ))
            .await
            .unwrap();
        let names: Vec<&str> = page.items.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "bravo", "charlie"]);
    }

    #[tokio::test]
    async fn test_default_sort_is_descending_by_id() {
        let repo = InMemoryRecordRepository::new();
        let first = repo.save(record(1, "a"), None).await.unwrap();
        let second = repo.save(record(1, "b"), None).await.unwrap();

        let page = repo.list(ListOptions::new()).await.unwrap();
        assert_eq!(page.items[0].id, second.id);
        assert_eq!(page.items[1].id, first.id);
    }

    #[tokio::test]
    async fn test_filter_query_on_custom_properties() {
        let repo = InMemoryRecordRepository::new();
        let mut a = record(1, "exp-a");
        a.custom_properties
            .insert("project".to_string(), PropertyValue::from("nlp"));
        a.custom_properties
            .insert("budget".to_string(), PropertyValue::from(15000.0));
        let mut b = record(1, "exp-b");
        b.custom_properties
            .insert("project".to_string(), PropertyValue::from("nlp"));
        b.custom_properties
            .insert("budget".to_string(), PropertyValue::from(9000.0));
        repo.save(a, None).await.unwrap();
        repo.save(b, None).await.unwrap();

        let page = repo
            .list(ListOptions::new().with_pagination(
                Pagination::new()
                    .with_filter_query("project = 'nlp' AND budget.double_value > 12000"),
            ))
            .await
            .unwrap();
        assert_eq!(page.size, 1);
        assert_eq!(page.items[0].name, "exp-a");
    }

    #[tokio::test]
    async fn test_invalid_filter_query_is_bad_request() {
        let repo = InMemoryRecordRepository::new();
        let err = repo
            .list(ListOptions::new().with_pagination(Pagination::new().with_filter_query("name >")))
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_invalid_page_token_is_bad_request() {
        let repo = InMemoryRecordRepository::new();
        let err = repo
            .list(
                ListOptions::new()
                    .with_pagination(Pagination::new().with_next_page_token("not-base64!")),
            )
            .await
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[tokio::test]
    async fn test_type_id_filter() {
        let repo = InMemoryRecordRepository::new();
        repo.save(record(3, "metric-a"), None).await.unwrap();
        repo.save(record(8, "metric-a__17"), None).await.unwrap();

        let page = repo
            .list(ListOptions::new().with_type_ids(vec![3]))
            .await
            .unwrap();
        assert_eq!(page.size, 1);
        assert_eq!(page.items[0].name, "metric-a");
    }
}
