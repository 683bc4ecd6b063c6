//! Repository contract consumed by the entity services
//!
//! One repository instance per entity kind. The contract is intentionally
//! narrow: `save`, `get_by_id`, `list`. Uniqueness of the (scope-prefixed)
//! name is enforced here and surfaced as a duplicate-key shaped error.

use std::fmt::Debug;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::error::RegistryError;
use super::record::Record;

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl Default for SortOrder {
    fn default() -> Self {
        Self::Desc
    }
}

/// Orderable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderBy {
    Id,
    Name,
    CreateTime,
    LastUpdateTime,
}

impl OrderBy {
    /// Parse an order-by field name. Accepts the screaming-case API names
    /// and the bare column names.
    pub fn parse(field: &str) -> Result<Self, RegistryError> {
        match field {
            "ID" | "id" => Ok(Self::Id),
            "NAME" | "name" => Ok(Self::Name),
            "CREATE_TIME" | "create_time_since_epoch" => Ok(Self::CreateTime),
            "LAST_UPDATE_TIME" | "last_update_time_since_epoch" => Ok(Self::LastUpdateTime),
            other => Err(RegistryError::bad_request(format!(
                "unsupported order by field '{}'",
                other
            ))),
        }
    }
}

/// Common pagination options shared by every listing
#[derive(Debug, Clone, Default)]
pub struct Pagination {
    pub page_size: Option<i32>,
    pub order_by: Option<String>,
    pub sort_order: Option<SortOrder>,
    pub next_page_token: Option<String>,
    pub filter_query: Option<String>,
}

impl Pagination {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page_size(mut self, page_size: i32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn with_order_by(mut self, order_by: impl Into<String>) -> Self {
        self.order_by = Some(order_by.into());
        self
    }

    pub fn with_sort_order(mut self, sort_order: SortOrder) -> Self {
        self.sort_order = Some(sort_order);
        self
    }

    pub fn with_next_page_token(mut self, token: impl Into<String>) -> Self {
        self.next_page_token = Some(token.into());
        self
    }

    pub fn with_filter_query(mut self, query: impl Into<String>) -> Self {
        self.filter_query = Some(query.into());
        self
    }
}

/// Listing options: typed filters layered on the common pagination
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    pub pagination: Pagination,
    /// Exact storage-name match (already scope-prefixed)
    pub name: Option<String>,
    /// Storage-name prefix match, used for the timestamp-suffixed
    /// metric-history names
    pub name_prefix: Option<String>,
    pub external_id: Option<String>,
    /// Restrict to children of this parent resource
    pub parent_resource_id: Option<i32>,
    /// Restrict to these record type ids (repositories shared by several
    /// kinds, like the artifact family)
    pub type_ids: Option<Vec<i32>>,
    /// InferenceService runtime filter
    pub runtime: Option<String>,
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = Some(prefix.into());
        self
    }

    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    pub fn with_parent_resource_id(mut self, parent_id: i32) -> Self {
        self.parent_resource_id = Some(parent_id);
        self
    }

    pub fn with_type_ids(mut self, type_ids: Vec<i32>) -> Self {
        self.type_ids = Some(type_ids);
        self
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }
}

/// One page of a listing
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque continuation token; empty when the listing is exhausted
    pub next_page_token: String,
    pub page_size: i32,
    /// Count of items in this page, not the total matching count
    pub size: i32,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_page_token: self.next_page_token,
            page_size: self.page_size,
            size: self.size,
        }
    }
}

/// Per-entity-kind persistence contract
#[async_trait]
pub trait RecordRepository: Send + Sync + Debug {
    /// Create or update a record. Creation allocates the id and the create
    /// timestamp; both timestamps are server-owned and caller values are
    /// ignored. A storage-name collision within scope fails with Conflict.
    async fn save(
        &self,
        record: Record,
        parent_id: Option<i32>,
    ) -> Result<Record, RegistryError>;

    /// Fetch a record by id, failing with NotFound when absent.
    async fn get_by_id(&self, id: i32) -> Result<Record, RegistryError>;

    /// List records matching the options. An unparseable filter query fails
    /// with BadRequest. Walking the token chain with fixed options visits
    /// every matching record exactly once.
    async fn list(&self, options: ListOptions) -> Result<Page<Record>, RegistryError>;
}
