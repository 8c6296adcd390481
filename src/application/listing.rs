//! Generic paginated filter/sort engine used by every list endpoint.
//!
//! A listing runs two independent reads against canonical storage: the page
//! itself and the total count. They are issued concurrently and are not
//! wrapped in a shared snapshot, so a write landing between them can make
//! `total_pages` disagree with the page contents by one record.

use std::str::FromStr;
use std::sync::Arc;

use metrics::counter;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::application::pagination::{PageRequest, PageResult, PaginationError};
use crate::application::repos::{ListingRepo, RepoError};
use crate::domain::entities::{AdminListing, ServiceProviderListing, StudentListing};
use crate::domain::types::EntityKind;

const SOURCE: &str = "application::listing";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StudentFilter {
    pub category_id: Option<Uuid>,
    pub search: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentInclude {
    pub professional_overview: bool,
    pub category: bool,
}

impl Default for StudentInclude {
    fn default() -> Self {
        Self {
            professional_overview: true,
            category: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceProviderFilter {
    pub search: Option<String>,
    pub state: Option<String>,
    /// Matches the user's field (discipline) exactly, ignoring case.
    pub discipline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceProviderInclude {
    pub professional_overview: bool,
}

impl Default for ServiceProviderInclude {
    fn default() -> Self {
        Self {
            professional_overview: true,
        }
    }
}

/// Admin listings always exclude soft-deleted admins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminFilter {
    pub search: Option<String>,
    /// Matches the admin's job title exactly, ignoring case.
    pub discipline: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminInclude {
    pub information: bool,
}

impl Default for AdminInclude {
    fn default() -> Self {
        Self { information: true }
    }
}

/// Target collection together with its filter predicate and relations to attach.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CollectionQuery {
    Students {
        filter: StudentFilter,
        include: StudentInclude,
    },
    ServiceProviders {
        filter: ServiceProviderFilter,
        include: ServiceProviderInclude,
    },
    Admins {
        filter: AdminFilter,
        include: AdminInclude,
    },
}

impl CollectionQuery {
    pub fn kind(&self) -> EntityKind {
        match self {
            CollectionQuery::Students { .. } => EntityKind::Student,
            CollectionQuery::ServiceProviders { .. } => EntityKind::ServiceProvider,
            CollectionQuery::Admins { .. } => EntityKind::Admin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderField {
    #[default]
    CreatedAt,
    UpdatedAt,
    LastName,
}

impl FromStr for OrderField {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "created_at" | "createdAt" => Ok(Self::CreatedAt),
            "updated_at" | "updatedAt" => Ok(Self::UpdatedAt),
            "last_name" | "lastName" => Ok(Self::LastName),
            other => Err(format!("unsupported sort field `{other}`")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(format!("unsupported sort direction `{other}`")),
        }
    }
}

/// Ordering for a listing. Ties are always broken by primary key in the same
/// direction, so pages are deterministic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrderSpec {
    pub field: OrderField,
    pub direction: SortDirection,
}

impl OrderSpec {
    pub const fn newest_first() -> Self {
        Self {
            field: OrderField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListedRecord {
    Student(StudentListing),
    ServiceProvider(ServiceProviderListing),
    Admin(AdminListing),
}

#[derive(Debug, Error)]
pub enum ListingError {
    #[error("invalid listing request: {0}")]
    InvalidArgument(String),
    #[error(transparent)]
    Pagination(#[from] PaginationError),
    #[error(transparent)]
    Repo(#[from] RepoError),
}

#[derive(Clone)]
pub struct ListingEngine {
    store: Arc<dyn ListingRepo>,
}

impl ListingEngine {
    pub fn new(store: Arc<dyn ListingRepo>) -> Self {
        Self { store }
    }

    /// Returns one page of `query` ordered by `order`, plus the total page count.
    ///
    /// The page request is validated before storage is touched.
    #[instrument(skip(self, query), fields(kind = %query.kind()))]
    pub async fn list(
        &self,
        page: PageRequest,
        query: &CollectionQuery,
        order: OrderSpec,
    ) -> Result<PageResult<ListedRecord>, ListingError> {
        page.validate()?;

        let offset = page.offset();
        let (records, total) = tokio::try_join!(
            self.store.find_many(query, order, page.page_size, offset),
            self.store.count(query),
        )?;

        counter!("talentdesk_listing_query_total", "kind" => query.kind().as_str()).increment(1);
        debug!(
            target = SOURCE,
            total,
            returned = records.len(),
            offset,
            "listing page resolved"
        );

        Ok(PageResult::from_total(total, page.page_size, records))
    }
}
