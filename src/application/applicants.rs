//! Applicant and admin listings built on the listing engine.

use uuid::Uuid;

use crate::application::listing::{
    AdminFilter, AdminInclude, CollectionQuery, ListedRecord, ListingEngine, ListingError,
    OrderField, OrderSpec, ServiceProviderFilter, ServiceProviderInclude, SortDirection,
    StudentFilter, StudentInclude,
};
use crate::application::pagination::{PageRequest, PageResult};
use crate::config::ListingSettings;

/// Raw listing parameters as received from a client.
#[derive(Debug, Clone, Default)]
pub struct ListingParams {
    pub page_size: Option<u32>,
    pub current_page: Option<u32>,
    pub search: Option<String>,
    pub state: Option<String>,
    pub category_id: Option<Uuid>,
    pub discipline: Option<String>,
    pub sort: Option<String>,
    pub direction: Option<String>,
}

#[derive(Clone)]
pub struct ApplicantService {
    engine: ListingEngine,
    settings: ListingSettings,
}

impl ApplicantService {
    pub fn new(engine: ListingEngine, settings: ListingSettings) -> Self {
        Self { engine, settings }
    }

    /// Lists students within one category, newest first unless told otherwise.
    pub async fn list_students(
        &self,
        params: ListingParams,
    ) -> Result<PageResult<ListedRecord>, ListingError> {
        let page = self.page_request(&params)?;
        let order = order_spec(&params)?;
        let category_id = params.category_id.ok_or_else(|| {
            ListingError::InvalidArgument("categoryId is required".to_string())
        })?;

        let query = CollectionQuery::Students {
            filter: StudentFilter {
                category_id: Some(category_id),
                search: normalize(params.search),
                state: normalize(params.state),
            },
            include: StudentInclude::default(),
        };
        self.engine.list(page, &query, order).await
    }

    pub async fn list_service_providers(
        &self,
        params: ListingParams,
    ) -> Result<PageResult<ListedRecord>, ListingError> {
        let page = self.page_request(&params)?;
        let order = order_spec(&params)?;

        let query = CollectionQuery::ServiceProviders {
            filter: ServiceProviderFilter {
                search: normalize(params.search),
                state: normalize(params.state),
                discipline: normalize(params.discipline),
            },
            include: ServiceProviderInclude::default(),
        };
        self.engine.list(page, &query, order).await
    }

    /// Lists admins that have not been soft-deleted.
    pub async fn list_admins(
        &self,
        params: ListingParams,
    ) -> Result<PageResult<ListedRecord>, ListingError> {
        let page = self.page_request(&params)?;
        let order = order_spec(&params)?;

        let query = CollectionQuery::Admins {
            filter: AdminFilter {
                search: normalize(params.search),
                discipline: normalize(params.discipline),
            },
            include: AdminInclude::default(),
        };
        self.engine.list(page, &query, order).await
    }

    fn page_request(&self, params: &ListingParams) -> Result<PageRequest, ListingError> {
        let page_size = params
            .page_size
            .unwrap_or(self.settings.default_page_size.get());
        if page_size > self.settings.max_page_size.get() {
            return Err(ListingError::InvalidArgument(format!(
                "pageSize must not exceed {}",
                self.settings.max_page_size
            )));
        }
        let current_page = params.current_page.unwrap_or(1);

        let request = PageRequest::new(page_size, current_page);
        request.validate()?;
        Ok(request)
    }
}

fn order_spec(params: &ListingParams) -> Result<OrderSpec, ListingError> {
    let field = match params.sort.as_deref() {
        Some(value) => value
            .parse::<OrderField>()
            .map_err(ListingError::InvalidArgument)?,
        None => OrderField::CreatedAt,
    };
    let direction = match params.direction.as_deref() {
        Some(value) => value
            .parse::<SortDirection>()
            .map_err(ListingError::InvalidArgument)?,
        None => SortDirection::Desc,
    };
    Ok(OrderSpec { field, direction })
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}
