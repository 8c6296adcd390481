use async_trait::async_trait;
use sqlx::{Postgres, QueryBuilder};
use tracing::debug;

use crate::{
    application::listing::{
        AdminFilter, CollectionQuery, ListedRecord, OrderField, OrderSpec, ServiceProviderFilter,
        StudentFilter,
    },
    application::repos::{ListingRepo, RepoError},
    domain::entities::{AdminListing, ServiceProviderListing, StudentListing},
    domain::types::EntityKind,
};

use super::{
    PostgresRepositories, map_sqlx_error,
    rows::{
        ADMIN_COLUMNS, ADMIN_INFO_COLUMNS, AdminListingRow, CATEGORY_COLUMNS, OVERVIEW_COLUMNS,
        SERVICE_PROVIDER_COLUMNS, STUDENT_COLUMNS, ServiceProviderListingRow, StudentListingRow,
        USER_COLUMNS,
    },
    util::like_pattern,
};

const SOURCE: &str = "infra::db::listing";

// One-to-one relations are always joined; they are needed by the state
// filter and the include flags only decide what is returned.
const STUDENT_FROM: &str = " FROM students s \
    INNER JOIN users u ON u.id = s.user_id \
    LEFT JOIN professional_overviews po ON po.student_id = s.id \
    LEFT JOIN categories c ON c.id = s.category_id \
    WHERE TRUE";

const SERVICE_PROVIDER_FROM: &str = " FROM service_providers sp \
    INNER JOIN users u ON u.id = sp.user_id \
    LEFT JOIN professional_overviews po ON po.service_provider_id = sp.id \
    WHERE TRUE";

const ADMIN_FROM: &str = " FROM admins a \
    INNER JOIN users u ON u.id = a.user_id \
    LEFT JOIN admin_information ai ON ai.admin_id = a.id \
    WHERE TRUE";

fn push_user_search(qb: &mut QueryBuilder<'_, Postgres>, search: &str, with_phone: bool) {
    let pattern = like_pattern(search);
    qb.push(" AND (u.first_name ILIKE ");
    qb.push_bind(pattern.clone());
    qb.push(" OR u.last_name ILIKE ");
    qb.push_bind(pattern.clone());
    qb.push(" OR u.email ILIKE ");
    qb.push_bind(pattern.clone());
    if with_phone {
        qb.push(" OR po.phone_number ILIKE ");
        qb.push_bind(pattern);
    }
    qb.push(")");
}

/// Case-insensitive equality; no wildcard expansion.
fn push_equals_ignore_case(qb: &mut QueryBuilder<'_, Postgres>, column: &str, value: &str) {
    qb.push(format!(" AND LOWER({column}) = LOWER("));
    qb.push_bind(value.to_string());
    qb.push(")");
}

fn push_student_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &StudentFilter) {
    if let Some(category_id) = filter.category_id {
        qb.push(" AND s.category_id = ");
        qb.push_bind(category_id);
    }
    if let Some(search) = filter.search.as_deref() {
        push_user_search(qb, search, true);
    }
    if let Some(state) = filter.state.as_deref() {
        push_equals_ignore_case(qb, "po.state", state);
    }
}

fn push_service_provider_filter(
    qb: &mut QueryBuilder<'_, Postgres>,
    filter: &ServiceProviderFilter,
) {
    if let Some(search) = filter.search.as_deref() {
        push_user_search(qb, search, true);
    }
    if let Some(state) = filter.state.as_deref() {
        push_equals_ignore_case(qb, "po.state", state);
    }
    if let Some(discipline) = filter.discipline.as_deref() {
        push_equals_ignore_case(qb, "u.field", discipline);
    }
}

fn push_admin_filter(qb: &mut QueryBuilder<'_, Postgres>, filter: &AdminFilter) {
    qb.push(" AND a.deleted = FALSE");
    if let Some(search) = filter.search.as_deref() {
        push_user_search(qb, search, false);
    }
    if let Some(discipline) = filter.discipline.as_deref() {
        push_equals_ignore_case(qb, "ai.job_title", discipline);
    }
}

fn push_filter(qb: &mut QueryBuilder<'_, Postgres>, query: &CollectionQuery) {
    match query {
        CollectionQuery::Students { filter, .. } => push_student_filter(qb, filter),
        CollectionQuery::ServiceProviders { filter, .. } => {
            push_service_provider_filter(qb, filter)
        }
        CollectionQuery::Admins { filter, .. } => push_admin_filter(qb, filter),
    }
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, alias: &str, order: OrderSpec) {
    let direction = order.direction.as_sql();
    qb.push(" ORDER BY ");
    match order.field {
        OrderField::CreatedAt => qb.push(format!("{alias}.created_at {direction}")),
        OrderField::UpdatedAt => qb.push(format!("{alias}.updated_at {direction}")),
        OrderField::LastName => qb.push(format!("LOWER(u.last_name) {direction}")),
    };
    qb.push(format!(", {alias}.id {direction}"));
}

fn push_window(qb: &mut QueryBuilder<'_, Postgres>, limit: u32, offset: u64) {
    qb.push(" LIMIT ");
    qb.push_bind(i64::from(limit));
    qb.push(" OFFSET ");
    qb.push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
}

fn from_clause(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Student => STUDENT_FROM,
        EntityKind::ServiceProvider => SERVICE_PROVIDER_FROM,
        EntityKind::Admin => ADMIN_FROM,
    }
}

/// `SELECT` of one account row with its user and one-to-one relations,
/// ready for further `AND` conditions.
pub(super) fn head_query(kind: EntityKind) -> QueryBuilder<'static, Postgres> {
    let columns = match kind {
        EntityKind::Student => {
            format!("{STUDENT_COLUMNS}, {USER_COLUMNS}, {OVERVIEW_COLUMNS}, {CATEGORY_COLUMNS}")
        }
        EntityKind::ServiceProvider => {
            format!("{SERVICE_PROVIDER_COLUMNS}, {USER_COLUMNS}, {OVERVIEW_COLUMNS}")
        }
        EntityKind::Admin => format!("{ADMIN_COLUMNS}, {USER_COLUMNS}, {ADMIN_INFO_COLUMNS}"),
    };
    QueryBuilder::new(format!("SELECT {columns}{}", from_clause(kind)))
}

#[async_trait]
impl ListingRepo for PostgresRepositories {
    async fn find_many(
        &self,
        query: &CollectionQuery,
        order: OrderSpec,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ListedRecord>, RepoError> {
        let mut qb = head_query(query.kind());
        push_filter(&mut qb, query);

        let records = match query {
            CollectionQuery::Students { include, .. } => {
                push_order(&mut qb, "s", order);
                push_window(&mut qb, limit, offset);
                let rows = qb
                    .build_query_as::<StudentListingRow>()
                    .fetch_all(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
                rows.into_iter()
                    .map(|row| {
                        ListedRecord::Student(StudentListing {
                            student: row.student.into(),
                            user: row.user.into(),
                            professional_overview: include
                                .professional_overview
                                .then(|| row.overview.into_overview())
                                .flatten(),
                            category: include
                                .category
                                .then(|| row.category.into_category())
                                .flatten(),
                        })
                    })
                    .collect::<Vec<_>>()
            }
            CollectionQuery::ServiceProviders { include, .. } => {
                push_order(&mut qb, "sp", order);
                push_window(&mut qb, limit, offset);
                let rows = qb
                    .build_query_as::<ServiceProviderListingRow>()
                    .fetch_all(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
                rows.into_iter()
                    .map(|row| {
                        ListedRecord::ServiceProvider(ServiceProviderListing {
                            service_provider: row.service_provider.into(),
                            user: row.user.into(),
                            professional_overview: include
                                .professional_overview
                                .then(|| row.overview.into_overview())
                                .flatten(),
                        })
                    })
                    .collect()
            }
            CollectionQuery::Admins { include, .. } => {
                push_order(&mut qb, "a", order);
                push_window(&mut qb, limit, offset);
                let rows = qb
                    .build_query_as::<AdminListingRow>()
                    .fetch_all(self.pool())
                    .await
                    .map_err(map_sqlx_error)?;
                rows.into_iter()
                    .map(|row| {
                        ListedRecord::Admin(AdminListing {
                            admin: row.admin.into(),
                            user: row.user.into(),
                            information: include
                                .information
                                .then(|| row.information.into_information())
                                .flatten(),
                        })
                    })
                    .collect()
            }
        };

        debug!(
            target = SOURCE,
            kind = %query.kind(),
            limit,
            offset,
            returned = records.len(),
            "listing page fetched"
        );
        Ok(records)
    }

    async fn count(&self, query: &CollectionQuery) -> Result<u64, RepoError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*)");
        qb.push(from_clause(query.kind()));
        push_filter(&mut qb, query);

        let total = qb
            .build_query_scalar::<i64>()
            .fetch_one(self.pool())
            .await
            .map_err(map_sqlx_error)?;
        Self::convert_count(total)
    }
}
