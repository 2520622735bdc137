//! Postgres repository implementation using Diesel.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic migration execution (schema plus seeded expense categories)
//!
//! Every call runs on the blocking thread pool; a failed statement is
//! reported once and never retried.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use diesel::dsl::exists;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::collections::HashMap;
use std::time::Duration;
use tokio::task;

use crate::api::*;
use crate::db::repository::{
    CalculationRepository, CatalogRepository, ErrorContext, ExpenseRepository, RepositoryError,
    RepositoryResult, SalesRepository,
};

mod models;
mod schema;

use models::*;
use schema::*;

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
        }
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let defaults = Self::default();
        Ok(Self {
            database_url,
            max_pool_size: env_or("PG_POOL_MAX", defaults.max_pool_size),
            min_pool_size: env_or("PG_POOL_MIN", defaults.min_pool_size),
            connection_timeout_sec: env_or("PG_CONN_TIMEOUT_SEC", defaults.connection_timeout_sec),
            idle_timeout_sec: env_or("PG_IDLE_TIMEOUT_SEC", defaults.idle_timeout_sec),
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    ///
    /// Blocks while the pool fills; call it from a blocking context.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true)
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        log::info!(
            "Postgres repository ready (max_pool_size={})",
            config.max_pool_size
        );

        Ok(Self { pool })
    }

    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Run a database operation on the blocking pool with a pooled connection.
    async fn with_conn<T, F>(&self, operation: &'static str, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static,
    {
        let pool = self.pool.clone();

        task::spawn_blocking(move || {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection"),
                )
            })?;

            f(&mut conn).map_err(|e| {
                log::warn!("{} failed: {}", operation, e);
                e.with_operation(operation)
            })
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }
}

fn ids<T: Copy + Into<i64>>(values: &[T]) -> Vec<i64> {
    let mut out: Vec<i64> = Vec::with_capacity(values.len());
    for value in values {
        let id = (*value).into();
        if !out.contains(&id) {
            out.push(id);
        }
    }
    out
}

fn load_event_summaries(
    conn: &mut PgConnection,
    event_ids: Vec<i64>,
) -> RepositoryResult<HashMap<i64, EventSummary>> {
    if event_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<EventRow> = events::table
        .filter(events::id.eq_any(event_ids))
        .select(EventRow::as_select())
        .load(conn)?;
    rows.into_iter()
        .map(|row| {
            let event = row.into_event()?;
            Ok((event.id.value(), EventSummary::from(&event)))
        })
        .collect()
}

fn load_sale_details(
    conn: &mut PgConnection,
    rows: Vec<SaleRow>,
) -> RepositoryResult<Vec<SaleDetails>> {
    let sale_ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    let package_ids: Vec<i64> = rows.iter().filter_map(|r| r.package_id).collect();

    let packages: HashMap<i64, PackageSummary> = if package_ids.is_empty() {
        HashMap::new()
    } else {
        packages::table
            .filter(packages::id.eq_any(package_ids))
            .select(PackageRow::as_select())
            .load::<PackageRow>(conn)?
            .into_iter()
            .map(|row| {
                let package = Package::from(row);
                (package.id.value(), PackageSummary::from(&package))
            })
            .collect()
    };

    let links: Vec<(i64, EventRow)> = sale_events::table
        .inner_join(events::table)
        .filter(sale_events::sale_id.eq_any(sale_ids))
        .select((sale_events::sale_id, EventRow::as_select()))
        .order((events::event_date.asc(), events::id.asc()))
        .load(conn)?;

    let mut events_by_sale: HashMap<i64, Vec<EventSummary>> = HashMap::new();
    for (sale_id, row) in links {
        let event = row.into_event()?;
        events_by_sale
            .entry(sale_id)
            .or_default()
            .push(EventSummary::from(&event));
    }

    rows.into_iter()
        .map(|row| {
            let id = row.id;
            let package_id = row.package_id;
            let mut details = SaleDetails::new(row.into_sale()?);
            details.package = package_id.and_then(|p| packages.get(&p).cloned());
            details.events = events_by_sale.remove(&id).unwrap_or_default();
            Ok(details)
        })
        .collect()
}

fn load_expense_details(
    conn: &mut PgConnection,
    rows: Vec<ExpenseRow>,
) -> RepositoryResult<Vec<ExpenseDetails>> {
    let categories: HashMap<i64, CategoryRow> = expense_categories::table
        .select(CategoryRow::as_select())
        .load::<CategoryRow>(conn)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let subcategory_ids: Vec<i64> = rows.iter().map(|r| r.subcategory_id).collect();
    let subcategories: HashMap<i64, String> = expense_subcategories::table
        .filter(expense_subcategories::id.eq_any(subcategory_ids))
        .select(SubcategoryRow::as_select())
        .load::<SubcategoryRow>(conn)?
        .into_iter()
        .map(|s| (s.id, s.subcategory_name))
        .collect();
    let events = load_event_summaries(conn, rows.iter().filter_map(|r| r.event_id).collect())?;

    rows.into_iter()
        .map(|row| {
            let category = categories.get(&row.category_id);
            let subcategory_name = subcategories.get(&row.subcategory_id).cloned();
            let event = row.event_id.and_then(|id| events.get(&id).cloned());
            let mut details = ExpenseDetails::new(row.into_expense()?);
            details.category_name = category.map(|c| c.category_name.clone());
            details.category_icon = category.and_then(|c| c.icon.clone());
            details.subcategory_name = subcategory_name;
            details.event = event;
            Ok(details)
        })
        .collect()
}

fn load_calculation_details(
    conn: &mut PgConnection,
    rows: Vec<CalculationRow>,
) -> RepositoryResult<Vec<CalculationDetails>> {
    let events = load_event_summaries(conn, rows.iter().filter_map(|r| r.event_id).collect())?;
    rows.into_iter()
        .map(|row| {
            let event = row.event_id.and_then(|id| events.get(&id).cloned());
            Ok(CalculationDetails {
                calculation: row.into_calculation()?,
                event,
            })
        })
        .collect()
}

#[async_trait]
impl CatalogRepository for PostgresRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn("health_check", |conn| {
            sql_query("SELECT 1").execute(conn).map(|_| true).map_err(Into::into)
        })
        .await
    }

    async fn list_events(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>> {
        let filter = filter.clone();
        self.with_conn("list_events", move |conn| {
            let mut query = events::table.select(EventRow::as_select()).into_boxed();
            if let Some(status) = filter.status {
                query = query.filter(events::status.eq(status.as_str()));
            }
            if let Some(city) = filter.city {
                query = query.filter(events::city.eq(city));
            }
            if filter.active_only {
                query = query.filter(events::status.eq(EventStatus::Activo.as_str()));
            }
            query = query.order((events::event_date.asc(), events::id.asc()));
            if let Some(limit) = filter.limit {
                query = query.limit(limit as i64);
            }
            let rows: Vec<EventRow> = query.load(conn)?;
            rows.into_iter().map(EventRow::into_event).collect()
        })
        .await
    }

    async fn get_event(&self, id: EventId) -> RepositoryResult<Option<Event>> {
        self.with_conn("get_event", move |conn| {
            events::table
                .find(id.value())
                .select(EventRow::as_select())
                .first::<EventRow>(conn)
                .optional()?
                .map(EventRow::into_event)
                .transpose()
        })
        .await
    }

    async fn get_events(&self, ids_in: &[EventId]) -> RepositoryResult<Vec<Event>> {
        let event_ids = ids(ids_in);
        self.with_conn("get_events", move |conn| {
            let rows: Vec<EventRow> = events::table
                .filter(events::id.eq_any(event_ids))
                .select(EventRow::as_select())
                .order((events::event_date.asc(), events::id.asc()))
                .load(conn)?;
            rows.into_iter().map(EventRow::into_event).collect()
        })
        .await
    }

    async fn event_slug_exists(&self, slug: &str) -> RepositoryResult<bool> {
        let slug = slug.to_string();
        self.with_conn("event_slug_exists", move |conn| {
            diesel::select(exists(events::table.filter(events::event_slug.eq(slug))))
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }

    async fn insert_event(&self, event: NewEvent) -> RepositoryResult<Event> {
        let row = NewEventRow::from(event);
        self.with_conn("insert_event", move |conn| {
            diesel::insert_into(events::table)
                .values(&row)
                .returning(EventRow::as_returning())
                .get_result::<EventRow>(conn)?
                .into_event()
        })
        .await
    }

    async fn update_event(
        &self,
        id: EventId,
        changes: &EventChanges,
    ) -> RepositoryResult<Option<Event>> {
        if changes.is_empty() {
            return self.get_event(id).await;
        }
        let changeset = EventChangeset::from(changes);
        self.with_conn("update_event", move |conn| {
            diesel::update(events::table.find(id.value()))
                .set(&changeset)
                .returning(EventRow::as_returning())
                .get_result::<EventRow>(conn)
                .optional()?
                .map(EventRow::into_event)
                .transpose()
        })
        .await
    }

    async fn delete_event(&self, id: EventId) -> RepositoryResult<bool> {
        self.with_conn("delete_event", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let referenced: bool = diesel::select(exists(
                    sale_events::table.filter(sale_events::event_id.eq(id.value())),
                ))
                .get_result(tx)?;
                if referenced {
                    return Err(RepositoryError::conflict_with_context(
                        "Event is referenced by sales",
                        ErrorContext::new("delete_event")
                            .with_entity("event")
                            .with_entity_id(id),
                    ));
                }
                let deleted = diesel::delete(events::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn list_packages(&self, active_only: bool) -> RepositoryResult<Vec<Package>> {
        self.with_conn("list_packages", move |conn| {
            let mut query = packages::table.select(PackageRow::as_select()).into_boxed();
            if active_only {
                query = query.filter(packages::active.eq(true));
            }
            let rows: Vec<PackageRow> = query
                .order((packages::created_at.desc(), packages::id.desc()))
                .load(conn)?;
            Ok(rows.into_iter().map(Package::from).collect())
        })
        .await
    }

    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<Package>> {
        self.with_conn("get_package", move |conn| {
            Ok(packages::table
                .find(id.value())
                .select(PackageRow::as_select())
                .first::<PackageRow>(conn)
                .optional()?
                .map(Package::from))
        })
        .await
    }

    async fn package_slug_exists(&self, slug: &str) -> RepositoryResult<bool> {
        let slug = slug.to_string();
        self.with_conn("package_slug_exists", move |conn| {
            diesel::select(exists(packages::table.filter(packages::package_slug.eq(slug))))
                .get_result(conn)
                .map_err(Into::into)
        })
        .await
    }

    async fn insert_package(&self, package: NewPackage) -> RepositoryResult<Package> {
        let row = NewPackageRow::from(package);
        self.with_conn("insert_package", move |conn| {
            let inserted: PackageRow = diesel::insert_into(packages::table)
                .values(&row)
                .returning(PackageRow::as_returning())
                .get_result(conn)?;
            Ok(Package::from(inserted))
        })
        .await
    }

    async fn update_package(
        &self,
        id: PackageId,
        changes: &PackageChanges,
    ) -> RepositoryResult<Option<Package>> {
        if changes.is_empty() {
            return self.get_package(id).await;
        }
        let changeset = PackageChangeset::from(changes);
        self.with_conn("update_package", move |conn| {
            Ok(diesel::update(packages::table.find(id.value()))
                .set(&changeset)
                .returning(PackageRow::as_returning())
                .get_result::<PackageRow>(conn)
                .optional()?
                .map(Package::from))
        })
        .await
    }

    async fn delete_package(&self, id: PackageId) -> RepositoryResult<bool> {
        self.with_conn("delete_package", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let referenced: bool = diesel::select(exists(
                    sales::table.filter(sales::package_id.eq(id.value())),
                ))
                .get_result(tx)?;
                if referenced {
                    return Err(RepositoryError::conflict_with_context(
                        "Package is referenced by sales",
                        ErrorContext::new("delete_package")
                            .with_entity("package")
                            .with_entity_id(id),
                    ));
                }
                let deleted = diesel::delete(packages::table.find(id.value())).execute(tx)?;
                Ok(deleted > 0)
            })
        })
        .await
    }

    async fn package_events(&self, id: PackageId) -> RepositoryResult<Vec<Event>> {
        self.with_conn("package_events", move |conn| {
            let rows: Vec<EventRow> = package_events::table
                .inner_join(events::table)
                .filter(package_events::package_id.eq(id.value()))
                .select(EventRow::as_select())
                .order((events::event_date.asc(), events::id.asc()))
                .load(conn)?;
            rows.into_iter().map(EventRow::into_event).collect()
        })
        .await
    }

    async fn replace_package_events(
        &self,
        id: PackageId,
        event_ids: &[EventId],
    ) -> RepositoryResult<()> {
        let links: Vec<PackageEventRow> = ids(event_ids)
            .into_iter()
            .map(|event_id| PackageEventRow {
                package_id: id.value(),
                event_id,
            })
            .collect();
        self.with_conn("replace_package_events", move |conn| {
            conn.transaction::<_, RepositoryError, _>(|tx| {
                let found: bool =
                    diesel::select(exists(packages::table.find(id.value()))).get_result(tx)?;
                if !found {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Package {} not found", id),
                        ErrorContext::new("replace_package_events")
                            .with_entity("package")
                            .with_entity_id(id),
                    ));
                }
                diesel::delete(package_events::table.filter(package_events::package_id.eq(id.value())))
                    .execute(tx)?;
                if !links.is_empty() {
                    diesel::insert_into(package_events::table)
                        .values(&links)
                        .execute(tx)?;
                }
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl SalesRepository for PostgresRepository {
    async fn list_sales(&self, filter: &SaleFilter) -> RepositoryResult<Vec<SaleDetails>> {
        let filter = filter.clone();
        self.with_conn("list_sales", move |conn| {
            let mut query = sales::table.select(SaleRow::as_select()).into_boxed();
            if let Some(sale_type) = filter.sale_type {
                query = query.filter(sales::sale_type.eq(sale_type.as_str()));
            }
            if let Some(city) = filter.city {
                query = query.filter(sales::city.eq(city));
            }
            if let Some(status) = filter.payment_status {
                query = query.filter(sales::payment_status.eq(status.as_str()));
            }
            query = query.order((sales::created_at.desc(), sales::id.desc()));
            if let Some(limit) = filter.limit {
                query = query.limit(limit as i64);
            }
            let rows: Vec<SaleRow> = query.load(conn)?;
            load_sale_details(conn, rows)
        })
        .await
    }

    async fn get_sale(&self, id: SaleId) -> RepositoryResult<Option<SaleDetails>> {
        self.with_conn("get_sale", move |conn| {
            let row = sales::table
                .find(id.value())
                .select(SaleRow::as_select())
                .first::<SaleRow>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(load_sale_details(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn insert_sale(&self, sale: NewSale) -> RepositoryResult<Sale> {
        let row = NewSaleRow::from(sale);
        self.with_conn("insert_sale", move |conn| {
            diesel::insert_into(sales::table)
                .values(&row)
                .returning(SaleRow::as_returning())
                .get_result::<SaleRow>(conn)?
                .into_sale()
        })
        .await
    }

    async fn link_sale_events(&self, id: SaleId, event_ids: &[EventId]) -> RepositoryResult<()> {
        let links: Vec<SaleEventRow> = ids(event_ids)
            .into_iter()
            .map(|event_id| SaleEventRow {
                sale_id: id.value(),
                event_id,
            })
            .collect();
        if links.is_empty() {
            return Ok(());
        }
        self.with_conn("link_sale_events", move |conn| {
            diesel::insert_into(sale_events::table)
                .values(&links)
                .on_conflict_do_nothing()
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    async fn set_delivery(
        &self,
        id: SaleId,
        delivered: bool,
        delivery_date: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Sale>> {
        self.with_conn("set_delivery", move |conn| {
            diesel::update(sales::table.find(id.value()))
                .set((
                    sales::tickets_delivered.eq(delivered),
                    sales::delivery_date.eq(delivery_date),
                ))
                .returning(SaleRow::as_returning())
                .get_result::<SaleRow>(conn)
                .optional()?
                .map(SaleRow::into_sale)
                .transpose()
        })
        .await
    }

    async fn set_payment_status(
        &self,
        id: SaleId,
        status: PaymentStatus,
    ) -> RepositoryResult<Option<Sale>> {
        self.with_conn("set_payment_status", move |conn| {
            diesel::update(sales::table.find(id.value()))
                .set(sales::payment_status.eq(status.as_str()))
                .returning(SaleRow::as_returning())
                .get_result::<SaleRow>(conn)
                .optional()?
                .map(SaleRow::into_sale)
                .transpose()
        })
        .await
    }

    async fn delete_sale(&self, id: SaleId) -> RepositoryResult<Option<Sale>> {
        self.with_conn("delete_sale", move |conn| {
            diesel::delete(sales::table.find(id.value()))
                .returning(SaleRow::as_returning())
                .get_result::<SaleRow>(conn)
                .optional()?
                .map(SaleRow::into_sale)
                .transpose()
        })
        .await
    }

    async fn event_has_sales(&self, event_id: EventId) -> RepositoryResult<bool> {
        self.with_conn("event_has_sales", move |conn| {
            diesel::select(exists(
                sale_events::table.filter(sale_events::event_id.eq(event_id.value())),
            ))
            .get_result(conn)
            .map_err(Into::into)
        })
        .await
    }

    async fn package_has_sales(&self, package_id: PackageId) -> RepositoryResult<bool> {
        self.with_conn("package_has_sales", move |conn| {
            diesel::select(exists(
                sales::table.filter(sales::package_id.eq(package_id.value())),
            ))
            .get_result(conn)
            .map_err(Into::into)
        })
        .await
    }
}

#[async_trait]
impl ExpenseRepository for PostgresRepository {
    async fn list_categories(&self) -> RepositoryResult<Vec<ExpenseCategory>> {
        self.with_conn("list_categories", |conn| {
            let categories: Vec<CategoryRow> = expense_categories::table
                .select(CategoryRow::as_select())
                .order((expense_categories::sort_order.asc(), expense_categories::id.asc()))
                .load(conn)?;
            let subcategories: Vec<SubcategoryRow> = expense_subcategories::table
                .select(SubcategoryRow::as_select())
                .order(expense_subcategories::id.asc())
                .load(conn)?;

            let mut by_category: HashMap<i64, Vec<ExpenseSubcategory>> = HashMap::new();
            for sub in subcategories {
                by_category
                    .entry(sub.category_id)
                    .or_default()
                    .push(ExpenseSubcategory::from(sub));
            }

            Ok(categories
                .into_iter()
                .map(|c| {
                    let subs = by_category.remove(&c.id).unwrap_or_default();
                    c.into_category(subs)
                })
                .collect())
        })
        .await
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<ExpenseCategory>> {
        self.with_conn("get_category", move |conn| {
            let Some(category) = expense_categories::table
                .find(id.value())
                .select(CategoryRow::as_select())
                .first::<CategoryRow>(conn)
                .optional()?
            else {
                return Ok(None);
            };
            let subcategories: Vec<SubcategoryRow> = expense_subcategories::table
                .filter(expense_subcategories::category_id.eq(id.value()))
                .select(SubcategoryRow::as_select())
                .order(expense_subcategories::id.asc())
                .load(conn)?;
            Ok(Some(category.into_category(
                subcategories.into_iter().map(ExpenseSubcategory::from).collect(),
            )))
        })
        .await
    }

    async fn get_subcategory(
        &self,
        id: SubcategoryId,
    ) -> RepositoryResult<Option<ExpenseSubcategory>> {
        self.with_conn("get_subcategory", move |conn| {
            Ok(expense_subcategories::table
                .find(id.value())
                .select(SubcategoryRow::as_select())
                .first::<SubcategoryRow>(conn)
                .optional()?
                .map(ExpenseSubcategory::from))
        })
        .await
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> RepositoryResult<Vec<ExpenseDetails>> {
        let filter = filter.clone();
        self.with_conn("list_expenses", move |conn| {
            let mut query = expenses::table.select(ExpenseRow::as_select()).into_boxed();
            if let Some(category_id) = filter.category_id {
                query = query.filter(expenses::category_id.eq(category_id.value()));
            }
            if let Some(status) = filter.status {
                query = query.filter(expenses::status.eq(status.as_str()));
            }
            if let Some(event_id) = filter.event_id {
                query = query.filter(expenses::event_id.eq(event_id.value()));
            }
            query = query.order((expenses::created_at.desc(), expenses::id.desc()));
            if let Some(limit) = filter.limit {
                query = query.limit(limit as i64);
            }
            let rows: Vec<ExpenseRow> = query.load(conn)?;
            load_expense_details(conn, rows)
        })
        .await
    }

    async fn get_expense(&self, id: ExpenseId) -> RepositoryResult<Option<ExpenseDetails>> {
        self.with_conn("get_expense", move |conn| {
            let row = expenses::table
                .find(id.value())
                .select(ExpenseRow::as_select())
                .first::<ExpenseRow>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(load_expense_details(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn insert_expense(&self, expense: NewExpense) -> RepositoryResult<Expense> {
        let row = NewExpenseRow::from(expense);
        self.with_conn("insert_expense", move |conn| {
            diesel::insert_into(expenses::table)
                .values(&row)
                .returning(ExpenseRow::as_returning())
                .get_result::<ExpenseRow>(conn)?
                .into_expense()
        })
        .await
    }

    async fn set_expense_status(
        &self,
        id: ExpenseId,
        status: ExpenseStatus,
        payment_date: Option<NaiveDate>,
    ) -> RepositoryResult<Option<Expense>> {
        self.with_conn("set_expense_status", move |conn| {
            let target = expenses::table.find(id.value());
            let row = match payment_date {
                Some(date) => diesel::update(target)
                    .set((
                        expenses::status.eq(status.as_str()),
                        expenses::payment_date.eq(date),
                    ))
                    .returning(ExpenseRow::as_returning())
                    .get_result::<ExpenseRow>(conn)
                    .optional()?,
                None => diesel::update(target)
                    .set(expenses::status.eq(status.as_str()))
                    .returning(ExpenseRow::as_returning())
                    .get_result::<ExpenseRow>(conn)
                    .optional()?,
            };
            row.map(ExpenseRow::into_expense).transpose()
        })
        .await
    }

    async fn delete_expense(&self, id: ExpenseId) -> RepositoryResult<Option<Expense>> {
        self.with_conn("delete_expense", move |conn| {
            diesel::delete(expenses::table.find(id.value()))
                .returning(ExpenseRow::as_returning())
                .get_result::<ExpenseRow>(conn)
                .optional()?
                .map(ExpenseRow::into_expense)
                .transpose()
        })
        .await
    }
}

#[async_trait]
impl CalculationRepository for PostgresRepository {
    async fn list_calculations(
        &self,
        filter: &CalculationFilter,
    ) -> RepositoryResult<Vec<CalculationDetails>> {
        let filter = filter.clone();
        self.with_conn("list_calculations", move |conn| {
            let mut query = event_calculations::table
                .select(CalculationRow::as_select())
                .into_boxed();
            if let Some(event_id) = filter.event_id {
                query = query.filter(event_calculations::event_id.eq(event_id.value()));
            }
            if let Some(scenario) = filter.scenario_type {
                query = query.filter(event_calculations::scenario_type.eq(scenario.as_str()));
            }
            query = query.order((
                event_calculations::created_at.desc(),
                event_calculations::id.desc(),
            ));
            if let Some(limit) = filter.limit {
                query = query.limit(limit as i64);
            }
            let rows: Vec<CalculationRow> = query.load(conn)?;
            load_calculation_details(conn, rows)
        })
        .await
    }

    async fn get_calculation(
        &self,
        id: CalculationId,
    ) -> RepositoryResult<Option<CalculationDetails>> {
        self.with_conn("get_calculation", move |conn| {
            let row = event_calculations::table
                .find(id.value())
                .select(CalculationRow::as_select())
                .first::<CalculationRow>(conn)
                .optional()?;
            match row {
                Some(row) => Ok(load_calculation_details(conn, vec![row])?.pop()),
                None => Ok(None),
            }
        })
        .await
    }

    async fn insert_calculation(&self, calculation: NewCalculation) -> RepositoryResult<Calculation> {
        let row = NewCalculationRow::from(calculation);
        self.with_conn("insert_calculation", move |conn| {
            diesel::insert_into(event_calculations::table)
                .values(&row)
                .returning(CalculationRow::as_returning())
                .get_result::<CalculationRow>(conn)?
                .into_calculation()
        })
        .await
    }

    async fn delete_calculation(&self, id: CalculationId) -> RepositoryResult<bool> {
        self.with_conn("delete_calculation", move |conn| {
            let deleted = diesel::delete(event_calculations::table.find(id.value())).execute(conn)?;
            Ok(deleted > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_url_uses_pool_defaults() {
        let config = PostgresConfig::with_url("postgres://localhost/summer");
        assert_eq!(config.database_url, "postgres://localhost/summer");
        assert_eq!(config.max_pool_size, 10);
        assert_eq!(config.min_pool_size, 1);
        assert_eq!(config.connection_timeout_sec, 30);
        assert_eq!(config.idle_timeout_sec, 600);
    }

    #[test]
    fn test_ids_deduplicates_preserving_order() {
        let input = [EventId(3), EventId(1), EventId(3), EventId(2)];
        assert_eq!(ids(&input), vec![3, 1, 2]);
    }
}
