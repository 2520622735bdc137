//! In-memory local repository implementation.
//!
//! Stores every table in memory behind a single `parking_lot::RwLock` and
//! enforces the same uniqueness and foreign-key rules the Postgres schema
//! does, so service code sees identical failures in both modes.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::*;
use crate::db::repository::*;
use crate::db::seed::DEFAULT_CATEGORIES;

/// In-memory local repository.
///
/// Ids are assigned sequentially per table starting at 1, which keeps tests
/// deterministic.
///
/// # Example
/// ```
/// use summer_rust::db::repositories::LocalRepository;
///
/// let repo = LocalRepository::with_default_categories();
/// assert!(repo.category_count() > 0);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    events: BTreeMap<EventId, Event>,
    packages: BTreeMap<PackageId, Package>,
    package_events: Vec<(PackageId, EventId)>,
    sales: BTreeMap<SaleId, Sale>,
    sale_events: Vec<(SaleId, EventId)>,
    categories: BTreeMap<CategoryId, ExpenseCategory>,
    expenses: BTreeMap<ExpenseId, Expense>,
    calculations: BTreeMap<CalculationId, Calculation>,

    // ID counters
    next_event_id: i64,
    next_package_id: i64,
    next_sale_id: i64,
    next_category_id: i64,
    next_subcategory_id: i64,
    next_expense_id: i64,
    next_calculation_id: i64,

    // Connection health
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            events: BTreeMap::new(),
            packages: BTreeMap::new(),
            package_events: Vec::new(),
            sales: BTreeMap::new(),
            sale_events: Vec::new(),
            categories: BTreeMap::new(),
            expenses: BTreeMap::new(),
            calculations: BTreeMap::new(),
            next_event_id: 1,
            next_package_id: 1,
            next_sale_id: 1,
            next_category_id: 1,
            next_subcategory_id: 1,
            next_expense_id: 1,
            next_calculation_id: 1,
            is_healthy: true,
        }
    }
}

fn take_id(counter: &mut i64) -> i64 {
    let id = *counter;
    *counter += 1;
    id
}

/// Newest first; ids break ties between rows created in the same instant.
fn newest_first<K: Ord + Copy, T>(rows: &mut [(K, DateTime<Utc>, T)]) {
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
}

fn apply_limit<T>(mut rows: Vec<T>, limit: Option<usize>) -> Vec<T> {
    if let Some(limit) = limit {
        rows.truncate(limit);
    }
    rows
}

impl LocalData {
    fn insert_category(&mut self, name: &str, icon: Option<&str>, subcategories: &[&str]) -> CategoryId {
        let id = CategoryId(take_id(&mut self.next_category_id));
        let sort_order = self.categories.len() as i32 + 1;
        let subcategories = subcategories
            .iter()
            .map(|sub| ExpenseSubcategory {
                id: SubcategoryId(take_id(&mut self.next_subcategory_id)),
                category_id: id,
                subcategory_name: sub.to_string(),
            })
            .collect();
        self.categories.insert(
            id,
            ExpenseCategory {
                id,
                category_name: name.to_string(),
                icon: icon.map(str::to_string),
                sort_order,
                subcategories,
            },
        );
        id
    }

    fn find_subcategory(&self, id: SubcategoryId) -> Option<&ExpenseSubcategory> {
        self.categories
            .values()
            .flat_map(|c| c.subcategories.iter())
            .find(|s| s.id == id)
    }

    fn event_summary(&self, id: Option<EventId>) -> Option<EventSummary> {
        id.and_then(|id| self.events.get(&id)).map(EventSummary::from)
    }

    fn sale_details(&self, sale: &Sale) -> SaleDetails {
        let mut details = SaleDetails::new(sale.clone());
        details.package = sale
            .package_id
            .and_then(|id| self.packages.get(&id))
            .map(PackageSummary::from);
        details.events = self
            .sale_events
            .iter()
            .filter(|(sale_id, _)| *sale_id == sale.id)
            .filter_map(|(_, event_id)| self.events.get(event_id))
            .map(EventSummary::from)
            .collect();
        details
    }

    fn expense_details(&self, expense: &Expense) -> ExpenseDetails {
        let mut details = ExpenseDetails::new(expense.clone());
        if let Some(category) = self.categories.get(&expense.category_id) {
            details.category_name = Some(category.category_name.clone());
            details.category_icon = category.icon.clone();
        }
        details.subcategory_name = self
            .find_subcategory(expense.subcategory_id)
            .map(|s| s.subcategory_name.clone());
        details.event = self.event_summary(expense.event_id);
        details
    }

    fn calculation_details(&self, calculation: &Calculation) -> CalculationDetails {
        CalculationDetails {
            calculation: calculation.clone(),
            event: self.event_summary(calculation.event_id),
        }
    }

    fn require_event(&self, id: EventId, operation: &str) -> RepositoryResult<()> {
        if self.events.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::conflict_with_context(
                format!("Event {} does not exist", id),
                ErrorContext::new(operation).with_entity("event").with_entity_id(id),
            ))
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
        }
    }

    /// Create a repository holding the standard expense categories, matching
    /// what the database migration seeds.
    pub fn with_default_categories() -> Self {
        let repo = Self::new();
        {
            let mut data = repo.data.write();
            for (name, icon, subcategories) in DEFAULT_CATEGORIES {
                data.insert_category(name, Some(*icon), subcategories);
            }
        }
        repo
    }

    /// Add a category with its subcategories; returns the category id.
    pub fn seed_category(&self, name: &str, icon: Option<&str>, subcategories: &[&str]) -> CategoryId {
        self.data.write().insert_category(name, icon, subcategories)
    }

    /// Set the health status for testing connection failures.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Clear all data from the repository, keeping the health flag.
    pub fn clear(&self) {
        let mut data = self.data.write();
        *data = LocalData {
            is_healthy: data.is_healthy,
            ..Default::default()
        };
    }

    pub fn category_count(&self) -> usize {
        self.data.read().categories.len()
    }

    pub fn event_count(&self) -> usize {
        self.data.read().events.len()
    }

    pub fn sale_count(&self) -> usize {
        self.data.read().sales.len()
    }

    /// Helper to check health and return error if unhealthy.
    fn check_health(&self) -> RepositoryResult<()> {
        if !self.data.read().is_healthy {
            return Err(RepositoryError::connection("Database is not healthy"));
        }
        Ok(())
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn list_events(&self, filter: &EventFilter) -> RepositoryResult<Vec<Event>> {
        self.check_health()?;
        let data = self.data.read();
        let mut events: Vec<Event> = data
            .events
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| a.event_date.cmp(&b.event_date).then(a.id.cmp(&b.id)));
        Ok(apply_limit(events, filter.limit))
    }

    async fn get_event(&self, id: EventId) -> RepositoryResult<Option<Event>> {
        self.check_health()?;
        Ok(self.data.read().events.get(&id).cloned())
    }

    async fn get_events(&self, ids: &[EventId]) -> RepositoryResult<Vec<Event>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .events
            .values()
            .filter(|e| ids.contains(&e.id))
            .cloned()
            .collect())
    }

    async fn event_slug_exists(&self, slug: &str) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.read().events.values().any(|e| e.event_slug == slug))
    }

    async fn insert_event(&self, event: NewEvent) -> RepositoryResult<Event> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.events.values().any(|e| e.event_slug == event.event_slug) {
            return Err(RepositoryError::conflict_with_context(
                format!("Event slug '{}' already exists", event.event_slug),
                ErrorContext::new("insert_event").with_entity("event"),
            ));
        }
        let id = EventId(take_id(&mut data.next_event_id));
        let stored = Event {
            id,
            event_name: event.event_name,
            event_slug: event.event_slug,
            event_date: event.event_date,
            event_type: event.event_type,
            city: event.city,
            venue_name: event.venue_name,
            capacity: event.capacity,
            ticket_price: event.ticket_price,
            status: event.status,
            created_at: Utc::now(),
        };
        data.events.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_event(&self, id: EventId, changes: &EventChanges) -> RepositoryResult<Option<Event>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(data.events.get_mut(&id).map(|event| {
            changes.apply_to(event);
            event.clone()
        }))
    }

    async fn delete_event(&self, id: EventId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.events.contains_key(&id) {
            return Ok(false);
        }
        if data.sale_events.iter().any(|(_, event_id)| *event_id == id) {
            return Err(RepositoryError::conflict_with_context(
                "Event is referenced by sales",
                ErrorContext::new("delete_event").with_entity("event").with_entity_id(id),
            ));
        }
        data.events.remove(&id);
        data.package_events.retain(|(_, event_id)| *event_id != id);
        for expense in data.expenses.values_mut() {
            if expense.event_id == Some(id) {
                expense.event_id = None;
            }
        }
        for calculation in data.calculations.values_mut() {
            if calculation.event_id == Some(id) {
                calculation.event_id = None;
            }
        }
        Ok(true)
    }

    async fn list_packages(&self, active_only: bool) -> RepositoryResult<Vec<Package>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(PackageId, DateTime<Utc>, Package)> = data
            .packages
            .values()
            .filter(|p| !active_only || p.active)
            .map(|p| (p.id, p.created_at, p.clone()))
            .collect();
        newest_first(&mut rows);
        Ok(rows.into_iter().map(|(_, _, p)| p).collect())
    }

    async fn get_package(&self, id: PackageId) -> RepositoryResult<Option<Package>> {
        self.check_health()?;
        Ok(self.data.read().packages.get(&id).cloned())
    }

    async fn package_slug_exists(&self, slug: &str) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.read().packages.values().any(|p| p.package_slug == slug))
    }

    async fn insert_package(&self, package: NewPackage) -> RepositoryResult<Package> {
        self.check_health()?;
        let mut data = self.data.write();
        if data.packages.values().any(|p| p.package_slug == package.package_slug) {
            return Err(RepositoryError::conflict_with_context(
                format!("Package slug '{}' already exists", package.package_slug),
                ErrorContext::new("insert_package").with_entity("package"),
            ));
        }
        let id = PackageId(take_id(&mut data.next_package_id));
        let stored = Package {
            id,
            package_name: package.package_name,
            package_slug: package.package_slug,
            description: package.description,
            package_price: package.package_price,
            discount_percent: package.discount_percent,
            active: package.active,
            created_at: Utc::now(),
        };
        data.packages.insert(id, stored.clone());
        Ok(stored)
    }

    async fn update_package(
        &self,
        id: PackageId,
        changes: &PackageChanges,
    ) -> RepositoryResult<Option<Package>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(data.packages.get_mut(&id).map(|package| {
            changes.apply_to(package);
            package.clone()
        }))
    }

    async fn delete_package(&self, id: PackageId) -> RepositoryResult<bool> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.packages.contains_key(&id) {
            return Ok(false);
        }
        if data.sales.values().any(|s| s.package_id == Some(id)) {
            return Err(RepositoryError::conflict_with_context(
                "Package is referenced by sales",
                ErrorContext::new("delete_package").with_entity("package").with_entity_id(id),
            ));
        }
        data.package_events.retain(|(package_id, _)| *package_id != id);
        data.packages.remove(&id);
        Ok(true)
    }

    async fn package_events(&self, id: PackageId) -> RepositoryResult<Vec<Event>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data
            .package_events
            .iter()
            .filter(|(package_id, _)| *package_id == id)
            .filter_map(|(_, event_id)| data.events.get(event_id).cloned())
            .collect())
    }

    async fn replace_package_events(&self, id: PackageId, event_ids: &[EventId]) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.packages.contains_key(&id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Package {} not found", id),
                ErrorContext::new("replace_package_events").with_entity("package").with_entity_id(id),
            ));
        }
        for event_id in event_ids {
            data.require_event(*event_id, "replace_package_events")?;
        }
        data.package_events.retain(|(package_id, _)| *package_id != id);
        for event_id in event_ids {
            if !data.package_events.contains(&(id, *event_id)) {
                data.package_events.push((id, *event_id));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl SalesRepository for LocalRepository {
    async fn list_sales(&self, filter: &SaleFilter) -> RepositoryResult<Vec<SaleDetails>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(SaleId, DateTime<Utc>, &Sale)> = data
            .sales
            .values()
            .filter(|s| filter.matches(s))
            .map(|s| (s.id, s.created_at, s))
            .collect();
        newest_first(&mut rows);
        let details = rows.into_iter().map(|(_, _, s)| data.sale_details(s)).collect();
        Ok(apply_limit(details, filter.limit))
    }

    async fn get_sale(&self, id: SaleId) -> RepositoryResult<Option<SaleDetails>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.sales.get(&id).map(|s| data.sale_details(s)))
    }

    async fn insert_sale(&self, sale: NewSale) -> RepositoryResult<Sale> {
        self.check_health()?;
        let mut data = self.data.write();
        if let Some(package_id) = sale.package_id {
            if !data.packages.contains_key(&package_id) {
                return Err(RepositoryError::conflict_with_context(
                    format!("Package {} does not exist", package_id),
                    ErrorContext::new("insert_sale").with_entity("package").with_entity_id(package_id),
                ));
            }
        }
        let id = SaleId(take_id(&mut data.next_sale_id));
        let stored = Sale {
            id,
            sale_type: sale.sale_type,
            package_id: sale.package_id,
            customer_name: sale.customer_name,
            customer_phone: sale.customer_phone,
            customer_email: sale.customer_email,
            ticket_quantity: sale.ticket_quantity,
            unit_price: sale.unit_price,
            total_amount: sale.total_amount,
            team_leader: sale.team_leader,
            rrpp_name: sale.rrpp_name,
            payment_method: sale.payment_method,
            payment_status: sale.payment_status,
            city: sale.city,
            receipt_filename: sale.receipt_filename,
            tickets_delivered: false,
            delivery_date: None,
            created_at: Utc::now(),
        };
        data.sales.insert(id, stored.clone());
        Ok(stored)
    }

    async fn link_sale_events(&self, id: SaleId, event_ids: &[EventId]) -> RepositoryResult<()> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.sales.contains_key(&id) {
            return Err(RepositoryError::conflict_with_context(
                format!("Sale {} does not exist", id),
                ErrorContext::new("link_sale_events").with_entity("sale").with_entity_id(id),
            ));
        }
        for event_id in event_ids {
            data.require_event(*event_id, "link_sale_events")?;
        }
        for event_id in event_ids {
            if !data.sale_events.contains(&(id, *event_id)) {
                data.sale_events.push((id, *event_id));
            }
        }
        Ok(())
    }

    async fn set_delivery(
        &self,
        id: SaleId,
        delivered: bool,
        delivery_date: Option<DateTime<Utc>>,
    ) -> RepositoryResult<Option<Sale>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(data.sales.get_mut(&id).map(|sale| {
            sale.tickets_delivered = delivered;
            sale.delivery_date = delivery_date;
            sale.clone()
        }))
    }

    async fn set_payment_status(&self, id: SaleId, status: PaymentStatus) -> RepositoryResult<Option<Sale>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(data.sales.get_mut(&id).map(|sale| {
            sale.payment_status = status;
            sale.clone()
        }))
    }

    async fn delete_sale(&self, id: SaleId) -> RepositoryResult<Option<Sale>> {
        self.check_health()?;
        let mut data = self.data.write();
        let removed = data.sales.remove(&id);
        if removed.is_some() {
            data.sale_events.retain(|(sale_id, _)| *sale_id != id);
        }
        Ok(removed)
    }

    async fn event_has_sales(&self, event_id: EventId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.read().sale_events.iter().any(|(_, e)| *e == event_id))
    }

    async fn package_has_sales(&self, package_id: PackageId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self
            .data
            .read()
            .sales
            .values()
            .any(|s| s.package_id == Some(package_id)))
    }
}

#[async_trait]
impl ExpenseRepository for LocalRepository {
    async fn list_categories(&self) -> RepositoryResult<Vec<ExpenseCategory>> {
        self.check_health()?;
        let mut categories: Vec<ExpenseCategory> = self.data.read().categories.values().cloned().collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.id.cmp(&b.id)));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> RepositoryResult<Option<ExpenseCategory>> {
        self.check_health()?;
        Ok(self.data.read().categories.get(&id).cloned())
    }

    async fn get_subcategory(&self, id: SubcategoryId) -> RepositoryResult<Option<ExpenseSubcategory>> {
        self.check_health()?;
        Ok(self.data.read().find_subcategory(id).cloned())
    }

    async fn list_expenses(&self, filter: &ExpenseFilter) -> RepositoryResult<Vec<ExpenseDetails>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(ExpenseId, DateTime<Utc>, &Expense)> = data
            .expenses
            .values()
            .filter(|e| filter.matches(e))
            .map(|e| (e.id, e.created_at, e))
            .collect();
        newest_first(&mut rows);
        let details = rows.into_iter().map(|(_, _, e)| data.expense_details(e)).collect();
        Ok(apply_limit(details, filter.limit))
    }

    async fn get_expense(&self, id: ExpenseId) -> RepositoryResult<Option<ExpenseDetails>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.expenses.get(&id).map(|e| data.expense_details(e)))
    }

    async fn insert_expense(&self, expense: NewExpense) -> RepositoryResult<Expense> {
        self.check_health()?;
        let mut data = self.data.write();
        if !data.categories.contains_key(&expense.category_id) {
            return Err(RepositoryError::conflict_with_context(
                format!("Category {} does not exist", expense.category_id),
                ErrorContext::new("insert_expense").with_entity("expense_category"),
            ));
        }
        if data.find_subcategory(expense.subcategory_id).is_none() {
            return Err(RepositoryError::conflict_with_context(
                format!("Subcategory {} does not exist", expense.subcategory_id),
                ErrorContext::new("insert_expense").with_entity("expense_subcategory"),
            ));
        }
        if let Some(event_id) = expense.event_id {
            data.require_event(event_id, "insert_expense")?;
        }
        let id = ExpenseId(take_id(&mut data.next_expense_id));
        let stored = Expense {
            id,
            event_id: expense.event_id,
            category_id: expense.category_id,
            subcategory_id: expense.subcategory_id,
            description: expense.description,
            amount: expense.amount,
            quantity: expense.quantity,
            unit_price: expense.unit_price,
            vendor_name: expense.vendor_name,
            invoice_number: expense.invoice_number,
            receipt_filename: expense.receipt_filename,
            status: expense.status,
            expense_date: expense.expense_date,
            payment_date: None,
            created_at: Utc::now(),
        };
        data.expenses.insert(id, stored.clone());
        Ok(stored)
    }

    async fn set_expense_status(
        &self,
        id: ExpenseId,
        status: ExpenseStatus,
        payment_date: Option<NaiveDate>,
    ) -> RepositoryResult<Option<Expense>> {
        self.check_health()?;
        let mut data = self.data.write();
        Ok(data.expenses.get_mut(&id).map(|expense| {
            expense.status = status;
            if payment_date.is_some() {
                expense.payment_date = payment_date;
            }
            expense.clone()
        }))
    }

    async fn delete_expense(&self, id: ExpenseId) -> RepositoryResult<Option<Expense>> {
        self.check_health()?;
        Ok(self.data.write().expenses.remove(&id))
    }
}

#[async_trait]
impl CalculationRepository for LocalRepository {
    async fn list_calculations(&self, filter: &CalculationFilter) -> RepositoryResult<Vec<CalculationDetails>> {
        self.check_health()?;
        let data = self.data.read();
        let mut rows: Vec<(CalculationId, DateTime<Utc>, &Calculation)> = data
            .calculations
            .values()
            .filter(|c| filter.matches(c))
            .map(|c| (c.id, c.created_at, c))
            .collect();
        newest_first(&mut rows);
        let details = rows
            .into_iter()
            .map(|(_, _, c)| data.calculation_details(c))
            .collect();
        Ok(apply_limit(details, filter.limit))
    }

    async fn get_calculation(&self, id: CalculationId) -> RepositoryResult<Option<CalculationDetails>> {
        self.check_health()?;
        let data = self.data.read();
        Ok(data.calculations.get(&id).map(|c| data.calculation_details(c)))
    }

    async fn insert_calculation(&self, calculation: NewCalculation) -> RepositoryResult<Calculation> {
        self.check_health()?;
        let mut data = self.data.write();
        if let Some(event_id) = calculation.event_id {
            data.require_event(event_id, "insert_calculation")?;
        }
        let id = CalculationId(take_id(&mut data.next_calculation_id));
        let stored = Calculation {
            id,
            event_id: calculation.event_id,
            calculation_name: calculation.calculation_name,
            total_capacity: calculation.total_capacity,
            expected_attendance: calculation.expected_attendance,
            ticket_price_general: calculation.ticket_price_general,
            ticket_price_vip: calculation.ticket_price_vip,
            venue_cost: calculation.venue_cost,
            production_cost: calculation.production_cost,
            marketing_cost: calculation.marketing_cost,
            staff_cost: calculation.staff_cost,
            other_costs: calculation.other_costs,
            total_costs: calculation.total_costs,
            projected_revenue: calculation.projected_revenue,
            projected_profit: calculation.projected_profit,
            break_even_tickets: calculation.break_even_tickets,
            profit_margin: calculation.profit_margin,
            scenario_type: calculation.scenario_type,
            created_at: Utc::now(),
        };
        data.calculations.insert(id, stored.clone());
        Ok(stored)
    }

    async fn delete_calculation(&self, id: CalculationId) -> RepositoryResult<bool> {
        self.check_health()?;
        Ok(self.data.write().calculations.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_event(slug: &str, date: (i32, u32, u32)) -> NewEvent {
        NewEvent {
            event_name: slug.replace('-', " "),
            event_slug: slug.to_string(),
            event_date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            event_type: None,
            city: "La Paz".to_string(),
            venue_name: None,
            capacity: Some(100),
            ticket_price: 50.0,
            status: EventStatus::Activo,
        }
    }

    fn new_sale(package_id: Option<PackageId>) -> NewSale {
        NewSale {
            sale_type: if package_id.is_some() {
                SaleType::Package
            } else {
                SaleType::Individual
            },
            package_id,
            customer_name: "Ana".to_string(),
            customer_phone: None,
            customer_email: None,
            ticket_quantity: 2,
            unit_price: 50.0,
            total_amount: 100.0,
            team_leader: None,
            rrpp_name: None,
            payment_method: "transferencia".to_string(),
            payment_status: PaymentStatus::Pendiente,
            city: None,
            receipt_filename: None,
        }
    }

    #[tokio::test]
    async fn test_health_check() {
        let repo = LocalRepository::new();
        assert!(repo.health_check().await.unwrap());

        repo.set_healthy(false);
        assert!(!repo.health_check().await.unwrap());
        let result = repo.list_events(&EventFilter::default()).await;
        assert!(matches!(result, Err(RepositoryError::ConnectionError { .. })));
    }

    #[tokio::test]
    async fn test_events_ordered_by_date_and_filtered() {
        let repo = LocalRepository::new();
        repo.insert_event(new_event("later", (2026, 5, 1))).await.unwrap();
        repo.insert_event(new_event("sooner", (2026, 1, 1))).await.unwrap();
        let mut cancelled = new_event("cancelled", (2026, 3, 1));
        cancelled.status = EventStatus::Cancelado;
        repo.insert_event(cancelled).await.unwrap();

        let all = repo.list_events(&EventFilter::default()).await.unwrap();
        let slugs: Vec<&str> = all.iter().map(|e| e.event_slug.as_str()).collect();
        assert_eq!(slugs, vec!["sooner", "cancelled", "later"]);

        let active = repo
            .list_events(&EventFilter {
                active_only: true,
                limit: Some(1),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].event_slug, "sooner");
    }

    #[tokio::test]
    async fn test_duplicate_slug_is_conflict() {
        let repo = LocalRepository::new();
        repo.insert_event(new_event("fest", (2026, 1, 1))).await.unwrap();
        let err = repo.insert_event(new_event("fest", (2026, 2, 1))).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
        assert!(repo.event_slug_exists("fest").await.unwrap());
    }

    #[tokio::test]
    async fn test_event_with_sales_cannot_be_deleted() {
        let repo = LocalRepository::new();
        let event = repo.insert_event(new_event("fest", (2026, 1, 1))).await.unwrap();
        let sale = repo.insert_sale(new_sale(None)).await.unwrap();
        repo.link_sale_events(sale.id, &[event.id]).await.unwrap();

        assert!(repo.event_has_sales(event.id).await.unwrap());
        let err = repo.delete_event(event.id).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));

        repo.delete_sale(sale.id).await.unwrap();
        assert!(repo.delete_event(event.id).await.unwrap());
        assert!(!repo.delete_event(event.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_sale_details_include_package_and_events() {
        let repo = LocalRepository::new();
        let event = repo.insert_event(new_event("fest", (2026, 1, 1))).await.unwrap();
        let package = repo
            .insert_package(NewPackage {
                package_name: "Full pass".to_string(),
                package_slug: "full-pass".to_string(),
                description: None,
                package_price: 300.0,
                discount_percent: None,
                active: true,
            })
            .await
            .unwrap();
        repo.replace_package_events(package.id, &[event.id]).await.unwrap();

        let sale = repo.insert_sale(new_sale(Some(package.id))).await.unwrap();
        repo.link_sale_events(sale.id, &[event.id]).await.unwrap();

        let details = repo.get_sale(sale.id).await.unwrap().unwrap();
        assert_eq!(details.package.unwrap().package_name, "Full pass");
        assert_eq!(details.events.len(), 1);
        assert_eq!(repo.package_events(package.id).await.unwrap().len(), 1);
        assert!(repo.package_has_sales(package.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_sales_newest_first_with_limit() {
        let repo = LocalRepository::new();
        for _ in 0..3 {
            repo.insert_sale(new_sale(None)).await.unwrap();
        }
        let sales = repo
            .list_sales(&SaleFilter {
                limit: Some(2),
                ..Default::default()
            })
            .await
            .unwrap();
        let ids: Vec<i64> = sales.iter().map(|s| s.sale.id.value()).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[tokio::test]
    async fn test_link_to_missing_event_is_conflict() {
        let repo = LocalRepository::new();
        let sale = repo.insert_sale(new_sale(None)).await.unwrap();
        let err = repo.link_sale_events(sale.id, &[EventId(99)]).await.unwrap_err();
        assert!(matches!(err, RepositoryError::ConflictError { .. }));
    }

    #[tokio::test]
    async fn test_default_categories_are_sorted_with_subcategories() {
        let repo = LocalRepository::with_default_categories();
        let categories = repo.list_categories().await.unwrap();
        assert_eq!(categories.len(), DEFAULT_CATEGORIES.len());
        assert!(categories.windows(2).all(|w| w[0].sort_order < w[1].sort_order));
        let sub = &categories[0].subcategories[0];
        let found = repo.get_subcategory(sub.id).await.unwrap().unwrap();
        assert_eq!(found.category_id, categories[0].id);
    }

    #[tokio::test]
    async fn test_expense_status_keeps_payment_date_unless_given() {
        let repo = LocalRepository::new();
        let category = repo.seed_category("Producción", None, &["Sonido"]);
        let sub = repo.get_category(category).await.unwrap().unwrap().subcategories[0].id;
        let expense = repo
            .insert_expense(NewExpense {
                event_id: None,
                category_id: category,
                subcategory_id: sub,
                description: "Speakers".to_string(),
                amount: 100.0,
                quantity: 1,
                unit_price: 100.0,
                vendor_name: None,
                invoice_number: None,
                receipt_filename: None,
                status: ExpenseStatus::Pendiente,
                expense_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            })
            .await
            .unwrap();

        let paid = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let approved = repo
            .set_expense_status(expense.id, ExpenseStatus::Aprobado, Some(paid))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(approved.payment_date, Some(paid));

        let rejected = repo
            .set_expense_status(expense.id, ExpenseStatus::Rechazado, None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(rejected.payment_date, Some(paid));

        let details = repo.get_expense(expense.id).await.unwrap().unwrap();
        assert_eq!(details.category_name.as_deref(), Some("Producción"));
        assert_eq!(details.subcategory_name.as_deref(), Some("Sonido"));
    }

    #[tokio::test]
    async fn test_clear_resets_ids() {
        let repo = LocalRepository::new();
        repo.insert_event(new_event("a", (2026, 1, 1))).await.unwrap();
        repo.clear();
        assert_eq!(repo.event_count(), 0);
        let event = repo.insert_event(new_event("b", (2026, 1, 1))).await.unwrap();
        assert_eq!(event.id, EventId(1));
    }
}
