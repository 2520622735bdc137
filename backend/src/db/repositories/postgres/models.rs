use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use std::str::FromStr;

use super::schema::{
    event_calculations, events, expense_categories, expense_subcategories, expenses, packages,
    sales,
};
use crate::api::*;
use crate::db::repository::{ErrorContext, RepositoryError, RepositoryResult};

/// Parse a label column back into its enum, reporting the column on failure.
fn parse_label<T: FromStr<Err = String>>(value: &str, column: &str) -> RepositoryResult<T> {
    T::from_str(value).map_err(|e| {
        RepositoryError::internal_with_context(
            e,
            ErrorContext::new("decode_row").with_details(format!("column={}", column)),
        )
    })
}

// ==================== events ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = events)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EventRow {
    pub id: i64,
    pub event_name: String,
    pub event_slug: String,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub city: String,
    pub venue_name: Option<String>,
    pub capacity: Option<i32>,
    pub ticket_price: f64,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl EventRow {
    pub fn into_event(self) -> RepositoryResult<Event> {
        Ok(Event {
            id: EventId(self.id),
            status: parse_label(&self.status, "events.status")?,
            event_name: self.event_name,
            event_slug: self.event_slug,
            event_date: self.event_date,
            event_type: self.event_type,
            city: self.city,
            venue_name: self.venue_name,
            capacity: self.capacity,
            ticket_price: self.ticket_price,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = events)]
pub struct NewEventRow {
    pub event_name: String,
    pub event_slug: String,
    pub event_date: NaiveDate,
    pub event_type: Option<String>,
    pub city: String,
    pub venue_name: Option<String>,
    pub capacity: Option<i32>,
    pub ticket_price: f64,
    pub status: String,
}

impl From<NewEvent> for NewEventRow {
    fn from(event: NewEvent) -> Self {
        Self {
            event_name: event.event_name,
            event_slug: event.event_slug,
            event_date: event.event_date,
            event_type: event.event_type,
            city: event.city,
            venue_name: event.venue_name,
            capacity: event.capacity,
            ticket_price: event.ticket_price,
            status: event.status.as_str().to_string(),
        }
    }
}

/// Partial update; `None` leaves the column alone, `Some(None)` writes NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = events)]
pub struct EventChangeset {
    pub event_name: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub event_type: Option<Option<String>>,
    pub city: Option<String>,
    pub venue_name: Option<Option<String>>,
    pub capacity: Option<Option<i32>>,
    pub ticket_price: Option<f64>,
    pub status: Option<String>,
}

impl From<&EventChanges> for EventChangeset {
    fn from(changes: &EventChanges) -> Self {
        Self {
            event_name: changes.event_name.clone(),
            event_date: changes.event_date,
            event_type: changes.event_type.clone(),
            city: changes.city.clone(),
            venue_name: changes.venue_name.clone(),
            capacity: changes.capacity,
            ticket_price: changes.ticket_price,
            status: changes.status.map(|s| s.as_str().to_string()),
        }
    }
}

// ==================== packages ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = packages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PackageRow {
    pub id: i64,
    pub package_name: String,
    pub package_slug: String,
    pub description: Option<String>,
    pub package_price: f64,
    pub discount_percent: Option<f64>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PackageRow> for Package {
    fn from(row: PackageRow) -> Self {
        Package {
            id: PackageId(row.id),
            package_name: row.package_name,
            package_slug: row.package_slug,
            description: row.description,
            package_price: row.package_price,
            discount_percent: row.discount_percent,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = packages)]
pub struct NewPackageRow {
    pub package_name: String,
    pub package_slug: String,
    pub description: Option<String>,
    pub package_price: f64,
    pub discount_percent: Option<f64>,
    pub active: bool,
}

impl From<NewPackage> for NewPackageRow {
    fn from(package: NewPackage) -> Self {
        Self {
            package_name: package.package_name,
            package_slug: package.package_slug,
            description: package.description,
            package_price: package.package_price,
            discount_percent: package.discount_percent,
            active: package.active,
        }
    }
}

#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = packages)]
pub struct PackageChangeset {
    pub package_name: Option<String>,
    pub description: Option<Option<String>>,
    pub package_price: Option<f64>,
    pub discount_percent: Option<Option<f64>>,
    pub active: Option<bool>,
}

impl From<&PackageChanges> for PackageChangeset {
    fn from(changes: &PackageChanges) -> Self {
        Self {
            package_name: changes.package_name.clone(),
            description: changes.description.clone(),
            package_price: changes.package_price,
            discount_percent: changes.discount_percent,
            active: changes.active,
        }
    }
}

// ==================== sales ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = sales)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SaleRow {
    pub id: i64,
    pub sale_type: String,
    pub package_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub ticket_quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub team_leader: Option<String>,
    pub rrpp_name: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub city: Option<String>,
    pub receipt_filename: Option<String>,
    pub tickets_delivered: bool,
    pub delivery_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SaleRow {
    pub fn into_sale(self) -> RepositoryResult<Sale> {
        Ok(Sale {
            id: SaleId(self.id),
            sale_type: parse_label(&self.sale_type, "sales.sale_type")?,
            payment_status: parse_label(&self.payment_status, "sales.payment_status")?,
            package_id: self.package_id.map(PackageId),
            customer_name: self.customer_name,
            customer_phone: self.customer_phone,
            customer_email: self.customer_email,
            ticket_quantity: self.ticket_quantity,
            unit_price: self.unit_price,
            total_amount: self.total_amount,
            team_leader: self.team_leader,
            rrpp_name: self.rrpp_name,
            payment_method: self.payment_method,
            city: self.city,
            receipt_filename: self.receipt_filename,
            tickets_delivered: self.tickets_delivered,
            delivery_date: self.delivery_date,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = sales)]
pub struct NewSaleRow {
    pub sale_type: String,
    pub package_id: Option<i64>,
    pub customer_name: String,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub ticket_quantity: i32,
    pub unit_price: f64,
    pub total_amount: f64,
    pub team_leader: Option<String>,
    pub rrpp_name: Option<String>,
    pub payment_method: String,
    pub payment_status: String,
    pub city: Option<String>,
    pub receipt_filename: Option<String>,
}

impl From<NewSale> for NewSaleRow {
    fn from(sale: NewSale) -> Self {
        Self {
            sale_type: sale.sale_type.as_str().to_string(),
            package_id: sale.package_id.map(|id| id.0),
            customer_name: sale.customer_name,
            customer_phone: sale.customer_phone,
            customer_email: sale.customer_email,
            ticket_quantity: sale.ticket_quantity,
            unit_price: sale.unit_price,
            total_amount: sale.total_amount,
            team_leader: sale.team_leader,
            rrpp_name: sale.rrpp_name,
            payment_method: sale.payment_method,
            payment_status: sale.payment_status.as_str().to_string(),
            city: sale.city,
            receipt_filename: sale.receipt_filename,
        }
    }
}

// ==================== expenses ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = expense_categories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CategoryRow {
    pub id: i64,
    pub category_name: String,
    pub icon: Option<String>,
    pub sort_order: i32,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = expense_subcategories)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SubcategoryRow {
    pub id: i64,
    pub category_id: i64,
    pub subcategory_name: String,
}

impl From<SubcategoryRow> for ExpenseSubcategory {
    fn from(row: SubcategoryRow) -> Self {
        ExpenseSubcategory {
            id: SubcategoryId(row.id),
            category_id: CategoryId(row.category_id),
            subcategory_name: row.subcategory_name,
        }
    }
}

impl CategoryRow {
    pub fn into_category(self, subcategories: Vec<ExpenseSubcategory>) -> ExpenseCategory {
        ExpenseCategory {
            id: CategoryId(self.id),
            category_name: self.category_name,
            icon: self.icon,
            sort_order: self.sort_order,
            subcategories,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = expenses)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExpenseRow {
    pub id: i64,
    pub event_id: Option<i64>,
    pub category_id: i64,
    pub subcategory_id: i64,
    pub description: String,
    pub amount: f64,
    pub quantity: i32,
    pub unit_price: f64,
    pub vendor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub receipt_filename: Option<String>,
    pub status: String,
    pub expense_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl ExpenseRow {
    pub fn into_expense(self) -> RepositoryResult<Expense> {
        Ok(Expense {
            id: ExpenseId(self.id),
            status: parse_label(&self.status, "expenses.status")?,
            event_id: self.event_id.map(EventId),
            category_id: CategoryId(self.category_id),
            subcategory_id: SubcategoryId(self.subcategory_id),
            description: self.description,
            amount: self.amount,
            quantity: self.quantity,
            unit_price: self.unit_price,
            vendor_name: self.vendor_name,
            invoice_number: self.invoice_number,
            receipt_filename: self.receipt_filename,
            expense_date: self.expense_date,
            payment_date: self.payment_date,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = expenses)]
pub struct NewExpenseRow {
    pub event_id: Option<i64>,
    pub category_id: i64,
    pub subcategory_id: i64,
    pub description: String,
    pub amount: f64,
    pub quantity: i32,
    pub unit_price: f64,
    pub vendor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub receipt_filename: Option<String>,
    pub status: String,
    pub expense_date: NaiveDate,
}

impl From<NewExpense> for NewExpenseRow {
    fn from(expense: NewExpense) -> Self {
        Self {
            event_id: expense.event_id.map(|id| id.0),
            category_id: expense.category_id.0,
            subcategory_id: expense.subcategory_id.0,
            description: expense.description,
            amount: expense.amount,
            quantity: expense.quantity,
            unit_price: expense.unit_price,
            vendor_name: expense.vendor_name,
            invoice_number: expense.invoice_number,
            receipt_filename: expense.receipt_filename,
            status: expense.status.as_str().to_string(),
            expense_date: expense.expense_date,
        }
    }
}

// ==================== event_calculations ====================

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = event_calculations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CalculationRow {
    pub id: i64,
    pub event_id: Option<i64>,
    pub calculation_name: String,
    pub total_capacity: i32,
    pub expected_attendance: i32,
    pub ticket_price_general: f64,
    pub ticket_price_vip: f64,
    pub venue_cost: f64,
    pub production_cost: f64,
    pub marketing_cost: f64,
    pub staff_cost: f64,
    pub other_costs: f64,
    pub total_costs: f64,
    pub projected_revenue: f64,
    pub projected_profit: f64,
    pub break_even_tickets: Option<i64>,
    pub profit_margin: f64,
    pub scenario_type: String,
    pub created_at: DateTime<Utc>,
}

impl CalculationRow {
    pub fn into_calculation(self) -> RepositoryResult<Calculation> {
        Ok(Calculation {
            id: CalculationId(self.id),
            scenario_type: parse_label(&self.scenario_type, "event_calculations.scenario_type")?,
            event_id: self.event_id.map(EventId),
            calculation_name: self.calculation_name,
            total_capacity: self.total_capacity,
            expected_attendance: self.expected_attendance,
            ticket_price_general: self.ticket_price_general,
            ticket_price_vip: self.ticket_price_vip,
            venue_cost: self.venue_cost,
            production_cost: self.production_cost,
            marketing_cost: self.marketing_cost,
            staff_cost: self.staff_cost,
            other_costs: self.other_costs,
            total_costs: self.total_costs,
            projected_revenue: self.projected_revenue,
            projected_profit: self.projected_profit,
            break_even_tickets: self.break_even_tickets,
            profit_margin: self.profit_margin,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = event_calculations)]
pub struct NewCalculationRow {
    pub event_id: Option<i64>,
    pub calculation_name: String,
    pub total_capacity: i32,
    pub expected_attendance: i32,
    pub ticket_price_general: f64,
    pub ticket_price_vip: f64,
    pub venue_cost: f64,
    pub production_cost: f64,
    pub marketing_cost: f64,
    pub staff_cost: f64,
    pub other_costs: f64,
    pub total_costs: f64,
    pub projected_revenue: f64,
    pub projected_profit: f64,
    pub break_even_tickets: Option<i64>,
    pub profit_margin: f64,
    pub scenario_type: String,
}

impl From<NewCalculation> for NewCalculationRow {
    fn from(calculation: NewCalculation) -> Self {
        Self {
            event_id: calculation.event_id.map(|id| id.0),
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
            scenario_type: calculation.scenario_type.as_str().to_string(),
        }
    }
}

// ==================== link tables ====================

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = super::schema::package_events)]
pub struct PackageEventRow {
    pub package_id: i64,
    pub event_id: i64,
}

#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = super::schema::sale_events)]
pub struct SaleEventRow {
    pub sale_id: i64,
    pub event_id: i64,
}
