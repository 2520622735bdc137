use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{CategoryId, EventId, ExpenseId, SubcategoryId};
use crate::define_label_enum;
use crate::models::event::EventSummary;

define_label_enum!(
    /// Approval state of an expense.
    ExpenseStatus {
        Pendiente => "pendiente",
        Aprobado => "aprobado",
        Rechazado => "rechazado",
    }
);

/// Expense category with its subcategories (`expense_categories`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseCategory {
    pub id: CategoryId,
    pub category_name: String,
    pub icon: Option<String>,
    pub sort_order: i32,
    pub subcategories: Vec<ExpenseSubcategory>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseSubcategory {
    pub id: SubcategoryId,
    pub category_id: CategoryId,
    pub subcategory_name: String,
}

/// A recorded expense (`expenses` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub event_id: Option<EventId>,
    pub category_id: CategoryId,
    pub subcategory_id: SubcategoryId,
    pub description: String,
    pub amount: f64,
    pub quantity: i32,
    pub unit_price: f64,
    pub vendor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub receipt_filename: Option<String>,
    pub status: ExpenseStatus,
    pub expense_date: NaiveDate,
    pub payment_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    pub event_id: Option<EventId>,
    pub category_id: CategoryId,
    pub subcategory_id: SubcategoryId,
    pub description: String,
    pub amount: f64,
    pub quantity: i32,
    pub unit_price: f64,
    pub vendor_name: Option<String>,
    pub invoice_number: Option<String>,
    pub receipt_filename: Option<String>,
    pub status: ExpenseStatus,
    pub expense_date: NaiveDate,
}

/// An expense with category, subcategory and event names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpenseDetails {
    #[serde(flatten)]
    pub expense: Expense,
    pub category_name: Option<String>,
    pub category_icon: Option<String>,
    pub subcategory_name: Option<String>,
    pub event: Option<EventSummary>,
    pub receipt_url: Option<String>,
}

impl ExpenseDetails {
    pub fn new(expense: Expense) -> Self {
        Self {
            expense,
            category_name: None,
            category_icon: None,
            subcategory_name: None,
            event: None,
            receipt_url: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExpenseFilter {
    pub category_id: Option<CategoryId>,
    pub status: Option<ExpenseStatus>,
    pub event_id: Option<EventId>,
    pub limit: Option<usize>,
}

impl ExpenseFilter {
    pub fn matches(&self, expense: &Expense) -> bool {
        self.category_id.map_or(true, |id| expense.category_id == id)
            && self.status.map_or(true, |s| expense.status == s)
            && self.event_id.map_or(true, |id| expense.event_id == Some(id))
    }
}
