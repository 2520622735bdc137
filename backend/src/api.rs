//! Public API surface for the backend.
//!
//! Identifier newtypes for every persisted entity, plus re-exports of the
//! record and DTO types that cross the HTTP boundary.

use crate::define_id_type;

pub use crate::models::calculation::{
    Calculation, CalculationDetails, CalculationFilter, NewCalculation, ScenarioType,
};
pub use crate::models::event::{Event, EventChanges, EventFilter, EventStatus, EventSummary, NewEvent};
pub use crate::models::expense::{
    Expense, ExpenseCategory, ExpenseDetails, ExpenseFilter, ExpenseStatus, ExpenseSubcategory,
    NewExpense,
};
pub use crate::models::package::{NewPackage, Package, PackageChanges, PackageSummary};
pub use crate::models::sale::{NewSale, PaymentStatus, Sale, SaleDetails, SaleFilter, SaleType};
pub use crate::services::projection::{
    ComparisonResult, ComparisonSummary, CostBreakdown, FinancialAnalysis, NamedScenario,
    ProjectionResult, RevenueBreakdown, RevenueRange, Scenario, ScenarioSummary, TicketSplit,
    TicketsBreakdown,
};

define_id_type!(i64, EventId);
define_id_type!(i64, PackageId);
define_id_type!(i64, SaleId);
define_id_type!(i64, CategoryId);
define_id_type!(i64, SubcategoryId);
define_id_type!(i64, ExpenseId);
define_id_type!(i64, CalculationId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_number() {
        let id = EventId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");
        let back: EventId = serde_json::from_str("42").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_id_from_str_trims() {
        let id: SaleId = " 7 ".parse().unwrap();
        assert_eq!(id.value(), 7);
        assert!("abc".parse::<SaleId>().is_err());
    }

    #[test]
    fn test_id_conversions() {
        let id = PackageId::from(3);
        let raw: i64 = id.into();
        assert_eq!(raw, 3);
        assert_eq!(id.to_string(), "3");
    }
}
