//! Reporting rollups over sales, expenses and stored projections.
//!
//! The reducers are pure functions over record slices; the `load_*`
//! functions fetch the full tables from the repository and apply them.

use serde::{Deserialize, Serialize};

use crate::api::*;
use crate::db::repository::FullRepository;
use crate::services::error::ServiceResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesStats {
    pub total_sales: usize,
    pub package_sales: usize,
    pub individual_sales: usize,
    pub total_tickets: i64,
    pub package_tickets: i64,
    pub individual_tickets: i64,
    /// Sum over sales already paid.
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub paid_sales: usize,
    pub pending_sales: usize,
}

pub fn sales_stats<'a>(sales: impl IntoIterator<Item = &'a Sale>) -> SalesStats {
    let mut stats = SalesStats::default();
    for sale in sales {
        let tickets = i64::from(sale.ticket_quantity);
        stats.total_sales += 1;
        stats.total_tickets += tickets;
        match sale.sale_type {
            SaleType::Package => {
                stats.package_sales += 1;
                stats.package_tickets += tickets;
            }
            SaleType::Individual => {
                stats.individual_sales += 1;
                stats.individual_tickets += tickets;
            }
        }
        match sale.payment_status {
            PaymentStatus::Pagado => {
                stats.paid_sales += 1;
                stats.total_revenue += sale.total_amount;
            }
            PaymentStatus::Pendiente => {
                stats.pending_sales += 1;
                stats.pending_revenue += sale.total_amount;
            }
            PaymentStatus::Parcial | PaymentStatus::Rechazado => {}
        }
    }
    stats
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub category_id: CategoryId,
    pub category_name: String,
    /// Approved amount only.
    pub total_amount: f64,
    /// Every expense in the category, whatever its status.
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseStats {
    pub total_expenses: usize,
    pub approved_amount: f64,
    pub pending_amount: f64,
    pub rejected_amount: f64,
    pub approved_count: usize,
    pub pending_count: usize,
    pub rejected_count: usize,
    pub by_category: Vec<CategoryTotal>,
}

/// `categories` must already be in display order.
pub fn expense_stats<'a>(
    expenses: impl IntoIterator<Item = &'a Expense>,
    categories: &[ExpenseCategory],
) -> ExpenseStats {
    let mut stats = ExpenseStats {
        by_category: categories
            .iter()
            .map(|c| CategoryTotal {
                category_id: c.id,
                category_name: c.category_name.clone(),
                total_amount: 0.0,
                count: 0,
            })
            .collect(),
        ..Default::default()
    };

    for expense in expenses {
        stats.total_expenses += 1;
        let approved = expense.status == ExpenseStatus::Aprobado;
        match expense.status {
            ExpenseStatus::Aprobado => {
                stats.approved_count += 1;
                stats.approved_amount += expense.amount;
            }
            ExpenseStatus::Pendiente => {
                stats.pending_count += 1;
                stats.pending_amount += expense.amount;
            }
            ExpenseStatus::Rechazado => {
                stats.rejected_count += 1;
                stats.rejected_amount += expense.amount;
            }
        }
        if let Some(total) = stats
            .by_category
            .iter_mut()
            .find(|t| t.category_id == expense.category_id)
        {
            total.count += 1;
            if approved {
                total.total_amount += expense.amount;
            }
        }
    }
    stats
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScenarioCounts {
    pub pesimista: usize,
    pub realista: usize,
    pub optimista: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectionTotals {
    pub total_projected_revenue: f64,
    pub total_projected_profit: f64,
    pub avg_projected_revenue: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalculationSummary {
    pub total_calculations: usize,
    pub by_scenario: ScenarioCounts,
    pub financial_summary: ProjectionTotals,
}

pub fn calculation_summary<'a>(
    calculations: impl IntoIterator<Item = &'a Calculation>,
) -> CalculationSummary {
    let mut summary = CalculationSummary::default();
    for calculation in calculations {
        summary.total_calculations += 1;
        match calculation.scenario_type {
            ScenarioType::Pesimista => summary.by_scenario.pesimista += 1,
            ScenarioType::Realista => summary.by_scenario.realista += 1,
            ScenarioType::Optimista => summary.by_scenario.optimista += 1,
        }
        summary.financial_summary.total_projected_revenue += calculation.projected_revenue;
        summary.financial_summary.total_projected_profit += calculation.projected_profit;
    }
    if summary.total_calculations > 0 {
        summary.financial_summary.avg_projected_revenue =
            summary.financial_summary.total_projected_revenue / summary.total_calculations as f64;
    }
    summary
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesRollup {
    pub total_count: usize,
    pub total_revenue: f64,
    pub pending_revenue: f64,
    pub total_tickets: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpensesRollup {
    pub total_count: usize,
    /// Approved amount only.
    pub total_amount: f64,
    pub pending_amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralStats {
    pub sales: SalesRollup,
    pub expenses: ExpensesRollup,
    /// Paid revenue minus approved expenses.
    pub net_profit: f64,
}

pub fn general_stats(sales: &SalesStats, expenses: &ExpenseStats) -> GeneralStats {
    GeneralStats {
        sales: SalesRollup {
            total_count: sales.total_sales,
            total_revenue: sales.total_revenue,
            pending_revenue: sales.pending_revenue,
            total_tickets: sales.total_tickets,
        },
        expenses: ExpensesRollup {
            total_count: expenses.total_expenses,
            total_amount: expenses.approved_amount,
            pending_amount: expenses.pending_amount,
        },
        net_profit: sales.total_revenue - expenses.approved_amount,
    }
}

pub async fn load_sales_stats(repo: &dyn FullRepository) -> ServiceResult<SalesStats> {
    let sales = repo.list_sales(&SaleFilter::default()).await?;
    Ok(sales_stats(sales.iter().map(|d| &d.sale)))
}

pub async fn load_expense_stats(repo: &dyn FullRepository) -> ServiceResult<ExpenseStats> {
    let expenses = repo.list_expenses(&ExpenseFilter::default()).await?;
    let categories = repo.list_categories().await?;
    Ok(expense_stats(expenses.iter().map(|d| &d.expense), &categories))
}

pub async fn load_calculation_summary(repo: &dyn FullRepository) -> ServiceResult<CalculationSummary> {
    let calculations = repo.list_calculations(&CalculationFilter::default()).await?;
    Ok(calculation_summary(calculations.iter().map(|d| &d.calculation)))
}

pub async fn load_general_stats(repo: &dyn FullRepository) -> ServiceResult<GeneralStats> {
    let sales = load_sales_stats(repo).await?;
    let expenses = load_expense_stats(repo).await?;
    Ok(general_stats(&sales, &expenses))
}

#[cfg(test)]
#[path = "stats_tests.rs"]
mod stats_tests;
