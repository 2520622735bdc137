use super::*;
use crate::db::repositories::LocalRepository;
use chrono::{NaiveDate, Utc};

fn sale(id: i64, sale_type: SaleType, quantity: i32, total: f64, status: PaymentStatus) -> Sale {
    Sale {
        id: SaleId::new(id),
        sale_type,
        package_id: None,
        customer_name: "Ana".to_string(),
        customer_phone: None,
        customer_email: None,
        ticket_quantity: quantity,
        unit_price: total / quantity as f64,
        total_amount: total,
        team_leader: None,
        rrpp_name: None,
        payment_method: "transferencia".to_string(),
        payment_status: status,
        city: None,
        receipt_filename: None,
        tickets_delivered: false,
        delivery_date: None,
        created_at: Utc::now(),
    }
}

fn expense(id: i64, category: i64, amount: f64, status: ExpenseStatus) -> Expense {
    Expense {
        id: ExpenseId::new(id),
        event_id: None,
        category_id: CategoryId::new(category),
        subcategory_id: SubcategoryId::new(1),
        description: "Sound system".to_string(),
        amount,
        quantity: 1,
        unit_price: amount,
        vendor_name: None,
        invoice_number: None,
        receipt_filename: None,
        status,
        expense_date: NaiveDate::from_ymd_opt(2026, 1, 5).unwrap(),
        payment_date: None,
        created_at: Utc::now(),
    }
}

fn category(id: i64, name: &str) -> ExpenseCategory {
    ExpenseCategory {
        id: CategoryId::new(id),
        category_name: name.to_string(),
        icon: None,
        sort_order: id as i32,
        subcategories: vec![],
    }
}

#[test]
fn test_sales_stats_split_by_type_and_payment() {
    let sales = vec![
        sale(1, SaleType::Package, 2, 300.0, PaymentStatus::Pagado),
        sale(2, SaleType::Individual, 1, 100.0, PaymentStatus::Pendiente),
        sale(3, SaleType::Individual, 3, 450.0, PaymentStatus::Pagado),
        sale(4, SaleType::Package, 1, 150.0, PaymentStatus::Rechazado),
    ];
    let stats = sales_stats(&sales);

    assert_eq!(stats.total_sales, 4);
    assert_eq!(stats.package_sales, 2);
    assert_eq!(stats.individual_sales, 2);
    assert_eq!(stats.total_tickets, 7);
    assert_eq!(stats.package_tickets, 3);
    assert_eq!(stats.individual_tickets, 4);
    assert_eq!(stats.total_revenue, 750.0);
    assert_eq!(stats.pending_revenue, 100.0);
    assert_eq!(stats.paid_sales, 2);
    assert_eq!(stats.pending_sales, 1);
}

#[test]
fn test_sales_stats_empty() {
    assert_eq!(sales_stats(&Vec::<Sale>::new()), SalesStats::default());
}

#[test]
fn test_expense_stats_counts_all_but_sums_approved_per_category() {
    let categories = vec![category(1, "Producción"), category(2, "Marketing"), category(3, "Staff")];
    let expenses = vec![
        expense(1, 1, 500.0, ExpenseStatus::Aprobado),
        expense(2, 1, 200.0, ExpenseStatus::Pendiente),
        expense(3, 2, 80.0, ExpenseStatus::Rechazado),
        expense(4, 2, 120.0, ExpenseStatus::Aprobado),
    ];
    let stats = expense_stats(&expenses, &categories);

    assert_eq!(stats.total_expenses, 4);
    assert_eq!(stats.approved_amount, 620.0);
    assert_eq!(stats.pending_amount, 200.0);
    assert_eq!(stats.rejected_amount, 80.0);
    assert_eq!((stats.approved_count, stats.pending_count, stats.rejected_count), (2, 1, 1));

    let names: Vec<&str> = stats.by_category.iter().map(|c| c.category_name.as_str()).collect();
    assert_eq!(names, vec!["Producción", "Marketing", "Staff"]);
    assert_eq!(stats.by_category[0].total_amount, 500.0);
    assert_eq!(stats.by_category[0].count, 2);
    assert_eq!(stats.by_category[1].total_amount, 120.0);
    assert_eq!(stats.by_category[1].count, 2);
    assert_eq!(stats.by_category[2].count, 0);
}

#[test]
fn test_calculation_summary_mean_guards_empty_input() {
    let summary = calculation_summary(&Vec::<Calculation>::new());
    assert_eq!(summary.total_calculations, 0);
    assert_eq!(summary.financial_summary.avg_projected_revenue, 0.0);
}

#[test]
fn test_general_stats_net_profit() {
    let sales = SalesStats {
        total_sales: 3,
        total_revenue: 1_000.0,
        pending_revenue: 250.0,
        total_tickets: 9,
        ..Default::default()
    };
    let expenses = ExpenseStats {
        total_expenses: 2,
        approved_amount: 400.0,
        pending_amount: 50.0,
        ..Default::default()
    };
    let general = general_stats(&sales, &expenses);

    assert_eq!(general.sales.total_count, 3);
    assert_eq!(general.sales.total_tickets, 9);
    assert_eq!(general.expenses.total_amount, 400.0);
    assert_eq!(general.net_profit, 600.0);
}

#[tokio::test]
async fn test_loaders_on_empty_repository() {
    let repo = LocalRepository::with_default_categories();

    let expenses = load_expense_stats(&repo).await.unwrap();
    assert_eq!(expenses.total_expenses, 0);
    assert_eq!(expenses.by_category.len(), repo.category_count());

    let general = load_general_stats(&repo).await.unwrap();
    assert_eq!(general.net_profit, 0.0);

    let summary = load_calculation_summary(&repo).await.unwrap();
    assert_eq!(summary, CalculationSummary::default());
}

#[tokio::test]
async fn test_loaders_surface_gateway_failure() {
    let repo = LocalRepository::new();
    repo.set_healthy(false);
    assert!(load_sales_stats(&repo).await.unwrap_err().is_upstream());
}
