use super::*;
use proptest::prelude::*;

fn scenario(capacity: i32, attendance: i32, general: f64, vip: f64, costs: CostBreakdown) -> Scenario {
    Scenario::new(capacity, attendance, general, vip, costs).unwrap()
}

fn named(name: &str, attendance: i32, general: f64) -> NamedScenario {
    NamedScenario::new(Some(name.to_string()), attendance, general, 0.0).unwrap()
}

#[test]
fn test_project_reference_scenario_without_costs() {
    let result = project(&scenario(1000, 500, 100.0, 200.0, CostBreakdown::default()));

    assert_eq!(result.tickets_breakdown.general_tickets, 400);
    assert_eq!(result.tickets_breakdown.vip_tickets, 100);
    assert_eq!(result.tickets_breakdown.total_tickets, 500);
    assert_eq!(result.revenue_breakdown.general_revenue, 40_000.0);
    assert_eq!(result.revenue_breakdown.vip_revenue, 20_000.0);
    assert_eq!(result.total_revenue(), 60_000.0);
    assert_eq!(result.projected_profit(), 60_000.0);
    assert_eq!(result.profit_margin(), 100.0);
    assert_eq!(result.break_even_tickets(), Some(0));
    assert_eq!(result.financial_analysis.avg_ticket_price, 120.0);
}

#[test]
fn test_project_with_costs() {
    let costs = CostBreakdown {
        venue: 10_000.0,
        production: 5_000.0,
        marketing: 2_500.0,
        staff: 2_500.0,
        other: 0.0,
    };
    let result = project(&scenario(1000, 500, 100.0, 200.0, costs));

    assert_eq!(result.total_costs(), 20_000.0);
    assert_eq!(result.projected_profit(), 40_000.0);
    assert!((result.profit_margin() - 66.666_666).abs() < 1e-3);
    // 20000 / 120 = 166.67 -> 167
    assert_eq!(result.break_even_tickets(), Some(167));
    assert_eq!(result.costs_breakdown, costs);
}

#[test]
fn test_project_zero_revenue_has_zero_margin_and_no_break_even() {
    let costs = CostBreakdown {
        venue: 100.0,
        ..Default::default()
    };
    let result = project(&scenario(10, 10, 0.0, 0.0, costs));

    assert_eq!(result.total_revenue(), 0.0);
    assert_eq!(result.profit_margin(), 0.0);
    assert_eq!(result.projected_profit(), -100.0);
    assert_eq!(result.break_even_tickets(), None);
}

#[test]
fn test_split_rounds_half_away_from_zero() {
    // 0.8 * 3 = 2.4 -> 2, 0.8 * 5 = 4, 0.8 * 7 = 5.6 -> 6
    assert_eq!(split_tickets(3), (2, 1));
    assert_eq!(split_tickets(5), (4, 1));
    assert_eq!(split_tickets(7), (6, 1));
    assert_eq!(split_tickets(1), (1, 0));
}

#[test]
fn test_scenario_rejects_attendance_over_capacity() {
    let err = Scenario::new(100, 101, 10.0, 0.0, CostBreakdown::default()).unwrap_err();
    assert!(matches!(err, ValidationFailure::ExceedsLimit { .. }));
}

#[test]
fn test_scenario_rejects_negative_cost() {
    let costs = CostBreakdown {
        staff: -1.0,
        ..Default::default()
    };
    let err = Scenario::new(100, 50, 10.0, 0.0, costs).unwrap_err();
    assert_eq!(err, ValidationFailure::Negative("Staff cost".to_string()));
}

#[test]
fn test_compare_requires_two_scenarios() {
    let err = compare(&[named("solo", 10, 1.0)]).unwrap_err();
    assert_eq!(err, ProjectionError::InsufficientScenarios { provided: 1 });
    assert!(compare(&[]).is_err());
}

#[test]
fn test_compare_ties_keep_first_occurrence() {
    // attendance 5 at price p: 4 general tickets -> revenue 4p
    let scenarios = vec![named("low", 5, 25.0), named("first-high", 5, 75.0), named("second-high", 5, 75.0)];
    let result = compare(&scenarios).unwrap();

    assert_eq!(result.comparisons.len(), 3);
    assert_eq!(result.comparisons[0].total_revenue, 100.0);
    assert_eq!(result.best_scenario.scenario_name.as_deref(), Some("first-high"));
    assert_eq!(result.best_scenario.total_revenue, 300.0);
    assert_eq!(result.summary.total_scenarios, 3);
    assert_eq!(result.summary.revenue_range, RevenueRange { min: 100.0, max: 300.0 });
}

#[test]
fn test_compare_summary_fields() {
    let scenarios = vec![
        NamedScenario::new(Some("a".into()), 100, 50.0, 150.0).unwrap(),
        NamedScenario::new(None, 10, 10.0, 0.0).unwrap(),
    ];
    let result = compare(&scenarios).unwrap();
    let first = &result.comparisons[0];

    assert_eq!(first.tickets_breakdown, TicketSplit { general: 80, vip: 20 });
    assert_eq!(first.total_revenue, 80.0 * 50.0 + 20.0 * 150.0);
    assert_eq!(first.revenue_per_person, 70.0);
    assert_eq!(result.comparisons[1].scenario_name, None);
}

#[test]
fn test_projection_serializes_as_calculation_details() {
    let result = project(&scenario(100, 10, 10.0, 20.0, CostBreakdown::default()));
    let json = serde_json::to_value(result).unwrap();

    assert_eq!(json["tickets_breakdown"]["general_tickets"], 8);
    assert_eq!(json["revenue_breakdown"]["total_revenue"], 120.0);
    assert_eq!(json["costs_breakdown"]["venue"], 0.0);
    assert_eq!(json["financial_analysis"]["break_even_tickets"], 0);
}

proptest! {
    #[test]
    fn prop_tickets_sum_to_attendance(attendance in 1i32..1_000_000) {
        let result = project(&scenario(attendance, attendance, 10.0, 20.0, CostBreakdown::default()));
        let tickets = result.tickets_breakdown;
        prop_assert_eq!(tickets.general_tickets + tickets.vip_tickets, i64::from(attendance));
        prop_assert_eq!(tickets.general_tickets, (f64::from(attendance) * 0.8).round() as i64);
    }

    #[test]
    fn prop_revenue_and_profit_identities(
        attendance in 1i32..100_000,
        general in 0.0f64..10_000.0,
        vip in 0.0f64..10_000.0,
        venue in 0.0f64..1_000_000.0,
        staff in 0.0f64..1_000_000.0,
    ) {
        let costs = CostBreakdown { venue, staff, ..Default::default() };
        let result = project(&scenario(attendance, attendance, general, vip, costs));
        let revenue = result.revenue_breakdown;
        prop_assert_eq!(revenue.total_revenue, revenue.general_revenue + revenue.vip_revenue);
        prop_assert_eq!(result.projected_profit(), revenue.total_revenue - result.total_costs());
        if revenue.total_revenue == 0.0 {
            prop_assert_eq!(result.profit_margin(), 0.0);
        }
    }

    #[test]
    fn prop_no_costs_means_zero_break_even(
        attendance in 1i32..100_000,
        general in 0.0f64..10_000.0,
        vip in 0.0f64..10_000.0,
    ) {
        let result = project(&scenario(attendance, attendance, general, vip, CostBreakdown::default()));
        prop_assert_eq!(result.break_even_tickets(), Some(0));
    }

    #[test]
    fn prop_best_scenario_has_max_revenue(
        inputs in proptest::collection::vec((1i32..10_000, 0.0f64..1_000.0), 2..8)
    ) {
        let scenarios: Vec<NamedScenario> = inputs
            .iter()
            .enumerate()
            .map(|(i, (attendance, price))| {
                NamedScenario::new(Some(format!("s{i}")), *attendance, *price, 0.0).unwrap()
            })
            .collect();
        let result = compare(&scenarios).unwrap();
        let first_max = result
            .comparisons
            .iter()
            .find(|s| s.total_revenue == result.summary.revenue_range.max)
            .unwrap();
        prop_assert_eq!(&result.best_scenario, first_max);
    }
}
