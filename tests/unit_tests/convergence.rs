use fenris_tmop::convergence::ConvergenceRates;
use matrixcompare::assert_scalar_eq;

fn refinement_study() -> ConvergenceRates {
    let mut rates = ConvergenceRates::new();
    let norm = 2.0;
    for (level, &num_dofs) in [16, 64, 256].iter().enumerate() {
        let error = 0.1 / 4.0_f64.powi(level as i32);
        rates.register_solution(num_dofs, error, norm);
    }
    rates
}

#[test]
fn rates_of_second_order_convergence() {
    let rates = refinement_study();
    assert_eq!(rates.len(), 3);
    assert!(!rates.is_empty());

    let computed = rates.rates();
    assert_eq!(computed[0], 0.0);
    assert_scalar_eq!(computed[1], 2.0, comp = abs, tol = 1e-12);
    assert_scalar_eq!(computed[2], 2.0, comp = abs, tol = 1e-12);

    let samples = rates.samples();
    assert_eq!(samples[2].num_dofs, 256);
    assert_scalar_eq!(samples[1].l2_relative_error, 0.025 / 2.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(samples[2].l2_relative_rate, 2.0, comp = abs, tol = 1e-12);
}

#[test]
fn l2_errors_by_level() {
    let rates = refinement_study();
    assert_eq!(rates.l2_errors().len(), 3);
    assert_scalar_eq!(rates.l2_error(1).unwrap(), 0.025, comp = abs, tol = 1e-15);
    assert_eq!(rates.l2_error(3), None);
}

#[test]
fn clear_forgets_levels() {
    let mut rates = refinement_study();
    rates.clear();
    assert!(rates.is_empty());
    rates.register_solution(4, 1.0, 1.0);
    assert_eq!(rates.rates(), vec![0.0]);
}

#[test]
fn table_has_one_row_per_level() {
    let table = refinement_study().to_string();
    let lines: Vec<_> = table.lines().collect();
    assert_eq!(lines.len(), 6);
    assert!(lines[1].contains("DOFs"));
    assert!(lines[1].contains("L^2 rate"));
    assert!(lines[5].trim_start().starts_with("256"));
}

#[test]
fn samples_serialize_to_json() {
    let rates = refinement_study();
    let json = serde_json::to_string(&rates).unwrap();
    assert!(json.contains("\"l2_rate\""));
    let restored: ConvergenceRates = serde_json::from_str(&json).unwrap();
    assert_eq!(restored, rates);
}
