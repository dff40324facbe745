use assert_approx_eq::assert_approx_eq;
use demand_forecast::metrics::{bias, evaluate, mase, smape, wmape};
use rstest::rstest;

#[rstest]
#[case(vec![10.0, 20.0, 30.0])]
#[case(vec![0.5, 0.5, 0.5, 0.5])]
#[case(vec![-3.0, 7.0, 0.0, 12.5])]
fn test_perfect_fit_is_zero(#[case] y: Vec<f64>) {
    assert_approx_eq!(wmape(&y, &y).unwrap(), 0.0, 1e-12);
    assert_approx_eq!(smape(&y, &y).unwrap(), 0.0, 1e-12);
    assert_approx_eq!(bias(&y, &y).unwrap(), 0.0, 1e-12);
}

#[test]
fn test_wmape_known_value() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    // Absolute errors sum to 12, absolute actuals sum to 150
    let value = wmape(&actual, &predicted).unwrap();
    assert_approx_eq!(value, 0.08, 1e-6);
}

#[test]
fn test_wmape_zero_denominator_is_guarded() {
    // All-zero true series: the epsilon keeps the value finite
    let value = wmape(&[0.0, 0.0, 0.0], &[1.0, 2.0, 3.0]).unwrap();
    assert!(value.is_finite());
    assert!(value > 0.0);
}

#[test]
fn test_smape_bounds() {
    // Completely wrong sign-free forecast saturates near the upper bound
    let value = smape(&[0.0, 0.0], &[1.0, 1.0]).unwrap();
    assert_approx_eq!(value, 2.0, 1e-6);

    let value = smape(&[10.0, 20.0], &[11.0, 19.0]).unwrap();
    assert!(value > 0.0 && value < 2.0);
}

#[test]
fn test_bias_sign_convention() {
    // Over-forecasting is positive
    let value = bias(&[10.0, 10.0], &[12.0, 14.0]).unwrap();
    assert_approx_eq!(value, 3.0, 1e-9);

    let value = bias(&[10.0, 10.0], &[7.0, 9.0]).unwrap();
    assert_approx_eq!(value, -2.0, 1e-9);
}

#[test]
fn test_mase_undefined_on_short_history() {
    let y52: Vec<f64> = (0..52).map(|i| i as f64).collect();
    assert!(mase(&y52, &y52, 52).unwrap().is_nan());

    let y53: Vec<f64> = (0..53).map(|i| i as f64).collect();
    assert!(mase(&y53, &y53, 52).unwrap().is_nan());

    let y54: Vec<f64> = (0..54).map(|i| (i % 7) as f64 + 1.0).collect();
    let p54: Vec<f64> = (0..54).map(|i| (i % 7) as f64).collect();
    let value = mase(&y54, &p54, 52).unwrap();
    assert!(value.is_finite());
}

#[test]
fn test_mase_known_value() {
    // Seasonal period 1: the baseline is the naive one-step diff, mean 1.0
    let actual = vec![1.0, 2.0, 3.0, 4.0];
    let predicted = vec![1.0, 2.0, 3.0, 5.0];

    let value = mase(&actual, &predicted, 1).unwrap();
    assert_approx_eq!(value, 0.25, 1e-6);
}

#[test]
fn test_length_mismatch_is_an_error() {
    assert!(wmape(&[1.0, 2.0], &[1.0]).is_err());
    assert!(smape(&[1.0], &[1.0, 2.0]).is_err());
    assert!(bias(&[], &[]).is_err());
    assert!(mase(&[1.0, 2.0], &[1.0], 1).is_err());
}

#[test]
fn test_evaluate_bundles_all_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let metrics = evaluate(&actual, &predicted, 2).unwrap();
    assert_approx_eq!(metrics.wmape, wmape(&actual, &predicted).unwrap(), 1e-12);
    assert_approx_eq!(metrics.smape, smape(&actual, &predicted).unwrap(), 1e-12);
    assert_approx_eq!(metrics.bias, bias(&actual, &predicted).unwrap(), 1e-12);
    assert_approx_eq!(metrics.mase, mase(&actual, &predicted, 2).unwrap(), 1e-12);
}
