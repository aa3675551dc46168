use cohortly_core::{calculate_funnel, FunnelStepInput};

fn checkout() -> Vec<FunnelStepInput> {
    vec![
        FunnelStepInput::new("visit", 1000, 600).with_avg_time(12.0),
        FunnelStepInput::new("signup", 600, 300).with_avg_time(45.5),
        FunnelStepInput::new("purchase", 300, 150),
    ]
}

#[test]
fn drop_off_per_step() {
    let results = calculate_funnel(&checkout());
    let rates: Vec<f64> = results.steps.iter().map(|s| s.drop_off_rate).collect();
    assert_eq!(rates, vec![0.4, 0.5, 0.5]);
    assert_eq!(results.steps[1].avg_time, 45.5);
}

#[test]
fn conversion_relative_to_first_step() {
    let results = calculate_funnel(&checkout());
    assert_eq!(results.total_entered, 1000);
    assert_eq!(results.total_converted, 150);
    assert_eq!(results.final_conversion_rate, 0.15);
    assert_eq!(results.steps[0].conversion_rate_from_start, 0.6);
    assert_eq!(results.steps[2].conversion_rate_from_start, 0.15);
}

#[test]
fn caller_order_is_preserved() {
    let steps = vec![
        FunnelStepInput::new("zeta", 10, 5),
        FunnelStepInput::new("alpha", 50, 25),
        FunnelStepInput::new("mid", 0, 0),
    ];
    let results = calculate_funnel(&steps);
    let names: Vec<&str> = results.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    assert_eq!(results.steps[2].drop_off_rate, 0.0);
}

#[test]
fn step_definitions_deserialize_with_default_avg_time() {
    let steps: Vec<FunnelStepInput> =
        serde_json::from_str(r#"[{"step":"visit","started":10,"completed":4}]"#)
            .expect("parse steps");
    assert_eq!(steps[0].avg_time, 0.0);
    assert_eq!(calculate_funnel(&steps).steps[0].drop_off_rate, 0.6);
}

#[test]
fn funnel_is_idempotent() {
    let steps = checkout();
    assert_eq!(calculate_funnel(&steps), calculate_funnel(&steps));
}
