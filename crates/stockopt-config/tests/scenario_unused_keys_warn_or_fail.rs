//! Scenario: misspelled or unknown config keys are surfaced, not ignored.
//!
//! # Invariants under test
//!
//! 1. Unused keys are reported under `Warn` without an error.
//! 2. Unused keys are an error under `Fail`.
//! 3. Every key the planner reads is considered consumed.
//! 4. Unused pointers come back sorted.

use stockopt_config::{load_layered_yaml_from_strings, report_unused_keys, UnusedKeyPolicy};

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
sale:
  gaincap: "$100"
statement:
  plan: "RSU"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(!report.is_clean());
    assert_eq!(report.unused_leaf_pointers, vec!["/sale/gaincap".to_string()]);
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
report:
  tax_rate: 20
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let result = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail);

    let msg = format!("{:?}", result.expect_err("fail policy must error"));
    assert!(msg.contains("CONFIG_UNUSED_KEYS"), "{msg}");
    assert!(msg.contains("/report/tax_rate"), "{msg}");
}

#[test]
fn full_config_is_clean() {
    let yaml = r#"
statement:
  plan: "GSU Class C"
  min_age_months: 12
  allow_loss: true
sale:
  gain_cap: 2500
report:
  tax_rate_pct: 25
solver:
  search_budget: 10000
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Fail)
        .expect("every planner key is consumed");

    assert!(report.is_clean());
    assert_eq!(report.consumed_prefixes.len(), 6);
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(&loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()],
    );
}
