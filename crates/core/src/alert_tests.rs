use super::*;

#[test]
fn parse_default_operator_is_greater() {
    let rule = AlertRule::parse("Temperature", "25").unwrap();
    assert_eq!(rule.comparison, Comparison::Greater);
    assert_eq!(rule.threshold, 25.0);
    assert!(!rule.prefix);
}

#[test]
fn parse_explicit_operators() {
    assert_eq!(
        AlertRule::parse("Humidity", "<30").unwrap().comparison,
        Comparison::Less
    );
    assert_eq!(
        AlertRule::parse("Motion", "=1").unwrap().comparison,
        Comparison::Equal
    );
}

#[test]
fn parse_prefix_marker() {
    let rule = AlertRule::parse("*Temp", ">25").unwrap();
    assert!(rule.prefix);
    assert!(rule.matches_name("Temperature"));
    assert!(rule.matches_name("TempOutside"));
    assert!(!rule.matches_name("Humidity"));
}

#[test]
fn parse_rejects_garbage() {
    assert!(matches!(
        AlertRule::parse("Temperature", ""),
        Err(AlertRuleError::Empty(_))
    ));
    assert!(matches!(
        AlertRule::parse("Temperature", ">abc"),
        Err(AlertRuleError::Threshold(_, _))
    ));
}

#[test]
fn exact_name_does_not_match_superstring() {
    let rule = AlertRule::parse("Temp", ">25").unwrap();
    assert!(!rule.matches_name("Temperature"));
}

#[test]
fn violations_reports_exceeded_rules_only() {
    let rules = vec![AlertRule::parse("Temperature", ">25").unwrap()];

    let mut bucket = BTreeMap::new();
    bucket.insert("Temperature".to_string(), Value::Number(26.0));
    let found = violations(&rules, &bucket);
    assert_eq!(found.len(), 1);
    assert!(found[0].contains("Temperature"));

    bucket.insert("Temperature".to_string(), Value::Number(24.0));
    assert!(violations(&rules, &bucket).is_empty());
}

#[test]
fn violations_evaluates_booleans_numerically() {
    let rules = vec![AlertRule::parse("Motion", "=1").unwrap()];

    let mut bucket = BTreeMap::new();
    bucket.insert("Motion".to_string(), Value::Bool(true));
    assert_eq!(violations(&rules, &bucket).len(), 1);

    bucket.insert("Motion".to_string(), Value::Bool(false));
    assert!(violations(&rules, &bucket).is_empty());
}
