use crate::nested::{Aggregation, DEFAULT_MAX_DEPTH, NestedConfig};

#[test]
fn test_default_config() {
    let config = NestedConfig::default();
    assert_eq!(config.max_depth, DEFAULT_MAX_DEPTH);
    assert_eq!(config.max_depth, 10);
    assert_eq!(config.aggregation, Aggregation::Preserve);
}

#[test]
fn test_config_from_json() {
    let config = NestedConfig::from_json(r#"{"max_depth": 3, "aggregation": "mean"}"#).unwrap();
    assert_eq!(config, NestedConfig::new(3, Aggregation::Mean));

    // 缺省字段取默认值
    let config = NestedConfig::from_json("{}").unwrap();
    assert_eq!(config, NestedConfig::default());

    assert!(NestedConfig::from_json(r#"{"aggregation": "sum"}"#).is_err());
    assert!(NestedConfig::from_json(r#"{"max_depth": -1}"#).is_err());
}

#[test]
fn test_config_json_round_trip() {
    let config = NestedConfig::new(4, Aggregation::Flatten);
    let json = config.to_json().unwrap();
    assert!(json.contains("\"flatten\""));
    assert_eq!(NestedConfig::from_json(&json).unwrap(), config);
}
