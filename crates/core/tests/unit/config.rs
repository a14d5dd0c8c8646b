use mipsim_core::config::Config;
use pretty_assertions::assert_eq;
use rstest::rstest;

#[test]
fn empty_object_is_the_default() {
    assert_eq!(Config::from_json("{}").unwrap(), Config::default());
}

#[test]
fn partial_objects_fill_in_defaults() {
    let config = Config::from_json(r#"{ "start_at_main": true, "max_instructions": 10 }"#).unwrap();
    assert_eq!(
        config,
        Config {
            start_at_main: true,
            max_instructions: Some(10),
            ..Config::default()
        }
    );
}

#[rstest]
#[case::unknown_key(r#"{ "turbo": true }"#)]
#[case::wrong_type(r#"{ "debug": "yes" }"#)]
#[case::not_json("debug = true")]
fn malformed_configs_are_rejected(#[case] json: &str) {
    let err = Config::from_json(json).unwrap_err();
    assert!(err.to_string().starts_with("invalid configuration"), "{err}");
}

#[test]
fn config_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mipsim.json");
    std::fs::write(&path, r#"{ "debug": true, "warnings": true }"#).unwrap();
    let config = Config::from_json(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert!(config.debug && config.warnings);
    assert!(!config.garbage_memory);
}
