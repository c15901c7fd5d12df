use std::fs;

use copycat::error::Error;
use copycat::model::{load_model, normalize, Scalar, Value};
use copycat::Generator;
use tempfile::TempDir;

#[test]
fn test_load_yaml_model() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.yaml");
    fs::write(&path, "projectName: MyApp\nport: 8080\nfeatures:\n  - name: auth\n").unwrap();

    let model = load_model(&path).unwrap();

    assert_eq!(model.get("projectName"), Some(&Value::from("MyApp")));
    assert_eq!(model.get("port"), Some(&Value::Scalar(Scalar::Integer(8080))));
    let features = model.get("features").unwrap().as_sequence().unwrap();
    assert_eq!(features[0].get("name").and_then(Value::as_str), Some("auth"));
}

#[test]
fn test_load_json_model() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("model.json");
    fs::write(&path, r#"{"zeta": true, "alpha": {"name": "x"}, "items": [1, 2.5, null]}"#)
        .unwrap();

    let model = load_model(&path).unwrap();

    let keys: Vec<&str> = model.root().as_map().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["zeta", "alpha", "items"]);
    assert_eq!(model.get("zeta"), Some(&Value::Scalar(Scalar::Bool(true))));
    assert_eq!(
        model.get("items").unwrap().as_sequence().unwrap(),
        [Value::Scalar(Scalar::Integer(1)), Value::Scalar(Scalar::Float(2.5)), Value::Absent]
    );
}

#[test]
fn test_load_model_errors() {
    let temp_dir = TempDir::new().unwrap();

    match load_model(temp_dir.path().join("missing.yaml")) {
        Err(Error::ConfigError(message)) => assert!(message.contains("missing.yaml")),
        other => panic!("Expected ConfigError, got {other:?}"),
    }

    let invalid = temp_dir.path().join("invalid.yaml");
    fs::write(&invalid, "key: [unclosed").unwrap();
    assert!(matches!(load_model(&invalid), Err(Error::ConfigError(_))));

    let sequence = temp_dir.path().join("list.json");
    fs::write(&sequence, "[1, 2]").unwrap();
    assert!(matches!(load_model(&sequence), Err(Error::ModelError(_))));
}

#[test]
fn test_templated_model_strings_are_interpolated() {
    let model = normalize(
        serde_yaml::from_str(
            r#"
projectName: My App
projectSlug: "{{ projectName | snake_case }}"
features:
  - name: user account
    module: "{{ name | pascal_case }}"
    title: "{{ root.projectName }}: {{ name }}"
"#,
        )
        .unwrap(),
    )
    .unwrap();

    let generator = Generator::new(model).unwrap();
    let model = generator.model();

    assert_eq!(model.get("projectSlug").and_then(Value::as_str), Some("my_app"));
    let feature = &model.get("features").unwrap().as_sequence().unwrap()[0];
    assert_eq!(feature.get("module").and_then(Value::as_str), Some("UserAccount"));
    assert_eq!(feature.get("title").and_then(Value::as_str), Some("My App: user account"));
}

#[test]
fn test_interpolation_failure_names_the_key() {
    let model = normalize(serde_yaml::from_str("slug: \"{{ nope }}\"").unwrap()).unwrap();

    match Generator::new(model) {
        Err(Error::RenderError { template, .. }) => assert_eq!(template, "model.slug"),
        Err(other) => panic!("Expected RenderError, got {other:?}"),
        Ok(_) => panic!("Expected RenderError"),
    }
}
