use copycat::error::Error;
use copycat::expander::Expander;
use copycat::functions::Functions;
use copycat::model::{normalize, Model, Value};
use copycat::renderer::MiniJinjaRenderer;

fn model(yaml: &str) -> Model {
    normalize(serde_yaml::from_str(yaml).unwrap()).unwrap()
}

fn names(model: &Model, segment: &str) -> Vec<String> {
    let renderer = MiniJinjaRenderer::new(model, &Functions::builtin());
    let expander = Expander::new(model, &renderer);
    expander.expand(segment, model.root()).unwrap().into_iter().map(|s| s.name).collect()
}

const FEATURES: &str = r#"
projectName: TestProject
features:
  - name: users
    table: user_rows
  - name: orders
    table: order_rows
"#;

#[test]
fn test_literal_segment_is_returned_as_is() {
    let model = model(FEATURES);
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expanded = Expander::new(&model, &renderer).expand("README.md", model.root()).unwrap();

    assert_eq!(expanded.len(), 1);
    assert_eq!(expanded[0].name, "README.md");
    assert!(std::ptr::eq(expanded[0].context, model.root()));
}

#[test]
fn test_scalar_placeholder() {
    let model = model(FEATURES);
    assert_eq!(names(&model, "{{ projectName }}"), ["TestProject"]);
    assert_eq!(names(&model, "{{projectName}}"), ["TestProject"]);
}

#[test]
fn test_sequence_fans_out_with_element_context() {
    let model = model(FEATURES);
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expanded =
        Expander::new(&model, &renderer).expand("{{ features.name }}", model.root()).unwrap();

    let features = model.get("features").unwrap().as_sequence().unwrap();
    assert_eq!(expanded.len(), 2);
    for (segment, feature) in expanded.iter().zip(features) {
        assert_eq!(Some(segment.name.as_str()), feature.get("name").and_then(Value::as_str));
        assert!(std::ptr::eq(segment.context, feature));
    }
}

#[test]
fn test_empty_sequence_prunes_the_branch() {
    let model = model("projectName: EmptyTest\nfeatures: []");
    assert!(names(&model, "{{ features.name }}").is_empty());
    assert!(names(&model, "{{ features }}").is_empty());
}

#[test]
fn test_missing_field_is_an_expression_error() {
    let model = model("projectName: TestApp");
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let result = Expander::new(&model, &renderer).expand("{{ nonexistent }}", model.root());

    match result {
        Err(Error::ExpressionError { expression, .. }) => assert_eq!(expression, "nonexistent"),
        other => panic!("Expected ExpressionError, got {other:?}"),
    }
}

#[test]
fn test_unresolved_path_falls_back_to_template_evaluation() {
    let model = model("projectName: My App");
    assert_eq!(names(&model, "{{ projectName | snake_case }}"), ["my_app"]);
    assert_eq!(names(&model, "{{ projectName | upper }}-v{{ 1 + 1 }}"), ["MY APP-v2"]);
}

#[test]
fn test_nested_field_inside_sequence() {
    let model = model(
        r#"
features:
  - name: feature1
    nested:
      value: deep-value
"#,
    );
    assert_eq!(names(&model, "{{ features.nested.value }}"), ["deep-value"]);
}

#[test]
fn test_two_scalars_substitute_left_to_right() {
    let model = model("a: first\nb: second");
    assert_eq!(names(&model, "pre-{{ a }}_{{ b }}.txt"), ["pre-first_second.txt"]);
}

#[test]
fn test_later_placeholder_sees_selected_element() {
    let model = model(FEATURES);
    assert_eq!(
        names(&model, "{{ features.name }}-{{ table }}"),
        ["users-user_rows", "orders-order_rows"]
    );
}

#[test]
fn test_two_sequences_expand_as_cartesian_product() {
    let model = model("envs: [dev, prod]\nregions: [eu, us]");
    assert_eq!(
        names(&model, "{{ envs }}_{{ regions }}"),
        ["dev_eu", "dev_us", "prod_eu", "prod_us"]
    );
}

#[test]
fn test_numeric_component_indexes_the_sequence() {
    let model = model(FEATURES);
    assert_eq!(names(&model, "{{ features.1.name }}"), ["orders"]);
}

#[test]
fn test_root_accessor_and_root_fallback() {
    let model = model(FEATURES);
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expander = Expander::new(&model, &renderer);
    let feature = &model.get("features").unwrap().as_sequence().unwrap()[0];

    let explicit = expander.expand("{{ root.projectName }}", feature).unwrap();
    assert_eq!(explicit[0].name, "TestProject");
    assert!(std::ptr::eq(explicit[0].context, feature));

    let implicit = expander.expand("{{ projectName }}-{{ name }}", feature).unwrap();
    assert_eq!(implicit[0].name, "TestProject-users");
}

#[test]
fn test_map_result_switches_context() {
    let model = model("owner:\n  name: alice\n  email: alice@example.com\nmeta:\n  kind: x");
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expander = Expander::new(&model, &renderer);

    let owner = expander.expand("{{ owner }}", model.root()).unwrap();
    assert_eq!(owner[0].name, "alice");
    assert!(std::ptr::eq(owner[0].context, model.get("owner").unwrap()));

    let meta = expander.expand("{{ meta }}{{ kind }}", model.root()).unwrap();
    assert_eq!(meta[0].name, "x");
}

#[test]
fn test_map_without_name_cannot_be_a_whole_name() {
    let model = model("settings:\n  port: 8080\nitems:\n  - port: 1\n  - port: 2");
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expander = Expander::new(&model, &renderer);

    for segment in ["{{ settings }}", "{{ items }}"] {
        match expander.expand(segment, model.root()) {
            Err(Error::TemplateError(message)) => assert!(message.contains(segment)),
            other => panic!("Expected TemplateError for {segment}, got {other:?}"),
        }
    }
    assert_eq!(names(&model, "{{ settings }}{{ port }}"), ["8080"]);
}

#[test]
fn test_sequence_of_scalars_uses_element_as_context() {
    let model = model("tags: [alpha, beta]");
    let renderer = MiniJinjaRenderer::new(&model, &Functions::builtin());
    let expanded = Expander::new(&model, &renderer).expand("{{ tags }}.md", model.root()).unwrap();

    let names: Vec<&str> = expanded.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, ["alpha.md", "beta.md"]);
    assert_eq!(expanded[1].context.as_str(), Some("beta"));
}
