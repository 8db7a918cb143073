use chatgate::config::ModelCatalogConfig;
use chatgate::model_registry::ModelRegistry;
use std::io::Write;

fn write_catalog(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(contents.as_bytes()).expect("write catalog");
    file
}

#[test]
fn catalog_file_loads_and_builds_a_registry() {
    let file = write_catalog(
        r#"{
            "default_model": "small",
            "models": [
                {
                    "key": "small",
                    "upstream_id": "org/small-1b",
                    "display_name": "Small 1B",
                    "pricing": { "input": "0.1", "output": "0.2" }
                },
                {
                    "key": "large",
                    "upstream_id": "org/large-70b",
                    "display_name": "Large 70B"
                }
            ]
        }"#,
    );
    let catalog = ModelCatalogConfig::load(file.path()).expect("catalog should load");
    let registry = ModelRegistry::from_config(catalog).expect("registry should build");
    assert_eq!(registry.lookup(Some("large")).upstream_id, "org/large-70b");
    assert_eq!(registry.lookup(Some("unknown")).upstream_id, "org/small-1b");
    let pricing = registry.default_descriptor().pricing.as_ref().unwrap();
    assert_eq!(pricing.input.to_string(), "0.1");
}

#[test]
fn catalog_with_absent_default_is_rejected() {
    let file = write_catalog(
        r#"{
            "default_model": "missing",
            "models": [
                { "key": "only", "upstream_id": "org/only", "display_name": "Only" }
            ]
        }"#,
    );
    let err = ModelCatalogConfig::load(file.path()).unwrap_err();
    assert!(err.contains("missing"));
}

#[test]
fn unknown_catalog_fields_are_rejected() {
    let file = write_catalog(
        r#"{
            "default_model": "only",
            "models": [
                { "key": "only", "upstream_id": "org/only", "display_name": "Only" }
            ],
            "surprise": true
        }"#,
    );
    assert!(ModelCatalogConfig::load(file.path()).is_err());
}

#[test]
fn missing_catalog_file_reports_the_path() {
    let err = ModelCatalogConfig::load(std::path::Path::new("/nonexistent/models.json"))
        .unwrap_err();
    assert!(err.contains("/nonexistent/models.json"));
}
