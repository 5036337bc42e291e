use std::io::Write;

use nova_overload::{json_schema, ConfigError, DiagnosticKind, OverloadConfig, Severity};
use pretty_assertions::assert_eq;

#[test]
fn empty_config_uses_defaults() {
    let config = OverloadConfig::load_from_str("").unwrap();
    assert_eq!(config, OverloadConfig::default());
    for kind in DiagnosticKind::ALL {
        let expected = match kind {
            DiagnosticKind::UncheckedConversion | DiagnosticKind::UncheckedVarargs => {
                Severity::Warning
            }
            _ => Severity::Error,
        };
        assert_eq!(config.severity_of(kind), expected, "{kind:?}");
    }
}

#[test]
fn severity_table_overrides_defaults() {
    let text = r#"
language_level = 17

[severity]
ambiguous = "warning"
unchecked_varargs = "ignore"
incompatible_inherited_return_types = "error"
"#;
    let config = OverloadConfig::load_from_str(text).unwrap();
    assert_eq!(config.language_level, 17);
    assert_eq!(config.severity_of(DiagnosticKind::Ambiguous), Severity::Warning);
    assert_eq!(
        config.severity_of(DiagnosticKind::UncheckedVarargs),
        Severity::Ignore
    );
    assert_eq!(
        config.severity.get(DiagnosticKind::IncompatibleInheritedReturnTypes),
        Some(Severity::Error)
    );
    assert_eq!(config.severity.get(DiagnosticKind::NameClash), None);
}

#[test]
fn unknown_keys_are_rejected() {
    let err = OverloadConfig::load_from_str("[severity]\nshadowing = \"warning\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");

    let err = OverloadConfig::load_from_str("langauge_level = 8\n").unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)), "{err:?}");
}

#[test]
fn config_round_trips_through_toml() {
    let mut config = OverloadConfig {
        language_level: 11,
        ..OverloadConfig::default()
    };
    config
        .severity
        .set(DiagnosticKind::NameClash, Some(Severity::Warning));

    let text = toml::to_string(&config).unwrap();
    assert_eq!(OverloadConfig::load_from_str(&text).unwrap(), config);
}

#[test]
fn loads_from_a_file_and_reports_missing_files() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "language_level = 6").unwrap();
    let config = OverloadConfig::load_from_path(file.path()).unwrap();
    assert_eq!(config.severity_of(DiagnosticKind::NameClash), Severity::Warning);

    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("overload.toml");
    let err = OverloadConfig::load_from_path(&missing).unwrap_err();
    match err {
        ConfigError::Io { path, .. } => assert_eq!(path, missing.display().to_string()),
        other => panic!("expected an io error, got {other:?}"),
    }
}

#[test]
fn schema_lists_every_severity_key() {
    let schema = serde_json::to_value(json_schema()).unwrap();
    let properties = &schema["properties"];
    assert!(properties.get("language_level").is_some());
    assert!(properties.get("severity").is_some());

    let overrides = &schema["definitions"]["SeverityOverrides"]["properties"];
    for kind in DiagnosticKind::ALL {
        let key = serde_json::to_value(kind).unwrap();
        let key = key.as_str().unwrap();
        assert!(overrides.get(key).is_some(), "missing {key}");
    }
}
