//! Server assembly from configuration files.

use gnmi_rs_config::{GetConfig, ServerConfig};
use gnmi_rs_core::{CallContext, GnmiServer, GnmiService, StartupError};
use gnmi_rs_protocol::{Encoding, TypedValue};
use gnmi_rs_test_utils::{get_request, write_fixture_files};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

/// A server built from on-disk files should answer like the fixture server.
#[tokio::test]
async fn from_config_loads_schema_and_document() {
    let temp = tempdir().expect("tempdir");
    let (schema_path, data_path) = write_fixture_files(temp.path());
    let config = ServerConfig::builder()
        .schema_path(schema_path.to_string_lossy())
        .data_path(data_path.to_string_lossy())
        .get(GetConfig {
            max_paths: 4,
            default_timeout_ms: Some(5_000),
        })
        .build();

    let server = GnmiServer::from_config(&config).expect("server");
    assert_eq!(server.options().max_paths, 4);
    assert_eq!(server.registry().models().len(), 5);

    let response = server
        .get(&CallContext::new(), get_request(&["hostname"], Encoding::Proto))
        .await
        .expect("get");
    assert_eq!(
        response.notifications[0].updates[0].value,
        TypedValue::StringVal("sdcore-adapter".into())
    );
}

/// Without a data document the tree starts empty and every leaf is missing.
#[tokio::test]
async fn from_config_without_data_starts_empty() {
    let temp = tempdir().expect("tempdir");
    let (schema_path, _) = write_fixture_files(temp.path());
    let config = ServerConfig::builder()
        .schema_path(schema_path.to_string_lossy())
        .build();

    let server = GnmiServer::from_config(&config).expect("server");
    let status = server
        .get(&CallContext::new(), get_request(&["hostname"], Encoding::Proto))
        .await
        .unwrap_err();
    assert_eq!(status.code(), gnmi_rs_protocol::Code::NotFound);
}

/// Missing schema locations and non-conforming documents should fail startup.
#[test]
fn from_config_reports_startup_errors() {
    let err = GnmiServer::from_config(&ServerConfig::default()).unwrap_err();
    assert!(matches!(err, StartupError::MissingSchema));

    let temp = tempdir().expect("tempdir");
    let (schema_path, data_path) = write_fixture_files(temp.path());
    fs::write(
        &data_path,
        r#"{ "site": [{ "enterprise": "acme", "name": "hq" }, { "enterprise": "acme", "name": "hq" }] }"#,
    )
    .expect("write data");
    let config = ServerConfig::builder()
        .schema_path(schema_path.to_string_lossy())
        .data_path(data_path.to_string_lossy())
        .build();
    let err = GnmiServer::from_config(&config).unwrap_err();
    assert!(matches!(err, StartupError::Tree(_)), "{err}");

    fs::write(&schema_path, "{ root: { kind: \"leaf\", type: \"string\" } }").expect("write schema");
    let err = GnmiServer::from_config(&config).unwrap_err();
    assert!(matches!(err, StartupError::Schema(_)), "{err}");
}
