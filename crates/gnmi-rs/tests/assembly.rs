//! End-to-end assembly through the facade: layered config, startup, get.

use gnmi_rs::config::LayeredConfigOptions;
use gnmi_rs::core::{CallContext, GnmiServer, GnmiService};
use gnmi_rs::protocol::{Encoding, TypedValue};
use gnmi_rs::{ConfigOverrides, load_server_config};
use gnmi_rs_test_utils::{get_request, write_fixture_files};
use pretty_assertions::assert_eq;
use std::fs;
use tempfile::tempdir;

/// A cwd config naming the fixture files should yield a working server.
#[tokio::test]
async fn cwd_config_assembles_server() {
    let temp = tempdir().expect("tempdir");
    let (schema_path, data_path) = write_fixture_files(temp.path());
    fs::write(
        temp.path().join("gnmi.json5"),
        format!(
            "{{ schema_path: {:?}, data_path: {:?}, get: {{ max_paths: 2 }} }}",
            schema_path.to_string_lossy(),
            data_path.to_string_lossy()
        ),
    )
    .expect("write config");

    let mut options = LayeredConfigOptions::new(temp.path());
    options.system_config_path = None;
    options.user_config_path = None;
    let config = load_server_config(options, &ConfigOverrides::default()).expect("config");
    let server = GnmiServer::from_config(&config).expect("server");

    let request = get_request(
        &["access-profile/access-profile[id=typical-access-profile]/description"],
        Encoding::Proto,
    );
    let response = server
        .get(&CallContext::new(), request)
        .await
        .expect("get");
    assert_eq!(
        response.notifications[0].updates[0].value,
        TypedValue::StringVal("a typical access profile".into())
    );

    let too_many = get_request(&["hostname", "hostname", "hostname"], Encoding::Proto);
    assert!(server.get(&CallContext::new(), too_many).await.is_err());
}

/// Command-line style overrides should replace the configured data document.
#[test]
fn data_override_replaces_configured_document() {
    let temp = tempdir().expect("tempdir");
    let (schema_path, _) = write_fixture_files(temp.path());
    let empty = temp.path().join("empty.json");
    fs::write(&empty, "{}").expect("write empty");

    let mut options = LayeredConfigOptions::new(temp.path());
    options.system_config_path = None;
    options.user_config_path = None;
    let overrides = ConfigOverrides {
        config: None,
        schema_path: Some(schema_path),
        data_path: Some(empty),
    };
    let config = load_server_config(options, &overrides).expect("config");
    let server = GnmiServer::from_config(&config).expect("server");
    assert_eq!(*server.store().read(), gnmi_rs::core::ConfigNode::empty());
}
