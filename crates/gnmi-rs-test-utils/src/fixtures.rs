use gnmi_rs_core::{ConfigStore, Schema};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Schema bundle modelled on a small mobile-core configuration.
pub const SCHEMA_BUNDLE: &str = r#"{
    modules: [
        { name: "access-profile", organization: "Open Networking Foundation", version: "2020-10-22", nodes: ["access-profile"] },
        { name: "connectivity-service", organization: "Open Networking Foundation", version: "2020-10-22", nodes: ["connectivity-service"] },
        { name: "ip-domain", organization: "Open Networking Foundation", version: "2020-10-22", nodes: ["ip-domain"] },
        { name: "upf", organization: "Open Networking Foundation", version: "2020-10-22", nodes: ["upf"] },
        { name: "site", organization: "Open Networking Foundation", version: "2020-10-22", nodes: ["site"] },
    ],
    enums: {
        "/access-profile/access-profile/type": {
            "internet-only": 0,
            "intranet-only": 1,
            "specific-application": 2,
        },
        "/ip-domain/ip-domain/admin-status": { "enable": 0, "disable": 1 },
    },
    root: {
        kind: "container",
        children: {
            "access-profile": {
                kind: "container",
                children: {
                    "access-profile": {
                        kind: "list",
                        keys: ["id"],
                        element: {
                            kind: "container",
                            children: {
                                id: { kind: "leaf", type: "string" },
                                type: { kind: "leaf", type: "enum" },
                                filter: { kind: "leaf", type: "string" },
                                description: { kind: "leaf", type: "string" },
                            },
                        },
                    },
                },
            },
            "connectivity-service": {
                kind: "container",
                children: {
                    "connectivity-service": {
                        kind: "list",
                        keys: ["id"],
                        element: {
                            kind: "container",
                            children: {
                                id: { kind: "leaf", type: "string" },
                                "hss-endpoint": { kind: "leaf", type: "string" },
                                "spgwc-endpoint": { kind: "leaf", type: "string" },
                            },
                        },
                    },
                },
            },
            "ip-domain": {
                kind: "container",
                children: {
                    "ip-domain": {
                        kind: "list",
                        keys: ["id"],
                        element: {
                            kind: "container",
                            children: {
                                id: { kind: "leaf", type: "string" },
                                subnet: { kind: "leaf", type: "string" },
                                mtu: { kind: "leaf", type: "uint" },
                                priority: { kind: "leaf", type: "int" },
                                "admin-status": { kind: "leaf", type: "enum" },
                            },
                        },
                    },
                },
            },
            upf: {
                kind: "container",
                children: {
                    upf: {
                        kind: "list",
                        keys: ["id"],
                        element: {
                            kind: "container",
                            children: {
                                id: { kind: "leaf", type: "string" },
                                address: { kind: "leaf", type: "string" },
                                port: { kind: "leaf", type: "uint" },
                                enabled: { kind: "leaf", type: "bool" },
                                weight: { kind: "leaf", type: "float" },
                                secret: { kind: "leaf", type: "bytes" },
                                bitrate: { kind: "leaf", type: "decimal" },
                            },
                        },
                    },
                },
            },
            site: {
                kind: "list",
                keys: ["enterprise", "name"],
                element: {
                    kind: "container",
                    children: {
                        enterprise: { kind: "leaf", type: "string" },
                        name: { kind: "leaf", type: "string" },
                        description: { kind: "leaf", type: "string" },
                    },
                },
            },
            hostname: { kind: "leaf", type: "string" },
        },
    },
}"#;

/// Initial configuration document for [`SCHEMA_BUNDLE`].
pub const DATA_DOCUMENT: &str = r#"{
    "access-profile": {
        "access-profile": [
            {
                "id": "typical-access-profile",
                "type": "internet-only",
                "filter": "allow app name",
                "description": "a typical access profile"
            },
            {
                "id": "intranet-profile",
                "type": 1,
                "filter": "deny all"
            }
        ]
    },
    "connectivity-service": {
        "connectivity-service": [
            {
                "id": "cs5gtest",
                "hss-endpoint": "http://aether-roc-umbrella-sdcore-test-dummy/v1/config/5g",
                "spgwc-endpoint": "http://aether-roc-umbrella-sdcore-test-dummy/v1/config/5g"
            }
        ]
    },
    "ip-domain": {
        "ip-domain": [
            {
                "id": "starbucks-newyork",
                "subnet": "254.186.117.251/31",
                "mtu": 1500,
                "priority": "-2",
                "admin-status": "enable"
            }
        ]
    },
    "upf": {
        "upf": [
            {
                "id": "upf-1",
                "address": "upf.example.net",
                "port": 8805,
                "enabled": true,
                "weight": 0.75,
                "secret": "AQID",
                "bitrate": "12.50"
            }
        ]
    },
    "site": [
        { "enterprise": "acme", "name": "hq", "description": "headquarters" },
        { "enterprise": "acme", "name": "lab" }
    ],
    "hostname": "sdcore-adapter"
}"#;

pub fn schema() -> Arc<Schema> {
    Arc::new(Schema::load_from_str(SCHEMA_BUNDLE).expect("fixture schema"))
}

/// Store populated from [`DATA_DOCUMENT`].
pub fn store() -> ConfigStore {
    ConfigStore::from_document(schema(), DATA_DOCUMENT.as_bytes()).expect("fixture document")
}

/// Write the schema bundle and data document into `dir`, returning their paths.
pub fn write_fixture_files(dir: &Path) -> (PathBuf, PathBuf) {
    let schema_path = dir.join("schema.json5");
    let data_path = dir.join("data.json");
    fs::write(&schema_path, SCHEMA_BUNDLE).expect("write schema");
    fs::write(&data_path, DATA_DOCUMENT).expect("write data");
    (schema_path, data_path)
}
