use crate::fixtures::store;
use gnmi_rs_config::GetConfig;
use gnmi_rs_core::GnmiServer;
use gnmi_rs_protocol::{Address, Encoding, GetRequest, ModelDescriptor};

/// Server over the fixture store with default get limits.
pub fn server() -> GnmiServer {
    server_with(GetConfig::default())
}

pub fn server_with(options: GetConfig) -> GnmiServer {
    GnmiServer::new(store(), options)
}

/// Parse address text, panicking on malformed input.
pub fn address(text: &str) -> Address {
    text.parse().expect("fixture address")
}

pub fn get_request(paths: &[&str], encoding: Encoding) -> GetRequest {
    GetRequest {
        prefix: None,
        paths: paths.iter().map(|path| address(path)).collect(),
        encoding,
        use_models: Vec::new(),
    }
}

/// Descriptor of a fixture module by name.
pub fn model(name: &str) -> ModelDescriptor {
    ModelDescriptor::new(name, "Open Networking Foundation", "2020-10-22")
}
