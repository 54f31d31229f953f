//! Capability and get request handlers.

use crate::encoder;
use crate::error::{GnmiError, StartupError};
use crate::registry::ModelRegistry;
use crate::resolver::resolve;
use crate::schema::Schema;
use crate::store::ConfigStore;
use async_trait::async_trait;
use gnmi_rs_config::{GetConfig, ServerConfig};
use gnmi_rs_protocol::{
    Address, CapabilityRequest, CapabilityResponse, Code, GetRequest, GetResponse,
    ModelDescriptor, Notification, Status, Update,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::time::{Duration, Instant};

/// Per-call cancellation flag and optional deadline.
///
/// Clones share the cancel flag, so the transport can keep one handle and
/// pass another into the handler.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Mark the call canceled for every clone of this context.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail if the call was canceled or its deadline has passed.
    pub fn check(&self) -> Result<(), GnmiError> {
        if self.is_cancelled() {
            return Err(GnmiError::Canceled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(GnmiError::DeadlineExceeded),
            _ => Ok(()),
        }
    }
}

/// Source of notification timestamps that never moves backwards.
#[derive(Debug, Default)]
pub struct TimestampClock {
    last: AtomicI64,
}

impl TimestampClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current time in nanoseconds since the Unix epoch, clamped to the last issued value.
    pub fn now(&self) -> i64 {
        let wall = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX);
        let previous = self.last.fetch_max(wall, Ordering::SeqCst);
        previous.max(wall)
    }
}

/// The two read operations a gNMI server answers.
#[async_trait]
pub trait GnmiService: Send + Sync {
    async fn capabilities(
        &self,
        ctx: &CallContext,
        request: CapabilityRequest,
    ) -> Result<CapabilityResponse, Status>;

    async fn get(&self, ctx: &CallContext, request: GetRequest) -> Result<GetResponse, Status>;
}

impl From<GnmiError> for Status {
    fn from(err: GnmiError) -> Self {
        let code = match &err {
            GnmiError::PathNotFound(_) => Code::NotFound,
            GnmiError::InvalidPath(_) | GnmiError::InvalidArgument(_) => Code::InvalidArgument,
            GnmiError::UnsupportedEncoding(_) => Code::Unimplemented,
            GnmiError::Internal(_) => Code::Internal,
            GnmiError::Canceled => Code::Canceled,
            GnmiError::DeadlineExceeded => Code::DeadlineExceeded,
        };
        Status::new(code, err.to_string())
    }
}

/// Request handlers over a shared configuration store.
#[derive(Clone)]
pub struct GnmiServer {
    schema: Arc<Schema>,
    registry: Arc<ModelRegistry>,
    store: ConfigStore,
    options: GetConfig,
    clock: Arc<TimestampClock>,
}

impl GnmiServer {
    /// Create handlers for `store`, advertising the models of its schema.
    pub fn new(store: ConfigStore, options: GetConfig) -> Self {
        let schema = store.schema().clone();
        let registry = Arc::new(ModelRegistry::from_schema(&schema));
        Self {
            schema,
            registry,
            store,
            options,
            clock: Arc::new(TimestampClock::new()),
        }
    }

    /// Load the schema bundle and initial document named by `config`.
    pub fn from_config(config: &ServerConfig) -> Result<Self, StartupError> {
        let schema_path = config.schema_path().ok_or(StartupError::MissingSchema)?;
        let schema = Arc::new(Schema::load_from_path(&schema_path)?);
        let store = match config.data_path() {
            Some(data_path) => ConfigStore::load_from_path(schema, &data_path)?,
            None => ConfigStore::empty(schema),
        };
        info!(
            "gnmi server assembled (schema={}, models={})",
            schema_path.display(),
            store.schema().modules().len()
        );
        Ok(Self::new(store, config.get.clone()))
    }

    pub fn schema(&self) -> &Arc<Schema> {
        &self.schema
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn options(&self) -> &GetConfig {
        &self.options
    }

    /// Apply the configured default timeout to calls without a deadline.
    fn effective_context(&self, ctx: &CallContext) -> CallContext {
        match (ctx.deadline(), self.options.default_timeout()) {
            (None, Some(timeout)) => ctx.clone().with_timeout(timeout),
            _ => ctx.clone(),
        }
    }

    fn handle_get(&self, ctx: &CallContext, request: &GetRequest) -> Result<GetResponse, GnmiError> {
        ctx.check()?;
        if request.paths.is_empty() {
            return Err(GnmiError::InvalidArgument(
                "request carries no paths".to_string(),
            ));
        }
        if request.paths.len() > self.options.max_paths {
            return Err(GnmiError::InvalidArgument(format!(
                "request carries {} paths; at most {} are accepted",
                request.paths.len(),
                self.options.max_paths
            )));
        }
        for model in &request.use_models {
            if self.registry.find(model).is_none() {
                return Err(GnmiError::InvalidArgument(format!(
                    "model {model} is not supported"
                )));
            }
        }
        if !encoder::is_supported(request.encoding) {
            return Err(GnmiError::UnsupportedEncoding(format!(
                "encoding {} is not supported",
                request.encoding
            )));
        }

        let targets = request
            .paths
            .iter()
            .map(|path| {
                let full = match &request.prefix {
                    Some(prefix) => prefix.join(path),
                    None => path.clone(),
                };
                self.check_model_scope(&full, &request.use_models)?;
                Ok::<_, GnmiError>((path, full))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let root = self.store.read();
        ctx.check()?;
        let mut notifications = Vec::with_capacity(targets.len());
        for (path, full) in targets {
            let resolved = resolve(&root, self.schema.root(), &full.segments)?;
            let value = encoder::encode(&resolved, request.encoding)?;
            notifications.push(Notification {
                timestamp: self.clock.now(),
                prefix: request.prefix.clone(),
                updates: vec![Update {
                    path: path.clone(),
                    value,
                }],
            });
        }
        Ok(GetResponse { notifications })
    }

    /// Reject addresses whose owning module lies outside a non-empty `use_models`.
    fn check_model_scope(
        &self,
        address: &Address,
        use_models: &[ModelDescriptor],
    ) -> Result<(), GnmiError> {
        if use_models.is_empty() {
            return Ok(());
        }
        match address.first_name() {
            Some(top_level) => match self.registry.owning_module(top_level) {
                Some(owner) if !use_models.contains(owner) => {
                    Err(GnmiError::InvalidArgument(format!(
                        "{address} belongs to model {owner}, which use_models excludes"
                    )))
                }
                _ => Ok(()),
            },
            None => match self
                .registry
                .owning_modules()
                .find(|owner| !use_models.contains(owner))
            {
                Some(owner) => Err(GnmiError::InvalidArgument(format!(
                    "the root spans model {owner}, which use_models excludes"
                ))),
                None => Ok(()),
            },
        }
    }
}

impl std::fmt::Debug for GnmiServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GnmiServer")
            .field("registry", &self.registry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GnmiService for GnmiServer {
    async fn capabilities(
        &self,
        ctx: &CallContext,
        _request: CapabilityRequest,
    ) -> Result<CapabilityResponse, Status> {
        debug!(
            "capabilities requested (models={})",
            self.registry.models().len()
        );
        ctx.check().map_err(|err| {
            warn!("capabilities failed (err={})", err);
            Status::from(err)
        })?;
        Ok(self.registry.capabilities())
    }

    async fn get(&self, ctx: &CallContext, request: GetRequest) -> Result<GetResponse, Status> {
        debug!(
            "get requested (paths={}, encoding={}, use_models={})",
            request.paths.len(),
            request.encoding,
            request.use_models.len()
        );
        let ctx = self.effective_context(ctx);
        self.handle_get(&ctx, &request).map_err(|err| {
            warn!("get failed (encoding={}, err={})", request.encoding, err);
            Status::from(err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn status_codes_follow_error_kind() {
        let cases = [
            (GnmiError::PathNotFound("x".into()), Code::NotFound),
            (GnmiError::InvalidPath("x".into()), Code::InvalidArgument),
            (GnmiError::InvalidArgument("x".into()), Code::InvalidArgument),
            (GnmiError::UnsupportedEncoding("x".into()), Code::Unimplemented),
            (GnmiError::Internal("x".into()), Code::Internal),
            (GnmiError::Canceled, Code::Canceled),
            (GnmiError::DeadlineExceeded, Code::DeadlineExceeded),
        ];
        for (err, code) in cases {
            let message = err.to_string();
            let status = Status::from(err);
            assert_eq!(status.code(), code);
            assert_eq!(status.message(), message);
        }
    }

    #[test]
    fn context_reports_cancel_and_deadline() {
        let ctx = CallContext::new();
        assert_eq!(ctx.check(), Ok(()));

        let handle = ctx.clone();
        handle.cancel();
        assert_eq!(ctx.check(), Err(GnmiError::Canceled));

        let expired = CallContext::new().with_deadline(Instant::now());
        assert_eq!(expired.check(), Err(GnmiError::DeadlineExceeded));

        let later = CallContext::new().with_timeout(Duration::from_secs(60));
        assert_eq!(later.check(), Ok(()));
    }

    #[test]
    fn clock_never_goes_backwards() {
        let clock = TimestampClock::new();
        clock.last.store(i64::MAX - 1, Ordering::SeqCst);
        assert_eq!(clock.now(), i64::MAX - 1);

        let fresh = TimestampClock::new();
        let first = fresh.now();
        let second = fresh.now();
        assert!(second >= first);
        assert!(first > 0);
    }
}
