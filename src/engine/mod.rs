//! Response plan assembly.
//!
//! # Data Flow
//! ```text
//! RequestContext
//!     → EchoEngine::delay   (transport suspends for the result)
//!     → EchoEngine::plan
//!         → status     (directive::status)
//!         → body       (body::BodyInputs, first match)
//!         → headers    (directive::headers, features.header only)
//!     → ResponsePlan
//! ```
//!
//! # Design Decisions
//! - The engine is immutable; a reload builds a new one and the transports
//!   swap it in, so in-flight requests finish on the snapshot they started with
//! - Delay is computed here but slept by the transport, which alone knows
//!   whether sleeping may block other requests
//! - The allowed path set, identity, env source and instance id survive
//!   reconfiguration

pub mod plan;

use std::sync::Arc;
use std::time::Duration;

use uuid::Uuid;

use crate::body::{BodyInputs, ServerSection};
use crate::config::{EchoConfig, EnvSource, ProcessEnv};
use crate::context::RequestContext;
use crate::directive::{parse_header_directive, resolve_status, Directive, DirectiveExtractor, TimingGate};
use crate::error::EngineError;
use crate::net::{NetworkIdentity, SystemIdentity};
use crate::security::{AllowedPathSet, FileAccessGuard};

pub use plan::ResponsePlan;

/// Turns requests into response plans under one configuration.
#[derive(Debug, Clone)]
pub struct EchoEngine {
    config: Arc<EchoConfig>,
    timing: TimingGate,
    files: FileAccessGuard,
    identity: Arc<dyn NetworkIdentity>,
    env: Arc<dyn EnvSource>,
    instance_id: Uuid,
    port: u16,
}

impl EchoEngine {
    /// Engine over the real host: system identity and process environment.
    pub fn new(config: EchoConfig) -> Self {
        Self::with_collaborators(config, Arc::new(SystemIdentity::new()), Arc::new(ProcessEnv))
    }

    pub fn with_collaborators(
        config: EchoConfig,
        identity: Arc<dyn NetworkIdentity>,
        env: Arc<dyn EnvSource>,
    ) -> Self {
        let paths = Arc::new(AllowedPathSet::new(config.files.allowed_prefixes.iter()));
        let port = config.server.port;
        Self {
            timing: TimingGate::new(&config.timing),
            files: FileAccessGuard::new(paths, config.files.max_file_size),
            config: Arc::new(config),
            identity,
            env,
            instance_id: Uuid::new_v4(),
            port,
        }
    }

    /// Report `port` in the echo instead of the configured one. Used once
    /// the listener is bound, since the configured port may be 0.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// New engine for `config`, keeping this engine's identity and sharing
    /// its allowed path set, whose prefixes are replaced in place.
    pub fn reconfigure(&self, config: EchoConfig) -> Self {
        let paths = self.files.allowed().clone();
        paths.replace(config.files.allowed_prefixes.iter());
        Self {
            timing: TimingGate::new(&config.timing),
            files: FileAccessGuard::new(paths, config.files.max_file_size),
            config: Arc::new(config),
            identity: self.identity.clone(),
            env: self.env.clone(),
            instance_id: self.instance_id,
            port: self.port,
        }
    }

    pub fn config(&self) -> &EchoConfig {
        &self.config
    }

    pub fn allowed_paths(&self) -> &Arc<AllowedPathSet> {
        self.files.allowed()
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    fn directives<'a>(&'a self, ctx: &'a RequestContext) -> DirectiveExtractor<'a> {
        DirectiveExtractor::new(&self.config.commands, &ctx.headers, &ctx.query)
    }

    /// How long the transport should wait before answering.
    pub fn delay(&self, ctx: &RequestContext) -> Duration {
        self.timing.delay(self.directives(ctx).get(Directive::Delay))
    }

    /// Resolve status, body and extra headers for `ctx`.
    pub fn plan(&self, ctx: &RequestContext) -> Result<ResponsePlan, EngineError> {
        let directives = self.directives(ctx);
        let status = resolve_status(directives.get(Directive::StatusCode));

        let (strategy, body) = BodyInputs {
            ctx,
            directives,
            features: &self.config.features,
            env: self.env.as_ref(),
            files: &self.files,
            identity: self.identity.as_ref(),
            server: ServerSection {
                name: &self.config.logging.app_name,
                port: self.port,
                instance_id: self.instance_id,
            },
        }
        .generate()?;

        let headers = match directives.get(Directive::Headers) {
            Some(raw) if self.config.features.header => parse_header_directive(raw),
            _ => Vec::new(),
        };

        tracing::debug!(status, strategy = strategy.as_str(), extra_headers = headers.len(), "Response planned");

        Ok(ResponsePlan {
            status,
            body,
            content_type_default: headers.is_empty(),
            headers,
            strategy,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyStrategy;
    use crate::config::MapEnv;
    use crate::context::{CanonicalHeaders, QueryParams};
    use crate::net::{HostSnapshot, OsInfo, StaticIdentity};

    fn engine(config: EchoConfig) -> EchoEngine {
        let identity = StaticIdentity::new(HostSnapshot {
            hostname: "engine-test".into(),
            ip: "10.1.1.1".into(),
            ips: vec!["127.0.0.1".into(), "10.1.1.1".into()],
            os: OsInfo {
                platform: "linux".into(),
                release: "6".into(),
                kind: "unix".into(),
            },
        });
        EchoEngine::with_collaborators(config, Arc::new(identity), Arc::new(MapEnv::new([("TOKEN", "t")])))
    }

    fn request(headers: &[(&str, &str)], query: &str) -> RequestContext {
        RequestContext {
            method: "GET".into(),
            path: "/".into(),
            raw_query: Some(query.into()),
            query: QueryParams::parse(Some(query)),
            headers: headers.iter().map(|(k, v)| (*k, *v)).collect::<CanonicalHeaders>(),
            ..RequestContext::default()
        }
    }

    #[test]
    fn test_default_plan() {
        let plan = engine(EchoConfig::default()).plan(&request(&[], "")).unwrap();
        assert_eq!(plan.status, 200);
        assert_eq!(plan.strategy, BodyStrategy::Echo);
        assert!(plan.headers.is_empty());
        assert!(plan.content_type_default);

        let echo: serde_json::Value = serde_json::from_str(&plan.body).unwrap();
        assert!(echo.get("host").is_some());
        assert!(echo.get("http").is_some());
        assert!(echo.get("request").is_some());
        assert_eq!(echo["server"]["name"], "echo-server");
    }

    #[test]
    fn test_directives_combine() {
        let ctx = request(
            &[("x-echo-code", "418"), ("x-echo-header", "X-A:1, X-B:2")],
            "echo_body=hi",
        );
        let plan = engine(EchoConfig::default()).plan(&ctx).unwrap();
        assert_eq!(plan.status, 418);
        assert_eq!(plan.body, "hi");
        assert_eq!(
            plan.headers,
            vec![("X-A".to_string(), "1".to_string()), ("X-B".to_string(), "2".to_string())]
        );
        assert!(!plan.content_type_default);
    }

    #[test]
    fn test_header_feature_off_ignores_directive() {
        let mut config = EchoConfig::default();
        config.features.header = false;
        let ctx = request(&[("x-echo-header", "X-A:1")], "");
        let plan = engine(config).plan(&ctx).unwrap();
        assert!(plan.headers.is_empty());
        assert!(plan.content_type_default);
    }

    #[test]
    fn test_delay_is_clamped() {
        let mut config = EchoConfig::default();
        config.timing.max_delay_ms = 1000;
        let engine = engine(config);
        assert_eq!(engine.delay(&request(&[("x-echo-time", "5000")], "")), Duration::from_millis(1000));
        assert_eq!(engine.delay(&request(&[], "echo_time=250")), Duration::from_millis(250));
        assert_eq!(engine.delay(&request(&[], "")), Duration::ZERO);
    }

    #[test]
    fn test_random_status_membership() {
        let engine = engine(EchoConfig::default());
        let ctx = request(&[], "echo_code=200-404-500");
        let mut seen = std::collections::HashSet::new();
        for _ in 0..300 {
            let status = engine.plan(&ctx).unwrap().status;
            assert!([200, 404, 500].contains(&status));
            seen.insert(status);
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_reconfigure_keeps_identity_and_shares_paths() {
        let first = engine(EchoConfig::default()).with_port(4321);
        let paths = first.allowed_paths().clone();

        let mut config = EchoConfig::default();
        config.files.allowed_prefixes = vec!["/srv/data".into()];
        config.logging.app_name = "renamed".into();
        let second = first.reconfigure(config);

        assert_eq!(second.instance_id(), first.instance_id());
        assert_eq!(second.port(), 4321);
        assert_eq!(paths.prefixes(), vec!["/srv/data".to_string()]);
        assert!(Arc::ptr_eq(&paths, second.allowed_paths()));
        assert_eq!(second.config().logging.app_name, "renamed");
    }
}
