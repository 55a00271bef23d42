//! Response body selection.
//!
//! # Data Flow
//! ```text
//! DirectiveExtractor
//!     → Custom   (x-echo-body / echo_body, returned verbatim)
//!     → EnvBody  (x-echo-env-body names a process variable)
//!     → File     (features.file only; FileAccessGuard)
//!     → Echo     (always matches; echo.rs)
//! ```
//!
//! # Design Decisions
//! - Fixed order, first match wins; no registration at runtime
//! - The env strategy is a trust boundary: the client picks which
//!   variable is read. Deployments that hold secrets in the environment
//!   should rename the directive or run with a scrubbed environment

pub mod echo;

use crate::config::{EnvSource, FeatureFlags};
use crate::context::RequestContext;
use crate::directive::{Directive, DirectiveExtractor};
use crate::net::NetworkIdentity;
use crate::security::FileAccessGuard;

pub use echo::{parse_cookies, ServerSection};

/// The body producers, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyStrategy {
    Custom,
    EnvBody,
    File,
    Echo,
}

impl BodyStrategy {
    pub const CHAIN: [BodyStrategy; 4] = [
        BodyStrategy::Custom,
        BodyStrategy::EnvBody,
        BodyStrategy::File,
        BodyStrategy::Echo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BodyStrategy::Custom => "custom",
            BodyStrategy::EnvBody => "env",
            BodyStrategy::File => "file",
            BodyStrategy::Echo => "echo",
        }
    }

    fn matches(self, inputs: &BodyInputs<'_>) -> bool {
        match self {
            BodyStrategy::Custom => inputs.directives.is_present(Directive::Body),
            BodyStrategy::EnvBody => inputs.directives.is_present(Directive::EnvBody),
            BodyStrategy::File => {
                inputs.features.file && inputs.directives.is_present(Directive::File)
            }
            BodyStrategy::Echo => true,
        }
    }

    fn generate(self, inputs: &BodyInputs<'_>) -> Result<String, serde_json::Error> {
        let value = |d| inputs.directives.get(d).unwrap_or_default();
        Ok(match self {
            BodyStrategy::Custom => value(Directive::Body).to_string(),
            BodyStrategy::EnvBody => {
                let name = value(Directive::EnvBody);
                tracing::debug!(variable = name, "Serving environment variable as body");
                inputs.env.var(name).unwrap_or_default()
            }
            BodyStrategy::File => match value(Directive::File) {
                "" => r#"{"error":"No file path specified"}"#.to_string(),
                path => inputs.files.resolve(path),
            },
            BodyStrategy::Echo => echo::render(
                inputs.ctx,
                inputs.features,
                inputs.identity,
                inputs.env,
                inputs.server.clone(),
            )?,
        })
    }
}

/// Everything a strategy may consult for one request.
pub struct BodyInputs<'a> {
    pub ctx: &'a RequestContext,
    pub directives: DirectiveExtractor<'a>,
    pub features: &'a FeatureFlags,
    pub env: &'a dyn EnvSource,
    pub files: &'a FileAccessGuard,
    pub identity: &'a dyn NetworkIdentity,
    pub server: ServerSection<'a>,
}

impl BodyInputs<'_> {
    /// First strategy in the chain that claims the request.
    pub fn select(&self) -> BodyStrategy {
        BodyStrategy::CHAIN
            .into_iter()
            .find(|strategy| strategy.matches(self))
            .unwrap_or(BodyStrategy::Echo)
    }

    /// Run the selected strategy.
    pub fn generate(&self) -> Result<(BodyStrategy, String), serde_json::Error> {
        let strategy = self.select();
        let body = strategy.generate(self)?;
        Ok((strategy, body))
    }
}
