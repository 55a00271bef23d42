//! Directive lookup with header-over-query precedence.

use crate::config::CommandConfig;
use crate::context::{CanonicalHeaders, QueryParams};

/// A client-controllable knob. Each one can arrive as a header or a query
/// parameter; the header always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Directive {
    /// Literal response body.
    Body,
    /// Name of an environment variable whose value becomes the body.
    EnvBody,
    /// Status code or `A-B-C` list.
    StatusCode,
    /// Extra response headers.
    Headers,
    /// Artificial delay in milliseconds.
    Delay,
    /// File or directory to return.
    File,
}

impl Directive {
    pub const ALL: [Directive; 6] = [
        Directive::Body,
        Directive::EnvBody,
        Directive::StatusCode,
        Directive::Headers,
        Directive::Delay,
        Directive::File,
    ];

    /// `(header name, query name)` configured for this directive.
    pub fn names(self, commands: &CommandConfig) -> (&str, &str) {
        match self {
            Directive::Body => (&commands.http_body_header, &commands.http_body_query),
            Directive::EnvBody => (&commands.http_env_body_header, &commands.http_env_body_query),
            Directive::StatusCode => (&commands.http_code_header, &commands.http_code_query),
            Directive::Headers => (&commands.http_headers_header, &commands.http_headers_query),
            Directive::Delay => (&commands.time_header, &commands.time_query),
            Directive::File => (&commands.file_header, &commands.file_query),
        }
    }
}

/// Resolves directives against one request's headers and query.
#[derive(Debug, Clone, Copy)]
pub struct DirectiveExtractor<'a> {
    commands: &'a CommandConfig,
    headers: &'a CanonicalHeaders,
    query: &'a QueryParams,
}

impl<'a> DirectiveExtractor<'a> {
    pub fn new(
        commands: &'a CommandConfig,
        headers: &'a CanonicalHeaders,
        query: &'a QueryParams,
    ) -> Self {
        Self { commands, headers, query }
    }

    /// Value of `directive`, or `None` when neither source carries it.
    ///
    /// A header that is present but empty still wins over the query.
    pub fn get(&self, directive: Directive) -> Option<&'a str> {
        let (header, query) = directive.names(self.commands);
        lookup(self.headers, self.query, header, query)
    }

    pub fn is_present(&self, directive: Directive) -> bool {
        self.get(directive).is_some()
    }
}

/// Header lookup is case-insensitive; query lookup is exact.
pub fn lookup<'a>(
    headers: &'a CanonicalHeaders,
    query: &'a QueryParams,
    header_name: &str,
    query_name: &str,
) -> Option<&'a str> {
    headers
        .get(header_name)
        .or_else(|| query.first(query_name))
}
