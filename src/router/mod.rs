//! Path routing
//!
//! The route table is built once when the [`Router`] is created and is only
//! read afterwards. Routes are checked in order; the last one always
//! matches and runs the directive pipeline.

pub mod canned;

use crate::directive;
use crate::http::{CommittedResponse, Method, ParsedRequest};
use crate::synthesis::{EchoFormat, ResponseBuilder, SynthesisConfig, SynthesisError, trace};
use bytes::Bytes;
use canned::CannedContent;
use sha1::{Digest, Sha1};
use tracing::debug;

/// What selects a route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// Path equals the string exactly
    Exact(&'static str),
    /// Path ends with the string
    Suffix(&'static str),
    /// `Accept` asks for a JSON media type
    AcceptsJson,
    Any,
}

impl Predicate {
    pub fn matches(&self, request: &ParsedRequest) -> bool {
        match self {
            Predicate::Exact(path) => request.path == *path,
            Predicate::Suffix(suffix) => request.path.ends_with(suffix),
            Predicate::AcceptsJson => request
                .headers
                .get_all("Accept")
                .flat_map(|value| value.split(','))
                .any(is_json_media_type),
            Predicate::Any => true,
        }
    }
}

fn is_json_media_type(range: &str) -> bool {
    let mime = range.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    mime.ends_with("/json") || mime.ends_with("+json")
}

/// How a matched route produces its response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    Canned(&'static CannedContent),
    Echo(EchoFormat),
}

impl Handler {
    pub fn name(&self) -> &'static str {
        match self {
            Handler::Canned(content) => content.name,
            Handler::Echo(EchoFormat::Text) => "echo",
            Handler::Echo(EchoFormat::Json) => "json-echo",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Route {
    pub predicate: Predicate,
    pub handler: Handler,
}

/// Maps requests to handlers and produces their responses
#[derive(Debug, Clone)]
pub struct Router {
    routes: Vec<Route>,
    config: SynthesisConfig,
}

impl Router {
    pub fn new(config: SynthesisConfig) -> Self {
        let fixed = [
            ("/", &canned::HELP),
            ("/ping", &canned::PONG),
            ("/test/ping", &canned::PONG),
            ("/test/hello_world", &canned::HELLO_WORLD),
            ("/test/help", &canned::HELP),
            ("/test/football.svg", &canned::FOOTBALL),
        ];

        let mut routes: Vec<Route> = fixed
            .into_iter()
            .map(|(path, content)| Route {
                predicate: Predicate::Exact(path),
                handler: Handler::Canned(content),
            })
            .collect();
        routes.push(Route {
            predicate: Predicate::Suffix(".json"),
            handler: Handler::Echo(EchoFormat::Json),
        });
        routes.push(Route {
            predicate: Predicate::AcceptsJson,
            handler: Handler::Echo(EchoFormat::Json),
        });
        routes.push(Route {
            predicate: Predicate::Any,
            handler: Handler::Echo(EchoFormat::Text),
        });

        Self { routes, config }
    }

    /// Selects the handler for `request`
    pub fn resolve(&self, request: &ParsedRequest) -> Handler {
        self.routes
            .iter()
            .find(|route| route.predicate.matches(request))
            .map(|route| route.handler)
            .unwrap_or(Handler::Echo(EchoFormat::Text))
    }

    /// Produces the complete response for `request`
    ///
    /// HEAD answers carry the same headers a GET would, body withheld.
    pub fn respond(&self, request: &ParsedRequest) -> Result<CommittedResponse, SynthesisError> {
        if matches!(request.method, Method::Connect | Method::Trace) {
            return Err(SynthesisError::UnsupportedMethod(request.method));
        }
        if request.method == Method::Head {
            let get = ParsedRequest {
                method: Method::Get,
                ..request.clone()
            };
            return Ok(self.respond(&get)?.without_body());
        }

        let handler = self.resolve(request);
        debug!(method = %request.method, path = %request.path, route = handler.name(), "Routed request");

        let builder = ResponseBuilder::new(request, &self.config);
        let response = match handler {
            Handler::Canned(content) => self.respond_canned(&builder, request, content)?,
            Handler::Echo(format) => {
                let content_type = match format {
                    EchoFormat::Text => "text/plain",
                    EchoFormat::Json => "text/json",
                };
                let directives = directive::parse(&request.query);
                builder.synthesize(builder.base_response(content_type), &directives, format)?
            }
        };

        Ok(response)
    }

    fn respond_canned(
        &self,
        builder: &ResponseBuilder<'_>,
        request: &ParsedRequest,
        content: &CannedContent,
    ) -> Result<CommittedResponse, SynthesisError> {
        match request.method {
            Method::Put | Method::Delete | Method::Patch => {
                let mut response = builder.base_response("text/plain");
                response.status = 405;
                response.headers.set("Allow", canned::ALLOWED_METHODS);
                response.body = Bytes::from_static(b"405: Method Not Allowed\n");
                builder.finish(response, None)
            }
            Method::Options => {
                let mut response = builder.base_response("text/plain");
                for (name, value) in canned::CORS_HEADERS {
                    response.headers.set(name, value);
                }
                builder.finish(response, None)
            }
            _ => {
                let mut response = builder.base_response(content.content_type);
                response.body = if content.append_trace {
                    let mut body = content.body.to_vec();
                    body.extend_from_slice(trace::render(request, &response).as_bytes());
                    Bytes::from(body)
                } else {
                    Bytes::from_static(content.body)
                };
                response
                    .headers
                    .set("Etag", format!("\"{:x}\"", Sha1::digest(&response.body)));
                builder.finish(response, None)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(SynthesisConfig::default())
    }
}
