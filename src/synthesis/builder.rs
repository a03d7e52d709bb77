use super::config::SynthesisConfig;
use super::{compression, content, matcher, trace};
use crate::directive::{ContentArgs, Directive, Encoding};
use crate::http::{CommittedResponse, Method, MockResponse, ParsedRequest};
use bytes::Bytes;
use std::io;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("Method {0} is not served by the mock origin")]
    UnsupportedMethod(Method),
    #[error("Requested content length {requested} exceeds the limit of {max} bytes")]
    ContentTooLarge { requested: usize, max: usize },
    #[error("Compression failed: {0}")]
    Compression(#[from] io::Error),
    #[error("Failed to render JSON echo: {0}")]
    Render(#[from] serde_json::Error),
}

impl SynthesisError {
    /// Status the transport answers with instead of the synthesized response
    pub fn status(&self) -> u16 {
        match self {
            SynthesisError::UnsupportedMethod(_) => 501,
            _ => 500,
        }
    }
}

/// How the catch-all routes render the request/response echo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EchoFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyMode {
    Debug,
    Quiet,
}

/// Effects that are only resolved once every directive has been applied
#[derive(Debug, Default)]
struct Plan {
    content: Option<ContentArgs>,
    encoding: Option<Encoding>,
    body_mode: Option<BodyMode>,
    status_set: bool,
}

/// Directive interpreter for one request
///
/// Starts from the route's base response, folds the directives over it left
/// to right, picks the body, then finalizes encoding and framing last so no
/// directive can desynchronize `Content-Length` from the body.
pub struct ResponseBuilder<'a> {
    request: &'a ParsedRequest,
    config: &'a SynthesisConfig,
}

impl<'a> ResponseBuilder<'a> {
    pub fn new(request: &'a ParsedRequest, config: &'a SynthesisConfig) -> Self {
        Self { request, config }
    }

    /// `200` response carrying the headers every route starts from
    pub fn base_response(&self, content_type: &str) -> MockResponse {
        let mut response = MockResponse::new(200);
        response.headers.set("Server", self.config.server_name.as_str());
        response.headers.set("Content-Type", content_type);
        response.headers.set("Cache-Control", "private, no-store");
        response
    }

    /// Runs the directive pipeline over an echo body
    pub fn synthesize(
        &self,
        mut response: MockResponse,
        directives: &[Directive],
        format: EchoFormat,
    ) -> Result<CommittedResponse, SynthesisError> {
        let mut plan = Plan::default();
        for directive in directives {
            self.apply(directive, &mut response, &mut plan);
        }

        response.body = match (&plan.content, plan.body_mode) {
            (Some(spec), _) => {
                if spec.length > self.config.max_content_length {
                    return Err(SynthesisError::ContentTooLarge {
                        requested: spec.length,
                        max: self.config.max_content_length,
                    });
                }
                content::generate(spec.length, spec.fill.as_deref())
            }
            (None, Some(BodyMode::Debug)) => {
                trace::render_debug(self.request, directives, &response).into()
            }
            (None, Some(BodyMode::Quiet)) => trace::render(self.request, &response).into(),
            (None, None) if plan.status_set => Bytes::new(),
            (None, None) => match format {
                EchoFormat::Text => trace::render_echo(self.request, &response).into(),
                EchoFormat::Json => trace::render_json(self.request, &response)?.into(),
            },
        };

        self.finish(response, plan.encoding)
    }

    /// Applies compression (forced or negotiated) and commits the response
    pub fn finish(
        &self,
        mut response: MockResponse,
        forced: Option<Encoding>,
    ) -> Result<CommittedResponse, SynthesisError> {
        compression::apply(&mut response, forced, self.request)?;
        Ok(response.commit())
    }

    fn apply(&self, directive: &Directive, response: &mut MockResponse, plan: &mut Plan) {
        match directive {
            Directive::SetHeader { name, value } if value.is_empty() => {
                response.headers.remove(name);
            }
            Directive::SetHeader { name, value } => {
                response.headers.set(name, value.as_str());
            }
            Directive::Delay { duration, raw } => {
                response.delay = Some(*duration);
                response
                    .headers
                    .set("X-Delay", format!("{raw} set by query string"));
            }
            Directive::Status(spec) => {
                response.status = spec.code;
                response.reason = spec.reason.clone();
                response
                    .headers
                    .set("X-Status-Code", format!("{} set by query string", spec.code));
                plan.status_set = true;
            }
            Directive::Content(spec) => plan.content = Some(spec.clone()),
            Directive::Encoding(encoding) => plan.encoding = Some(*encoding),
            Directive::ConditionalGroup { condition, directives } => {
                if !matcher::evaluate(condition, self.request) {
                    debug!(%condition, "Conditional group did not match");
                    return;
                }
                debug!(%condition, count = directives.len(), "Conditional group matched");
                for nested in directives {
                    self.apply(nested, response, plan);
                }
                return;
            }
            Directive::Debug => plan.body_mode = Some(BodyMode::Debug),
            Directive::Quiet => plan.body_mode = Some(BodyMode::Quiet),
        }
        debug!(%directive, "Applied directive");
    }
}
