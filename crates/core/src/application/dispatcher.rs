// Dispatcher - the single entry point of the pipeline
//
// extract -> gate -> resolve -> bind -> invoke -> convert, with one error
// boundary at the top. `dispatch` always produces a response.

use super::access::check_access;
use super::arguments::{effective_verb, extract_arguments, RequestParts};
use super::binder::{capitalize, ParameterBinder};
use super::convert::{ConverterChain, ConverterRegistry, OutputFormat};
use super::invoker::{invoke, resolve_method};
use super::translate::translate;
use crate::domain::{Caller, TypeHierarchy, Verb};
use crate::error::{DispatchError, Result};
use crate::port::{Authorizer, CallContext, EntityRepository, ServiceLocator};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};

/// Registry key for a URL segment: `echo` -> `EchoService`
pub fn service_key(segment: &str) -> String {
    format!("{}Service", capitalize(segment))
}

/// One inbound call, already routed
#[derive(Debug, Clone)]
pub struct DispatchRequest {
    /// Service segment as it appeared in the URL
    pub service: String,
    pub method: String,
    pub verb: Verb,
    pub query: Vec<(String, String)>,
    pub body: Bytes,
    pub content_type: Option<String>,
    /// Whatever followed `<service>/<method>/` in the path
    pub path_suffix: String,
    pub caller: Caller,
    pub format: OutputFormat,
}

impl DispatchRequest {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
            verb: Verb::Get,
            query: Vec::new(),
            body: Bytes::new(),
            content_type: None,
            path_suffix: String::new(),
            caller: Caller::Anonymous,
            format: OutputFormat::Json,
        }
    }

    pub fn with_verb(mut self, verb: Verb) -> Self {
        self.verb = verb;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = body.into();
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_path_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.path_suffix = suffix.into();
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = caller;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl DispatchResponse {
    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

pub struct Dispatcher {
    locator: Arc<dyn ServiceLocator>,
    authorizer: Arc<dyn Authorizer>,
    repository: Arc<dyn EntityRepository>,
    types: Arc<TypeHierarchy>,
    converters: Arc<ConverterRegistry>,
}

impl Dispatcher {
    pub fn new(
        locator: Arc<dyn ServiceLocator>,
        authorizer: Arc<dyn Authorizer>,
        repository: Arc<dyn EntityRepository>,
        types: Arc<TypeHierarchy>,
        converters: Arc<ConverterRegistry>,
    ) -> Self {
        Self {
            locator,
            authorizer,
            repository,
            types,
            converters,
        }
    }

    /// Run one call to completion. Failures become `{message, status}` bodies.
    pub async fn dispatch(&self, request: DispatchRequest) -> DispatchResponse {
        let span = info_span!(
            "dispatch",
            service = %request.service,
            method = %request.method,
            caller = %request.caller,
        );

        async {
            match self.run(&request).await {
                Ok(body) => {
                    info!(status = 200, "Dispatch succeeded");
                    DispatchResponse {
                        status: 200,
                        body,
                        content_type: request.format.content_type(),
                    }
                }
                Err(err) => {
                    let failure = translate(&err);
                    DispatchResponse {
                        status: failure.status,
                        body: failure.to_json(),
                        content_type: OutputFormat::Json.content_type(),
                    }
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &DispatchRequest) -> Result<String> {
        let key = service_key(&request.service);
        let service = self
            .locator
            .get(&key)
            .ok_or_else(|| DispatchError::internal(format!("Service {} is not available", key)))?;

        let verb = effective_verb(request.verb, &request.body);
        let args = extract_arguments(RequestParts {
            verb,
            query: &request.query,
            body: &request.body,
            content_type: request.content_type.as_deref(),
            path_suffix: &request.path_suffix,
        });

        check_access(
            service.as_ref(),
            &request.method,
            &request.caller,
            verb,
            self.authorizer.as_ref(),
        )
        .await?;

        let descriptor = resolve_method(service.as_ref(), &request.method)?;

        let bound = ParameterBinder::new(self.repository.as_ref(), &self.types)
            .bind(descriptor, &args, &request.body, verb, &request.caller)
            .await?;

        let ctx = CallContext {
            caller: request.caller.clone(),
            verb,
        };
        let value = invoke(service.as_ref(), descriptor, bound, &ctx).await?;

        ConverterChain::new(self.converters.table(request.format), &self.types).render(&value)
    }
}
