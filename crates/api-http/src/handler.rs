//! Request handler: health, routing, authentication, dispatch.

use crate::route::RouteConfig;
use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use std::sync::Arc;
use switchboard_core::application::ErrorBody;
use switchboard_core::domain::{Caller, Verb};
use switchboard_core::port::{Authenticator, Credentials, IdProvider};
use switchboard_core::{DispatchRequest, Dispatcher};
use tracing::{error, field, info, info_span, warn, Instrument, Span};

pub type HttpResponse = Response<Full<Bytes>>;

pub const AUTH_TOKEN_HEADER: &str = "x-auth-token";
pub const TOKEN_QUERY_PARAM: &str = "token";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const JSON: &str = "application/json";

/// Everything one HTTP request needs, shared by all connections
pub struct GatewayHandler {
    dispatcher: Arc<Dispatcher>,
    authenticator: Arc<dyn Authenticator>,
    ids: Arc<dyn IdProvider>,
    routes: RouteConfig,
}

impl GatewayHandler {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        authenticator: Arc<dyn Authenticator>,
        ids: Arc<dyn IdProvider>,
        routes: RouteConfig,
    ) -> Self {
        Self {
            dispatcher,
            authenticator,
            ids,
            routes,
        }
    }

    pub async fn handle(&self, req: Request<Bytes>) -> HttpResponse {
        let request_id = self.ids.next_request_id();
        let span = info_span!(
            "request",
            request_id = %request_id,
            http_method = %req.method(),
            path = %req.uri().path(),
            format = field::Empty,
        );

        let mut response = self.route(req).instrument(span).await;
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }

    async fn route(&self, req: Request<Bytes>) -> HttpResponse {
        let path = req.uri().path().to_string();

        if req.method() == Method::GET && path == "/health" {
            return respond(200, JSON, r#"{"status":"ok"}"#.to_string());
        }

        let Some(route) = self.routes.parse(&path) else {
            return error_response(404, "Not found");
        };
        Span::current().record("format", route.format.as_str());

        let verb: Verb = match req.method().as_str().parse() {
            Ok(verb) => verb,
            Err(msg) => return error_response(405, msg),
        };

        let (query, query_token) = split_query(req.uri().query());
        let token = req
            .headers()
            .get(AUTH_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or(query_token);

        let caller = match self.authenticate(token).await {
            Ok(caller) => caller,
            Err(response) => return response,
        };

        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let request = DispatchRequest {
            service: route.service,
            method: route.method,
            verb,
            query,
            body: req.into_body(),
            content_type,
            path_suffix: route.suffix,
            caller,
            format: route.format,
        };

        let response = self.dispatcher.dispatch(request).await;
        info!(status = response.status, "Request completed");
        respond(response.status, response.content_type, response.body)
    }

    async fn authenticate(&self, token: Option<String>) -> Result<Caller, HttpResponse> {
        let credentials = Credentials { token };
        match self.authenticator.authenticate(&credentials).await {
            Ok(Some(caller)) => Ok(caller),
            Ok(None) => {
                warn!("Authentication rejected");
                Err(error_response(403, "User not found"))
            }
            Err(e) => {
                error!(error = %e, "Authentication failed");
                Err(error_response(e.status_code(), e.to_string()))
            }
        }
    }
}

/// Decoded query pairs with the auth token pulled out
fn split_query(query: Option<&str>) -> (Vec<(String, String)>, Option<String>) {
    let pairs: Vec<(String, String)> = query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();

    let mut token = None;
    let args = pairs
        .into_iter()
        .filter_map(|(k, v)| {
            if k == TOKEN_QUERY_PARAM {
                token = Some(v);
                None
            } else {
                Some((k, v))
            }
        })
        .collect();
    (args, token)
}

pub(crate) fn error_response(status: u16, message: impl Into<String>) -> HttpResponse {
    respond(status, JSON, ErrorBody::new(status, message).to_json())
}

fn respond(status: u16, content_type: &'static str, body: String) -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}
