// src/server/handler.rs
//
// HTTP surface through which the host delivers lifecycle events.
//
use crate::error::Error;
use crate::model::ServiceInstance;
use crate::reconciler::Reconciler;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

#[derive(Clone)]
pub struct RequestHandler {
    reconciler: Arc<Reconciler>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl RequestHandler {
    pub fn new(reconciler: Arc<Reconciler>) -> Self {
        Self { reconciler }
    }

    async fn route(reconciler: Arc<Reconciler>, req: Request<Body>) -> Response<Body> {
        let method = req.method().clone();
        let path = req.uri().path().to_string();
        match (method, path.as_str()) {
            (Method::GET, "/healthz") => match reconciler.probe().await {
                Ok(()) => empty(StatusCode::OK),
                Err(err) => {
                    tracing::warn!(%err, "probe failed");
                    error_body(StatusCode::SERVICE_UNAVAILABLE, &err)
                }
            },
            (Method::GET, "/v1/instances") => {
                json(StatusCode::OK, &reconciler.list_managed_instances())
            }
            (Method::POST, "/v1/instances/up") => {
                let instance = match read_instance(req).await {
                    Ok(instance) => instance,
                    Err(response) => return response,
                };
                respond(reconciler.on_instance_up(&instance).await.map(|_| ()))
            }
            (Method::POST, "/v1/instances/down") => {
                let instance = match read_instance(req).await {
                    Ok(instance) => instance,
                    Err(response) => return response,
                };
                respond(reconciler.on_instance_down(&instance).await.map(|_| ()))
            }
            (Method::POST, "/v1/instances/refresh") => {
                let instance = match read_instance(req).await {
                    Ok(instance) => instance,
                    Err(response) => return response,
                };
                respond(reconciler.on_instance_refresh(&instance).await)
            }
            _ => empty(StatusCode::NOT_FOUND),
        }
    }
}

impl Service<Request<Body>> for RequestHandler {
    type Response = Response<Body>;
    type Error = Infallible;
    type Future = futures::future::BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let reconciler = self.reconciler.clone();
        Box::pin(async move { Ok(Self::route(reconciler, req).await) })
    }
}

async fn read_instance(req: Request<Body>) -> Result<ServiceInstance, Response<Body>> {
    let bytes = hyper::body::to_bytes(req.into_body()).await.map_err(|err| {
        error_message(StatusCode::BAD_REQUEST, format!("failed to read body: {err}"))
    })?;
    serde_json::from_slice(&bytes).map_err(|err| {
        error_message(StatusCode::BAD_REQUEST, format!("invalid instance record: {err}"))
    })
}

fn respond(result: crate::error::Result<()>) -> Response<Body> {
    match result {
        Ok(()) => empty(StatusCode::NO_CONTENT),
        Err(err) => {
            let status = status_for(&err);
            tracing::error!(%err, status = status.as_u16(), "reconciliation failed");
            error_body(status, &err)
        }
    }
}

fn status_for(err: &Error) -> StatusCode {
    if err.is_client_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_GATEWAY
    }
}

fn empty(status: StatusCode) -> Response<Body> {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response
}

fn json<T: Serialize>(status: StatusCode, value: &T) -> Response<Body> {
    match serde_json::to_vec(value) {
        Ok(body) => {
            let mut response = Response::new(Body::from(body));
            *response.status_mut() = status;
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            response
        }
        Err(err) => error_message(StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
    }
}

fn error_body(status: StatusCode, err: &Error) -> Response<Body> {
    error_message(status, err.to_string())
}

fn error_message(status: StatusCode, error: String) -> Response<Body> {
    let mut response = Response::new(Body::from(
        serde_json::to_vec(&ErrorBody { error }).unwrap_or_default(),
    ));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
