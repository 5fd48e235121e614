use std::convert::Infallible;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use async_trait::async_trait;

use crate::axum::AuthContext;
use crate::axum::stages::{
    AuthenticationStage, AuthorizationStage, ExemptionPolicy, LoggingStage, TimingStage,
};
use crate::engine::Engine;
use crate::store::RbacStore;
use crate::token::TokenService;
use crate::types::UserId;

use ::axum::extract::Request;
use ::axum::http::Method;
use ::axum::response::Response;
use ::tower::{Layer, Service, ServiceExt};

/// A request travelling through the pipeline.
///
/// The subject slot starts empty and can only be filled by the
/// authentication stage, so later stages read an identity that was verified
/// on this very request.
#[derive(Debug)]
pub struct Call {
    request: Request,
    subject: Option<UserId>,
}

impl Call {
    /// Wraps an incoming request.
    pub fn new(request: Request) -> Self {
        Self {
            request,
            subject: None,
        }
    }

    /// Returns the wrapped request.
    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Returns the request method, used as the action.
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    /// Returns the request path, used as the resource.
    pub fn path(&self) -> &str {
        self.request.uri().path()
    }

    /// Returns the authenticated subject, if any.
    pub fn subject(&self) -> Option<&UserId> {
        self.subject.as_ref()
    }

    pub(crate) fn authenticated(mut self, subject: UserId) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Unwraps the request, exposing the subject as an [`AuthContext`] extension.
    pub fn into_request(self) -> Request {
        let mut request = self.request;
        if let Some(subject) = self.subject {
            request.extensions_mut().insert(AuthContext::new(subject));
        }
        request
    }
}

/// One step of the request pipeline.
///
/// A stage either answers the call itself, ending the request, or hands it
/// to `next`.
#[async_trait]
pub trait Stage: Send + Sync {
    /// Processes `call`.
    async fn handle(&self, call: Call, next: Next<'_>) -> Response;
}

/// Terminal handler reached once every stage has passed the call on.
#[async_trait]
pub trait Endpoint: Send + Sync {
    /// Produces the response for `call`.
    async fn call(&self, call: Call) -> Response;
}

/// Remaining stages of a pipeline run.
pub struct Next<'a> {
    stages: &'a [Arc<dyn Stage>],
    endpoint: &'a dyn Endpoint,
}

impl Next<'_> {
    /// Passes `call` to the next stage, or to the endpoint after the last one.
    pub async fn run(self, call: Call) -> Response {
        match self.stages.split_first() {
            Some((stage, rest)) => {
                let next = Next {
                    stages: rest,
                    endpoint: self.endpoint,
                };
                stage.handle(call, next).await
            }
            None => self.endpoint.call(call).await,
        }
    }
}

/// Ordered list of stages, composed once at startup.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("stages", &self.stages.len())
            .finish()
    }
}

impl Pipeline {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stage; stages run in insertion order.
    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Builds Logging, Timing, Authentication, Authorization over one store
    /// and one exemption policy.
    pub fn standard(
        store: Arc<dyn RbacStore>,
        tokens: Arc<dyn TokenService>,
        exemptions: ExemptionPolicy,
    ) -> Self {
        let exemptions = Arc::new(exemptions);
        Self::new()
            .stage(LoggingStage)
            .stage(TimingStage)
            .stage(AuthenticationStage::new(
                store.clone(),
                tokens,
                exemptions.clone(),
            ))
            .stage(AuthorizationStage::new(Engine::new(store), exemptions))
    }

    /// Returns the number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns whether the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs `call` through every stage and then `endpoint`.
    pub async fn run(&self, call: Call, endpoint: &dyn Endpoint) -> Response {
        Next {
            stages: &self.stages,
            endpoint,
        }
        .run(call)
        .await
    }
}

/// Layer mounting a [`Pipeline`] in front of an axum service.
#[derive(Debug, Clone)]
pub struct PipelineLayer {
    pipeline: Arc<Pipeline>,
}

impl PipelineLayer {
    /// Creates a new pipeline layer.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl<Inner> Layer<Inner> for PipelineLayer {
    type Service = PipelineService<Inner>;

    fn layer(&self, inner: Inner) -> Self::Service {
        PipelineService {
            inner,
            pipeline: self.pipeline.clone(),
        }
    }
}

/// Service running the pipeline before delegating to the wrapped service.
#[derive(Debug, Clone)]
pub struct PipelineService<Inner> {
    inner: Inner,
    pipeline: Arc<Pipeline>,
}

impl<Inner> Service<Request> for PipelineService<Inner>
where
    Inner:
        Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    Inner::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Response, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let pipeline = self.pipeline.clone();
        let endpoint = ServiceEndpoint {
            inner: self.inner.clone(),
        };

        Box::pin(async move { Ok(pipeline.run(Call::new(req), &endpoint).await) })
    }
}

struct ServiceEndpoint<Inner> {
    inner: Inner,
}

#[async_trait]
impl<Inner> Endpoint for ServiceEndpoint<Inner>
where
    Inner:
        Service<Request, Response = Response, Error = Infallible> + Clone + Send + Sync + 'static,
    Inner::Future: Send + 'static,
{
    async fn call(&self, call: Call) -> Response {
        match self.inner.clone().oneshot(call.into_request()).await {
            Ok(response) => response,
            Err(never) => match never {},
        }
    }
}
