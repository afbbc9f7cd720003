//! The interception stage.
//!
//! Runs once per request, before any handler:
//!
//! ```text
//! resolve route ─▶ discover descriptor ─┬─ none ──────────────────────────▶ Proceed
//!                                       └─ construct ─▶ guard ─▶ validate ─▶ match ─▶ Proceed
//!        any failure ─▶ log ─▶ 404 or 500 ─▶ Halt
//! ```
//!
//! A [`Verdict::Halt`] replaces the response for that request; the handler
//! never runs. A descriptor that panics is answered like any other
//! unexpected failure, with a 500.

mod lifecycle;

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::config::Config;
use crate::descriptor::{Catalog, Collaborators, DescriptorRegistry};
use crate::failure::{Failure, FailureClass};
use crate::request::Request;
use crate::response::{ErrorResponder, JsonResponder, Response};
use crate::router::{Route, Router};
use crate::services::Services;

/// Outcome of intercepting one request.
#[derive(Debug)]
pub enum Verdict {
    /// Dispatch `request` (now carrying route params) to `route`'s handler.
    Proceed { route: Route, request: Request },
    /// Send this response instead.
    Halt(Response),
}

/// Vets requests against the descriptors their handlers declare.
///
/// Built once at startup; shared by every connection.
pub struct Interceptor {
    router: Arc<Router>,
    registry: DescriptorRegistry,
    services: Services,
    responder: Box<dyn ErrorResponder>,
}

impl Interceptor {
    pub fn new(router: Router, catalog: &Catalog, services: Services) -> Self {
        let registry = DescriptorRegistry::scan(catalog);
        for id in router.handlers() {
            if !registry.contains(id) {
                warn!(handler = %id, "route handler is missing from the catalog; its requests will fail");
            }
        }
        Self {
            router: Arc::new(router),
            registry,
            services,
            responder: Box::new(JsonResponder::default()),
        }
    }

    /// Like [`Interceptor::new`], with a [`JsonResponder`] that honours
    /// [`Config::expose_internal_errors`].
    pub fn from_config(router: Router, catalog: &Catalog, services: Services, config: &Config) -> Self {
        Self::new(router, catalog, services)
            .responder(JsonResponder::new(config.expose_internal_errors))
    }

    /// Replaces the default [`JsonResponder`].
    pub fn responder(mut self, responder: impl ErrorResponder) -> Self {
        self.responder = Box::new(responder);
        self
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    pub async fn intercept(&self, request: Request) -> Verdict {
        let span = info_span!("intercept", method = %request.method(), path = request.path());
        async move {
            match self.vet(request).await {
                Ok((route, request)) => {
                    debug!(handler = %route.handler, "request passed interception");
                    Verdict::Proceed { route, request }
                }
                Err(failure) => Verdict::Halt(self.translate(&failure)),
            }
        }
        .instrument(span)
        .await
    }

    async fn vet(&self, request: Request) -> Result<(Route, Request), Failure> {
        let route = self.router.resolve(request.method(), request.path())?;
        let request = request.with_params(route.params.clone());

        if let Some(kind) = self.registry.discover(&route.handler)? {
            let collaborators = Collaborators::bind(request.clone(), &self.services, &self.router);
            AssertUnwindSafe(lifecycle::run(kind, collaborators))
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(Failure::Collaborator(panicked(kind.name(), &*payload).into())))?;
        }

        Ok((route, request))
    }

    /// Logs `failure` and builds the substitute response.
    fn translate(&self, failure: &Failure) -> Response {
        let cause = std::error::Error::source(failure).map(|e| e.to_string());
        match failure.class() {
            FailureClass::NotFound => {
                warn!(kind = failure.kind(), error = %failure, cause = cause.as_deref(), "request intercepted");
                self.responder.not_found()
            }
            FailureClass::Internal => {
                error!(kind = failure.kind(), error = %failure, cause = cause.as_deref(), "request intercepted");
                self.responder.internal(failure)
            }
        }
    }
}

fn panicked(descriptor: &str, payload: &(dyn Any + Send)) -> String {
    let message = payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string payload");
    format!("descriptor `{descriptor}` panicked: {message}")
}
