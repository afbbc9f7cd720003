//! Radix-tree request router.
//!
//! One tree per HTTP method, O(path-length) lookup. Every registration is
//! labelled with a [`HandlerId`] so the interception stage can look up what
//! the handler declares before it runs.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use http::Method;
use matchit::Router as MatchitRouter;

use crate::failure::Failure;
use crate::handler::{BoxedHandler, Handler};

/// Identifies a handler as `Type::method`.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct HandlerId(String);

impl HandlerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str { &self.0 }

    /// Splits into `(type, method)` at the last `::`, so namespaced types
    /// such as `app::widgets::WidgetController::show` keep their path.
    /// `None` when either half is missing.
    pub fn split(&self) -> Option<(&str, &str)> {
        let (type_name, method) = self.0.rsplit_once("::")?;
        (!type_name.is_empty() && !method.is_empty()).then_some((type_name, method))
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for HandlerId {
    fn from(id: &str) -> Self { Self::new(id) }
}

/// A resolved route. Lives for one request.
#[derive(Clone)]
pub struct Route {
    pub template: String,
    pub params: HashMap<String, String>,
    pub handler: HandlerId,
    pub(crate) endpoint: BoxedHandler,
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("template", &self.template)
            .field("params", &self.params)
            .field("handler", &self.handler)
            .finish_non_exhaustive()
    }
}

struct Endpoint {
    template: String,
    id: HandlerId,
    handler: BoxedHandler,
}

/// The application router.
///
/// Build it once at startup and hand it to
/// [`Interceptor::new`](crate::Interceptor::new).
#[derive(Default)]
pub struct Router {
    routes: HashMap<Method, MatchitRouter<Endpoint>>,
    ids: Vec<HandlerId>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under a method + path pair, labelled `id`.
    ///
    /// Path parameters use `{name}` syntax:
    ///
    /// ```rust,no_run
    /// # use warden::{Method, Request, Response, Router};
    /// # async fn show(_: Request) -> Response { Response::text("") }
    /// # async fn create(_: Request) -> Response { Response::text("") }
    /// Router::new()
    ///     .on(Method::GET,  "/widgets/{id}", "WidgetController::show",   show)
    ///     .on(Method::POST, "/widgets",      "WidgetController::create", create);
    /// ```
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route template or conflicts with one
    /// already registered for `method`.
    pub fn on(mut self, method: Method, path: &str, id: &str, handler: impl Handler) -> Self {
        let endpoint = Endpoint {
            template: path.to_owned(),
            id: HandlerId::new(id),
            handler: handler.into_boxed_handler(),
        };
        self.routes
            .entry(method)
            .or_default()
            .insert(path, endpoint)
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        if !self.ids.iter().any(|known| known.as_str() == id) {
            self.ids.push(HandlerId::new(id));
        }
        self
    }

    /// Every distinct handler id registered, in registration order.
    pub fn handlers(&self) -> &[HandlerId] {
        &self.ids
    }

    /// Matches `path` under `method`. `HEAD` falls back to the `GET` route
    /// when no `HEAD` route matches.
    ///
    /// Fails with [`Failure::RouteNotFound`] when no tree knows the path and
    /// with [`Failure::MethodNotAllowed`] when only other methods do.
    pub fn resolve(&self, method: &Method, path: &str) -> Result<Route, Failure> {
        let matched = self.routes.get(method).and_then(|tree| tree.at(path).ok()).or_else(|| {
            (*method == Method::HEAD)
                .then(|| self.routes.get(&Method::GET).and_then(|tree| tree.at(path).ok()))
                .flatten()
        });
        if let Some(matched) = matched {
            let endpoint = matched.value;
            let params = matched.params.iter()
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .collect();
            return Ok(Route {
                template: endpoint.template.clone(),
                params,
                handler: endpoint.id.clone(),
                endpoint: Arc::clone(&endpoint.handler),
            });
        }

        let routed_elsewhere = self.routes.iter()
            .any(|(m, tree)| m != method && tree.at(path).is_ok());
        if routed_elsewhere {
            Err(Failure::MethodNotAllowed { method: method.clone(), path: path.to_owned() })
        } else {
            Err(Failure::RouteNotFound { path: path.to_owned() })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Request, Response};

    async fn noop(_: Request) -> Response {
        Response::text("")
    }

    fn router() -> Router {
        Router::new()
            .on(Method::GET, "/widgets/{id}", "WidgetController::show", noop)
            .on(Method::DELETE, "/widgets/{id}", "WidgetController::delete", noop)
            .on(Method::GET, "/healthz", "Health::live", noop)
    }

    #[test]
    fn resolves_template_params_and_handler() {
        let route = router().resolve(&Method::GET, "/widgets/42").unwrap();
        assert_eq!(route.template, "/widgets/{id}");
        assert_eq!(route.params.get("id").map(String::as_str), Some("42"));
        assert_eq!(route.handler.as_str(), "WidgetController::show");

        let route = router().resolve(&Method::DELETE, "/widgets/7").unwrap();
        assert_eq!(route.handler.as_str(), "WidgetController::delete");
    }

    #[test]
    fn unknown_path_is_route_not_found() {
        let err = router().resolve(&Method::GET, "/widgets").unwrap_err();
        assert!(matches!(err, Failure::RouteNotFound { ref path } if path == "/widgets"));
    }

    #[test]
    fn known_path_wrong_method() {
        let err = router().resolve(&Method::POST, "/widgets/42").unwrap_err();
        assert!(matches!(err, Failure::MethodNotAllowed { .. }));
    }

    #[test]
    fn lists_handlers_once() {
        let router = router().on(Method::HEAD, "/healthz", "Health::live", noop);
        let ids: Vec<_> = router.handlers().iter().map(HandlerId::as_str).collect();
        assert_eq!(ids, ["WidgetController::show", "WidgetController::delete", "Health::live"]);
    }

    #[test]
    fn handler_id_split() {
        assert_eq!(HandlerId::from("WidgetController::show").split(), Some(("WidgetController", "show")));
        assert_eq!(HandlerId::from("WidgetController").split(), None);
        assert_eq!(HandlerId::from("::show").split(), None);
        assert_eq!(HandlerId::from("WidgetController::").split(), None);
    }

    #[test]
    fn handler_id_split_keeps_type_path() {
        assert_eq!(
            HandlerId::from("app::widgets::WidgetController::index").split(),
            Some(("app::widgets::WidgetController", "index"))
        );
    }

    #[test]
    fn head_falls_back_to_get() {
        let route = router().resolve(&Method::HEAD, "/widgets/42").unwrap();
        assert_eq!(route.handler.as_str(), "WidgetController::show");
        assert_eq!(route.params.get("id").map(String::as_str), Some("42"));

        let err = router().resolve(&Method::HEAD, "/gadgets").unwrap_err();
        assert!(matches!(err, Failure::RouteNotFound { .. }));
    }

    #[test]
    fn explicit_head_route_wins() {
        let router = router().on(Method::HEAD, "/widgets/{id}", "WidgetController::peek", noop);
        let route = router.resolve(&Method::HEAD, "/widgets/42").unwrap();
        assert_eq!(route.handler.as_str(), "WidgetController::peek");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = router().on(Method::GET, "/widgets/{id}", "Other::show", noop);
    }
}
