//! Widget service vetted by a request descriptor.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example widgets
//!
//! Try:
//!   curl -i http://localhost:3000/widgets                                     # 200, no descriptor
//!   curl -i -H 'authorization: Bearer t-alice' http://localhost:3000/widgets/7  # 200
//!   curl -i -H 'authorization: Bearer t-alice' http://localhost:3000/widgets/42 # 404, no such widget
//!   curl -i http://localhost:3000/widgets/7                                   # 500, guard refused
//!   curl -i http://localhost:3000/gadgets                                     # 404, no route

use async_trait::async_trait;
use serde_json::json;
use warden::memory::{MemorySession, MemoryUsers, StaticTokens};
use warden::{
    Catalog, Collaborators, Config, Descriptor, Failure, Interceptor, Method, Param, Request,
    Response, Router, Server, Services, User,
};

/// Only known users may read a widget, and only one that exists.
#[derive(Debug)]
struct WidgetShowRequest {
    deps: Collaborators,
    id: String,
}

#[async_trait]
impl Descriptor for WidgetShowRequest {
    fn construct(deps: Collaborators) -> Self {
        let id = deps.request.param("id").unwrap_or_default().to_owned();
        Self { deps, id }
    }

    async fn guard(&mut self) -> Result<(), Failure> {
        let token = self.deps.request.bearer_token().ok_or_else(|| Failure::guard("missing bearer token"))?;
        let claims = self.deps.tokens.decode(token).await.map_err(|_| Failure::guard("invalid token"))?;
        let subject = claims.get("sub").and_then(|v| v.as_str()).unwrap_or_default();
        if self.deps.users.find_by_identifier(subject).await?.is_none() {
            return Err(Failure::guard("unknown user"));
        }
        Ok(())
    }

    async fn validate(&mut self) -> Result<(), Failure> {
        if self.id.parse::<u64>().is_err() {
            return Err(Failure::validation("widget id must be a positive integer"));
        }
        Ok(())
    }

    async fn r#match(&mut self) -> Result<(), Failure> {
        match self.deps.session.find("widget", &self.id).await? {
            Some(_) => Ok(()),
            None => Err(Failure::not_found(format!("widget {}", self.id))),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), warden::Error> {
    let config = Config::from_env()?;
    warden::init_tracing(config.log_format);

    let router = Router::new()
        .on(Method::GET, "/widgets",      "WidgetController::index", index)
        .on(Method::GET, "/widgets/{id}", "WidgetController::show",  show);

    let catalog = Catalog::new()
        .declare("WidgetController", "index", [Param::plain::<Request>()])
        .declare(
            "WidgetController",
            "show",
            [Param::plain::<Request>(), Param::descriptor::<WidgetShowRequest>()],
        );

    let services = Services::new(
        StaticTokens::default().with("t-alice", "alice"),
        MemoryUsers::default().with(User { id: "1".into(), identifier: "alice".into(), roles: vec![] }),
        MemorySession::default().with("widget", "7", json!({"id": 7, "name": "sprocket"})),
    );

    let interceptor = Interceptor::from_config(router, &catalog, services, &config);

    Server::from_config(&config).serve(interceptor).await
}

// GET /widgets
async fn index(_req: Request) -> Response {
    Response::json(br#"[{"id":7,"name":"sprocket"}]"#.to_vec())
}

// GET /widgets/{id}, reached only once WidgetShowRequest has passed.
async fn show(req: Request) -> Response {
    let id = req.param("id").unwrap_or_default();
    Response::json(format!(r#"{{"id":{id},"name":"sprocket"}}"#).into_bytes())
}
