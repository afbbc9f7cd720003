//! # warden
//!
//! A minimal HTTP framework that vets requests before handlers see them.
//!
//! A handler may declare a *request descriptor*: a type implementing
//! [`Descriptor`] that knows how to authorize, validate and resolve one
//! endpoint's requests. For every request warden
//!
//! 1. resolves the route and its handler id (`Type::method`),
//! 2. looks up the first descriptor-typed parameter the handler declared
//!    in the [`Catalog`],
//! 3. constructs that descriptor and runs `guard`, `validate`, `match`,
//! 4. and turns any failure along the way into a 404 or a 500.
//!
//! Handlers that declare no descriptor run unobstructed.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use warden::{
//!     Catalog, Config, Interceptor, Method, Param, Request, Response, Router, Server, Services,
//!     memory::{MemorySession, MemoryUsers, StaticTokens},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), warden::Error> {
//!     let config = Config::from_env()?;
//!     warden::init_tracing(config.log_format);
//!
//!     let router = Router::new().on(Method::GET, "/widgets", "WidgetController::index", index);
//!     let catalog = Catalog::new().declare("WidgetController", "index", [Param::plain::<Request>()]);
//!     let services = Services::new(StaticTokens::default(), MemoryUsers::default(), MemorySession::default());
//!
//!     Server::from_config(&config)
//!         .serve(Interceptor::from_config(router, &catalog, services, &config))
//!         .await
//! }
//!
//! async fn index(_req: Request) -> Response {
//!     Response::json(br#"[]"#.to_vec())
//! }
//! ```

mod config;
mod descriptor;
mod error;
mod failure;
mod handler;
mod observability;
mod request;
mod response;
mod router;
mod server;
mod services;

pub mod middleware;

pub use config::{Config, LogFormat};
pub use descriptor::{Catalog, Collaborators, Descriptor, DescriptorRegistry, DescriptorType, Param, ParamKind};
pub use error::Error;
pub use failure::{BoxError, Failure, FailureClass, ReflectionError};
pub use handler::Handler;
pub use http::{Method, StatusCode};
pub use middleware::{Interceptor, Verdict};
pub use observability::init_tracing;
pub use request::Request;
pub use response::{ErrorResponder, IntoResponse, JsonResponder, Response, ResponseBuilder};
pub use router::{HandlerId, Route, Router};
pub use server::Server;
pub use services::{Claims, Services, Session, TokenManager, User, UserLookup, memory};
