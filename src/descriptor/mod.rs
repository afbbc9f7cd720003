//! Request descriptors.
//!
//! A request descriptor is a type that vets one endpoint's requests before
//! its handler runs. Every descriptor is built through the same constructor
//! shape, [`Descriptor::construct`], from the same [`Collaborators`], and
//! then checked in a fixed order: [`guard`](Descriptor::guard),
//! [`validate`](Descriptor::validate), [`r#match`](Descriptor::r#match).
//!
//! ```rust
//! use async_trait::async_trait;
//! use warden::{Collaborators, Descriptor, Failure};
//!
//! #[derive(Debug)]
//! struct WidgetShowRequest {
//!     id: Option<String>,
//!     deps: Collaborators,
//! }
//!
//! #[async_trait]
//! impl Descriptor for WidgetShowRequest {
//!     fn construct(deps: Collaborators) -> Self {
//!         let id = deps.request.param("id").map(str::to_owned);
//!         Self { id, deps }
//!     }
//!
//!     async fn guard(&mut self) -> Result<(), Failure> {
//!         Ok(())
//!     }
//!
//!     async fn validate(&mut self) -> Result<(), Failure> {
//!         match &self.id {
//!             Some(id) if id.bytes().all(|b| b.is_ascii_digit()) => Ok(()),
//!             _ => Err(Failure::validation("id must be numeric")),
//!         }
//!     }
//!
//!     async fn r#match(&mut self) -> Result<(), Failure> {
//!         let id = self.id.as_deref().unwrap_or_default();
//!         match self.deps.session.find("widget", id).await? {
//!             Some(_) => Ok(()),
//!             None => Err(Failure::not_found(format!("widget {id}"))),
//!         }
//!     }
//! }
//! ```

mod catalog;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::failure::Failure;
use crate::request::Request;
use crate::router::Router;
use crate::services::{Services, Session, TokenManager, UserLookup};

pub use catalog::{Catalog, DescriptorRegistry, Param, ParamKind};

/// The request-descriptor contract.
///
/// Lifecycle steps run strictly in order and the first `Err` stops the
/// rest. Return [`Failure::NotFound`] from any step to answer 404; every
/// other failure answers 500.
#[async_trait]
pub trait Descriptor: fmt::Debug + Send {
    /// The one constructor shape every descriptor shares.
    fn construct(collaborators: Collaborators) -> Self
    where
        Self: Sized;

    /// Authorization and preconditions.
    async fn guard(&mut self) -> Result<(), Failure>;

    /// Input validation.
    async fn validate(&mut self) -> Result<(), Failure>;

    /// Resource existence and route-parameter resolution.
    async fn r#match(&mut self) -> Result<(), Failure>;
}

/// A descriptor type known to the registry: its name and how to build it.
#[derive(Clone, Copy)]
pub struct DescriptorType {
    name: &'static str,
    construct: fn(Collaborators) -> Box<dyn Descriptor>,
}

impl DescriptorType {
    pub fn of<D: Descriptor + 'static>() -> Self {
        Self {
            name: std::any::type_name::<D>(),
            construct: construct_boxed::<D>,
        }
    }

    pub fn name(&self) -> &'static str { self.name }

    pub(crate) fn construct(&self, collaborators: Collaborators) -> Box<dyn Descriptor> {
        (self.construct)(collaborators)
    }
}

fn construct_boxed<D: Descriptor + 'static>(collaborators: Collaborators) -> Box<dyn Descriptor> {
    Box::new(D::construct(collaborators))
}

impl fmt::Debug for DescriptorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DescriptorType").field(&self.name).finish()
    }
}

impl PartialEq for DescriptorType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

/// Everything a descriptor is constructed with.
///
/// `request` is the current request; the rest are shared for the lifetime
/// of the application.
#[derive(Clone)]
pub struct Collaborators {
    pub request: Request,
    pub tokens: Arc<dyn TokenManager>,
    pub users: Arc<dyn UserLookup>,
    pub router: Arc<Router>,
    pub session: Arc<dyn Session>,
}

impl Collaborators {
    pub(crate) fn bind(request: Request, services: &Services, router: &Arc<Router>) -> Self {
        Self {
            request,
            tokens: Arc::clone(&services.tokens),
            users: Arc::clone(&services.users),
            router: Arc::clone(router),
            session: Arc::clone(&services.session),
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators")
            .field("method", self.request.method())
            .field("path", &self.request.path())
            .finish_non_exhaustive()
    }
}
