//! Per-request pipeline failures.
//!
//! Every way the interception stage can refuse a request ends up here, as a
//! value rather than an unwinding exception. The outer boundary inspects
//! [`Failure::class`] exactly once to pick between the two observable
//! outcomes: a not-found response or an internal-error response.

use thiserror::Error;

/// Error type returned by collaborators (token manager, user lookup,
/// persistence session). Converts into [`Failure::Collaborator`] with `?`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The two response classes a failure can map to.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FailureClass {
    /// 404-class: the route or the addressed resource does not exist.
    NotFound,
    /// 500-class: everything else.
    Internal,
}

/// Why a handler identifier could not be resolved against the catalog.
#[derive(Debug, Error, Clone, Eq, PartialEq)]
pub enum ReflectionError {
    #[error("handler id `{0}` is not in `Type::method` form")]
    Malformed(String),

    #[error("handler type `{0}` is not declared")]
    UnknownType(String),

    #[error("handler type `{type_name}` declares no method `{method}`")]
    UnknownMethod { type_name: String, method: String },
}

/// A failure raised anywhere in route resolution, descriptor discovery or
/// the descriptor lifecycle.
#[derive(Debug, Error)]
pub enum Failure {
    /// No configured route matches the request path.
    #[error("no route matches `{path}`")]
    RouteNotFound { path: String },

    /// The path is routed, but not for this method.
    #[error("route `{path}` does not accept {method}")]
    MethodNotAllowed { method: http::Method, path: String },

    /// The matched route points at a handler the catalog does not know.
    /// Always a configuration defect.
    #[error("reflection failed: {0}")]
    Reflection(#[from] ReflectionError),

    /// The descriptor's authorization precondition failed.
    #[error("access denied: {0}")]
    Guard(String),

    /// The descriptor rejected the request input.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The descriptor could not resolve its route parameters.
    #[error("unresolvable request: {0}")]
    Match(String),

    /// The addressed resource does not exist. Any lifecycle step may raise
    /// this; it is the only descriptor failure that maps to not-found.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// A collaborator failed underneath a lifecycle step.
    #[error("collaborator failed: {0}")]
    Collaborator(#[from] BoxError),
}

impl Failure {
    pub fn guard(msg: impl Into<String>) -> Self {
        Self::Guard(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unmatched(msg: impl Into<String>) -> Self {
        Self::Match(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Which response class this failure maps to.
    pub fn class(&self) -> FailureClass {
        match self {
            Self::RouteNotFound { .. } | Self::MethodNotAllowed { .. } | Self::NotFound(_) => {
                FailureClass::NotFound
            }
            Self::Reflection(_)
            | Self::Guard(_)
            | Self::Validation(_)
            | Self::Match(_)
            | Self::Collaborator(_) => FailureClass::Internal,
        }
    }

    /// Stable machine-readable tag, used in logs and response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RouteNotFound { .. } => "route_not_found",
            Self::MethodNotAllowed { .. } => "method_not_allowed",
            Self::Reflection(_) => "reflection",
            Self::Guard(_) => "guard",
            Self::Validation(_) => "validation",
            Self::Match(_) => "match",
            Self::NotFound(_) => "not_found",
            Self::Collaborator(_) => "collaborator",
        }
    }

    /// Message safe to hand to a client.
    ///
    /// Descriptor-authored messages pass through; anything that could carry
    /// infrastructure detail is replaced.
    pub fn public_message(&self) -> String {
        match self {
            Self::Guard(msg) | Self::Validation(msg) | Self::Match(msg) | Self::NotFound(msg) => {
                msg.clone()
            }
            Self::RouteNotFound { .. } | Self::MethodNotAllowed { .. } => self.to_string(),
            Self::Reflection(_) | Self::Collaborator(_) => "internal server error".to_owned(),
        }
    }
}
