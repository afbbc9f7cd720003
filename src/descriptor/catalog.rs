//! Handler signatures and descriptor discovery.
//!
//! Rust has no runtime reflection over function parameters, so handlers
//! declare their parameter lists in a [`Catalog`] at startup.
//! [`DescriptorRegistry::scan`] walks the catalog once and remembers, per
//! handler, the first parameter whose type implements [`Descriptor`].
//! Requests then pay a hash lookup, not a signature walk.

use std::collections::HashMap;

use tracing::debug;

use super::{Descriptor, DescriptorType};
use crate::failure::{Failure, ReflectionError};
use crate::router::HandlerId;

/// What a declared parameter type is, as far as dispatch cares.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParamKind {
    /// Any type that is not a request descriptor, including the framework
    /// [`Request`](crate::Request) itself.
    Plain,
    Descriptor(DescriptorType),
}

/// One declared handler parameter.
#[derive(Clone, Copy, Debug)]
pub struct Param {
    type_name: &'static str,
    kind: ParamKind,
}

impl Param {
    pub fn plain<T: ?Sized>() -> Self {
        Self { type_name: std::any::type_name::<T>(), kind: ParamKind::Plain }
    }

    /// A parameter of descriptor type `D`. The trait bound is the subtype
    /// check: only real implementors can be declared this way.
    pub fn descriptor<D: Descriptor + 'static>() -> Self {
        let descriptor = DescriptorType::of::<D>();
        Self { type_name: descriptor.name(), kind: ParamKind::Descriptor(descriptor) }
    }

    pub fn type_name(&self) -> &'static str { self.type_name }
    pub fn kind(&self) -> ParamKind { self.kind }
}

/// Declared parameter lists, keyed by handler type then method.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    types: HashMap<String, HashMap<String, Vec<Param>>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `type_name::method` with its parameters in declaration
    /// order. Redeclaring replaces the earlier list.
    pub fn declare(
        mut self,
        type_name: &str,
        method: &str,
        params: impl IntoIterator<Item = Param>,
    ) -> Self {
        self.types
            .entry(type_name.to_owned())
            .or_default()
            .insert(method.to_owned(), params.into_iter().collect());
        self
    }

    /// The parameter list of `id`.
    pub fn signature(&self, id: &HandlerId) -> Result<&[Param], ReflectionError> {
        let (type_name, method) =
            id.split().ok_or_else(|| ReflectionError::Malformed(id.to_string()))?;
        let methods = self
            .types
            .get(type_name)
            .ok_or_else(|| ReflectionError::UnknownType(type_name.to_owned()))?;
        methods
            .get(method)
            .map(Vec::as_slice)
            .ok_or_else(|| ReflectionError::UnknownMethod {
                type_name: type_name.to_owned(),
                method: method.to_owned(),
            })
    }

    fn iter(&self) -> impl Iterator<Item = (HandlerId, &[Param])> {
        self.types.iter().flat_map(|(type_name, methods)| {
            methods
                .iter()
                .map(move |(method, params)| (HandlerId::new(format!("{type_name}::{method}")), params.as_slice()))
        })
    }
}

/// Handler id to descriptor type, computed once from a [`Catalog`].
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    entries: HashMap<HandlerId, Option<DescriptorType>>,
}

impl DescriptorRegistry {
    pub fn scan(catalog: &Catalog) -> Self {
        let entries: HashMap<_, _> = catalog
            .iter()
            .map(|(id, params)| {
                let found = first_descriptor(params);
                debug!(handler = %id, descriptor = found.map(|d| d.name()), "scanned handler");
                (id, found)
            })
            .collect();
        Self { entries }
    }

    /// The descriptor type `id` declares, if any.
    ///
    /// `Ok(None)` is the common case: the handler wants no vetting. Ids the
    /// catalog never declared fail with [`Failure::Reflection`].
    pub fn discover(&self, id: &HandlerId) -> Result<Option<&DescriptorType>, Failure> {
        match self.entries.get(id) {
            Some(found) => Ok(found.as_ref()),
            None => Err(unresolvable(id, self).into()),
        }
    }

    pub fn contains(&self, id: &HandlerId) -> bool {
        self.entries.contains_key(id)
    }
}

fn first_descriptor(params: &[Param]) -> Option<DescriptorType> {
    params.iter().find_map(|param| match param.kind {
        ParamKind::Descriptor(descriptor) => Some(descriptor),
        ParamKind::Plain => None,
    })
}

// Reconstructs the precise reason an id is missing.
fn unresolvable(id: &HandlerId, registry: &DescriptorRegistry) -> ReflectionError {
    let Some((type_name, method)) = id.split() else {
        return ReflectionError::Malformed(id.to_string());
    };
    let type_known = registry
        .entries
        .keys()
        .any(|known| known.split().is_some_and(|(t, _)| t == type_name));
    if type_known {
        ReflectionError::UnknownMethod { type_name: type_name.to_owned(), method: method.to_owned() }
    } else {
        ReflectionError::UnknownType(type_name.to_owned())
    }
}
