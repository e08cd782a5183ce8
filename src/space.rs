use crate::error::Error;
use crate::handle::{NativeHandle, Ownership, RawHandle, ResourceKind};
use crate::ode::Ode;
use crate::Result;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SpaceKind {
    /// `dSimpleSpaceCreate`
    Simple,
    /// `dHashSpaceCreate`
    Hash,
}

/// Wrapper around `dSpaceID`.
///
/// A space created inside another one is destroyed by its parent's cleanup, so
/// it is owned by the parent.
#[derive(Debug)]
pub struct Space {
    handle: NativeHandle,
    kind: SpaceKind,
}

impl Space {
    /// Creates a simple space, optionally inside `parent`.
    pub fn simple(ode: &Ode, parent: Option<&Space>) -> Result<Self> {
        Self::new(ode, SpaceKind::Simple, parent)
    }

    /// Creates a multi-resolution hash table space, optionally inside `parent`.
    pub fn hash(ode: &Ode, parent: Option<&Space>) -> Result<Self> {
        Self::new(ode, SpaceKind::Hash, parent)
    }

    pub fn new(ode: &Ode, kind: SpaceKind, parent: Option<&Space>) -> Result<Self> {
        let (parent_raw, ownership) = match parent {
            Some(parent) => match parent.raw() {
                RawHandle::Absent => {
                    return Err(Error::ContractViolation("space created inside a destroyed space"))
                }
                raw => (raw, parent.handle.child_ownership()),
            },
            None => (RawHandle::null(), Ownership::Unowned),
        };

        let id = unsafe { ode.api().space_create(kind, parent_raw)? };
        Ok(Self {
            handle: NativeHandle::new(ode.context(), ResourceKind::Space, id, ownership),
            kind,
        })
    }

    pub fn kind(&self) -> SpaceKind {
        self.kind
    }

    pub fn handle(&self) -> &NativeHandle {
        &self.handle
    }

    pub fn raw(&self) -> RawHandle {
        self.handle.raw()
    }

    pub fn is_closed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Destroys the space and, through its cleanup, the spaces nested in it.
    pub fn close(&mut self) {
        self.handle.close()
    }
}
