use crate::body::Body;
use crate::handle::{NativeHandle, Ownership, RawHandle, ResourceKind};
use crate::ode::Ode;
use crate::Result;

/// Wrapper around `dWorldID`.
///
/// A world is an aggregate owner: destroying it destroys every body created in
/// it, after which the bodies' own handles skip their release.
#[derive(Debug)]
pub struct World {
    handle: NativeHandle,
}

impl World {
    pub fn new(ode: &Ode) -> Result<Self> {
        let id = ode.api().world_create()?;
        Ok(Self {
            handle: NativeHandle::new(ode.context(), ResourceKind::World, id, Ownership::Unowned),
        })
    }

    /// Creates a body in this world.
    pub fn create_body(&self) -> Result<Body> {
        Body::new(self)
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

    /// Destroys the world along with all of its bodies.
    pub fn close(&mut self) {
        self.handle.close()
    }
}
