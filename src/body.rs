use crate::error::Error;
use crate::handle::{NativeHandle, RawHandle, ResourceKind};
use crate::world::World;
use crate::Result;

/// Wrapper around `dBodyID`.
///
/// The body does not keep its world alive. If the world is destroyed first the
/// body is already gone natively and closing it does nothing.
#[derive(Debug)]
pub struct Body {
    handle: NativeHandle,
}

impl Body {
    pub fn new(world: &World) -> Result<Self> {
        let world_id = world
            .raw()
            .id()
            .ok_or(Error::ContractViolation("body created in a destroyed world"))?;

        let handle = world.handle();
        let id = unsafe { handle.api().body_create(world_id)? };
        Ok(Self {
            handle: NativeHandle::new(handle.context(), ResourceKind::Body, id, handle.child_ownership()),
        })
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

    /// Whether the owning world has been destroyed, which destroyed this body
    /// too. Only meaningful while the body is open.
    pub fn is_world_closed(&self) -> bool {
        self.handle.is_owner_closed()
    }

    /// Destroys the body, unless its world already did.
    pub fn close(&mut self) {
        self.handle.close()
    }
}
