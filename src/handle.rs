//! Ownership of native identifiers.
//!
//! Every native resource is wrapped in a [`NativeHandle`], which destroys the
//! resource at most once. Resources created inside an aggregate (bodies inside a
//! world, spaces inside a parent space) carry a non-owning back-reference to the
//! aggregate so that their release is skipped once the aggregate has torn them
//! down itself.
//!
//! ```
//! use std::rc::Rc;
//! use ode::backend::recording::RecordingApi;
//! use ode::{Body, Ode, World};
//!
//! let api = Rc::new(RecordingApi::default());
//! let ode = Ode::config().backend(api.clone()).build().unwrap();
//!
//! let mut world = World::new(&ode).unwrap();
//! let mut body = Body::new(&world).unwrap();
//!
//! // destroying the world frees the body too...
//! world.close();
//! // ...so closing the body must not call dBodyDestroy again.
//! body.close();
//!
//! assert_eq!(1, api.destroy_calls());
//! ```
use std::cell::{Cell, RefCell};
use std::fmt;
use std::num::NonZeroUsize;
use std::ptr;
use std::rc::{Rc, Weak};

use log::debug;

use crate::backend::NativeApi;
use crate::ode::{Context, Ode};

/// Opaque identifier produced by the native library.
///
/// Zero and all-ones are never valid identifiers.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct RawId(NonZeroUsize);

impl RawId {
    pub fn new(id: usize) -> Option<Self> {
        if id == usize::MAX {
            return None;
        }
        NonZeroUsize::new(id).map(RawId)
    }

    pub fn from_ptr<T>(ptr: *mut T) -> Option<Self> {
        Self::new(ptr as usize)
    }

    pub const fn get(self) -> usize {
        self.0.get()
    }

    pub fn as_ptr<T>(self) -> *mut T {
        self.0.get() as *mut T
    }
}

/// A native identifier that may be absent.
///
/// `Absent` is what the native API receives wherever an optional handle was not
/// given (e.g. a space created with no parent).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum RawHandle {
    Valid(RawId),
    Absent,
}

impl RawHandle {
    pub const fn null() -> Self {
        RawHandle::Absent
    }

    pub fn id(self) -> Option<RawId> {
        match self {
            RawHandle::Valid(id) => Some(id),
            RawHandle::Absent => None,
        }
    }

    pub fn is_absent(self) -> bool {
        self == RawHandle::Absent
    }

    /// Pointer form for FFI calls. `Absent` maps to null.
    pub fn as_ptr<T>(self) -> *mut T {
        match self {
            RawHandle::Valid(id) => id.as_ptr(),
            RawHandle::Absent => ptr::null_mut(),
        }
    }
}

impl From<Option<RawId>> for RawHandle {
    fn from(id: Option<RawId>) -> Self {
        id.map_or(RawHandle::Absent, RawHandle::Valid)
    }
}

/// Selects the native destroy call of a handle.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ResourceKind {
    World,
    Body,
    Space,
    TriMeshData,
}

/// Teardown state of an aggregate owner, as seen by its children.
pub trait OwnerState {
    fn is_closed(&self) -> bool;
}

#[derive(Debug)]
struct HandleState {
    closed: Cell<bool>,
    ownership: RefCell<Ownership>,
}

// An aggregate freed by its own owner's teardown is closed as well.
impl OwnerState for HandleState {
    fn is_closed(&self) -> bool {
        self.closed.get() || self.ownership.borrow().is_owner_closed()
    }
}

/// Relation between a handle and the aggregate that created it.
pub enum Ownership {
    /// Released unconditionally.
    Unowned,
    /// Released only while the owner is still open. An owner that no longer
    /// exists counts as closed.
    OwnedBy(Weak<dyn OwnerState>),
}

impl Ownership {
    pub fn owned_by<S: OwnerState + 'static>(owner: &Rc<S>) -> Self {
        let weak: Weak<S> = Rc::downgrade(owner);
        Ownership::OwnedBy(weak)
    }

    /// Whether the owner has already released this resource along with itself.
    pub fn is_owner_closed(&self) -> bool {
        match self {
            Ownership::Unowned => false,
            Ownership::OwnedBy(owner) => owner.upgrade().map_or(true, |o| o.is_closed()),
        }
    }

    pub fn is_owned(&self) -> bool {
        match self {
            Ownership::Unowned => false,
            Ownership::OwnedBy(_) => true,
        }
    }
}

impl fmt::Debug for Ownership {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Ownership::Unowned => write!(f, "Unowned"),
            Ownership::OwnedBy(_) => write!(f, "OwnedBy(closed: {})", self.is_owner_closed()),
        }
    }
}

/// Owns one native identifier and its release.
pub struct NativeHandle {
    context: Rc<Context>,
    kind: ResourceKind,
    id: RawId,
    state: Rc<HandleState>,
}

impl NativeHandle {
    pub(crate) fn new(
        context: Rc<Context>,
        kind: ResourceKind,
        id: RawId,
        ownership: Ownership,
    ) -> Self {
        debug!("Created {:?} {:#x} ({:?})", kind, id.get(), ownership);
        Self {
            context,
            kind,
            id,
            state: Rc::new(HandleState {
                closed: Cell::new(false),
                ownership: RefCell::new(ownership),
            }),
        }
    }

    /// Takes ownership of an identifier created outside of this crate.
    ///
    /// # Safety
    /// `id` must be a live identifier of the given `kind`, created by the same
    /// backend `ode` was configured with, and not owned by any other handle.
    pub unsafe fn from_raw(ode: &Ode, kind: ResourceKind, id: RawId, ownership: Ownership) -> Self {
        Self::new(ode.context(), kind, id, ownership)
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The identifier while the resource exists, `RawHandle::Absent` once it
    /// was closed or destroyed along with its owner.
    pub fn raw(&self) -> RawHandle {
        if self.state.is_closed() {
            RawHandle::Absent
        } else {
            RawHandle::Valid(self.id)
        }
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.get()
    }

    /// Whether the handle still refers to an owner. Cleared on close.
    pub fn is_owned(&self) -> bool {
        self.state.ownership.borrow().is_owned()
    }

    /// Whether the owner, or one of its own owners, has been closed.
    pub fn is_owner_closed(&self) -> bool {
        self.state.ownership.borrow().is_owner_closed()
    }

    /// Ownership relation for a resource created inside this one.
    pub fn child_ownership(&self) -> Ownership {
        Ownership::owned_by(&self.state)
    }

    pub(crate) fn api(&self) -> &dyn NativeApi {
        self.context.api()
    }

    pub(crate) fn context(&self) -> Rc<Context> {
        Rc::clone(&self.context)
    }

    /// Releases the native resource. Only the first call has an effect.
    ///
    /// When the owner has already been closed, its teardown freed this
    /// resource and the native destroy call is skipped.
    pub fn close(&mut self) {
        if self.state.closed.replace(true) {
            return;
        }

        let ownership = self.state.ownership.replace(Ownership::Unowned);
        if ownership.is_owner_closed() {
            debug!("Skipping release of {:?} {:#x}, owner already destroyed", self.kind, self.id.get());
        } else {
            debug!("Destroying {:?} {:#x}", self.kind, self.id.get());
            unsafe { self.context.api().destroy(self.kind, self.id) }
        }
    }
}

impl Drop for NativeHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for NativeHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NativeHandle")
            .field("kind", &self.kind)
            .field("id", &format_args!("{:#x}", self.id.get()))
            .field("closed", &self.is_closed())
            .field("ownership", &*self.state.ownership.borrow())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::backend::recording::{Call, RecordingApi};

    struct StubOwner(Cell<bool>);

    impl OwnerState for StubOwner {
        fn is_closed(&self) -> bool {
            self.0.get()
        }
    }

    fn setup() -> (Rc<RecordingApi>, Ode) {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = Rc::new(RecordingApi::default());
        let ode = Ode::config().backend(api.clone()).build().unwrap();
        (api, ode)
    }

    #[test]
    fn raw_id_rejects_zero_and_minus_one() {
        assert_eq!(None, RawId::new(0));
        assert_eq!(None, RawId::new(usize::MAX));
        assert_eq!(Some(42), RawId::new(42).map(RawId::get));
        assert_eq!(None, RawId::from_ptr::<u8>(ptr::null_mut()));
    }

    #[test]
    fn absent_handle_is_null() {
        assert!(RawHandle::null().is_absent());
        assert!(RawHandle::null().as_ptr::<u8>().is_null());
        assert_eq!(RawHandle::Absent, RawHandle::from(None));

        let id = RawId::new(16).unwrap();
        assert_eq!(16, RawHandle::from(Some(id)).as_ptr::<u8>() as usize);
    }

    #[test]
    fn close_twice_destroys_once() {
        let (api, ode) = setup();
        let id = api.trimesh_data_create().unwrap();
        let mut handle = unsafe { NativeHandle::from_raw(&ode, ResourceKind::TriMeshData, id, Ownership::Unowned) };

        assert_eq!(RawHandle::Valid(id), handle.raw());
        handle.close();
        assert!(handle.is_closed());
        assert_eq!(RawHandle::Absent, handle.raw());
        handle.close();
        drop(handle);

        assert_eq!(1, api.destroy_calls());
        assert!(!api.is_live(id));
    }

    #[test]
    fn child_of_closed_stub_owner_skips_destroy() {
        let (api, ode) = setup();
        let owner = Rc::new(StubOwner(Cell::new(true)));
        let world = api.world_create().unwrap();
        let id = unsafe { api.body_create(world).unwrap() };

        let mut handle =
            unsafe { NativeHandle::from_raw(&ode, ResourceKind::Body, id, Ownership::owned_by(&owner)) };
        handle.close();

        assert!(handle.is_closed());
        assert!(!handle.is_owned());
        assert!(!api.calls().iter().any(|c| match c {
            Call::Destroy { .. } => true,
            _ => false,
        }));
    }

    #[test]
    fn child_of_open_stub_owner_is_destroyed() {
        let (api, ode) = setup();
        let owner = Rc::new(StubOwner(Cell::new(false)));
        let world = api.world_create().unwrap();
        let id = unsafe { api.body_create(world).unwrap() };

        let mut handle =
            unsafe { NativeHandle::from_raw(&ode, ResourceKind::Body, id, Ownership::owned_by(&owner)) };
        handle.close();

        assert_eq!(1, api.destroy_calls());
        assert!(api.is_live(world));
        assert!(!owner.is_closed());
    }

    #[test]
    fn dropped_owner_counts_as_closed() {
        let owner = Rc::new(StubOwner(Cell::new(false)));
        let ownership = Ownership::owned_by(&owner);
        assert!(!ownership.is_owner_closed());
        drop(owner);
        assert!(ownership.is_owner_closed());
        assert!(!Ownership::Unowned.is_owner_closed());
    }
}
