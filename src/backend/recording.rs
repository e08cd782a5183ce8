//! In-process backend that records native calls.
//!
//! Identifiers are slab keys. Destroying an aggregate frees what the native
//! library would free along with it (bodies with their world, nested spaces with
//! their parent), and destroying an identifier that is not live panics, the
//! same way the native library would crash.
//!
//! ```
//! use std::rc::Rc;
//! use ode::backend::recording::RecordingApi;
//! use ode::{Ode, Space};
//!
//! let api = Rc::new(RecordingApi::default());
//! let ode = Ode::config().backend(api.clone()).build().unwrap();
//!
//! let root = Space::simple(&ode, None).unwrap();
//! let _child = Space::hash(&ode, Some(&root)).unwrap();
//!
//! assert_eq!(2, api.live_count());
//! ```
use std::cell::{Cell, RefCell};
use std::os::raw::c_uint;

use log::trace;
use slab::Slab;

use super::NativeApi;
use crate::error::Error;
use crate::handle::{RawHandle, RawId, ResourceKind};
use crate::mesh::BuildArgs;
use crate::space::SpaceKind;
use crate::Result;

/// A native call, as seen by [`RecordingApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Init(c_uint),
    Close,
    Create { kind: ResourceKind, id: RawId, parent: RawHandle },
    Build { data: RawId, args: BuildArgs },
    Preprocess(RawId),
    Update(RawId),
    Destroy { kind: ResourceKind, id: RawId },
}

#[derive(Debug)]
struct Entry {
    kind: ResourceKind,
    parent: Option<RawId>,
    built: bool,
}

#[derive(Debug, Default)]
pub struct RecordingApi {
    live: RefCell<Slab<Entry>>,
    calls: RefCell<Vec<Call>>,
    fail_builds: Cell<bool>,
    initialized: Cell<bool>,
}

// slab keys start at zero, identifiers can't
fn id_of(key: usize) -> RawId {
    match RawId::new(key + 1) {
        Some(id) => id,
        None => unreachable!("slab key out of range"),
    }
}

fn key_of(id: RawId) -> usize {
    id.get() - 1
}

impl RecordingApi {
    /// Makes every following build call fail, as a native validation failure would.
    pub fn fail_builds(&self, fail: bool) {
        self.fail_builds.set(fail);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    /// Arguments of every build call, in order.
    pub fn builds(&self) -> Vec<BuildArgs> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                Call::Build { args, .. } => Some(*args),
                _ => None,
            })
            .collect()
    }

    pub fn destroy_calls(&self) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|call| match call {
                Call::Destroy { .. } => true,
                _ => false,
            })
            .count()
    }

    pub fn is_live(&self, id: RawId) -> bool {
        self.live.borrow().contains(key_of(id))
    }

    pub fn live_count(&self) -> usize {
        self.live.borrow().len()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    fn record(&self, call: Call) {
        trace!("{:?}", call);
        self.calls.borrow_mut().push(call);
    }

    fn create(&self, kind: ResourceKind, parent: RawHandle) -> RawId {
        let key = self.live.borrow_mut().insert(Entry {
            kind,
            parent: parent.id(),
            built: false,
        });
        let id = id_of(key);
        self.record(Call::Create { kind, id, parent });
        id
    }

    fn expect_live(&self, id: RawId, kind: ResourceKind) {
        match self.live.borrow().get(key_of(id)) {
            Some(entry) if entry.kind == kind => {}
            Some(entry) => panic!("{:#x} is a {:?}, expected a {:?}", id.get(), entry.kind, kind),
            None => panic!("{:?} {:#x} is not live", kind, id.get()),
        }
    }

    // Removes `key` and everything created inside it.
    fn remove_tree(live: &mut Slab<Entry>, key: usize) {
        live.remove(key);
        let parent = id_of(key);
        let children: Vec<usize> = live
            .iter()
            .filter(|(_, entry)| entry.parent == Some(parent))
            .map(|(key, _)| key)
            .collect();
        for child in children {
            Self::remove_tree(live, child);
        }
    }
}

impl NativeApi for RecordingApi {
    fn init(&self, flags: c_uint) -> Result<()> {
        self.initialized.set(true);
        self.record(Call::Init(flags));
        Ok(())
    }

    unsafe fn close(&self) {
        self.initialized.set(false);
        self.record(Call::Close);
    }

    fn world_create(&self) -> Result<RawId> {
        Ok(self.create(ResourceKind::World, RawHandle::Absent))
    }

    unsafe fn body_create(&self, world: RawId) -> Result<RawId> {
        self.expect_live(world, ResourceKind::World);
        Ok(self.create(ResourceKind::Body, RawHandle::Valid(world)))
    }

    unsafe fn space_create(&self, _kind: SpaceKind, parent: RawHandle) -> Result<RawId> {
        if let Some(parent) = parent.id() {
            self.expect_live(parent, ResourceKind::Space);
        }
        Ok(self.create(ResourceKind::Space, parent))
    }

    fn trimesh_data_create(&self) -> Result<RawId> {
        Ok(self.create(ResourceKind::TriMeshData, RawHandle::Absent))
    }

    unsafe fn trimesh_data_build(&self, data: RawId, args: &BuildArgs) -> Result<()> {
        self.expect_live(data, ResourceKind::TriMeshData);
        self.record(Call::Build { data, args: *args });
        if self.fail_builds.get() {
            return Err(Error::Native(args.variant.entry_point()));
        }
        if let Some(entry) = self.live.borrow_mut().get_mut(key_of(data)) {
            entry.built = true;
        }
        Ok(())
    }

    unsafe fn trimesh_data_preprocess(&self, data: RawId) -> Result<()> {
        self.expect_live(data, ResourceKind::TriMeshData);
        self.record(Call::Preprocess(data));
        match self.live.borrow().get(key_of(data)) {
            Some(entry) if entry.built => Ok(()),
            _ => Err(Error::Native("dGeomTriMeshDataPreprocess")),
        }
    }

    unsafe fn trimesh_data_update(&self, data: RawId) {
        self.expect_live(data, ResourceKind::TriMeshData);
        self.record(Call::Update(data));
    }

    unsafe fn destroy(&self, kind: ResourceKind, id: RawId) {
        self.expect_live(id, kind);
        self.record(Call::Destroy { kind, id });
        Self::remove_tree(&mut self.live.borrow_mut(), key_of(id));
    }
}
