//! The native ODE boundary.
//!
//! Every foreign call made by this crate goes through [`NativeApi`]. The
//! [`native`] implementation forwards to `ode-sys` and is only compiled with the
//! `native` feature; [`recording::RecordingApi`] is an in-process stand-in that
//! records every call.
use std::os::raw::c_uint;

use crate::handle::{RawHandle, RawId, ResourceKind};
use crate::mesh::BuildArgs;
use crate::space::SpaceKind;
use crate::Result;

#[cfg(feature = "native")]
pub mod native;
pub mod recording;

/// Native library entry points.
///
/// Methods taking identifiers are `unsafe`: callers guarantee the identifiers
/// are live and of the expected kind.
pub trait NativeApi {
    /// `dInitODE2`
    fn init(&self, flags: c_uint) -> Result<()>;

    /// `dCloseODE`
    ///
    /// # Safety
    /// No identifier created through this backend may be used afterwards.
    unsafe fn close(&self);

    /// `dWorldCreate`
    fn world_create(&self) -> Result<RawId>;

    /// `dBodyCreate`
    unsafe fn body_create(&self, world: RawId) -> Result<RawId>;

    /// `dSimpleSpaceCreate` / `dHashSpaceCreate`. An absent parent creates a
    /// top level space.
    unsafe fn space_create(&self, kind: SpaceKind, parent: RawHandle) -> Result<RawId>;

    /// `dGeomTriMeshDataCreate`
    fn trimesh_data_create(&self) -> Result<RawId>;

    /// One of the six `dGeomTriMeshDataBuild*` functions, picked by `args.variant`.
    ///
    /// # Safety
    /// The buffers referenced by `args` must stay allocated and unmoved until
    /// the data is rebuilt or destroyed.
    unsafe fn trimesh_data_build(&self, data: RawId, args: &BuildArgs) -> Result<()>;

    /// `dGeomTriMeshDataPreprocess`
    unsafe fn trimesh_data_preprocess(&self, data: RawId) -> Result<()>;

    /// `dGeomTriMeshDataUpdate`
    unsafe fn trimesh_data_update(&self, data: RawId);

    /// The destroy call matching `kind`. Assumed infallible; destroying an
    /// identifier that is no longer live is undefined.
    unsafe fn destroy(&self, kind: ResourceKind, id: RawId);
}
