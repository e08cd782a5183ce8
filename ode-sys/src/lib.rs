//! Raw declarations for the subset of the ODE C API used by the `ode` crate.
//!
//! Linking is opt-in through the `link` feature. Enable `double` when the
//! native library was configured with `dDOUBLE`.
#![allow(non_snake_case)]
#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]

use std::os::raw::{c_int, c_uint, c_void};

#[cfg(not(feature = "double"))]
pub type dReal = f32;
#[cfg(feature = "double")]
pub type dReal = f64;

pub type dTriIndex = u32;

/// `dVector3` is four reals wide; the last component is padding.
pub type dVector3 = [dReal; 4];

pub const dInitFlagManualThreadCleanup: c_uint = 0x0000_0001;

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct dxWorld {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct dxBody {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct dxSpace {
    _unused: [u8; 0],
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct dxTriMeshData {
    _unused: [u8; 0],
}

pub type dWorldID = *mut dxWorld;
pub type dBodyID = *mut dxBody;
pub type dSpaceID = *mut dxSpace;
pub type dTriMeshDataID = *mut dxTriMeshData;

extern "C" {
    pub fn dInitODE2(uiInitFlags: c_uint) -> c_int;
    pub fn dCloseODE();

    pub fn dWorldCreate() -> dWorldID;
    pub fn dWorldDestroy(world: dWorldID);

    pub fn dBodyCreate(world: dWorldID) -> dBodyID;
    pub fn dBodyDestroy(body: dBodyID);

    pub fn dSimpleSpaceCreate(space: dSpaceID) -> dSpaceID;
    pub fn dHashSpaceCreate(space: dSpaceID) -> dSpaceID;
    pub fn dSpaceDestroy(space: dSpaceID);
    pub fn dSpaceSetCleanup(space: dSpaceID, mode: c_int);

    pub fn dGeomTriMeshDataCreate() -> dTriMeshDataID;
    pub fn dGeomTriMeshDataDestroy(g: dTriMeshDataID);

    pub fn dGeomTriMeshDataBuildSingle(
        g: dTriMeshDataID,
        Vertices: *const c_void,
        VertexStride: c_int,
        VertexCount: c_int,
        Indices: *const c_void,
        IndexCount: c_int,
        TriStride: c_int,
    );

    pub fn dGeomTriMeshDataBuildSingle1(
        g: dTriMeshDataID,
        Vertices: *const c_void,
        VertexStride: c_int,
        VertexCount: c_int,
        Indices: *const c_void,
        IndexCount: c_int,
        TriStride: c_int,
        Normals: *const c_void,
    );

    pub fn dGeomTriMeshDataBuildDouble(
        g: dTriMeshDataID,
        Vertices: *const c_void,
        VertexStride: c_int,
        VertexCount: c_int,
        Indices: *const c_void,
        IndexCount: c_int,
        TriStride: c_int,
    );

    pub fn dGeomTriMeshDataBuildDouble1(
        g: dTriMeshDataID,
        Vertices: *const c_void,
        VertexStride: c_int,
        VertexCount: c_int,
        Indices: *const c_void,
        IndexCount: c_int,
        TriStride: c_int,
        Normals: *const c_void,
    );

    pub fn dGeomTriMeshDataBuildSimple(
        g: dTriMeshDataID,
        Vertices: *const dReal,
        VertexCount: c_int,
        Indices: *const dTriIndex,
        IndexCount: c_int,
    );

    // The header declares the normals as `const int*`.
    pub fn dGeomTriMeshDataBuildSimple1(
        g: dTriMeshDataID,
        Vertices: *const dReal,
        VertexCount: c_int,
        Indices: *const dTriIndex,
        IndexCount: c_int,
        Normals: *const c_int,
    );

    pub fn dGeomTriMeshDataPreprocess(g: dTriMeshDataID) -> c_int;
    pub fn dGeomTriMeshDataUpdate(g: dTriMeshDataID);
}
