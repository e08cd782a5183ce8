use std::os::raw::{c_int, c_uint};

use log::trace;

use super::NativeApi;
use crate::error::Error;
use crate::ffi;
use crate::handle::{RawHandle, RawId, ResourceKind};
use crate::mesh::{BuildArgs, SourceShape};
use crate::space::SpaceKind;
use crate::Result;

/// Backend calling into the system libode.
#[derive(Debug, Default, Copy, Clone)]
pub struct NativeOde;

fn created<T>(ptr: *mut T, function: &'static str) -> Result<RawId> {
    RawId::from_ptr(ptr).ok_or(Error::Native(function))
}

impl NativeApi for NativeOde {
    fn init(&self, flags: c_uint) -> Result<()> {
        match unsafe { ffi::dInitODE2(flags) } {
            0 => Err(Error::Native("dInitODE2")),
            _ => Ok(()),
        }
    }

    unsafe fn close(&self) {
        ffi::dCloseODE()
    }

    fn world_create(&self) -> Result<RawId> {
        created(unsafe { ffi::dWorldCreate() }, "dWorldCreate")
    }

    unsafe fn body_create(&self, world: RawId) -> Result<RawId> {
        created(ffi::dBodyCreate(world.as_ptr()), "dBodyCreate")
    }

    unsafe fn space_create(&self, kind: SpaceKind, parent: RawHandle) -> Result<RawId> {
        let parent = parent.as_ptr();
        match kind {
            SpaceKind::Simple => created(ffi::dSimpleSpaceCreate(parent), "dSimpleSpaceCreate"),
            SpaceKind::Hash => created(ffi::dHashSpaceCreate(parent), "dHashSpaceCreate"),
        }
    }

    fn trimesh_data_create(&self) -> Result<RawId> {
        created(unsafe { ffi::dGeomTriMeshDataCreate() }, "dGeomTriMeshDataCreate")
    }

    unsafe fn trimesh_data_build(&self, data: RawId, args: &BuildArgs) -> Result<()> {
        let g = data.as_ptr();
        let &BuildArgs {
            variant,
            vertices,
            vertex_stride,
            vertex_count,
            indices,
            index_count,
            tri_stride,
            normals,
        } = args;

        trace!("{}({:#x})", variant.entry_point(), data.get());

        match (variant.shape, variant.normals) {
            (SourceShape::Single, false) => ffi::dGeomTriMeshDataBuildSingle(
                g, vertices, vertex_stride, vertex_count, indices, index_count, tri_stride,
            ),
            (SourceShape::Single, true) => ffi::dGeomTriMeshDataBuildSingle1(
                g, vertices, vertex_stride, vertex_count, indices, index_count, tri_stride, normals,
            ),
            (SourceShape::Double, false) => ffi::dGeomTriMeshDataBuildDouble(
                g, vertices, vertex_stride, vertex_count, indices, index_count, tri_stride,
            ),
            (SourceShape::Double, true) => ffi::dGeomTriMeshDataBuildDouble1(
                g, vertices, vertex_stride, vertex_count, indices, index_count, tri_stride, normals,
            ),
            (SourceShape::Simple, false) => ffi::dGeomTriMeshDataBuildSimple(
                g,
                vertices as *const ffi::dReal,
                vertex_count,
                indices as *const ffi::dTriIndex,
                index_count,
            ),
            (SourceShape::Simple, true) => ffi::dGeomTriMeshDataBuildSimple1(
                g,
                vertices as *const ffi::dReal,
                vertex_count,
                indices as *const ffi::dTriIndex,
                index_count,
                normals as *const c_int,
            ),
        }
        Ok(())
    }

    unsafe fn trimesh_data_preprocess(&self, data: RawId) -> Result<()> {
        match ffi::dGeomTriMeshDataPreprocess(data.as_ptr()) {
            0 => Err(Error::Native("dGeomTriMeshDataPreprocess")),
            _ => Ok(()),
        }
    }

    unsafe fn trimesh_data_update(&self, data: RawId) {
        ffi::dGeomTriMeshDataUpdate(data.as_ptr())
    }

    unsafe fn destroy(&self, kind: ResourceKind, id: RawId) {
        match kind {
            ResourceKind::World => ffi::dWorldDestroy(id.as_ptr()),
            ResourceKind::Body => ffi::dBodyDestroy(id.as_ptr()),
            ResourceKind::Space => ffi::dSpaceDestroy(id.as_ptr()),
            ResourceKind::TriMeshData => ffi::dGeomTriMeshDataDestroy(id.as_ptr()),
        }
    }
}
