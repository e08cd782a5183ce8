//! Triangle mesh data.
//!
//! ```
//! use std::rc::Rc;
//! use ode::backend::recording::RecordingApi;
//! use ode::{Ode, TriMeshData};
//!
//! let api = Rc::new(RecordingApi::default());
//! let ode = Ode::config().backend(api.clone()).build().unwrap();
//!
//! let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0f32];
//! let indices = [0, 1, 2];
//!
//! let mut data = TriMeshData::new(&ode).unwrap();
//! data.build_single(&vertices, &indices, None).unwrap();
//! data.preprocess().unwrap();
//!
//! assert_eq!(Some(1), data.triangle_count());
//! ```
use std::convert::TryFrom;
use std::fmt;
use std::os::raw::{c_int, c_void};
use std::ptr;

use log::debug;

use crate::buffer::{Element, ScratchBuffer};
use crate::error::Error;
use crate::handle::{NativeHandle, Ownership, RawHandle, RawId, ResourceKind};
use crate::math::{Precision, Real, TriIndex, Vector3};
use crate::ode::Ode;
use crate::Result;

/// Shape of the vertex array a mesh is built from.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum SourceShape {
    /// Packed `f32` triples.
    Single,
    /// Packed `f64` triples.
    Double,
    /// [`Vector3`]s in the native vector layout.
    Simple,
}

/// One of the six native build entry points.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BuildVariant {
    pub shape: SourceShape,
    /// Precomputed per-triangle normals are passed.
    pub normals: bool,
}

impl BuildVariant {
    pub const ALL: [BuildVariant; 6] = [
        BuildVariant::new(SourceShape::Single, false),
        BuildVariant::new(SourceShape::Single, true),
        BuildVariant::new(SourceShape::Double, false),
        BuildVariant::new(SourceShape::Double, true),
        BuildVariant::new(SourceShape::Simple, false),
        BuildVariant::new(SourceShape::Simple, true),
    ];

    pub const fn new(shape: SourceShape, normals: bool) -> Self {
        Self { shape, normals }
    }

    /// Precision of the vertex data.
    pub fn precision(&self) -> Precision {
        match self.shape {
            SourceShape::Single => Precision::Single,
            SourceShape::Double => Precision::Double,
            SourceShape::Simple => Precision::NATIVE,
        }
    }

    /// Name of the native function this variant calls.
    pub fn entry_point(&self) -> &'static str {
        match (self.shape, self.normals) {
            (SourceShape::Single, false) => "dGeomTriMeshDataBuildSingle",
            (SourceShape::Single, true) => "dGeomTriMeshDataBuildSingle1",
            (SourceShape::Double, false) => "dGeomTriMeshDataBuildDouble",
            (SourceShape::Double, true) => "dGeomTriMeshDataBuildDouble1",
            (SourceShape::Simple, false) => "dGeomTriMeshDataBuildSimple",
            (SourceShape::Simple, true) => "dGeomTriMeshDataBuildSimple1",
        }
    }
}

/// Vertex array, tagged by shape.
#[derive(Debug, Copy, Clone)]
pub enum Vertices<'a> {
    Single(&'a [f32]),
    Double(&'a [f64]),
    Simple(&'a [Vector3]),
}

impl<'a> Vertices<'a> {
    pub fn shape(&self) -> SourceShape {
        match self {
            Vertices::Single(_) => SourceShape::Single,
            Vertices::Double(_) => SourceShape::Double,
            Vertices::Simple(_) => SourceShape::Simple,
        }
    }

    /// Number of vertices, or `None` if a packed array is not made of triples.
    pub fn vertex_count(&self) -> Option<usize> {
        let (len, per_vertex) = match self {
            Vertices::Single(v) => (v.len(), 3),
            Vertices::Double(v) => (v.len(), 3),
            Vertices::Simple(v) => (v.len(), 1),
        };
        if len % per_vertex == 0 {
            Some(len / per_vertex)
        } else {
            None
        }
    }

    fn to_scratch(&self) -> Result<ScratchBuffer> {
        match *self {
            Vertices::Single(v) => ScratchBuffer::from_slice(v),
            Vertices::Double(v) => ScratchBuffer::from_slice(v),
            Vertices::Simple(v) => ScratchBuffer::from_slice(v),
        }
    }
}

impl<'a> From<&'a [f32]> for Vertices<'a> {
    fn from(v: &'a [f32]) -> Self {
        Vertices::Single(v)
    }
}

impl<'a> From<&'a [f64]> for Vertices<'a> {
    fn from(v: &'a [f64]) -> Self {
        Vertices::Double(v)
    }
}

impl<'a> From<&'a [Vector3]> for Vertices<'a> {
    fn from(v: &'a [Vector3]) -> Self {
        Vertices::Simple(v)
    }
}

/// Arguments of a native build call.
///
/// Counts and strides are what the selected entry point receives. The `Simple`
/// entry points take no strides; `vertex_stride` and `tri_stride` then only
/// describe the buffer layout.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BuildArgs {
    pub variant: BuildVariant,
    pub vertices: *const c_void,
    pub vertex_stride: c_int,
    pub vertex_count: c_int,
    pub indices: *const c_void,
    pub index_count: c_int,
    pub tri_stride: c_int,
    /// Null unless `variant.normals`.
    pub normals: *const c_void,
}

/// Lifecycle of a [`TriMeshData`].
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MeshState {
    /// Identifier allocated, nothing built.
    Unbuilt,
    Built {
        variant: BuildVariant,
        vertex_count: usize,
        triangle_count: usize,
        preprocessed: bool,
    },
    Disposed,
}

// Validated shape of a build request.
struct MeshLayout {
    vertex_count: usize,
    triangle_count: usize,
}

fn c_count(len: usize, what: &str) -> Result<c_int> {
    c_int::try_from(len).map_err(|_| Error::InvalidArgument(format!("too many {} ({})", what, len)))
}

impl MeshLayout {
    fn validate(vertices: &Vertices, indices: &[TriIndex], normals: Option<&[Real]>) -> Result<Self> {
        if indices.len() % 3 != 0 {
            return Err(Error::InvalidArgument(format!(
                "index count {} is not a multiple of 3",
                indices.len()
            )));
        }
        let vertex_count = vertices.vertex_count().ok_or_else(|| {
            Error::InvalidArgument("vertex array length is not a multiple of 3".to_string())
        })?;
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            return Err(Error::InvalidArgument(format!(
                "index {} out of range for {} vertices",
                index, vertex_count
            )));
        }

        let triangle_count = indices.len() / 3;
        if let Some(normals) = normals {
            if normals.len() != 3 * triangle_count {
                return Err(Error::InvalidArgument(format!(
                    "{} normal components given for {} triangles",
                    normals.len(),
                    triangle_count
                )));
            }
        }

        Ok(Self {
            vertex_count,
            triangle_count,
        })
    }
}

/// Wrapper around `dTriMeshDataID` and the scratch buffers it was built from.
///
/// The native structure keeps pointers into the buffers, so they are owned here
/// and only freed on rebuild or dispose.
pub struct TriMeshData {
    handle: NativeHandle,
    vertices: Option<ScratchBuffer>,
    indices: Option<ScratchBuffer>,
    normals: Option<ScratchBuffer>,
    state: MeshState,
}

impl TriMeshData {
    /// Creates an empty (unbuilt) mesh data object.
    pub fn new(ode: &Ode) -> Result<Self> {
        let id = ode.api().trimesh_data_create()?;
        let handle = NativeHandle::new(ode.context(), ResourceKind::TriMeshData, id, Ownership::Unowned);
        Ok(Self {
            handle,
            vertices: None,
            indices: None,
            normals: None,
            state: MeshState::Unbuilt,
        })
    }

    /// Builds from packed single precision vertices.
    pub fn build_single(&mut self, vertices: &[f32], indices: &[TriIndex], normals: Option<&[Real]>) -> Result<()> {
        self.build(Vertices::Single(vertices), indices, normals)
    }

    /// Builds from packed double precision vertices.
    pub fn build_double(&mut self, vertices: &[f64], indices: &[TriIndex], normals: Option<&[Real]>) -> Result<()> {
        self.build(Vertices::Double(vertices), indices, normals)
    }

    /// Builds from vectors in the native layout.
    pub fn build_simple(
        &mut self,
        vertices: &[Vector3],
        indices: &[TriIndex],
        normals: Option<&[Real]>,
    ) -> Result<()> {
        self.build(Vertices::Simple(vertices), indices, normals)
    }

    /// Copies the arrays into fresh scratch buffers and builds the native data
    /// from them. Calling it again rebuilds.
    ///
    /// `indices` holds three vertex indices per triangle; `normals`, if given,
    /// three components per triangle. A failed build leaves the data unbuilt and
    /// holding no buffers.
    pub fn build(&mut self, vertices: Vertices, indices: &[TriIndex], normals: Option<&[Real]>) -> Result<()> {
        let id = self.id().ok_or(Error::ContractViolation("build on disposed mesh data"))?;
        let layout = MeshLayout::validate(&vertices, indices, normals)?;
        let variant = BuildVariant::new(vertices.shape(), normals.is_some());

        self.release_buffers();
        self.state = MeshState::Unbuilt;

        if let Err(err) = self.store_and_build(id, variant, &layout, &vertices, indices, normals) {
            self.release_buffers();
            return Err(err);
        }

        debug!(
            "Built {:?} {:#x} with {} ({} vertices, {} triangles)",
            ResourceKind::TriMeshData,
            id.get(),
            variant.entry_point(),
            layout.vertex_count,
            layout.triangle_count
        );
        self.state = MeshState::Built {
            variant,
            vertex_count: layout.vertex_count,
            triangle_count: layout.triangle_count,
            preprocessed: false,
        };
        Ok(())
    }

    fn store_and_build(
        &mut self,
        id: RawId,
        variant: BuildVariant,
        layout: &MeshLayout,
        vertices: &Vertices,
        indices: &[TriIndex],
        normals: Option<&[Real]>,
    ) -> Result<()> {
        let vb = vertices.to_scratch()?;
        let vertex_stride = c_count(vb.stride(), "vertex bytes")?;
        let vertex_count = c_count(layout.vertex_count, "vertices")?;
        let vertices = self.vertices.insert(vb).as_ptr();

        let ib = ScratchBuffer::from_slice(indices)?;
        let tri_stride = c_count(ib.stride(), "index bytes")?;
        let index_count = c_count(ib.count(), "indices")?;
        let indices = self.indices.insert(ib).as_ptr();

        // sized by the normals' own element type
        let normals = match normals {
            Some(normals) => {
                let nb = ScratchBuffer::from_slice(normals)?;
                self.normals.insert(nb).as_ptr()
            }
            None => ptr::null(),
        };

        let args = BuildArgs {
            variant,
            vertices,
            vertex_stride,
            vertex_count,
            indices,
            index_count,
            tri_stride,
            normals,
        };
        unsafe { self.handle.api().trimesh_data_build(id, &args) }
    }

    /// Runs the native pass that removes redundant edges and vertices.
    ///
    /// The scratch buffers are left untouched.
    pub fn preprocess(&mut self) -> Result<()> {
        let id = self.built_id("preprocess before a successful build")?;
        unsafe { self.handle.api().trimesh_data_preprocess(id)? };
        if let MeshState::Built { preprocessed, .. } = &mut self.state {
            *preprocessed = true;
        }
        Ok(())
    }

    /// Refreshes the native acceleration structures after the vertex data was
    /// edited in place (see [`vertices_mut`](Self::vertices_mut)). Nothing is
    /// copied or reallocated.
    pub fn update(&mut self) -> Result<()> {
        let id = self.built_id("update before a successful build")?;
        unsafe { self.handle.api().trimesh_data_update(id) };
        Ok(())
    }

    fn built_id(&self, violation: &'static str) -> Result<RawId> {
        match (self.state, self.id()) {
            (MeshState::Built { .. }, Some(id)) => Ok(id),
            _ => Err(Error::ContractViolation(violation)),
        }
    }

    fn id(&self) -> Option<RawId> {
        self.handle.raw().id()
    }

    /// Frees the scratch buffers, then the native data. Later calls do nothing.
    pub fn dispose(&mut self) {
        if self.handle.is_closed() {
            return;
        }
        self.release_buffers();
        self.handle.close();
        self.state = MeshState::Disposed;
    }

    fn release_buffers(&mut self) {
        for buffer in [&mut self.vertices, &mut self.indices, &mut self.normals].iter_mut() {
            if let Some(mut buffer) = buffer.take() {
                buffer.release();
            }
        }
    }

    pub fn state(&self) -> MeshState {
        self.state
    }

    pub fn is_built(&self) -> bool {
        match self.state {
            MeshState::Built { .. } => true,
            _ => false,
        }
    }

    pub fn is_preprocessed(&self) -> bool {
        match self.state {
            MeshState::Built { preprocessed, .. } => preprocessed,
            _ => false,
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.handle.is_closed()
    }

    /// Entry point used by the last successful build.
    pub fn variant(&self) -> Option<BuildVariant> {
        match self.state {
            MeshState::Built { variant, .. } => Some(variant),
            _ => None,
        }
    }

    pub fn vertex_count(&self) -> Option<usize> {
        match self.state {
            MeshState::Built { vertex_count, .. } => Some(vertex_count),
            _ => None,
        }
    }

    pub fn triangle_count(&self) -> Option<usize> {
        match self.state {
            MeshState::Built { triangle_count, .. } => Some(triangle_count),
            _ => None,
        }
    }

    /// Number of scratch buffers currently held (at most three).
    pub fn buffer_count(&self) -> usize {
        [&self.vertices, &self.indices, &self.normals]
            .iter()
            .filter(|b| b.is_some())
            .count()
    }

    pub fn vertex_buffer(&self) -> Option<&ScratchBuffer> {
        self.vertices.as_ref()
    }

    pub fn index_buffer(&self) -> Option<&ScratchBuffer> {
        self.indices.as_ref()
    }

    pub fn normal_buffer(&self) -> Option<&ScratchBuffer> {
        self.normals.as_ref()
    }

    /// The vertex data the native structure reads from, for in-place edits.
    ///
    /// `T` must be the element type the mesh was built with (`f32`, `f64` or
    /// `Vector3`). Call [`update`](Self::update) once done.
    pub fn vertices_mut<T: Element>(&mut self) -> Option<&mut [T]> {
        self.vertices.as_mut().and_then(|buffer| buffer.as_mut_slice())
    }

    /// `dTriMeshDataID`, absent once disposed.
    pub fn raw(&self) -> RawHandle {
        self.handle.raw()
    }
}

impl Drop for TriMeshData {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for TriMeshData {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("TriMeshData")
            .field("handle", &self.handle)
            .field("state", &self.state)
            .field("buffers", &self.buffer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::rc::Rc;

    use crate::backend::recording::RecordingApi;
    use crate::buffer::live_buffers;

    fn setup() -> (Rc<RecordingApi>, Ode) {
        let _ = env_logger::builder().is_test(true).try_init();
        let api = Rc::new(RecordingApi::default());
        let ode = Ode::config().backend(api.clone()).build().unwrap();
        (api, ode)
    }

    const QUAD: [f32; 12] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
    const QUAD_INDICES: [TriIndex; 6] = [0, 1, 2, 0, 2, 3];
    const QUAD_NORMALS: [Real; 6] = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

    fn expect_invalid(result: Result<()>) {
        match result {
            Err(Error::InvalidArgument(_)) => {}
            other => panic!("expected InvalidArgument, got {:?}", other),
        }
    }

    #[test]
    fn entry_points_are_distinct() {
        let mut names: Vec<_> = BuildVariant::ALL.iter().map(BuildVariant::entry_point).collect();
        names.sort();
        names.dedup();
        assert_eq!(6, names.len());
    }

    #[test]
    fn single_build_arguments() {
        let (api, ode) = setup();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.build_single(&QUAD, &QUAD_INDICES, None).unwrap();

        let args = api.builds()[0];
        assert_eq!(BuildVariant::new(SourceShape::Single, false), args.variant);
        assert_eq!(12, args.vertex_stride);
        assert_eq!(4, args.vertex_count);
        assert_eq!(6, args.index_count);
        assert_eq!(12, args.tri_stride);
        assert!(args.normals.is_null());
        assert_eq!(data.vertex_buffer().unwrap().as_ptr(), args.vertices);
        assert_eq!(data.index_buffer().unwrap().as_ptr(), args.indices);
        assert_eq!(Some(4), data.vertex_count());
        assert_eq!(Some(2), data.triangle_count());
    }

    #[test]
    fn double_build_arguments() {
        let (api, ode) = setup();
        let vertices: Vec<f64> = QUAD.iter().map(|&v| v as f64).collect();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.build_double(&vertices, &QUAD_INDICES, Some(&QUAD_NORMALS)).unwrap();

        let args = api.builds()[0];
        assert_eq!(BuildVariant::new(SourceShape::Double, true), args.variant);
        assert_eq!(24, args.vertex_stride);
        assert_eq!(4, args.vertex_count);
        assert_eq!(data.normal_buffer().unwrap().as_ptr(), args.normals);
        assert_eq!(Some(&QUAD_NORMALS[..]), data.normal_buffer().unwrap().as_slice::<Real>());
    }

    #[test]
    fn simple_build_passes_array_lengths() {
        let (api, ode) = setup();
        let vertices: Vec<Vector3> = QUAD
            .chunks(3)
            .map(|c| Vector3::new(c[0] as Real, c[1] as Real, c[2] as Real))
            .collect();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.build_simple(&vertices, &QUAD_INDICES, None).unwrap();

        let args = api.builds()[0];
        assert_eq!(SourceShape::Simple, args.variant.shape);
        assert_eq!(4, args.vertex_count);
        assert_eq!(6, args.index_count);
        assert_eq!(Some(&vertices[..]), data.vertex_buffer().unwrap().as_slice::<Vector3>());
    }

    #[test]
    fn rejects_bad_shapes_without_touching_state() {
        let (api, ode) = setup();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.build_single(&QUAD, &QUAD_INDICES, None).unwrap();

        expect_invalid(data.build_single(&QUAD, &QUAD_INDICES[..4], None));
        expect_invalid(data.build_single(&QUAD[..10], &QUAD_INDICES, None));
        expect_invalid(data.build_single(&QUAD, &[0, 1, 4], None));
        expect_invalid(data.build_single(&QUAD, &QUAD_INDICES, Some(&QUAD_NORMALS[..3])));

        assert!(data.is_built());
        assert_eq!(2, data.buffer_count());
        assert_eq!(1, api.builds().len());
    }

    #[test]
    fn native_failure_leaves_unbuilt() {
        let (api, ode) = setup();
        let before = live_buffers();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.build_single(&QUAD, &QUAD_INDICES, Some(&QUAD_NORMALS)).unwrap();

        api.fail_builds(true);
        match data.build_single(&QUAD, &QUAD_INDICES, None) {
            Err(Error::Native(name)) => assert_eq!("dGeomTriMeshDataBuildSingle", name),
            other => panic!("unexpected {:?}", other),
        }

        assert_eq!(MeshState::Unbuilt, data.state());
        assert_eq!(0, data.buffer_count());
        assert_eq!(before, live_buffers());
        match data.update() {
            Err(Error::ContractViolation(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        api.fail_builds(false);
        data.build_single(&QUAD, &QUAD_INDICES, None).unwrap();
        assert!(data.is_built());
    }

    #[test]
    fn preprocess_marks_state() {
        let (_api, ode) = setup();
        let mut data = TriMeshData::new(&ode).unwrap();
        match data.preprocess() {
            Err(Error::ContractViolation(_)) => {}
            other => panic!("unexpected {:?}", other),
        }

        data.build_single(&QUAD, &QUAD_INDICES, None).unwrap();
        let vertices = data.vertex_buffer().unwrap().as_ptr();
        data.preprocess().unwrap();

        assert!(data.is_preprocessed());
        assert_eq!(vertices, data.vertex_buffer().unwrap().as_ptr());
        assert_eq!(Some(&QUAD[..]), data.vertex_buffer().unwrap().as_slice::<f32>());

        // a rebuild starts over
        data.build_single(&QUAD, &QUAD_INDICES, None).unwrap();
        assert!(!data.is_preprocessed());
    }

    #[test]
    fn build_after_dispose_is_a_violation() {
        let (_api, ode) = setup();
        let mut data = TriMeshData::new(&ode).unwrap();
        data.dispose();

        assert!(data.raw().is_absent());
        match data.build_single(&QUAD, &QUAD_INDICES, None) {
            Err(Error::ContractViolation(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(0, data.buffer_count());
    }
}
