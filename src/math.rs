use crate::ffi;

/// Scalar type of the native library (`f32`, or `f64` with the `double` feature).
pub type Real = ffi::dReal;

/// Triangle index type.
pub type TriIndex = ffi::dTriIndex;

/// Floating point precision of vertex data.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Precision {
    Single,
    Double,
}

impl Precision {
    /// Precision of [`Real`].
    #[cfg(not(feature = "double"))]
    pub const NATIVE: Precision = Precision::Single;
    #[cfg(feature = "double")]
    pub const NATIVE: Precision = Precision::Double;
}

/// 3D vector laid out like `dVector3` (three components plus one of padding).
///
/// Arrays of this type are handed to native code as-is by
/// [`TriMeshData::build_simple`](crate::mesh::TriMeshData::build_simple).
#[repr(C)]
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct Vector3 {
    pub x: Real,
    pub y: Real,
    pub z: Real,
    _pad: Real,
}

impl Vector3 {
    pub const fn new(x: Real, y: Real, z: Real) -> Self {
        Self { x, y, z, _pad: 0.0 }
    }

    pub fn as_ptr(&self) -> *const Real {
        self as *const Vector3 as *const Real
    }
}

impl From<[Real; 3]> for Vector3 {
    fn from([x, y, z]: [Real; 3]) -> Self {
        Self::new(x, y, z)
    }
}

impl From<Vector3> for [Real; 3] {
    fn from(v: Vector3) -> Self {
        [v.x, v.y, v.z]
    }
}
