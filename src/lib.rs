//! Resource ownership and trimesh data marshaling for the ODE physics engine.
//!
//! Native calls go through a [`backend::NativeApi`]. Enable the `native` feature
//! to call a system-installed libode, or configure a backend explicitly with
//! [`OdeConfig::backend`](ode::OdeConfig::backend).
pub use ffi;

// reexports
pub use body::Body;
pub use buffer::ScratchBuffer;
pub use error::{Error, Result};
pub use handle::{NativeHandle, Ownership, RawHandle, RawId};
pub use math::{Precision, Real, TriIndex, Vector3};
pub use mesh::{BuildVariant, TriMeshData, Vertices};
pub use ode::{Ode, OdeConfig};
pub use space::{Space, SpaceKind};
pub use world::World;

pub mod backend;
pub mod body;
pub mod buffer;
pub mod error;
pub mod handle;
pub mod math;
pub mod mesh;
pub mod ode;
pub mod prelude;
pub mod space;
pub mod world;
