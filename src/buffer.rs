//! Native-layout copies of caller arrays.
//!
//! ODE keeps the vertex, index and normal pointers it is built from, so the
//! arrays have to live somewhere with a stable address for as long as the mesh
//! data exists. A [`ScratchBuffer`] is that place: allocated once, never moved
//! or resized, freed on release.
use std::alloc::{self, Layout};
use std::cell::Cell;
use std::fmt;
use std::mem;
use std::os::raw::c_void;
use std::ptr::{self, NonNull};
use std::slice;

use log::trace;

use crate::error::Error;
use crate::math::Vector3;
use crate::Result;

thread_local! {
    static LIVE_BUFFERS: Cell<usize> = Cell::new(0);
}

/// Number of scratch buffers allocated and not yet released on this thread.
pub fn live_buffers() -> usize {
    LIVE_BUFFERS.with(Cell::get)
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ElementType {
    F32,
    F64,
    U32,
    Vector3,
}

impl ElementType {
    pub fn size(self) -> usize {
        match self {
            ElementType::F32 => mem::size_of::<f32>(),
            ElementType::F64 => mem::size_of::<f64>(),
            ElementType::U32 => mem::size_of::<u32>(),
            ElementType::Vector3 => mem::size_of::<Vector3>(),
        }
    }

    pub fn align(self) -> usize {
        match self {
            ElementType::F32 => mem::align_of::<f32>(),
            ElementType::F64 => mem::align_of::<f64>(),
            ElementType::U32 => mem::align_of::<u32>(),
            ElementType::Vector3 => mem::align_of::<Vector3>(),
        }
    }

    /// Bytes between consecutive vertices (or triangles, for indices).
    ///
    /// Scalar arrays hold three components per element group; a `Vector3`
    /// is already one whole vertex.
    pub fn stride(self) -> usize {
        match self {
            ElementType::Vector3 => self.size(),
            _ => 3 * self.size(),
        }
    }
}

/// Types that can be copied byte-for-byte into a scratch buffer.
///
/// # Safety
/// `TYPE` must describe the exact size and alignment of the implementing type,
/// and every bit pattern of that size must be a valid value.
pub unsafe trait Element: Copy + 'static {
    const TYPE: ElementType;
}

unsafe impl Element for f32 {
    const TYPE: ElementType = ElementType::F32;
}

unsafe impl Element for f64 {
    const TYPE: ElementType = ElementType::F64;
}

unsafe impl Element for u32 {
    const TYPE: ElementType = ElementType::U32;
}

unsafe impl Element for Vector3 {
    const TYPE: ElementType = ElementType::Vector3;
}

/// Zeroed, fixed-address memory holding one typed array.
pub struct ScratchBuffer {
    ptr: NonNull<u8>,
    len_bytes: usize,
    element_type: ElementType,
    released: bool,
}

impl ScratchBuffer {
    /// Allocates zeroed storage for `count` elements of `element_type`.
    pub fn allocate(element_type: ElementType, count: usize) -> Result<Self> {
        let len_bytes = count
            .checked_mul(element_type.size())
            .ok_or(Error::Allocation { bytes: usize::MAX })?;
        let layout = Layout::from_size_align(len_bytes, element_type.align())
            .map_err(|_| Error::Allocation { bytes: len_bytes })?;

        let ptr = if len_bytes == 0 {
            // never dereferenced, aligned for every element type
            NonNull::<f64>::dangling().cast()
        } else {
            NonNull::new(unsafe { alloc::alloc_zeroed(layout) })
                .ok_or(Error::Allocation { bytes: len_bytes })?
        };

        LIVE_BUFFERS.with(|live| live.set(live.get() + 1));
        trace!("Allocated {} byte {:?} scratch buffer at {:p}", len_bytes, element_type, ptr);

        Ok(Self {
            ptr,
            len_bytes,
            element_type,
            released: false,
        })
    }

    /// Allocates a buffer sized for `src` and copies it in.
    pub fn from_slice<T: Element>(src: &[T]) -> Result<Self> {
        let mut buffer = Self::allocate(T::TYPE, src.len())?;
        buffer.copy_from(src)?;
        Ok(buffer)
    }

    /// Copies `src` into the buffer.
    ///
    /// The array must have the element type and total size the buffer was
    /// allocated with.
    pub fn copy_from<T: Element>(&mut self, src: &[T]) -> Result<()> {
        if self.released {
            return Err(Error::ContractViolation("copy into a released scratch buffer"));
        }
        if T::TYPE != self.element_type {
            return Err(Error::ContractViolation("array element type does not match the scratch buffer"));
        }
        if mem::size_of_val(src) != self.len_bytes {
            return Err(Error::ContractViolation("array size does not match the scratch buffer"));
        }

        unsafe { ptr::copy_nonoverlapping(src.as_ptr() as *const u8, self.ptr.as_ptr(), self.len_bytes) }
        Ok(())
    }

    /// Typed view of the contents. `None` on an element type mismatch or once released.
    pub fn as_slice<T: Element>(&self) -> Option<&[T]> {
        if self.released || T::TYPE != self.element_type {
            return None;
        }
        Some(unsafe { slice::from_raw_parts(self.ptr.as_ptr() as *const T, self.count()) })
    }

    /// Mutable typed view, for editing the contents in place.
    pub fn as_mut_slice<T: Element>(&mut self) -> Option<&mut [T]> {
        if self.released || T::TYPE != self.element_type {
            return None;
        }
        Some(unsafe { slice::from_raw_parts_mut(self.ptr.as_ptr() as *mut T, self.count()) })
    }

    pub fn as_bytes(&self) -> &[u8] {
        if self.released {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len_bytes) }
    }

    /// Address handed to native code. Null once released.
    pub fn as_ptr(&self) -> *const c_void {
        if self.released {
            ptr::null()
        } else {
            self.ptr.as_ptr() as *const c_void
        }
    }

    pub fn len_bytes(&self) -> usize {
        self.len_bytes
    }

    pub fn count(&self) -> usize {
        self.len_bytes / self.element_type.size()
    }

    pub fn element_type(&self) -> ElementType {
        self.element_type
    }

    pub fn stride(&self) -> usize {
        self.element_type.stride()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    /// Frees the storage. Later calls do nothing.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if self.len_bytes > 0 {
            // the layout was validated on allocation
            unsafe {
                let layout = Layout::from_size_align_unchecked(self.len_bytes, self.element_type.align());
                alloc::dealloc(self.ptr.as_ptr(), layout);
            }
        }

        LIVE_BUFFERS.with(|live| live.set(live.get() - 1));
        trace!("Released scratch buffer at {:p}", self.ptr);
    }
}

impl Drop for ScratchBuffer {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for ScratchBuffer {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ScratchBuffer")
            .field("ptr", &self.ptr)
            .field("len_bytes", &self.len_bytes)
            .field("element_type", &self.element_type)
            .field("released", &self.released)
            .finish()
    }
}
