pub use crate::backend::NativeApi;
pub use crate::buffer::Element;
pub use crate::handle::OwnerState;
