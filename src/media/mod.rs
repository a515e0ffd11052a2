//! Everything that touches image files: storing uploads, optimizing them for
//! display, and picking what a client should try loading.

pub mod fallback;
pub mod optimize;
pub mod storage;

pub use fallback::{FallbackChain, ImageSource};
pub use optimize::{OptimizeFormat, OptimizeRequest};
pub use storage::MediaStore;
