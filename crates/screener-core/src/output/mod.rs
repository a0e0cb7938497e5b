//! Where unique captures end up on disk.

mod naming;
mod writer;

pub use naming::{derive_file_stem, file_name, EXTENSION};
pub use writer::{DirectoryWriter, ResultWriter, TEMP_SUFFIX};
