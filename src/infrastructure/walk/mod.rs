//! Directory walker implementations

mod walkdir_walker;

pub use walkdir_walker::WalkdirWalker;
