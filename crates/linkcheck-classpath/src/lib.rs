//! Classpath assembly (component C) and the lazy, cached class lookup
//! built on top of it (component F).

pub mod archive;
pub mod builder;
pub mod repository;

pub use archive::Archive;
pub use builder::{build, Candidate, ClassPathResult, ClasspathEntry, UnselectedAlternative};
pub use repository::{is_system_class, ClassLookup, ClassRepository, Hit};
