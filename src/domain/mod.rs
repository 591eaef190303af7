//! Domain logic - pure version rules independent of files and git

pub mod field;
pub mod sigfig;
pub mod source;
pub mod tag;
pub mod version;

pub use field::{FieldAliases, FieldId};
pub use sigfig::SigFig;
pub use source::{PersistTarget, VersionSource};
pub use tag::TagTemplate;
