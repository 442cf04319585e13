//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod batch_repo;
pub mod font_repo;
pub mod render_repo;

pub use batch_repo::BatchRepo;
pub use font_repo::FontRepo;
pub use render_repo::RenderRepo;
