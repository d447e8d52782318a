// ==========================================
// 船舶离线报表系统 - Lookup Catalog
// ==========================================

pub mod builder;
pub mod model;

pub use builder::LookupCatalogBuilder;
pub use model::{pivot_notes, LookupCatalog, NotePivot};
