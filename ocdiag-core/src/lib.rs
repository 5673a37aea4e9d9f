pub mod catalogue;
pub mod dataset;
pub mod field;
pub mod grid;
pub mod lister;
pub mod operators;
pub mod resolver;

pub mod errors;

pub use catalogue::{Catalogue, CatalogueEntry};
pub use dataset::Dataset;
pub use errors::{DiagError, DiagResult};
pub use field::{AttrValue, Attributes, Field};
pub use operators::{average, derivate, extent_where, integrate, DepthFilter, ExtentCondition};
pub use resolver::{add, Resolver};
