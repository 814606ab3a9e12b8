//! Config composition: source ordering and defaults.

mod policy;
pub mod service;

pub(crate) use policy::builder_with_defaults;
