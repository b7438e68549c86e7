//! Pipeline core: resolution, mapping and job orchestration

pub mod job;
pub mod mapping;
pub mod resolver;
