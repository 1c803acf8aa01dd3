pub mod dataset;
pub mod features;
pub mod records;
pub mod scoring;
