pub mod fs;
pub mod math;
