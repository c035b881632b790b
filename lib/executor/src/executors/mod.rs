pub mod common;
pub mod map;
