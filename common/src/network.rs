pub mod proxy;
pub mod range;
pub mod target;
pub mod validate;
