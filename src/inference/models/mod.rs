pub mod identity;
pub mod linear;
pub mod model;
