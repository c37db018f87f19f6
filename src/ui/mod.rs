pub mod input;
pub mod layout;
pub mod render;
pub mod wrap;
