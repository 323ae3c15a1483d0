pub mod catalog;
pub mod resolver;
