pub mod platform;
pub mod post;
pub mod product;
