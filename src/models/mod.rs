pub mod api;
pub mod payload;
