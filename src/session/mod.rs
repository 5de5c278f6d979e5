pub mod session_model;
pub mod store;
