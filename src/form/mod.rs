pub mod engine;
pub mod error;
pub mod form_model;
pub mod input_filter;
pub mod payload;
pub mod validation;
