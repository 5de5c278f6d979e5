pub mod api;
pub mod catalog;
pub mod cli;
pub mod form;
pub mod report;
pub mod session;
pub mod submit;
pub mod trace;
pub mod upload;
