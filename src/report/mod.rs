pub mod console;
pub mod feedback;
