pub mod capture_writer;
pub mod events;
pub mod recorder;
