pub mod metadata;
pub mod raw_writer;
pub mod wave_encoder;
