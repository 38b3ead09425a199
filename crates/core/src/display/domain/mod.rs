pub mod frame_sink;
pub mod image_writer;
