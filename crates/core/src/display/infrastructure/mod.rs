pub mod ffplay_sink;
pub mod image_file_writer;
