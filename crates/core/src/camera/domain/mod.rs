pub mod camera_source;
pub mod frame_pool;
pub mod latest_frame_cell;
