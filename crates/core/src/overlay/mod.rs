pub mod detection_cell;
pub mod infrastructure;
pub mod renderer;
