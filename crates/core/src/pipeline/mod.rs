pub mod frame_analyzer;
pub mod live_preview_use_case;
