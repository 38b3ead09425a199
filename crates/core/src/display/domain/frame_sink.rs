use crate::shared::frame::Frame;

/// Receives annotated preview frames for display.
///
/// A `write` error means the viewer is gone (e.g. the preview window was
/// closed); the pipeline treats it as a clean end of the run.
pub trait FrameSink: Send {
    fn open(&mut self, width: u32, height: u32, fps: u32) -> Result<(), Box<dyn std::error::Error>>;

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>>;

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>>;
}

/// Sink that discards all frames.
///
/// Used for snapshot runs (where only the saved file matters) and in tests.
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn open(
        &mut self,
        _width: u32,
        _height: u32,
        _fps: u32,
    ) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn write(&mut self, _frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        Ok(())
    }
}
