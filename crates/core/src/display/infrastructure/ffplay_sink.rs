use std::io::Write;
use std::process::{Child, Command, Stdio};

use crate::display::domain::frame_sink::FrameSink;
use crate::shared::frame::Frame;

/// Live preview window backed by an `ffplay` child process.
///
/// Raw RGB24 frames are piped to ffplay's stdin; closing the window ends the
/// pipe, which surfaces as a write error and stops the preview loop.
pub struct FfplaySink {
    child: Option<Child>,
}

impl FfplaySink {
    pub fn new() -> Self {
        Self { child: None }
    }
}

impl Default for FfplaySink {
    fn default() -> Self {
        Self::new()
    }
}

fn ffplay_args(width: u32, height: u32, fps: u32) -> Vec<String> {
    vec![
        "-f".into(),
        "rawvideo".into(),
        "-pixel_format".into(),
        "rgb24".into(),
        "-video_size".into(),
        format!("{width}x{height}"),
        "-framerate".into(),
        fps.to_string(),
        "-window_title".into(),
        "faceview".into(),
        "-fflags".into(),
        "nobuffer".into(),
        "-flags".into(),
        "low_delay".into(),
        "-".into(),
    ]
}

impl FrameSink for FfplaySink {
    fn open(&mut self, width: u32, height: u32, fps: u32) -> Result<(), Box<dyn std::error::Error>> {
        let child = Command::new("ffplay")
            .args(ffplay_args(width, height, fps))
            .stdin(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| format!("failed to start ffplay (is it installed?): {e}"))?;
        self.child = Some(child);
        Ok(())
    }

    fn write(&mut self, frame: &Frame) -> Result<(), Box<dyn std::error::Error>> {
        let child = self.child.as_mut().ok_or("preview sink is not open")?;
        let stdin = child.stdin.as_mut().ok_or("ffplay stdin unavailable")?;
        stdin.write_all(frame.data())?;
        Ok(())
    }

    fn close(&mut self) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(mut child) = self.child.take() {
            drop(child.stdin.take());
            child.wait()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_carry_format_and_size() {
        let args = ffplay_args(640, 480, 30);
        assert!(args.contains(&"rawvideo".to_string()));
        assert!(args.contains(&"rgb24".to_string()));
        assert!(args.contains(&"640x480".to_string()));
        assert!(args.contains(&"30".to_string()));
        assert_eq!(args.last().unwrap(), "-");
    }

    #[test]
    fn test_write_before_open_errors() {
        let mut sink = FfplaySink::new();
        let frame = Frame::new(
            vec![0u8; 12],
            2,
            2,
            crate::shared::frame::Rotation::Deg0,
        );
        assert!(sink.write(&frame).is_err());
    }

    #[test]
    fn test_close_without_open_is_ok() {
        let mut sink = FfplaySink::new();
        assert!(sink.close().is_ok());
    }
}
