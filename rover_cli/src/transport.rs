//! Serial transport: line-oriented frame source over `serialport`.
//!
//! The port is opened 8N1 with a short read timeout so a quiet line costs
//! the control loop almost nothing; a `TimedOut` read is simply "no bytes
//! yet". Writes go through a cloned handle so telemetry and input share the
//! one device.

use std::io::Read;
use std::time::Duration;

use eyre::WrapErr;
use rover_core::FrameSource;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};

/// Open the device 8N1 at the configured baud rate.
pub fn open_port(path: &str, baud: u32) -> eyre::Result<Box<dyn SerialPort>> {
    let port = serialport::new(path, baud)
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(FlowControl::None)
        .timeout(Duration::from_millis(5))
        .open()
        .wrap_err_with(|| format!("open serial port {path}"))?;
    tracing::info!(path, baud, "serial port open");
    Ok(port)
}

/// Accumulates raw bytes from any reader into newline-terminated frames.
/// `TimedOut` from the underlying reader means "no bytes yet", matching the
/// short-timeout serial configuration above.
pub struct LineSource<R: Read> {
    reader: R,
    buf: Vec<u8>,
}

pub type SerialLineSource = LineSource<Box<dyn SerialPort>>;

impl<R: Read> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(128),
        }
    }

    fn take_line(&mut self) -> Option<String> {
        let nl = self.buf.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = self.buf.drain(..=nl).collect();
        let line = String::from_utf8_lossy(&raw);
        Some(line.trim_end_matches(['\n', '\r']).to_string())
    }
}

impl<R: Read> FrameSource for LineSource<R> {
    fn poll_line(&mut self) -> std::io::Result<Option<String>> {
        // A frame may already be buffered from a previous chunk
        if let Some(line) = self.take_line() {
            return Ok(Some(line));
        }
        let mut chunk = [0u8; 256];
        match self.reader.read(&mut chunk) {
            Ok(0) => Ok(None),
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(self.take_line())
            }
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Reader that hands out one preset chunk per read, then times out.
    struct ChunkedReader {
        chunks: VecDeque<Vec<u8>>,
    }

    impl ChunkedReader {
        fn new(chunks: &[&[u8]]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
            }
        }
    }

    impl Read for ChunkedReader {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    out[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(io::ErrorKind::TimedOut, "quiet line")),
            }
        }
    }

    #[test]
    fn reassembles_split_frames() {
        let mut src = LineSource::new(ChunkedReader::new(&[
            b"FORW",
            b"ARD,5,meter\r\nSTOP,0",
            b",none\n",
        ]));
        assert_eq!(src.poll_line().unwrap(), None);
        assert_eq!(src.poll_line().unwrap().as_deref(), Some("FORWARD,5,meter"));
        assert_eq!(src.poll_line().unwrap().as_deref(), Some("STOP,0,none"));
        assert_eq!(src.poll_line().unwrap(), None);
    }

    #[test]
    fn buffered_second_line_needs_no_new_bytes() {
        let mut src = LineSource::new(ChunkedReader::new(&[b"A,1,x\nB,2,y\n"]));
        assert_eq!(src.poll_line().unwrap().as_deref(), Some("A,1,x"));
        assert_eq!(src.poll_line().unwrap().as_deref(), Some("B,2,y"));
    }

    #[test]
    fn timeout_is_not_an_error() {
        let mut src = LineSource::new(ChunkedReader::new(&[]));
        assert_eq!(src.poll_line().unwrap(), None);
    }
}
