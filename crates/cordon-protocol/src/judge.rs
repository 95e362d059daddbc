//! [`Judge`] over a text stream.

use std::io::{BufRead, Write};

use cordon_core::{Judge, Observation, ProtocolError};
use tracing::trace;

use crate::codec::{Handshake, Request, TokenReader};

/// Talks to an external judge process.
///
/// Every command is flushed before the reply is read; the judge answers
/// `ADDMED` and `WAITTIME` with a status where `0` means accepted.
pub struct LineJudge<R: BufRead, W: Write> {
    reader: TokenReader<R>,
    writer: W,
    requests: u64,
}

impl<R: BufRead, W: Write> LineJudge<R, W> {
    /// Wrap the judge's output (`reader`) and input (`writer`).
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: TokenReader::new(reader),
            writer,
            requests: 0,
        }
    }

    /// Read the opening message. Call once, before any command.
    pub fn handshake(&mut self) -> Result<Handshake, ProtocolError> {
        self.reader.read_handshake()
    }

    /// Commands sent so far.
    pub fn requests(&self) -> u64 {
        self.requests
    }

    /// Give back the writer, e.g. to inspect what was sent.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn send(&mut self, request: Request) -> Result<(), ProtocolError> {
        trace!(?request, "send");
        request.write_to(&mut self.writer)?;
        self.writer.flush()?;
        self.requests += 1;
        Ok(())
    }

    fn expect_ok(&mut self, command: &'static str) -> Result<(), ProtocolError> {
        let status: i64 = self.reader.parse("status")?;
        if status != 0 {
            return Err(ProtocolError::Rejected { command, status });
        }
        Ok(())
    }
}

impl<R: BufRead, W: Write> Judge for LineJudge<R, W> {
    fn add_med(&mut self, x: u32, y: u32) -> Result<(), ProtocolError> {
        let request = Request::AddMed { x, y };
        self.send(request)?;
        self.expect_ok(request.name())
    }

    fn observe(&mut self) -> Result<Observation, ProtocolError> {
        self.send(Request::Observe)?;
        self.reader.read_grid()
    }

    fn wait_time(&mut self, turns: u32) -> Result<(), ProtocolError> {
        let request = Request::WaitTime(turns);
        self.send(request)?;
        self.expect_ok(request.name())
    }

    fn finish(&mut self) -> Result<(), ProtocolError> {
        self.send(Request::End)
    }
}
