//! Writes each chart snapshot as one line of JSON.

use std::io::Write;

use crate::domain::analytics::ChartSnapshot;
use crate::domain::error::TraderError;
use crate::ports::render_port::RenderPort;

pub struct JsonRenderAdapter<W: Write> {
    out: W,
    pretty: bool,
}

impl<W: Write> JsonRenderAdapter<W> {
    pub fn new(out: W) -> Self {
        Self { out, pretty: false }
    }

    /// Indented output; one document per render, separated by newlines.
    pub fn pretty(out: W) -> Self {
        Self { out, pretty: true }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderPort for JsonRenderAdapter<W> {
    fn render(&mut self, snapshot: &ChartSnapshot) -> Result<(), TraderError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.out, snapshot)?;
        } else {
            serde_json::to_writer(&mut self.out, snapshot)?;
        }
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }
}
