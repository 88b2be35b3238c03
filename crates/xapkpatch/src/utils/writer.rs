use indicatif::MultiProgress;
use std::io::{self, Write};

/// Routes log lines above the active spinners instead of through them.
pub struct MultiProgressWriter {
    mp: MultiProgress,
}

impl MultiProgressWriter {
    pub fn new(mp: MultiProgress) -> Self {
        Self { mp }
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A hidden target (stdout is not a terminal) drops println output.
        if self.mp.is_hidden() {
            return io::stdout().write(buf);
        }

        let text = String::from_utf8_lossy(buf);
        self.mp.println(text.trim_end_matches('\n'))?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.mp.is_hidden() {
            return io::stdout().flush();
        }

        Ok(())
    }
}
