use std::io::{self, BufRead, Write};

/// Line-oriented question/answer loop over any reader and writer.
///
/// Questions and per-event feedback go to `output` (stderr in the binary) so
/// stdout carries only the final report.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Ask a question and read one line. `None` means end of input.
    pub fn ask(&mut self, question: &str) -> io::Result<Option<String>> {
        write!(self.output, "{question}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        loop {
            match self.input.read_line(&mut line) {
                Ok(0) => {
                    writeln!(self.output)?;
                    return Ok(None);
                }
                Ok(_) => return Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
                // Ctrl-C style interrupts retry the read.
                Err(err) if err.kind() == io::ErrorKind::Interrupted => line.clear(),
                Err(err) => return Err(err),
            }
        }
    }

    pub fn say(&mut self, message: impl std::fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{message}")
    }
}
