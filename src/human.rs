//! Human boundary: multiline submissions and yes/no decisions.
use anyhow::{anyhow, Context, Result};
use std::io::{self, BufRead, Write};

/// Line that ends a multiline submission (case-insensitive).
pub const DONE_SENTINEL: &str = "//done";

/// Blocking source of input lines. `None` means the input is closed.
pub trait InputSource {
    fn next_line(&mut self) -> Result<Option<String>>;
    fn show(&mut self, text: &str) -> Result<()>;
}

pub trait HumanInput {
    /// Lines up to the sentinel or end of input, joined with newlines.
    fn collect_multiline_text(&mut self, prompt: &str) -> Result<String>;
    /// Re-asks until the answer is yes or no.
    fn collect_yes_no(&mut self, prompt: &str) -> Result<bool>;
    fn notify(&mut self, text: &str) -> Result<()>;
}

impl<S: InputSource> HumanInput for S {
    fn collect_multiline_text(&mut self, prompt: &str) -> Result<String> {
        self.show(&format!("{prompt}\n(finish with a line containing {DONE_SENTINEL})"))?;
        let mut lines = Vec::new();
        while let Some(line) = self.next_line()? {
            if line.trim().eq_ignore_ascii_case(DONE_SENTINEL) {
                break;
            }
            lines.push(line);
        }
        Ok(lines.join("\n").trim().to_string())
    }

    fn collect_yes_no(&mut self, prompt: &str) -> Result<bool> {
        loop {
            self.show(&format!("{prompt} (yes/no)"))?;
            let line = self
                .next_line()?
                .ok_or_else(|| anyhow!("input closed while waiting for yes/no answer"))?;
            match line.trim().to_ascii_lowercase().as_str() {
                "yes" | "y" => return Ok(true),
                "no" | "n" => return Ok(false),
                other => self.show(&format!("Please answer yes or no (got {other:?})."))?,
            }
        }
    }

    fn notify(&mut self, text: &str) -> Result<()> {
        self.show(text)
    }
}

/// Line-oriented console over any reader/writer pair.
pub struct Console<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    #[cfg(test)]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl Console<io::StdinLock<'static>, io::Stderr> {
    /// Reads stdin and prompts on stderr, leaving stdout for the report.
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> InputSource for Console<R, W> {
    fn next_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).context("read input line")?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\n', '\r']).to_string()))
    }

    fn show(&mut self, text: &str) -> Result<()> {
        writeln!(self.writer, "{text}").context("write prompt")?;
        self.writer.flush().context("flush prompt")
    }
}
