//! Line-based interactive prompts.

use std::io::{self, BufRead, Stdout, StdinLock, Write};

use ragflow_uploader_core::config::{ConfigField, Prompter};
use ragflow_uploader_core::AppError;

/// Asks on `output`, reads one line per question from `input`.
pub struct LinePrompter<R, W> {
    input: R,
    output: W,
}

impl LinePrompter<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> LinePrompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    fn ask(&mut self, field: ConfigField, current: Option<&str>) -> io::Result<String> {
        match current {
            Some(_) if field.is_secret() => write!(self.output, "{} [keep current]: ", field.label())?,
            Some(value) => write!(self.output, "{} [{}]: ", field.label(), value)?,
            None => write!(self.output, "{}: ", field.label())?,
        }
        self.output.flush()?;
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(line)
    }
}

impl<R: BufRead, W: Write> Prompter for LinePrompter<R, W> {
    fn prompt(
        &mut self,
        field: ConfigField,
        current: Option<String>,
    ) -> Result<Option<String>, AppError> {
        let line = self.ask(field, current.as_deref()).map_err(AppError::Prompt)?;
        let answer = line.trim();
        Ok((!answer.is_empty()).then(|| answer.to_string()))
    }
}
