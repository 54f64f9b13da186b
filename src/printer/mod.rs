//! Printers: status lines and compile result reports.

use std::io::{self, Write};

use owo_colors::OwoColorize;

use crate::godbolt::{CompileResponse, OutputLine};

#[derive(Debug, Clone, Copy, Default)]
pub struct ReportPrinter {
    pub color: bool,
}

impl ReportPrinter {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn status<W: Write>(&self, out: &mut W, file: &str, run: bool) -> io::Result<()> {
        let action = if run { "Running" } else { "Compiling" };
        let line = format!("{} {} on Compiler Explorer...", action, file);
        if self.color {
            writeln!(out, "{}", line.cyan())
        } else {
            writeln!(out, "{}", line)
        }
    }

    /// Print `result` and return the compiler's return code.
    ///
    /// A failing runtime code is printed but never returned.
    pub fn report<W: Write>(&self, out: &mut W, result: &CompileResponse) -> io::Result<i32> {
        if result.code != 0 {
            self.notice(out, &format!("Compilation returned {} (not 0)!", result.code))?;
        }
        write_lines(out, &result.stderr)?;
        let runtime_code = result.runtime_code();
        if runtime_code != 0 {
            self.notice(out, &format!("Linking and/or running returned {} (not 0)!", runtime_code))?;
        }
        write_lines(out, result.runtime_stdout())?;
        write_lines(out, result.runtime_stderr())?;
        Ok(result.code)
    }

    fn notice<W: Write>(&self, out: &mut W, text: &str) -> io::Result<()> {
        if self.color {
            writeln!(out, "{}", text.red().bold())
        } else {
            writeln!(out, "{}", text)
        }
    }
}

fn write_lines<W: Write>(out: &mut W, lines: &[OutputLine]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line.text)?;
    }
    Ok(())
}
