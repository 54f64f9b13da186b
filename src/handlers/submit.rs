//! Submit handler: preprocess each file, send it to the compiler service, report.

use std::{
    io::Write,
    path::{self, Path, PathBuf},
};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::{
    godbolt::{CompileRequest, CompileService, IncludePaths},
    preprocess::Preprocessor,
    printer::ReportPrinter,
};

pub struct SubmitHandler<S> {
    service: S,
    include_paths: IncludePaths,
    preprocessor: Preprocessor,
    printer: ReportPrinter,
}

impl<S: CompileService> SubmitHandler<S> {
    pub fn new(service: S, preprocessor: Preprocessor, printer: ReportPrinter) -> Self {
        Self {
            service,
            include_paths: IncludePaths::new(),
            preprocessor,
            printer,
        }
    }

    /// Process `files` in order and return the first non-zero compiler status, or 0.
    ///
    /// Files after a failing one are not read or submitted.
    pub async fn run_files<W: Write>(&mut self, out: &mut W, files: &[PathBuf], run: bool) -> Result<i32> {
        for file in files {
            let source = self.preprocessor.preprocess_file(&absolute(file)?)?;
            self.printer.status(out, &file.display().to_string(), run)?;
            let status = self.submit(out, source, run).await?;
            if status != 0 {
                info!(file = %file.display(), status, "stopping after failed compilation");
                return Ok(status);
            }
        }
        Ok(0)
    }

    /// Compile one preprocessed source, print the report, return the compiler status.
    pub async fn submit<W: Write>(&mut self, out: &mut W, source: String, run: bool) -> Result<i32> {
        let flags = self.include_paths.resolve(&self.service).await?;
        let request = CompileRequest::new(source, flags, run);
        let result = self.service.compile(&request).await?;
        debug!(code = result.code, runtime_code = result.runtime_code(), "compile finished");
        Ok(self.printer.report(out, &result)?)
    }
}

/// Write the preprocessed text of each file without contacting the service.
pub fn preprocess_only<W: Write>(preprocessor: &Preprocessor, out: &mut W, files: &[PathBuf]) -> Result<()> {
    for file in files {
        let source = preprocessor.preprocess_file(&absolute(file)?)?;
        out.write_all(source.as_bytes())?;
    }
    Ok(())
}

/// Exit code for a compiler status. Unix keeps only the low byte, so a failing
/// status whose low byte is zero (256, 512, ...) maps to 1.
pub fn exit_code(status: i32) -> i32 {
    if status != 0 && status & 0xff == 0 {
        1
    } else {
        status
    }
}

fn absolute(file: &Path) -> Result<PathBuf> {
    path::absolute(file).with_context(|| format!("cannot resolve path {}", file.display()))
}
