//! Source preprocessing: inline remote-repository includes from the local checkout.
//!
//! A line such as
//!
//! ```text
//! #include <https://raw.githubusercontent.com/Quuxplusone/coro/master/include/coro/task.h>
//! ```
//!
//! is replaced by the contents of `<dir of input>/../include/coro/task.h`. Every other
//! line is copied with its trailing whitespace removed.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

/// Classification of a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    PassThrough(&'a str),
    /// Path relative to the repository root named by the include URL.
    Substitute(&'a str),
}

#[derive(Debug, Clone)]
pub struct Preprocessor {
    pattern: Regex,
}

impl Preprocessor {
    pub fn new(url_prefix: &str) -> Result<Self> {
        let pattern = Regex::new(&format!("^#include <{}(.*)>", regex::escape(url_prefix)))
            .context("invalid include URL prefix")?;
        Ok(Self { pattern })
    }

    pub fn classify_line<'a>(&self, line: &'a str) -> Line<'a> {
        match self.pattern.captures(line).and_then(|c| c.get(1)) {
            Some(m) => Line::Substitute(m.as_str()),
            None => Line::PassThrough(line),
        }
    }

    /// Build the submitted text from `source`, reading substituted files through `read`.
    ///
    /// Substitution targets resolve against `base_dir/..`, where `base_dir` is the
    /// directory holding the input file.
    pub fn assemble<F>(&self, source: &str, base_dir: &Path, mut read: F) -> Result<String>
    where
        F: FnMut(&Path) -> io::Result<String>,
    {
        let mut out = String::with_capacity(source.len());
        for line in source.lines() {
            match self.classify_line(line) {
                Line::Substitute(rel) => {
                    let target = substitution_target(base_dir, rel);
                    debug!(target = %target.display(), "inlining include");
                    let content = read(&target)
                        .with_context(|| format!("failed to read included file {}", target.display()))?;
                    out.push_str(&content);
                    out.push('\n');
                }
                Line::PassThrough(text) => {
                    out.push_str(text.trim_end());
                    out.push('\n');
                }
            }
        }
        Ok(out)
    }

    /// Read and preprocess the file at `path`.
    ///
    /// Any failure, including a missing include target, carries the input path.
    pub fn preprocess_file(&self, path: &Path) -> Result<String> {
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        read_lossy(path)
            .context("failed to open source file")
            .and_then(|source| self.assemble(&source, base_dir, read_lossy))
            .with_context(|| format!("while preprocessing {}", path.display()))
    }
}

/// Invalid UTF-8 (e.g. a Latin-1 comment) becomes U+FFFD instead of failing the read.
fn read_lossy(path: &Path) -> io::Result<String> {
    let bytes = fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Always below `base_dir/..`, even when the captured path starts with `/`.
fn substitution_target(base_dir: &Path, rel: &str) -> PathBuf {
    base_dir.join("..").join(rel.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_INCLUDE_URL_PREFIX;

    fn preprocessor() -> Preprocessor {
        Preprocessor::new(DEFAULT_INCLUDE_URL_PREFIX).unwrap()
    }

    #[test]
    fn test_classify_include_directive() {
        let pp = preprocessor();
        let line = "#include <https://raw.githubusercontent.com/Quuxplusone/coro/master/include/coro/task.h>";
        assert_eq!(pp.classify_line(line), Line::Substitute("include/coro/task.h"));
    }

    #[test]
    fn test_classify_ordinary_lines() {
        let pp = preprocessor();
        for line in [
            "#include <vector>",
            "#include \"local.h\"",
            "  #include <https://raw.githubusercontent.com/Quuxplusone/coro/master/x.h>",
            "#include <https://example.com/other/x.h>",
            "int main() {}",
        ] {
            assert_eq!(pp.classify_line(line), Line::PassThrough(line));
        }
    }

    #[test]
    fn test_pass_through_strips_trailing_whitespace() {
        let pp = preprocessor();
        let out = pp
            .assemble("int x;   \n\tfoo();\t\n\nbar(); \r\nend", Path::new("/src/examples"), |_| {
                panic!("no include expected")
            })
            .unwrap();
        assert_eq!(out, "int x;\n\tfoo();\n\nbar();\nend\n");
    }

    #[test]
    fn test_substitution_replaces_directive_in_place() {
        let pp = preprocessor();
        let source = "// head\n#include <https://raw.githubusercontent.com/Quuxplusone/coro/master/include/coro/gen.h>\nint main() {}\n";
        let mut requested = Vec::new();
        let out = pp
            .assemble(source, Path::new("/repo/examples"), |p| {
                requested.push(p.to_path_buf());
                Ok("struct gen {};".to_string())
            })
            .unwrap();
        assert_eq!(out, "// head\nstruct gen {};\nint main() {}\n");
        assert_eq!(requested, vec![PathBuf::from("/repo/examples/../include/coro/gen.h")]);
    }

    #[test]
    fn test_substitution_with_leading_slash_stays_under_parent() {
        let pp = preprocessor();
        let mut requested = Vec::new();
        pp.assemble(
            "#include <https://raw.githubusercontent.com/Quuxplusone/coro/master//etc/hostname>\n",
            Path::new("/repo/examples"),
            |p| {
                requested.push(p.to_path_buf());
                Ok(String::new())
            },
        )
        .unwrap();
        assert_eq!(requested, vec![PathBuf::from("/repo/examples/../etc/hostname")]);
    }

    #[test]
    fn test_preprocess_file_keeps_non_utf8_source() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("latin1.cpp");
        fs::write(&input, b"// caf\xe9  \nint main() {}\n").unwrap();

        let out = preprocessor().preprocess_file(&input).unwrap();
        assert_eq!(out, "// caf\u{fffd}\nint main() {}\n");
    }

    #[test]
    fn test_preprocess_file_reads_from_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("include/coro")).unwrap();
        fs::create_dir_all(dir.path().join("examples")).unwrap();
        fs::write(dir.path().join("include/coro/task.h"), "// task header\nstruct task {};\n").unwrap();
        let input = dir.path().join("examples/demo.cpp");
        fs::write(
            &input,
            "#include <https://raw.githubusercontent.com/Quuxplusone/coro/master/include/coro/task.h>\nint main() { }  \n",
        )
        .unwrap();

        let out = preprocessor().preprocess_file(&input).unwrap();
        assert_eq!(out, "// task header\nstruct task {};\n\nint main() { }\n");
    }

    #[test]
    fn test_missing_input_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("nope.cpp");
        let err = preprocessor().preprocess_file(&input).unwrap_err();
        assert!(err.to_string().contains(&input.display().to_string()), "got: {:#}", err);
    }

    #[test]
    fn test_missing_include_target_propagates_with_input_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("examples")).unwrap();
        let input = dir.path().join("examples/demo.cpp");
        fs::write(
            &input,
            "#include <https://raw.githubusercontent.com/Quuxplusone/coro/master/include/coro/missing.h>\n",
        )
        .unwrap();

        let err = preprocessor().preprocess_file(&input).unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains(&input.display().to_string()), "got: {}", chain);
        assert!(chain.contains("missing.h"), "got: {}", chain);
        assert!(err.root_cause().downcast_ref::<io::Error>().is_some());
    }
}
