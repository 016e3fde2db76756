//! Per-unit write buffers for generated GDScript.
//!
//! Every output file is assembled in its own [`Unit`]: a string buffer with
//! tab indentation tracking. When the unit is complete it is flushed into an
//! [`OutputSink`] in one piece, so a failure never leaves a half-written unit
//! behind in the sink (units flushed earlier stay where they are).
//!
//! Indentation is managed with RAII guards. The level lives in an
//! `Rc<Cell<usize>>` so a guard can be held while the writer is borrowed
//! mutably for writes:
//!
//! ```
//! use twirp_godot::codegen::writer::GdWriter;
//!
//! let mut w = GdWriter::new();
//! w.line("func f():");
//! {
//!     let _i = w.indent();
//!     w.line("return 1");
//! }
//! assert_eq!(w.into_string(), "func f():\n\treturn 1\n");
//! ```

use std::cell::Cell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use anyhow::{Context, Result};

/// Destination for finished output units.
pub trait OutputSink {
    fn write_unit(&mut self, name: &str, content: String) -> Result<()>;
}

/// In-memory sink, mostly for tests: `(file name, content)` in write order.
impl OutputSink for Vec<(String, String)> {
    fn write_unit(&mut self, name: &str, content: String) -> Result<()> {
        self.push((name.to_string(), content));
        Ok(())
    }
}

/// A GDScript text buffer that tracks the current indentation level.
#[derive(Debug, Default)]
pub struct GdWriter {
    buf: String,
    indent_level: Rc<Cell<usize>>,
}

impl GdWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Write one line at the current indentation. Empty text produces an
    /// empty line with no trailing tabs.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if !text.is_empty() {
            for _ in 0..self.indent_level.get() {
                self.buf.push('\t');
            }
            self.buf.push_str(text);
        }
        self.buf.push('\n');
    }

    pub fn blank(&mut self) {
        self.buf.push('\n');
    }

    /// Increase indentation while the returned guard is alive.
    pub fn indent(&self) -> IndentGuard {
        self.indent_level.set(self.indent_level.get() + 1);
        IndentGuard {
            indent_level: Rc::clone(&self.indent_level),
        }
    }

    pub fn indent_level(&self) -> usize {
        self.indent_level.get()
    }

    pub fn into_string(self) -> String {
        self.buf
    }
}

pub struct IndentGuard {
    indent_level: Rc<Cell<usize>>,
}

impl Drop for IndentGuard {
    fn drop(&mut self) {
        self.indent_level.set(self.indent_level.get().saturating_sub(1));
    }
}

/// One output file under construction.
pub struct Unit {
    name: String,
    writer: GdWriter,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Unit {
            name: name.into(),
            writer: GdWriter::new(),
        }
    }

    /// Flush the buffer into `sink`, consuming the unit.
    pub fn finish(self, sink: &mut dyn OutputSink) -> Result<()> {
        let content = self.writer.into_string();
        tracing::debug!(unit = %self.name, bytes = content.len(), "writing unit");
        sink.write_unit(&self.name, content)
            .with_context(|| format!("write output unit {:?}", self.name))
    }
}

impl Deref for Unit {
    type Target = GdWriter;

    fn deref(&self) -> &GdWriter {
        &self.writer
    }
}

impl DerefMut for Unit {
    fn deref_mut(&mut self) -> &mut GdWriter {
        &mut self.writer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_indentation() {
        let mut w = GdWriter::new();
        w.line("a");
        {
            let _i = w.indent();
            w.line("b");
            {
                let _j = w.indent();
                w.line("c");
                w.line("");
            }
            w.line("d");
        }
        w.line("e");
        assert_eq!(w.indent_level(), 0);
        assert_eq!(w.into_string(), "a\n\tb\n\t\tc\n\n\td\ne\n");
    }

    #[test]
    fn test_unit_flushes_whole_buffer() {
        let mut sink: Vec<(String, String)> = Vec::new();
        let mut unit = Unit::new("x.gd");
        unit.line("extends Node");
        unit.blank();
        unit.finish(&mut sink).unwrap();
        assert_eq!(sink, vec![("x.gd".to_string(), "extends Node\n\n".to_string())]);
    }

    struct FailingSink;

    impl OutputSink for FailingSink {
        fn write_unit(&mut self, _name: &str, _content: String) -> Result<()> {
            anyhow::bail!("disk full")
        }
    }

    #[test]
    fn test_unit_write_error_names_unit() {
        let unit = Unit::new("broken.gd");
        let err = unit.finish(&mut FailingSink).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("broken.gd"), "{msg}");
        assert!(msg.contains("disk full"), "{msg}");
    }
}
