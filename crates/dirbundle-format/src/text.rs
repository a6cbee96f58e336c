//! Plain text renderer.

use std::io::{self, Write};

use dirbundle_core::{BundleSink, Entry};

use crate::RenderOptions;

/// Renders a bundle as an indented listing followed by every file's
/// content under a `// File:` header.
#[derive(Debug)]
pub struct TextRenderer<W: Write> {
    out: W,
    options: RenderOptions,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W, options: RenderOptions) -> Self {
        Self { out, options }
    }

    /// Consume the renderer, returning the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn indent(&mut self, depth: u32) -> io::Result<()> {
        write!(self.out, "{:width$}", "", width = depth as usize * 2)
    }
}

/// Size in KiB, rounded up.
pub fn size_kb(size: u64) -> u64 {
    size.div_ceil(1024)
}

impl<W: Write> BundleSink for TextRenderer<W> {
    fn begin_structure(&mut self) -> io::Result<()> {
        self.out
            .write_all(b"Directory Structure:\n==================\n\n")
    }

    fn write_directory(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.indent(depth)?;
        writeln!(self.out, "📁 {}/", entry.path())
    }

    fn write_file_entry(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.indent(depth)?;
        if self.options.show_size {
            writeln!(self.out, "📄 [{} KB] {}", size_kb(entry.size()), entry.path())
        } else {
            writeln!(self.out, "📄 {}", entry.path())
        }
    }

    fn begin_content(&mut self) -> io::Result<()> {
        self.out.write_all(b"\nFile Contents:\n=============\n\n")
    }

    fn write_file_header(&mut self, entry: &Entry<'_>) -> io::Result<()> {
        writeln!(self.out, "// File: {}", entry.path())
    }

    fn write_file_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.out.write_all(data)
    }

    fn write_file_footer(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n\n")
    }

    fn end_document(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}
