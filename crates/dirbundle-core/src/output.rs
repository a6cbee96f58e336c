//! Output boundary the engine emits into.

use std::io;

use crate::entry::Entry;

/// Receiver of one bundling run's output.
///
/// The engine drives the calls in a fixed order:
///
/// ```text
/// begin_document
///   begin_structure  (write_directory | write_file_entry)*  end_structure
///   begin_content    (write_file_header write_file_chunk* write_file_footer?)*  end_content
/// end_document
/// ```
///
/// `write_file_footer` is left out when a file's content was rejected part
/// way through, which is how renderers learn the file was truncated. How
/// any of this is rendered is up to the implementation.
pub trait BundleSink {
    fn begin_document(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn begin_structure(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// A directory accepted by the rule chain, at `depth` (root children are 0).
    fn write_directory(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()>;

    /// Any non-directory entry accepted by the rule chain.
    fn write_file_entry(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()>;

    fn end_structure(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn begin_content(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn write_file_header(&mut self, entry: &Entry<'_>) -> io::Result<()>;

    fn write_file_chunk(&mut self, data: &[u8]) -> io::Result<()>;

    fn write_file_footer(&mut self) -> io::Result<()>;

    fn end_content(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn end_document(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<S: BundleSink + ?Sized> BundleSink for &mut S {
    fn begin_document(&mut self) -> io::Result<()> {
        (**self).begin_document()
    }

    fn begin_structure(&mut self) -> io::Result<()> {
        (**self).begin_structure()
    }

    fn write_directory(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        (**self).write_directory(entry, depth)
    }

    fn write_file_entry(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        (**self).write_file_entry(entry, depth)
    }

    fn end_structure(&mut self) -> io::Result<()> {
        (**self).end_structure()
    }

    fn begin_content(&mut self) -> io::Result<()> {
        (**self).begin_content()
    }

    fn write_file_header(&mut self, entry: &Entry<'_>) -> io::Result<()> {
        (**self).write_file_header(entry)
    }

    fn write_file_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        (**self).write_file_chunk(data)
    }

    fn write_file_footer(&mut self) -> io::Result<()> {
        (**self).write_file_footer()
    }

    fn end_content(&mut self) -> io::Result<()> {
        (**self).end_content()
    }

    fn end_document(&mut self) -> io::Result<()> {
        (**self).end_document()
    }
}
