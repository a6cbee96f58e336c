//! JSON renderer.

use std::io::{self, Write};

use chrono::{DateTime, Utc};
use dirbundle_core::{BundleSink, Entry, EntryKind};
use serde::Serialize;

/// One structure listing element.
#[derive(Debug, Serialize)]
struct StructureItem<'a> {
    path: &'a str,
    depth: u32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<u64>,
    is_binary: bool,
    is_symlink: bool,
    modified: String,
}

impl<'a> StructureItem<'a> {
    fn new(entry: &Entry<'a>, depth: u32) -> Self {
        let kind = match entry.kind() {
            EntryKind::Directory => "directory",
            EntryKind::File => "file",
            EntryKind::Symlink => "symlink",
            EntryKind::Other => "other",
        };
        Self {
            path: entry.path(),
            depth,
            kind,
            size: (!entry.is_dir()).then(|| entry.size()),
            is_binary: entry.is_binary(),
            is_symlink: entry.is_symlink(),
            modified: DateTime::<Utc>::from(entry.modified()).to_rfc3339(),
        }
    }
}

/// Renders a bundle as a single JSON object:
///
/// ```json
/// {
///   "structure": [ {"path": "src", "depth": 0, "kind": "directory", ...} ],
///   "contents": [ {"path": "src/main.rs", "content": "..."} ]
/// }
/// ```
///
/// Structure items are written as they arrive and content is escaped chunk
/// by chunk, so nothing is buffered beyond a partial UTF-8 sequence. Bytes
/// that are not valid UTF-8 become U+FFFD. A file whose content was cut
/// short is closed with `"truncated": true`.
#[derive(Debug)]
pub struct JsonRenderer<W: Write> {
    out: W,
    items: usize,
    /// Trailing bytes of an incomplete UTF-8 sequence from the last chunk.
    pending: Vec<u8>,
    open_content: bool,
}

impl<W: Write> JsonRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            items: 0,
            pending: Vec::with_capacity(4),
            open_content: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn separator(&mut self) -> io::Result<()> {
        if self.items > 0 {
            self.out.write_all(b",\n")?;
        }
        self.items += 1;
        Ok(())
    }

    fn write_item(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.separator()?;
        self.out.write_all(b"    ")?;
        serde_json::to_writer(&mut self.out, &StructureItem::new(entry, depth))?;
        Ok(())
    }

    /// Close a content string left open by a file without a footer.
    fn close_truncated(&mut self) -> io::Result<()> {
        if self.open_content {
            self.flush_pending()?;
            self.out.write_all(b"\", \"truncated\": true}")?;
            self.open_content = false;
        }
        Ok(())
    }

    fn flush_pending(&mut self) -> io::Result<()> {
        if !self.pending.is_empty() {
            self.pending.clear();
            self.out.write_all("\u{FFFD}".as_bytes())?;
        }
        Ok(())
    }
}

impl<W: Write> BundleSink for JsonRenderer<W> {
    fn begin_document(&mut self) -> io::Result<()> {
        self.out.write_all(b"{\n")
    }

    fn begin_structure(&mut self) -> io::Result<()> {
        self.items = 0;
        self.out.write_all(b"  \"structure\": [\n")
    }

    fn write_directory(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.write_item(entry, depth)
    }

    fn write_file_entry(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.write_item(entry, depth)
    }

    fn end_structure(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n  ]")
    }

    fn begin_content(&mut self) -> io::Result<()> {
        self.items = 0;
        self.out.write_all(b",\n  \"contents\": [\n")
    }

    fn write_file_header(&mut self, entry: &Entry<'_>) -> io::Result<()> {
        self.close_truncated()?;
        self.separator()?;
        self.out.write_all(b"    {\"path\": ")?;
        serde_json::to_writer(&mut self.out, entry.path())?;
        self.out.write_all(b", \"content\": \"")?;
        self.open_content = true;
        Ok(())
    }

    fn write_file_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(data);

        let mut rest = bytes.as_slice();
        loop {
            match std::str::from_utf8(rest) {
                Ok(text) => {
                    write_escaped(&mut self.out, text)?;
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // The prefix was just validated.
                    write_escaped(&mut self.out, std::str::from_utf8(valid).unwrap_or_default())?;
                    match e.error_len() {
                        Some(len) => {
                            self.out.write_all("\u{FFFD}".as_bytes())?;
                            rest = &after[len..];
                        }
                        None => {
                            self.pending.extend_from_slice(after);
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn write_file_footer(&mut self) -> io::Result<()> {
        self.flush_pending()?;
        self.out.write_all(b"\"}")?;
        self.open_content = false;
        Ok(())
    }

    fn end_content(&mut self) -> io::Result<()> {
        self.close_truncated()?;
        self.out.write_all(b"\n  ]")
    }

    fn end_document(&mut self) -> io::Result<()> {
        self.out.write_all(b"\n}\n")?;
        self.out.flush()
    }
}

/// Write `text` with JSON string escaping, without surrounding quotes.
pub fn write_escaped<W: Write + ?Sized>(out: &mut W, text: &str) -> io::Result<()> {
    let mut start = 0;
    for (i, ch) in text.char_indices() {
        let escape: Option<&str> = match ch {
            '"' => Some("\\\""),
            '\\' => Some("\\\\"),
            '\n' => Some("\\n"),
            '\r' => Some("\\r"),
            '\t' => Some("\\t"),
            c if (c as u32) < 0x20 => None,
            _ => continue,
        };
        out.write_all(text[start..i].as_bytes())?;
        match escape {
            Some(seq) => out.write_all(seq.as_bytes())?,
            None => write!(out, "\\u{:04x}", ch as u32)?,
        }
        start = i + ch.len_utf8();
    }
    out.write_all(text[start..].as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dirbundle_core::EntryKind;
    use serde_json::Value;
    use std::path::Path;

    fn escaped(text: &str) -> String {
        let mut out = Vec::new();
        write_escaped(&mut out, text).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_escaping() {
        assert_eq!(escaped("plain"), "plain");
        assert_eq!(escaped("a\"b\\c"), "a\\\"b\\\\c");
        assert_eq!(escaped("line\nnext\ttab\r"), "line\\nnext\\ttab\\r");
        assert_eq!(escaped("\u{1}bell"), "\\u0001bell");
        assert_eq!(escaped("héllo"), "héllo");
    }

    #[test]
    fn test_document_parses() {
        let mut renderer = JsonRenderer::new(Vec::new());
        let dir = Entry::new("d", Path::new("/nonexistent/d"), EntryKind::Directory);
        let file = Entry::new("d/f.txt", Path::new("/nonexistent/d/f.txt"), EntryKind::File)
            .with_size(11)
            .with_binary(false);

        renderer.begin_document().unwrap();
        renderer.begin_structure().unwrap();
        renderer.write_directory(&dir, 0).unwrap();
        renderer.write_file_entry(&file, 1).unwrap();
        renderer.end_structure().unwrap();
        renderer.begin_content().unwrap();
        renderer.write_file_header(&file).unwrap();
        renderer.write_file_chunk(b"say \"hi\"\n").unwrap();
        renderer.write_file_footer().unwrap();
        renderer.end_content().unwrap();
        renderer.end_document().unwrap();

        let doc: Value = serde_json::from_slice(&renderer.into_inner()).unwrap();
        assert_eq!(doc["structure"][0]["kind"], "directory");
        assert!(doc["structure"][0].get("size").is_none());
        assert_eq!(doc["structure"][1]["path"], "d/f.txt");
        assert_eq!(doc["structure"][1]["size"], 11);
        assert_eq!(doc["structure"][1]["depth"], 1);
        assert_eq!(doc["contents"][0]["content"], "say \"hi\"\n");
    }

    #[test]
    fn test_split_utf8_sequence() {
        let mut renderer = JsonRenderer::new(Vec::new());
        let file = Entry::new("u.txt", Path::new("/nonexistent/u.txt"), EntryKind::File);
        let snowman = "☃".as_bytes();

        renderer.begin_content().unwrap();
        renderer.write_file_header(&file).unwrap();
        renderer.write_file_chunk(&snowman[..1]).unwrap();
        renderer.write_file_chunk(&snowman[1..]).unwrap();
        renderer.write_file_chunk(b"\xff!").unwrap();
        renderer.write_file_footer().unwrap();

        let out = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(out.ends_with("\"content\": \"☃\u{FFFD}!\"}"));
    }

    #[test]
    fn test_truncated_file_is_marked() {
        let mut renderer = JsonRenderer::new(Vec::new());
        let a = Entry::new("a", Path::new("/nonexistent/a"), EntryKind::File).with_binary(false);
        let b = Entry::new("b", Path::new("/nonexistent/b"), EntryKind::File).with_binary(false);

        renderer.begin_document().unwrap();
        renderer.begin_structure().unwrap();
        renderer.end_structure().unwrap();
        renderer.begin_content().unwrap();
        renderer.write_file_header(&a).unwrap();
        renderer.write_file_chunk(b"partial").unwrap();
        renderer.write_file_header(&b).unwrap();
        renderer.write_file_footer().unwrap();
        renderer.end_content().unwrap();
        renderer.end_document().unwrap();

        let doc: Value = serde_json::from_slice(&renderer.into_inner()).unwrap();
        assert_eq!(doc["contents"][0]["truncated"], true);
        assert_eq!(doc["contents"][0]["content"], "partial");
        assert!(doc["contents"][1].get("truncated").is_none());
    }

    #[test]
    fn test_document_without_content_section() {
        let mut renderer = JsonRenderer::new(Vec::new());
        renderer.begin_document().unwrap();
        renderer.begin_structure().unwrap();
        renderer.end_structure().unwrap();
        renderer.end_document().unwrap();

        let doc: Value = serde_json::from_slice(&renderer.into_inner()).unwrap();
        assert_eq!(doc["structure"], Value::Array(vec![]));
        assert!(doc.get("contents").is_none());
    }
}
