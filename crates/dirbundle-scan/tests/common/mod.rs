#![allow(dead_code)]

use std::fs;
use std::io;
use std::path::Path;

use dirbundle_core::{BundleSink, Entry};

/// One call made on the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Directory(String, u32),
    File(String, u32),
    Header(String),
    Chunk(Vec<u8>),
    Footer,
}

/// Sink recording every call in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<Event>,
    pub documents: usize,
}

impl RecordingSink {
    pub fn listed(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Directory(p, _) => Some(format!("{p}/")),
                Event::File(p, _) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn headers(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Header(p) => Some(p.clone()),
                _ => None,
            })
            .collect()
    }

    /// Concatenated chunks emitted for `path`.
    pub fn content_of(&self, path: &str) -> Option<Vec<u8>> {
        let start = self
            .events
            .iter()
            .position(|e| matches!(e, Event::Header(p) if p == path))?;
        let mut out = Vec::new();
        for event in &self.events[start + 1..] {
            match event {
                Event::Chunk(data) => out.extend_from_slice(data),
                _ => break,
            }
        }
        Some(out)
    }

    /// Whether the content of `path` was closed with a footer.
    pub fn has_footer(&self, path: &str) -> bool {
        let Some(start) = self
            .events
            .iter()
            .position(|e| matches!(e, Event::Header(p) if p == path))
        else {
            return false;
        };
        self.events[start + 1..]
            .iter()
            .find(|e| !matches!(e, Event::Chunk(_)))
            .is_some_and(|e| *e == Event::Footer)
    }

    pub fn chunk_sizes(&self) -> Vec<usize> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Chunk(data) => Some(data.len()),
                _ => None,
            })
            .collect()
    }
}

impl BundleSink for RecordingSink {
    fn begin_document(&mut self) -> io::Result<()> {
        self.documents += 1;
        Ok(())
    }

    fn write_directory(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.events.push(Event::Directory(entry.path().to_string(), depth));
        Ok(())
    }

    fn write_file_entry(&mut self, entry: &Entry<'_>, depth: u32) -> io::Result<()> {
        self.events.push(Event::File(entry.path().to_string(), depth));
        Ok(())
    }

    fn write_file_header(&mut self, entry: &Entry<'_>) -> io::Result<()> {
        self.events.push(Event::Header(entry.path().to_string()));
        Ok(())
    }

    fn write_file_chunk(&mut self, data: &[u8]) -> io::Result<()> {
        self.events.push(Event::Chunk(data.to_vec()));
        Ok(())
    }

    fn write_file_footer(&mut self) -> io::Result<()> {
        self.events.push(Event::Footer);
        Ok(())
    }
}

/// Create `rel` under `root` with `contents`, making parent directories.
pub fn write(root: &Path, rel: &str, contents: impl AsRef<[u8]>) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, contents).unwrap();
}
