//! Text chunking with page tracking
//!
//! Chunks partition the document text: concatenating them in order gives the
//! original text back, byte for byte. No overlap is added between chunks.

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::{ChunkStrategy, ChunkingConfig};
use crate::error::{Error, Result};
use crate::types::{Chunk, Document};

/// Half-open byte range `[start, end)` into the chunked text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Text chunker with a configurable size limit and boundary policy
#[derive(Debug, Clone)]
pub struct TextChunker {
    strategy: ChunkStrategy,
    /// Maximum chunk size in characters
    max_chars: usize,
}

impl TextChunker {
    /// Create a new chunker
    pub fn new(strategy: ChunkStrategy, max_chars: usize) -> Result<Self> {
        if max_chars == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        Ok(Self { strategy, max_chars })
    }

    /// Create from the chunking section of the config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.strategy, config.chunk_size)
    }

    /// Split text into spans covering it exactly, in order
    pub fn split(&self, text: &str) -> Vec<Span> {
        if text.is_empty() {
            return Vec::new();
        }
        let mut spans = Vec::new();
        match self.strategy {
            ChunkStrategy::Fixed => self.split_fixed(text, 0, &mut spans),
            ChunkStrategy::Boundary => self.split_boundary(text, &mut spans),
        }
        spans
    }

    /// Split text and return the chunk strings
    pub fn chunk_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        self.split(text)
            .into_iter()
            .map(|span| &text[span.start..span.end])
            .collect()
    }

    /// Chunk a document, assigning page ranges from the page offsets
    pub fn chunk_document(&self, doc: &Document) -> Vec<Chunk> {
        let text = doc.text();
        let offsets = doc.page_offsets();

        self.split(&text)
            .into_iter()
            .enumerate()
            .map(|(index, span)| Chunk {
                id: Uuid::new_v4(),
                document_id: doc.id,
                filename: doc.filename.clone(),
                content: text[span.start..span.end].to_string(),
                page_start: doc.page_at(&offsets, span.start),
                page_end: doc.page_at(&offsets, span.end - 1),
                char_start: span.start,
                char_end: span.end,
                chunk_index: index as u32,
                embedding: Vec::new(),
            })
            .collect()
    }

    /// Cut every `max_chars` characters, only ever at char boundaries
    fn split_fixed(&self, text: &str, base: usize, spans: &mut Vec<Span>) {
        let mut start = 0;
        let mut count = 0;
        for (idx, _) in text.char_indices() {
            if count == self.max_chars {
                spans.push(Span { start: base + start, end: base + idx });
                start = idx;
                count = 0;
            }
            count += 1;
        }
        if start < text.len() {
            spans.push(Span { start: base + start, end: base + text.len() });
        }
    }

    /// Pack whole paragraphs, falling back to sentences, then to fixed slices
    fn split_boundary(&self, text: &str, spans: &mut Vec<Span>) {
        let mut packer = Packer::new(self.max_chars);

        for (para_start, para) in paragraphs(text) {
            let para_chars = para.chars().count();
            if para_chars <= self.max_chars {
                packer.push(spans, para_start, para_start + para.len(), para_chars);
                continue;
            }

            for (offset, sentence) in para.split_sentence_bound_indices() {
                let start = para_start + offset;
                let chars = sentence.chars().count();
                if chars <= self.max_chars {
                    packer.push(spans, start, start + sentence.len(), chars);
                } else {
                    packer.flush(spans);
                    self.split_fixed(sentence, start, spans);
                }
            }
        }

        packer.flush(spans);
    }
}

/// Greedy accumulator of adjacent segments
struct Packer {
    max_chars: usize,
    current: Option<(Span, usize)>,
}

impl Packer {
    fn new(max_chars: usize) -> Self {
        Self { max_chars, current: None }
    }

    fn push(&mut self, spans: &mut Vec<Span>, start: usize, end: usize, chars: usize) {
        match self.current.as_mut() {
            Some((span, count)) if *count + chars <= self.max_chars => {
                span.end = end;
                *count += chars;
            }
            _ => {
                self.flush(spans);
                self.current = Some((Span { start, end }, chars));
            }
        }
    }

    fn flush(&mut self, spans: &mut Vec<Span>) {
        if let Some((span, _)) = self.current.take() {
            spans.push(span);
        }
    }
}

/// Paragraphs with their byte offsets; each keeps its trailing blank lines
fn paragraphs(text: &str) -> Vec<(usize, &str)> {
    let bytes = text.as_bytes();
    let mut out = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find("\n\n") {
        let mut end = start + pos + 2;
        while end < bytes.len() && bytes[end] == b'\n' {
            end += 1;
        }
        out.push((start, &text[start..end]));
        start = end;
    }
    if start < text.len() {
        out.push((start, &text[start..]));
    }
    out
}
