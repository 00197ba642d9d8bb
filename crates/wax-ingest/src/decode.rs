//! Streaming dump decoder
//!
//! Opens a gzip-compressed (or plain) XML dump and exposes it as a pull-based
//! sequence of [`XmlToken`]s. The underlying bytes are read through a
//! bounded-size buffer, so peak memory does not depend on the dump size.
//! Decode failures are terminal for the current file.

use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor, Read};
use std::path::Path;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;

/// Decompression buffer size; one refill per chunk of compressed input.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Result type alias for decoding operations
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Fatal decode failure for the current file.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Decoding cancelled")]
    Cancelled,
}

impl DecodeError {
    /// True when the run stopped because the cancellation token fired rather
    /// than because the input was corrupt.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DecodeError::Cancelled)
    }
}

/// One XML token from the dump stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlToken {
    /// Element start with its attributes in document order
    Start {
        name: String,
        attrs: Vec<(String, String)>,
    },
    /// Text or CDATA content
    Text(String),
    /// Element end
    End(String),
}

/// Incremental XML tokenizer over a buffered byte source.
///
/// Cancellation is cooperative: the token is checked between events, so a
/// cancelled decoder stops promptly without finishing the remaining tokens
/// of the current chunk.
pub struct XmlDecoder<R: BufRead> {
    reader: Reader<R>,
    cancel: CancellationToken,
    buf: Vec<u8>,
    // Synthesized end tag for a self-closing element
    pending_end: Option<String>,
}

/// Decoder over a boxed source, as produced by [`DumpDecoder::open_path`].
pub type DumpDecoder = XmlDecoder<Box<dyn BufRead + Send>>;

impl DumpDecoder {
    /// Open a dump file, unwrapping the gzip envelope when the path ends in
    /// `.gz`.
    pub fn open_path(path: &Path, cancel: CancellationToken) -> Result<DumpDecoder> {
        let file = File::open(path)?;
        let source: Box<dyn BufRead + Send> =
            if path.extension().and_then(|s| s.to_str()) == Some("gz") {
                Box::new(BufReader::with_capacity(CHUNK_SIZE, GzDecoder::new(file)))
            } else {
                Box::new(BufReader::with_capacity(CHUNK_SIZE, file))
            };
        Ok(Self::from_buf_read(source, cancel))
    }
}

impl XmlDecoder<BufReader<GzDecoder<Cursor<Vec<u8>>>>> {
    /// Decode gzip-compressed bytes held in memory.
    pub fn from_gzip_bytes(data: Vec<u8>, cancel: CancellationToken) -> Self {
        let source = BufReader::with_capacity(CHUNK_SIZE, GzDecoder::new(Cursor::new(data)));
        Self::from_buf_read(source, cancel)
    }
}

impl<R: BufRead> XmlDecoder<R> {
    /// Wrap an already-buffered byte source.
    pub fn from_buf_read(source: R, cancel: CancellationToken) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self {
            reader,
            cancel,
            buf: Vec::with_capacity(8192),
            pending_end: None,
        }
    }

    /// Pull the next token, or `None` at end of stream.
    ///
    /// Declarations, comments, and processing instructions are skipped.
    /// Self-closing elements yield a `Start` followed by an `End`.
    pub fn next_token(&mut self) -> Result<Option<XmlToken>> {
        if let Some(name) = self.pending_end.take() {
            return Ok(Some(XmlToken::End(name)));
        }

        loop {
            if self.cancel.is_cancelled() {
                return Err(DecodeError::Cancelled);
            }

            self.buf.clear();
            match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(ref e)) => return Ok(Some(start_token(e)?)),
                Ok(Event::Empty(ref e)) => {
                    let token = start_token(e)?;
                    if let XmlToken::Start { ref name, .. } = token {
                        self.pending_end = Some(name.clone());
                    }
                    return Ok(Some(token));
                },
                Ok(Event::Text(ref t)) => {
                    let text = t.unescape().map_err(quick_xml::Error::from)?;
                    if !text.is_empty() {
                        return Ok(Some(XmlToken::Text(text.into_owned())));
                    }
                },
                Ok(Event::CData(ref c)) => {
                    return Ok(Some(XmlToken::Text(
                        String::from_utf8_lossy(c.as_ref()).into_owned(),
                    )));
                },
                Ok(Event::End(ref e)) => return Ok(Some(XmlToken::End(tag_name(e.name())))),
                Ok(Event::Eof) => return Ok(None),
                Ok(_) => continue,
                Err(e) => return Err(DecodeError::Xml(e)),
            }
        }
    }
}

fn tag_name(name: QName<'_>) -> String {
    String::from_utf8_lossy(name.as_ref()).into_owned()
}

fn start_token(e: &BytesStart<'_>) -> Result<XmlToken> {
    let name = tag_name(e.name());
    let mut attrs = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(quick_xml::Error::from)?
            .into_owned();
        attrs.push((key, value));
    }
    Ok(XmlToken::Start { name, attrs })
}
