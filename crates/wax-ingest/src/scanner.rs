//! Generic record scanner
//!
//! Drives a decoder, locates entity-root elements, applies the kind's
//! mapper, and yields validated records. Per-record mapping failures are
//! logged and skipped; only stream exhaustion or a fatal decode error stops
//! the scan.

use crate::decode::{DecodeError, XmlDecoder, XmlToken};
use crate::mapper::{DumpRecord, MappingError};
use std::io::BufRead;
use std::marker::PhantomData;
use tracing::warn;

/// Lazy cursor over one dump file's records of a single kind.
///
/// Usage follows the scan/next protocol:
///
/// ```ignore
/// let mut scanner = RecordScanner::<Release, _>::new(decoder);
/// while scanner.scan() {
///     store.upsert(scanner.next());
/// }
/// if let Some(err) = scanner.err() { /* fatal decode failure */ }
/// ```
pub struct RecordScanner<T: DumpRecord, R: BufRead> {
    decoder: XmlDecoder<R>,
    current: Option<T>,
    errors: Vec<MappingError>,
    fatal: Option<DecodeError>,
    elements_seen: u64,
    finished: bool,
    _kind: PhantomData<T>,
}

impl<T: DumpRecord, R: BufRead> RecordScanner<T, R> {
    pub fn new(decoder: XmlDecoder<R>) -> Self {
        Self {
            decoder,
            current: None,
            errors: Vec::new(),
            fatal: None,
            elements_seen: 0,
            finished: false,
            _kind: PhantomData,
        }
    }

    /// Advance to the next valid record.
    ///
    /// Returns `true` with the cursor positioned on a decoded record, or
    /// `false` when the stream is exhausted or decoding failed fatally
    /// (check [`err`](Self::err) to tell the two apart). Malformed
    /// individual elements do not stop the scan: they are recorded in
    /// [`errors`](Self::errors), discarded, and skipped.
    pub fn scan(&mut self) -> bool {
        self.current = None;
        if self.finished {
            return false;
        }

        loop {
            let token = match self.decoder.next_token() {
                Ok(Some(token)) => token,
                Ok(None) => {
                    self.finished = true;
                    return false;
                },
                Err(e) => {
                    self.finished = true;
                    self.fatal = Some(e);
                    return false;
                },
            };

            let (name, attrs) = match token {
                XmlToken::Start { name, attrs } if name == T::root_tag() => (name, attrs),
                // Container roots and stray text between entries.
                _ => continue,
            };

            self.elements_seen += 1;
            let element = match crate::element::Element::collect(&mut self.decoder, name, attrs) {
                Ok(element) => element,
                Err(e) => {
                    self.finished = true;
                    self.fatal = Some(e);
                    return false;
                },
            };

            match T::from_element(&element) {
                Ok(record) => {
                    self.current = Some(record);
                    return true;
                },
                Err(e) => {
                    warn!(kind = %e.kind, id = %e.id, field = %e.field, "skipping malformed entry: {e}");
                    self.errors.push(e);
                },
            }
        }
    }

    /// The record established by the most recent successful [`scan`](Self::scan).
    ///
    /// # Panics
    ///
    /// Calling this without a preceding successful `scan`, or twice for one
    /// `scan`, is a scanner-protocol violation (a programming defect, not a
    /// data error) and panics.
    pub fn next(&mut self) -> T {
        self.current
            .take()
            .expect("RecordScanner::next called without a successful scan")
    }

    /// Terminal decode error, if `scan` returned `false` for a fatal reason
    /// rather than exhaustion.
    pub fn err(&self) -> Option<&DecodeError> {
        self.fatal.as_ref()
    }

    /// Accumulated per-record mapping failures, in document order. Available
    /// at any time during or after the scan.
    pub fn errors(&self) -> &[MappingError] {
        &self.errors
    }

    /// Root elements encountered so far, valid and malformed alike.
    pub fn elements_seen(&self) -> u64 {
        self.elements_seen
    }

    /// Tear down into the run's bookkeeping: elements seen, mapping errors,
    /// and the terminal decode error if any.
    pub(crate) fn finish(self) -> (u64, Vec<MappingError>, Option<DecodeError>) {
        (self.elements_seen, self.errors, self.fatal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::XmlDecoder;
    use crate::models::{Artist, Release};
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tokio_util::sync::CancellationToken;

    fn gzip(content: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    fn release_scanner(
        xml: &str,
    ) -> RecordScanner<Release, impl std::io::BufRead> {
        RecordScanner::new(XmlDecoder::from_gzip_bytes(
            gzip(xml),
            CancellationToken::new(),
        ))
    }

    #[test]
    fn test_scan_yields_each_record() {
        let mut scanner = release_scanner(
            r#"<releases>
                 <release id="1"><title>One</title></release>
                 <release id="2"><title>Two</title></release>
               </releases>"#,
        );

        assert!(scanner.scan());
        assert_eq!(scanner.next().title, "One");
        assert!(scanner.scan());
        assert_eq!(scanner.next().title, "Two");
        assert!(!scanner.scan());
        assert!(scanner.err().is_none());
        assert_eq!(scanner.elements_seen(), 2);
    }

    #[test]
    fn test_malformed_entry_is_skipped_not_fatal() {
        let mut scanner = release_scanner(
            r#"<releases>
                 <release id="1"><title>Good</title></release>
                 <release id="abc"><title>Bad</title></release>
                 <release id="3"><title>Also Good</title></release>
               </releases>"#,
        );

        assert!(scanner.scan());
        assert_eq!(scanner.next().id, 1);
        // scan steps over the malformed entry and lands on the next valid one
        assert!(scanner.scan());
        assert_eq!(scanner.next().id, 3);
        assert!(!scanner.scan());

        assert_eq!(scanner.errors().len(), 1);
        assert_eq!(scanner.errors()[0].id, "abc");
        assert_eq!(scanner.elements_seen(), 3);
        assert!(scanner.err().is_none());
    }

    #[test]
    fn test_all_entries_malformed() {
        let mut scanner =
            release_scanner(r#"<releases><release><title>No Id</title></release></releases>"#);
        assert!(!scanner.scan());
        assert_eq!(scanner.errors().len(), 1);
        assert!(scanner.err().is_none());
    }

    #[test]
    fn test_fatal_decode_error_reported() {
        let full = gzip(r#"<releases><release id="1"><title>A</title></release><release id="2">"#);
        let truncated = full[..full.len() - 8].to_vec();
        let mut scanner: RecordScanner<Release, _> = RecordScanner::new(
            XmlDecoder::from_gzip_bytes(truncated, CancellationToken::new()),
        );

        let mut stored = 0;
        while scanner.scan() {
            scanner.next();
            stored += 1;
        }
        assert!(scanner.err().is_some());
        assert!(stored <= 1);
    }

    #[test]
    fn test_ignores_other_kinds_tags() {
        // An artists file scanned for releases yields nothing
        let mut scanner = release_scanner(
            "<artists><artist><id>1</id><name>Someone</name></artist></artists>",
        );
        assert!(!scanner.scan());
        assert_eq!(scanner.elements_seen(), 0);
        assert!(scanner.errors().is_empty());
    }

    #[test]
    fn test_artist_scanner_generic_over_kind() {
        let mut scanner: RecordScanner<Artist, _> = RecordScanner::new(
            XmlDecoder::from_gzip_bytes(
                gzip("<artists><artist><id>42</id><name>Fela</name></artist></artists>"),
                CancellationToken::new(),
            ),
        );
        assert!(scanner.scan());
        let artist = scanner.next();
        assert_eq!(artist.id, 42);
        assert_eq!(artist.name, "Fela");
    }

    #[test]
    #[should_panic(expected = "without a successful scan")]
    fn test_next_without_scan_panics() {
        let mut scanner = release_scanner("<releases></releases>");
        let _ = scanner.next();
    }

    #[test]
    #[should_panic(expected = "without a successful scan")]
    fn test_next_after_exhaustion_panics() {
        let mut scanner = release_scanner("<releases></releases>");
        assert!(!scanner.scan());
        let _ = scanner.next();
    }
}
