//! Case-insensitive header collection with incremental line parsing.
//!
//! [`Headers`] stores every field under its lower-cased name. A field that shows up more than once
//! is folded into a single value, joined with `", "` in the order the lines arrived.
//!
//! The [`Headers::parse`] method works on a shared receive buffer: it consumes at most one header
//! line per call and reports exactly how many bytes it used, so the caller can compact its buffer
//! and come back once more bytes are available.

use std::collections::HashMap;
use std::collections::hash_map;

use tracing::trace;

use crate::ensure;
use crate::protocol::ParseError;

const CRLF: &[u8] = b"\r\n";

/// Non alphanumeric characters allowed in a header name (RFC 9110 `tchar`).
const TOKEN_SYMBOLS: &[u8] = b"!#$%&'*+-.^_`|~";

/// A header map keyed by lower-cased field name.
///
/// There is no ordering between entries, the wire format doesn't need one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    inner: HashMap<String, String>,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up a field, the name is matched case-insensitively.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.inner.contains_key(&name.to_ascii_lowercase())
    }

    /// Sets a field, replacing any previous value. Returns the replaced value.
    pub fn insert<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) -> Option<String> {
        self.inner.insert(name.as_ref().to_ascii_lowercase(), value.into())
    }

    /// Adds a field, folding it into an existing value with `", "` if the name is already present.
    pub fn append<K: AsRef<str>, V: Into<String>>(&mut self, name: K, value: V) {
        let value = value.into();
        match self.inner.entry(name.as_ref().to_ascii_lowercase()) {
            hash_map::Entry::Occupied(mut entry) => {
                let existing = entry.get_mut();
                existing.push_str(", ");
                existing.push_str(&value);
            }
            hash_map::Entry::Vacant(entry) => {
                entry.insert(value);
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.inner.remove(&name.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterates `(name, value)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Parses at most one header line from the front of `src`.
    ///
    /// # Returns
    ///
    /// - `Ok((0, false))`: no complete line is buffered yet
    /// - `Ok((2, true))`: `src` starts with the blank line ending the header block
    /// - `Ok((n, done))`: one field was parsed, `n` bytes were consumed. When the blank line
    ///   directly follows the field it is consumed as well and `done` is `true`
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidHeader`] if:
    /// - the line has no `:` or starts with one
    /// - whitespace sits directly before the `:`
    /// - the name is empty or holds a non-token character
    /// - the value isn't valid UTF-8
    pub fn parse(&mut self, src: &[u8]) -> Result<(usize, bool), ParseError> {
        let Some(line_end) = find_crlf(src) else {
            return Ok((0, false));
        };

        if line_end == 0 {
            return Ok((CRLF.len(), true));
        }

        let line = &src[..line_end];
        let colon = line
            .iter()
            .position(|b| *b == b':')
            .ok_or_else(|| ParseError::invalid_header(format!("no ':' found in header line {:?}", String::from_utf8_lossy(line))))?;

        ensure!(colon != 0, ParseError::invalid_header("header line starts with ':'"));
        ensure!(!line[colon - 1].is_ascii_whitespace(), ParseError::invalid_header("whitespace before ':' is not allowed"));

        let name = line[..colon].trim_ascii();
        let value = line[colon + 1..].trim_ascii();

        check_name(name)?;
        let name = String::from_utf8_lossy(name).to_ascii_lowercase();
        let value = std::str::from_utf8(value).map_err(|e| ParseError::invalid_header(format!("value of {name} is not utf-8: {e}")))?;

        trace!(name = %name, value, "parsed header line");
        self.append(name, value);

        let consumed = line_end + CRLF.len();
        if src[consumed..].starts_with(CRLF) {
            return Ok((consumed + CRLF.len(), true));
        }
        Ok((consumed, false))
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut headers = Headers::new();
        for (name, value) in iter {
            headers.insert(name, value);
        }
        headers
    }
}

pub(crate) fn find_crlf(src: &[u8]) -> Option<usize> {
    src.windows(CRLF.len()).position(|window| window == CRLF)
}

fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || TOKEN_SYMBOLS.contains(&b)
}

fn check_name(name: &[u8]) -> Result<(), ParseError> {
    // any non-empty token is a name, single-character names such as `A` included
    ensure!(!name.is_empty(), ParseError::invalid_header("header name is empty"));

    if let Some(b) = name.iter().find(|b| !is_token_char(**b)) {
        return Err(ParseError::invalid_header(format!(
            "header name {:?} has an invalid character {:?}",
            String::from_utf8_lossy(name),
            char::from(*b)
        )));
    }
    Ok(())
}
