// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Shared text utilities for line scanning.

/// Check if a byte can start a label (ASCII letter).
#[inline]
pub fn is_label_start(c: u8) -> bool {
    c.is_ascii_alphabetic()
}

/// Check if a byte can continue a label (letter or digit).
#[inline]
pub fn is_label_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
}

/// Check if a byte is whitespace (space, tab, or a stray CR from CRLF input).
#[inline]
pub fn is_space(c: u8) -> bool {
    c == b' ' || c == b'\t' || c == b'\r'
}

/// Split a line into code and comment parts at the first unquoted semicolon.
pub fn split_comment(line: &str) -> (&str, &str) {
    let bytes = line.as_bytes();
    let mut in_string = false;
    for (idx, &c) in bytes.iter().enumerate() {
        match c {
            b'"' => in_string = !in_string,
            b';' if !in_string => return (&line[..idx], &line[idx..]),
            _ => {}
        }
    }
    (line, "")
}

/// A simple cursor for scanning text byte-by-byte.
pub struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Create a new cursor at the start of the input.
    pub fn new(input: &'a str) -> Self {
        Self {
            bytes: input.as_bytes(),
            pos: 0,
        }
    }

    /// Get the current position.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Skip whitespace characters.
    pub fn skip_ws(&mut self) {
        while self.peek().is_some_and(is_space) {
            self.pos += 1;
        }
    }

    /// Peek at the current byte without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    /// Consume and return the current byte.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<u8> {
        let c = self.peek()?;
        self.pos += 1;
        Some(c)
    }

    /// Check whether only whitespace remains.
    pub fn at_end(&self) -> bool {
        self.bytes[self.pos..].iter().all(|&c| is_space(c))
    }

    /// Return the next whitespace-delimited token, advancing past it.
    pub fn take_token(&mut self) -> Option<&'a str> {
        self.skip_ws();
        let start = self.pos;
        while self.peek().is_some_and(|c| !is_space(c)) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        std::str::from_utf8(&self.bytes[start..self.pos]).ok()
    }

    /// Return the remainder of the input from the current position.
    pub fn rest(&self) -> &'a str {
        std::str::from_utf8(&self.bytes[self.pos..]).unwrap_or("")
    }
}

/// Split a payload into comma-separated fields, trimming surrounding
/// whitespace from each. Empty fields are preserved so callers can reject
/// stray commas.
pub fn split_fields(payload: &str) -> Vec<&str> {
    payload.split(',').map(str::trim).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_char_classes() {
        assert!(is_label_start(b'a'));
        assert!(is_label_start(b'Z'));
        assert!(!is_label_start(b'0'));
        assert!(!is_label_start(b'_'));
        assert!(is_label_char(b'7'));
        assert!(!is_label_char(b'_'));
    }

    #[test]
    fn split_comment_respects_strings() {
        assert_eq!(split_comment("mov r1, r2 ; copy"), ("mov r1, r2 ", "; copy"));
        assert_eq!(split_comment("no comment"), ("no comment", ""));
        assert_eq!(
            split_comment(".string \"a;b\" ; real"),
            (".string \"a;b\" ", "; real")
        );
    }

    #[test]
    fn cursor_takes_tokens() {
        let mut cursor = Cursor::new("  LOOP: mov \tr1");
        assert_eq!(cursor.take_token(), Some("LOOP:"));
        assert_eq!(cursor.take_token(), Some("mov"));
        assert_eq!(cursor.take_token(), Some("r1"));
        assert_eq!(cursor.take_token(), None);
        assert!(cursor.at_end());
    }

    #[test]
    fn split_fields_preserves_empties() {
        assert_eq!(split_fields("1, 2 ,3"), vec!["1", "2", "3"]);
        assert_eq!(split_fields("1,,2"), vec!["1", "", "2"]);
        assert_eq!(split_fields("1,"), vec!["1", ""]);
    }
}
