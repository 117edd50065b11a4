// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Macro preprocessor: collects mcro/mcrend definitions and substitutes call
// sites with the stored body lines.

use std::collections::HashMap;

use crate::core::error::{Diagnostic, ErrorKind, Severity};
use crate::core::instruction::is_reserved_name;
use crate::core::text_utils::Cursor;

/// Maximum source line length, excluding the line terminator.
pub const MAX_LINE_LENGTH: usize = 80;

const MACRO_START: &str = "mcro";
// Both terminator spellings are accepted; both are reserved names.
const MACRO_END: &str = "mcrend";
const MACRO_END_ALT: &str = "endmcro";

#[derive(Debug, Clone)]
struct Macro {
    body: Vec<String>,
}

enum State {
    Idle,
    Collecting { name: String, body: Vec<String> },
}

/// Whole-file macro expander. Owns the macro table for the duration of one
/// file; a fresh instance is created per source file.
#[derive(Default)]
pub struct Preprocessor {
    macros: HashMap<String, Macro>,
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expand `lines` into macro-free output. On failure every offending
    /// line is reported with `file` and its 1-based line number; no partial
    /// output is returned.
    pub fn expand(&mut self, file: &str, lines: &[String]) -> Result<Vec<String>, Vec<Diagnostic>> {
        let mut out = Vec::new();
        let mut diagnostics = Vec::new();
        let mut state = State::Idle;

        for (idx, raw) in lines.iter().enumerate() {
            let line_no = idx as u32 + 1;
            let line = raw.trim_end_matches(['\n', '\r']);
            if line.len() > MAX_LINE_LENGTH {
                diagnostics.push(error(file, line_no, ErrorKind::LineTooLong, None));
                continue;
            }

            let mut cursor = Cursor::new(line);
            let first = cursor.take_token();

            match &mut state {
                State::Idle => match first {
                    Some(MACRO_START) => {
                        match self.parse_definition_header(&mut cursor) {
                            Ok(name) => state = State::Collecting {
                                name,
                                body: Vec::new(),
                            },
                            Err((kind, param)) => {
                                diagnostics.push(error(file, line_no, kind, param));
                            }
                        }
                    }
                    Some(MACRO_END) | Some(MACRO_END_ALT) => {
                        // Terminator with no open definition.
                        diagnostics.push(error(
                            file,
                            line_no,
                            ErrorKind::InvalidMacroName,
                            first.map(str::to_string),
                        ));
                    }
                    Some(name) if self.macros.contains_key(name) && cursor.at_end() => {
                        let body = &self.macros[name].body;
                        out.extend(body.iter().cloned());
                    }
                    _ => out.push(line.to_string()),
                },
                State::Collecting { name, body } => match first {
                    Some(MACRO_END) | Some(MACRO_END_ALT) => {
                        if !cursor.at_end() {
                            diagnostics.push(error(
                                file,
                                line_no,
                                ErrorKind::TokenAfterMacro,
                                Some(cursor.rest().trim().to_string()),
                            ));
                        }
                        self.macros.insert(
                            std::mem::take(name),
                            Macro {
                                body: std::mem::take(body),
                            },
                        );
                        state = State::Idle;
                    }
                    Some(MACRO_START) => {
                        // Nested definitions are not permitted.
                        diagnostics.push(error(file, line_no, ErrorKind::InvalidMacroName, None));
                    }
                    _ => body.push(line.to_string()),
                },
            }
        }

        if let State::Collecting { name, .. } = state {
            // Unterminated definition at end of file.
            diagnostics.push(error(file, 0, ErrorKind::InvalidMacroName, Some(name)));
        }

        if diagnostics.is_empty() {
            Ok(out)
        } else {
            Err(diagnostics)
        }
    }

    /// Parse the rest of a `mcro` line: exactly one unreserved, fresh name.
    fn parse_definition_header(
        &self,
        cursor: &mut Cursor<'_>,
    ) -> Result<String, (ErrorKind, Option<String>)> {
        let Some(name) = cursor.take_token() else {
            return Err((ErrorKind::InvalidMacroName, None));
        };
        if !cursor.at_end() {
            return Err((
                ErrorKind::TokenAfterMacro,
                Some(cursor.rest().trim().to_string()),
            ));
        }
        if is_reserved_name(name) || self.macros.contains_key(name) {
            return Err((ErrorKind::InvalidMacroName, Some(name.to_string())));
        }
        Ok(name.to_string())
    }
}

fn error(file: &str, line: u32, kind: ErrorKind, param: Option<String>) -> Diagnostic {
    Diagnostic::new(line, Severity::Error, kind)
        .with_file(Some(file.to_string()))
        .with_param(param)
}
