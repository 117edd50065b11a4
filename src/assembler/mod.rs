// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Per-file assembly driver.
//!
//! Runs each source file through the full chain: macro preprocessing,
//! the symbol-building first pass, the data-address rebase, the encoding
//! second pass, and the output writers. Files are independent; a failure
//! in one does not stop the others.

pub mod cli;


use std::fs;

use clap::Parser;

use crate::core::error::{Diagnostic, ErrorKind, RunError, RunReport, Severity};
use crate::core::first_pass::first_pass;
use crate::core::image::{has_entries, write_entries, ObjectImage};
use crate::core::preprocess::Preprocessor;
use crate::core::second_pass::second_pass;
use crate::core::symbol_table::SymbolTable;

use cli::{Cli, FilePaths};

pub use cli::VERSION;

/// Run the assembler with command-line arguments. Returns one outcome per
/// input base, in argument order.
pub fn run() -> Vec<(String, Result<RunReport, RunError>)> {
    let cli = Cli::parse();
    cli.bases
        .iter()
        .map(|base| (base.clone(), assemble_base(base)))
        .collect()
}

/// Assemble one source file named by its extension-less base.
pub fn assemble_base(base: &str) -> Result<RunReport, RunError> {
    let paths = FilePaths::for_base(base);

    let source = fs::read_to_string(&paths.source).map_err(|_| {
        let diag = Diagnostic::new(0, Severity::Error, ErrorKind::CannotOpenFile)
            .with_file(Some(paths.source.clone()));
        RunError::new(ErrorKind::CannotOpenFile, paths.source.as_str(), vec![diag], Vec::new())
    })?;
    let source_lines: Vec<String> = source.lines().map(str::to_string).collect();

    let expanded = match Preprocessor::new().expand(&paths.source, &source_lines) {
        Ok(expanded) => expanded,
        Err(diagnostics) => {
            // No preprocessed output may exist after a failed run.
            let _ = fs::remove_file(&paths.preprocessed);
            remove_stale_outputs(&paths);
            let kind = diagnostics[0].kind();
            return Err(RunError::new(kind, paths.source.as_str(), diagnostics, source_lines));
        }
    };

    let mut am_text = expanded.join("\n");
    if !am_text.is_empty() {
        am_text.push('\n');
    }
    if fs::write(&paths.preprocessed, am_text).is_err() {
        let _ = fs::remove_file(&paths.preprocessed);
        let diag = Diagnostic::new(0, Severity::Error, ErrorKind::WriteFailed)
            .with_file(Some(paths.preprocessed.clone()));
        return Err(RunError::new(
            ErrorKind::WriteFailed,
            paths.preprocessed.as_str(),
            vec![diag],
            source_lines,
        ));
    }

    let mut symbols = SymbolTable::new();
    let mut diagnostics = Vec::new();
    let pass1 = first_pass(&paths.preprocessed, &expanded, &mut symbols, &mut diagnostics);
    if pass1.errors > 0 {
        remove_stale_outputs(&paths);
        let kind = diagnostics[0].kind();
        return Err(RunError::new(kind, paths.preprocessed.as_str(), diagnostics, expanded));
    }

    let image = match second_pass(&expanded, &symbols) {
        Ok(image) => image,
        Err(err) => {
            remove_stale_outputs(&paths);
            let diag = Diagnostic::new(err.line, Severity::Error, err.kind)
                .with_file(Some(paths.preprocessed.clone()))
                .with_param(err.param);
            diagnostics.push(diag);
            return Err(RunError::new(err.kind, paths.preprocessed.as_str(), diagnostics, expanded));
        }
    };

    write_outputs(&paths, &image, &symbols).map_err(|failed_path| {
        let diag = Diagnostic::new(0, Severity::Error, ErrorKind::WriteFailed)
            .with_file(Some(failed_path.clone()));
        RunError::new(ErrorKind::WriteFailed, failed_path, vec![diag], expanded.clone())
    })?;

    Ok(RunReport::new(diagnostics, expanded))
}

/// Remove machine-code outputs left behind by an earlier run of the same
/// base. Failed runs must not leave stale results on disk.
fn remove_stale_outputs(paths: &FilePaths) {
    let _ = fs::remove_file(&paths.object);
    let _ = fs::remove_file(&paths.entries);
    let _ = fs::remove_file(&paths.externals);
}

/// Render the object, entry, and externals files to buffers and persist
/// them. On any write failure every file created for this source is
/// removed; the error names the path that failed.
fn write_outputs(
    paths: &FilePaths,
    image: &ObjectImage,
    symbols: &SymbolTable,
) -> Result<(), String> {
    let mut object = Vec::new();
    if image.write_object(&mut object).is_err() {
        return Err(paths.object.clone());
    }
    let entries = if has_entries(symbols) {
        let mut buf = Vec::new();
        if write_entries(symbols, &mut buf).is_err() {
            return Err(paths.entries.clone());
        }
        Some(buf)
    } else {
        None
    };
    let externals = if image.ext_uses().is_empty() {
        None
    } else {
        let mut buf = Vec::new();
        if image.write_externals(&mut buf).is_err() {
            return Err(paths.externals.clone());
        }
        Some(buf)
    };

    let mut created: Vec<&str> = Vec::new();
    let plan: [(&str, Option<&Vec<u8>>); 3] = [
        (paths.object.as_str(), Some(&object)),
        (paths.entries.as_str(), entries.as_ref()),
        (paths.externals.as_str(), externals.as_ref()),
    ];
    for (path, content) in plan {
        // Outputs this run does not produce must not survive from earlier runs.
        let Some(content) = content else {
            let _ = fs::remove_file(path);
            continue;
        };
        if fs::write(path, content).is_err() {
            for stale in &created {
                let _ = fs::remove_file(stale);
            }
            let _ = fs::remove_file(path);
            return Err(path.to_string());
        }
        created.push(path);
    }
    Ok(())
}
