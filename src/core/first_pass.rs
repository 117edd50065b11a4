// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// First pass: build the symbol table, assign addresses, and size the code
// and data images. Errors accumulate so one run surfaces every diagnostic.

use crate::core::error::{Diagnostic, ErrorKind, Severity};
use crate::core::image::ADDRESS_BASE;
use crate::core::parser::{parse_line, DirectiveBody, Operand, ParsedLine};
use crate::core::symbol_table::{SymbolFlags, SymbolInsert, SymbolTable};

#[derive(Debug, Clone, Copy)]
pub struct FirstPassResult {
    pub ic_final: u32,
    pub dc_final: u32,
    pub errors: u32,
}

/// Total words for an instruction, including the opcode word. When both
/// operands are registers they share one word.
pub fn instruction_words(operands: &[Operand]) -> u32 {
    let extra: u32 = operands.iter().map(Operand::extra_words).sum();
    match operands {
        [Operand::RegisterDirect(_), Operand::RegisterDirect(_)] => 1 + extra - 1,
        _ => 1 + extra,
    }
}

/// Walk the expanded lines, building `symbols` and accumulating
/// diagnostics. Completes the whole file regardless of errors and finishes
/// with the data-address rebase and entry validation.
pub fn first_pass(
    file: &str,
    lines: &[String],
    symbols: &mut SymbolTable,
    diagnostics: &mut Vec<Diagnostic>,
) -> FirstPassResult {
    let mut ic = 0u32;
    let mut dc = 0u32;
    let mut errors = 0u32;

    let mut report = |diag: Diagnostic, errors: &mut u32| {
        *errors += 1;
        diagnostics.push(diag.with_file(Some(file.to_string())));
    };

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx as u32 + 1;
        let parsed = match parse_line(line) {
            Ok(parsed) => parsed,
            Err(err) => {
                report(
                    Diagnostic::new(line_no, Severity::Error, err.kind).with_param(err.param),
                    &mut errors,
                );
                continue;
            }
        };

        match parsed {
            ParsedLine::EmptyOrComment => {}
            ParsedLine::Operation { label, operands, .. } => {
                if let Some(label) = label {
                    if symbols.insert(&label, ADDRESS_BASE + ic, SymbolFlags::CODE)
                        == SymbolInsert::Conflict
                    {
                        report(
                            Diagnostic::new(
                                line_no,
                                Severity::Error,
                                ErrorKind::DuplicateLabelDefinition,
                            )
                            .with_param(Some(label)),
                            &mut errors,
                        );
                    }
                }
                ic += instruction_words(&operands);
            }
            ParsedLine::Directive { label, body } => {
                match &body {
                    DirectiveBody::Data(_) | DirectiveBody::StringLit(_) | DirectiveBody::Mat { .. } => {
                        if let Some(label) = label {
                            if symbols.insert(&label, ADDRESS_BASE + dc, SymbolFlags::DATA)
                                == SymbolInsert::Conflict
                            {
                                report(
                                    Diagnostic::new(
                                        line_no,
                                        Severity::Error,
                                        ErrorKind::DuplicateLabelDefinition,
                                    )
                                    .with_param(Some(label)),
                                    &mut errors,
                                );
                            }
                        }
                        dc += body.word_count();
                    }
                    // A label before .entry/.extern is ignored.
                    DirectiveBody::Extern(name) => {
                        if symbols.insert(name, 0, SymbolFlags::EXTERN) == SymbolInsert::Conflict {
                            let kind = match symbols.lookup(name) {
                                Some(sym) if sym.flags.contains(SymbolFlags::ENTRY) => {
                                    ErrorKind::ExternalSymbolCannotBeEntry
                                }
                                _ => ErrorKind::DuplicateLabelDefinition,
                            };
                            report(
                                Diagnostic::new(line_no, Severity::Error, kind)
                                    .with_param(Some(name.clone())),
                                &mut errors,
                            );
                        }
                    }
                    DirectiveBody::Entry(name) => {
                        if symbols.insert(name, 0, SymbolFlags::ENTRY) == SymbolInsert::Conflict {
                            let kind = match symbols.lookup(name) {
                                Some(sym) if sym.flags.contains(SymbolFlags::EXTERN) => {
                                    ErrorKind::ExternalSymbolCannotBeEntry
                                }
                                _ => ErrorKind::DuplicateEntryDeclaration,
                            };
                            report(
                                Diagnostic::new(line_no, Severity::Error, kind)
                                    .with_param(Some(name.clone())),
                                &mut errors,
                            );
                        }
                    }
                }
            }
        }
    }

    // Data symbols move to just past the code image.
    symbols.bump_data_addresses(ic);

    for sym in symbols.iter() {
        if !sym.flags.contains(SymbolFlags::ENTRY) {
            continue;
        }
        if !sym
            .flags
            .intersects(SymbolFlags::CODE | SymbolFlags::DATA)
        {
            diagnostics.push(
                Diagnostic::new(0, Severity::Error, ErrorKind::EntrySymbolNotDefined)
                    .with_file(Some(file.to_string()))
                    .with_param(Some(sym.name.clone())),
            );
            errors += 1;
        }
        if sym.flags.contains(SymbolFlags::EXTERN) {
            // Should have been caught at insert time; kept for robustness.
            diagnostics.push(
                Diagnostic::new(0, Severity::Error, ErrorKind::ExternalSymbolCannotBeEntry)
                    .with_file(Some(file.to_string()))
                    .with_param(Some(sym.name.clone())),
            );
            errors += 1;
        }
    }

    FirstPassResult {
        ic_final: ic,
        dc_final: dc,
        errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    fn run(text: &str) -> (SymbolTable, Vec<Diagnostic>, FirstPassResult) {
        let mut symbols = SymbolTable::new();
        let mut diagnostics = Vec::new();
        let result = first_pass("test.am", &lines(text), &mut symbols, &mut diagnostics);
        (symbols, diagnostics, result)
    }

    #[test]
    fn instruction_word_counts() {
        use crate::core::parser::Operand::*;
        assert_eq!(instruction_words(&[]), 1);
        assert_eq!(instruction_words(&[RegisterDirect(1)]), 2);
        assert_eq!(instruction_words(&[Immediate(3), RegisterDirect(1)]), 3);
        assert_eq!(instruction_words(&[RegisterDirect(1), RegisterDirect(2)]), 2);
        assert_eq!(
            instruction_words(&[Direct("X".into()), Direct("Y".into())]),
            3
        );
        assert_eq!(
            instruction_words(&[
                MatrixAccess {
                    label: "M".into(),
                    row_reg: 1,
                    col_reg: 2
                },
                RegisterDirect(0)
            ]),
            4
        );
    }

    #[test]
    fn minimal_program_symbol_layout() {
        let (symbols, diagnostics, result) = run(
            "MAIN: mov r1, r2\n      stop\nVAL:  .data 5\n      .entry MAIN\n",
        );
        assert!(diagnostics.is_empty());
        assert_eq!(result.errors, 0);
        assert_eq!(result.ic_final, 3);
        assert_eq!(result.dc_final, 1);

        let main = symbols.lookup("MAIN").unwrap();
        assert_eq!(main.address, 100);
        assert_eq!(main.flags, SymbolFlags::CODE | SymbolFlags::ENTRY);

        let val = symbols.lookup("VAL").unwrap();
        assert_eq!(val.address, 103);
        assert_eq!(val.flags, SymbolFlags::DATA);
    }

    #[test]
    fn data_symbols_rebase_after_code() {
        let (symbols, _, result) = run(
            "A: .data 1, 2\nB: .string \"hi\"\nMAIN: stop\n",
        );
        assert_eq!(result.ic_final, 1);
        assert_eq!(result.dc_final, 5);
        // Data addresses are BASE + DC at definition, plus IC_final.
        assert_eq!(symbols.lookup("A").unwrap().address, 100 + 0 + 1);
        assert_eq!(symbols.lookup("B").unwrap().address, 100 + 2 + 1);
        assert_eq!(symbols.lookup("MAIN").unwrap().address, 100);
    }

    #[test]
    fn mat_directive_grows_dc_by_cell_count() {
        let (_, diagnostics, result) = run("M: .mat [2][3] 1,2,3,4,5,6\n");
        assert!(diagnostics.is_empty());
        assert_eq!(result.dc_final, 6);
    }

    #[test]
    fn parse_errors_accumulate_and_pass_continues() {
        let (symbols, diagnostics, result) = run(
            "mov r1\nblip\nOK: stop\n",
        );
        assert_eq!(result.errors, 2);
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].line(), 1);
        assert_eq!(diagnostics[1].line(), 2);
        // The pass kept going and still recorded the later label.
        assert!(symbols.lookup("OK").is_some());
    }

    #[test]
    fn duplicate_label_reported() {
        let (_, diagnostics, result) = run("X: stop\nX: stop\n");
        assert_eq!(result.errors, 1);
        assert_eq!(diagnostics[0].kind(), ErrorKind::DuplicateLabelDefinition);
    }

    #[test]
    fn entry_before_definition_is_accepted() {
        let (symbols, diagnostics, result) = run(".entry MAIN\nMAIN: stop\n");
        assert!(diagnostics.is_empty());
        assert_eq!(result.errors, 0);
        let main = symbols.lookup("MAIN").unwrap();
        assert_eq!(main.address, 100);
        assert_eq!(main.flags, SymbolFlags::CODE | SymbolFlags::ENTRY);
    }

    #[test]
    fn undefined_entry_is_reported_after_the_pass() {
        let (_, diagnostics, result) = run("stop\n.entry GHOST\n");
        assert_eq!(result.errors, 1);
        assert_eq!(diagnostics[0].kind(), ErrorKind::EntrySymbolNotDefined);
    }

    #[test]
    fn entry_extern_conflicts() {
        let (_, diagnostics, _) = run(".extern LIB\n.entry LIB\nstop\n");
        assert_eq!(
            diagnostics[0].kind(),
            ErrorKind::ExternalSymbolCannotBeEntry
        );

        let (_, diagnostics, _) = run(".entry X\n.entry X\nX: stop\n");
        assert_eq!(diagnostics[0].kind(), ErrorKind::DuplicateEntryDeclaration);

        let (_, diagnostics, _) = run("LIB: stop\n.extern LIB\n");
        assert_eq!(diagnostics[0].kind(), ErrorKind::DuplicateLabelDefinition);
    }

    #[test]
    fn label_on_entry_directive_is_ignored() {
        let (symbols, diagnostics, _) = run("SKIP: .entry MAIN\nMAIN: stop\n");
        assert!(diagnostics.is_empty());
        assert!(symbols.lookup("SKIP").is_none());
    }
}
