// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// Second pass: encode instructions into the code image, data into the data
// image, and record every external-symbol usage.

use crate::core::error::ErrorKind;
use crate::core::image::{pack_word, Are, ObjectImage};
use crate::core::instruction::Opcode;
use crate::core::parser::{parse_line, DirectiveBody, Operand, ParsedLine};
use crate::core::symbol_table::{SymbolFlags, SymbolTable};

/// A fatal encoding failure with its line and taxonomy kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondPassError {
    pub line: u32,
    pub kind: ErrorKind,
    pub param: Option<String>,
}

impl SecondPassError {
    fn new(line: u32, kind: ErrorKind, param: Option<String>) -> Self {
        Self { line, kind, param }
    }
}

/// Encode the expanded lines against the final symbol table. Lines that
/// failed to parse were already reported by the first pass and are skipped.
pub fn second_pass(
    lines: &[String],
    symbols: &SymbolTable,
) -> Result<ObjectImage, SecondPassError> {
    let mut image = ObjectImage::new();

    for (idx, line) in lines.iter().enumerate() {
        let line_no = idx as u32 + 1;
        let Ok(parsed) = parse_line(line) else {
            continue;
        };
        match parsed {
            ParsedLine::EmptyOrComment => {}
            ParsedLine::Operation {
                opcode, operands, ..
            } => encode_instruction(&mut image, opcode, &operands, symbols, line_no)?,
            ParsedLine::Directive { body, .. } => encode_directive(&mut image, &body, line_no)?,
        }
    }

    Ok(image)
}

fn image_full(line: u32) -> SecondPassError {
    SecondPassError::new(line, ErrorKind::DataOverflow, None)
}

fn encode_instruction(
    image: &mut ObjectImage,
    opcode: Opcode,
    operands: &[Operand],
    symbols: &SymbolTable,
    line: u32,
) -> Result<(), SecondPassError> {
    // First word: [opcode 9..6][src mode 5..4][dst mode 3..2][ARE 1..0].
    // A single operand occupies the destination-mode field.
    let (src_mode, dst_mode) = match operands {
        [src, dst] => (src.mode() as u16, dst.mode() as u16),
        [single] => (0, single.mode() as u16),
        _ => (0, 0),
    };
    let first = pack_word((opcode.code() << 6) | (src_mode << 4) | (dst_mode << 2), Are::Absolute);
    if !image.push_code(first) {
        return Err(image_full(line));
    }

    // Two register operands share one word: source bits 6..9, destination
    // bits 2..5.
    if let [Operand::RegisterDirect(src), Operand::RegisterDirect(dst)] = operands {
        let shared = pack_word(((*src as u16) << 6) | ((*dst as u16) << 2), Are::Absolute);
        if !image.push_code(shared) {
            return Err(image_full(line));
        }
        return Ok(());
    }

    for (ix, op) in operands.iter().enumerate() {
        encode_operand(image, op, symbols, ix == 0, line)?;
    }
    Ok(())
}

fn encode_operand(
    image: &mut ObjectImage,
    op: &Operand,
    symbols: &SymbolTable,
    is_source: bool,
    line: u32,
) -> Result<(), SecondPassError> {
    match op {
        Operand::Immediate(value) => {
            let word = pack_word((*value as u16) << 2, Are::Absolute);
            if !image.push_code(word) {
                return Err(image_full(line));
            }
        }
        Operand::Direct(label) => {
            encode_symbol_word(image, label, symbols, line)?;
        }
        Operand::MatrixAccess {
            label,
            row_reg,
            col_reg,
        } => {
            encode_symbol_word(image, label, symbols, line)?;
            let regs = pack_word(((*row_reg as u16) << 6) | ((*col_reg as u16) << 2), Are::Absolute);
            if !image.push_code(regs) {
                return Err(image_full(line));
            }
        }
        Operand::RegisterDirect(num) => {
            let shift = if is_source { 6 } else { 2 };
            let word = pack_word((*num as u16) << shift, Are::Absolute);
            if !image.push_code(word) {
                return Err(image_full(line));
            }
        }
    }
    Ok(())
}

/// Emit the address word for a symbol reference. External symbols emit a
/// zero payload with ARE=E and a recorded usage at the word's absolute
/// address; everything else emits the address with ARE=R.
fn encode_symbol_word(
    image: &mut ObjectImage,
    label: &str,
    symbols: &SymbolTable,
    line: u32,
) -> Result<(), SecondPassError> {
    let Some(sym) = symbols.lookup(label) else {
        return Err(SecondPassError::new(
            line,
            ErrorKind::UndefinedSymbolUsed,
            Some(label.to_string()),
        ));
    };
    let word = if sym.flags.contains(SymbolFlags::EXTERN) {
        image.record_extern(label, image.next_code_address());
        pack_word(0, Are::External)
    } else {
        pack_word((sym.address as u16) << 2, Are::Relocatable)
    };
    if !image.push_code(word) {
        return Err(image_full(line));
    }
    Ok(())
}

fn encode_directive(
    image: &mut ObjectImage,
    body: &DirectiveBody,
    line: u32,
) -> Result<(), SecondPassError> {
    match body {
        DirectiveBody::Data(values) => {
            for value in values {
                if !image.push_data(*value as u16) {
                    return Err(image_full(line));
                }
            }
        }
        DirectiveBody::StringLit(text) => {
            for byte in text.bytes() {
                if !image.push_data(byte as u16) {
                    return Err(image_full(line));
                }
            }
            if !image.push_data(0) {
                return Err(image_full(line));
            }
        }
        DirectiveBody::Mat { cells, .. } => {
            for cell in cells {
                if !image.push_data(*cell as u16) {
                    return Err(image_full(line));
                }
            }
        }
        // No image contribution.
        DirectiveBody::Entry(_) | DirectiveBody::Extern(_) => {}
    }
    Ok(())
}
