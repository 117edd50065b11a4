// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

// CLI entrypoint for tenasm.

fn main() {
    let use_color = std::env::var("NO_COLOR").is_err();
    let mut failed = false;
    for (base, outcome) in tenasm::assembler::run() {
        match outcome {
            Ok(report) => {
                for diag in report.diagnostics() {
                    eprintln!(
                        "{}",
                        diag.format_with_context(Some(report.source_lines()), use_color)
                    );
                }
                eprintln!("tenasm: {base}.as assembled");
            }
            Err(err) => {
                failed = true;
                for diag in err.diagnostics() {
                    eprintln!(
                        "{}",
                        diag.format_with_context(Some(err.source_lines()), use_color)
                    );
                }
                eprintln!("{err}");
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
}
