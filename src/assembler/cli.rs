// SPDX-License-Identifier: GPL-3.0-or-later
// Copyright (C) 2026 Erik van der Tier

//! Command-line interface parsing and output path derivation.

use clap::Parser;

pub const VERSION: &str = "1.0";

const LONG_ABOUT: &str = "Two-pass assembler for a 10-bit teaching instruction set.

Each BASE names a source file without its extension: for BASE `foo` the
assembler reads foo.as and writes foo.am (macro-expanded source), foo.ob
(base-4 object code), and, when present in the program, foo.ent (entry
symbols) and foo.ext (external references). The exit status is zero only
when every file assembled successfully.";

#[derive(Parser, Debug)]
#[command(
    name = "tenasm",
    version = VERSION,
    about = "Two-pass assembler for a 10-bit teaching instruction set",
    long_about = LONG_ABOUT
)]
pub struct Cli {
    #[arg(
        value_name = "BASE",
        required = true,
        long_help = "Source file base name, without the .as extension (repeatable)."
    )]
    pub bases: Vec<String>,
}

/// The four file paths derived from one source base name.
#[derive(Debug, Clone)]
pub struct FilePaths {
    pub source: String,
    pub preprocessed: String,
    pub object: String,
    pub entries: String,
    pub externals: String,
}

impl FilePaths {
    pub fn for_base(base: &str) -> Self {
        Self {
            source: format!("{base}.as"),
            preprocessed: format!("{base}.am"),
            object: format!("{base}.ob"),
            entries: format!("{base}.ent"),
            externals: format!("{base}.ext"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_collects_bases() {
        let cli = Cli::parse_from(["tenasm", "ps", "mtest"]);
        assert_eq!(cli.bases, vec!["ps".to_string(), "mtest".to_string()]);
    }

    #[test]
    fn cli_requires_at_least_one_base() {
        assert!(Cli::try_parse_from(["tenasm"]).is_err());
    }

    #[test]
    fn file_paths_share_the_base() {
        let paths = FilePaths::for_base("dir/prog");
        assert_eq!(paths.source, "dir/prog.as");
        assert_eq!(paths.preprocessed, "dir/prog.am");
        assert_eq!(paths.object, "dir/prog.ob");
        assert_eq!(paths.entries, "dir/prog.ent");
        assert_eq!(paths.externals, "dir/prog.ext");
    }
}
