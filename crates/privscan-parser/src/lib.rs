/*! Read collaborator facts from text files.
 *
 * The classifier consumes alias trees, loop nests, def-use summaries, reach and live sets, and
 * dependence results that other analyses produce. A facts file writes those results down one
 * statement per line so a classification can be reproduced, diffed, and checked without the
 * analyses that produced it.
 */

use pest::Parser;
use pest_derive::Parser;
use privscan_core::Function;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub mod errors;
pub mod loader;
pub mod statement;

pub use errors::{ParseError, Result};
pub use loader::FactsLoader;
pub use statement::{FactValue, Statement};

#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct FactsParser;

/// Extension of the files [`parse_dir`] picks up.
pub const FACTS_EXTENSION: &str = "facts";

pub fn parse(input: &str) -> Result<Vec<Statement>> {
    let file = FactsParser::parse(Rule::file, input)
        .map_err(Box::new)?
        .next()
        .map(|pair| pair.into_inner());
    let Some(pairs) = file else {
        return Ok(Vec::new());
    };
    pairs
        .filter(|pair| pair.as_rule() == Rule::statement)
        .map(Statement::from_pair)
        .collect()
}

pub fn check(input: &str) -> bool {
    load(input).is_ok()
}

/// Parses `input` and builds every function it describes.
pub fn load(input: &str) -> Result<Vec<Function>> {
    FactsLoader::new().load(&parse(input)?)
}

pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<Function>> {
    let path = path.as_ref();
    let input = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
        path: path.display().to_string(),
        source,
    })?;
    load(&input)
}

/// Loads every `.facts` file under `path`, in path order.
pub fn parse_dir<P: AsRef<Path>>(path: P) -> Result<Vec<(PathBuf, Vec<Function>)>> {
    let path = path.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|source| ParseError::Walk {
            path: path.display().to_string(),
            source,
        })?;
        let is_facts = entry
            .path()
            .extension()
            .is_some_and(|ext| ext == FACTS_EXTENSION);
        if entry.file_type().is_file() && is_facts {
            files.push(entry.into_path());
        }
    }
    files
        .into_iter()
        .map(|file| {
            let functions = parse_file(&file)?;
            Ok((file, functions))
        })
        .collect()
}
