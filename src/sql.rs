use std::fmt;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashSet;
use smallvec::{smallvec, SmallVec};
use sqlparser::parser::ParserError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::page::{self, PageRecord};
use crate::parser;

pub const PAGE_TABLE: &str = "page";

/// Columns of the `page` table, in the order every value tuple is written.
pub const COLUMNS: [&str; 5] = [
    "page_number",
    "chapter_number",
    "image_id",
    "name",
    "published_at",
];

pub const PAGE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS page (page_number INT PRIMARY KEY, chapter_number INT NOT NULL, image_id TEXT NOT NULL, name TEXT NOT NULL, published_at STRING);";

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("can't read '{}'", path.display())]
    FileAccess {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid json: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("expected a json array of pages")]
    NotAnArray,

    #[error("page {index} is not a json object")]
    NotAnObject { index: usize },

    #[error("page {index} is missing field '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("page {index} field '{field}' should be {expected}")]
    InvalidField {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("generated sql doesn't parse: {0}")]
    SqlSyntax(#[from] ParserError),

    #[error("generated sql check failed: {0}")]
    Check(&'static str),

    #[error("generated sql has {found} value tuples, expected {expected}")]
    RowCount { expected: usize, found: usize },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Put the `CREATE TABLE` for `page` before the insert.
    pub with_schema: bool,
    /// Parse the generated sql back before handing it out.
    pub check: bool,
}

#[derive(Debug, Clone, Copy)]
enum SqlLiteral<'a> {
    Bare(&'a str),
    // Quoted as is; embedded quotes are not escaped.
    Quoted(&'a str),
}

impl fmt::Display for SqlLiteral<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlLiteral::Bare(value) => write!(f, "{}", value),
            SqlLiteral::Quoted(value) => write!(f, "'{}'", value),
        }
    }
}

/// Reads the JSON file at `path` and turns it into sql for the `page` table.
///
/// Nothing is returned unless every record converted, so a failure never
/// leaves half a statement behind.
pub fn convert(path: &Path, options: Options) -> Result<String, ConvertError> {
    let json = std::fs::read_to_string(path).map_err(|source| ConvertError::FileAccess {
        path: path.to_path_buf(),
        source,
    })?;
    convert_str(&json, options)
}

pub fn convert_str(json: &str, options: Options) -> Result<String, ConvertError> {
    let pages = page::parse_pages(json)?;
    debug!(pages = pages.len(), "parsed page records");
    if pages.is_empty() {
        warn!("no pages in input, the statement will have an empty VALUES clause");
    }
    warn_duplicate_pages(&pages);

    let insert = insert_statement(&pages);
    let sql = if options.with_schema {
        format!("{}\n{}", PAGE_TABLE_SQL, insert)
    } else {
        insert
    };

    if options.check {
        parser::check_generated_sql(&sql, pages.len(), options.with_schema)?;
        debug!("generated sql parsed back cleanly");
    }

    Ok(sql)
}

/// Formats one record as `(page_number, chapter_number, 'image_id', 'name', 'published_at')`.
pub fn value_tuple(page: &PageRecord) -> String {
    let literals: SmallVec<[SqlLiteral; 5]> = smallvec![
        SqlLiteral::Bare(&page.page_number),
        SqlLiteral::Bare(&page.chapter_number),
        SqlLiteral::Quoted(&page.image_id),
        SqlLiteral::Quoted(&page.name),
        SqlLiteral::Quoted(&page.published_at),
    ];

    let values: Vec<String> = literals.iter().map(ToString::to_string).collect();
    format!("({})", values.join(", "))
}

/// Joins the value tuples of `pages` into a single insert.
///
/// An empty slice still produces a statement, ending in `VALUES ;`.
pub fn insert_statement(pages: &[PageRecord]) -> String {
    let values: Vec<String> = pages.iter().map(value_tuple).collect();
    format!(
        "INSERT INTO {} ({}) VALUES {};",
        PAGE_TABLE,
        COLUMNS.join(", "),
        values.join(",")
    )
}

// page_number is the primary key, a repeat will fail once the statement runs.
fn warn_duplicate_pages(pages: &[PageRecord]) {
    let mut seen = FxHashSet::default();
    for (index, page) in pages.iter().enumerate() {
        if !seen.insert(page.page_number.as_str()) {
            warn!(
                page_number = %page.page_number,
                index, "duplicate page number, the insert will violate the primary key"
            );
        }
    }
}
