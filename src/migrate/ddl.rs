//! Validated DDL statement builder.
//!
//! SQL engines do not bind identifiers through placeholders, so every table
//! and column name is checked against an allow-list and quoted before it is
//! spliced into statement text. Raw strings never reach `to_sql`.

use crate::error::{Result, SchemaError};
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

// One or more words, optionally followed by a numeric size: VARCHAR(255), DECIMAL(10, 2).
static TYPE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_]*(\s+[A-Za-z][A-Za-z0-9_]*)*(\s*\(\s*\d+\s*(,\s*\d+\s*)?\))?$")
        .expect("valid regex")
});

// Literals SQLite accepts after DEFAULT without parentheses.
static LITERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(NULL|TRUE|FALSE|CURRENT_(TIME|DATE|TIMESTAMP)|[+-]?(\d+(\.\d*)?|\.\d+)(e[+-]?\d+)?|0x[0-9a-f]+|x'[0-9a-f]*'|'([^']|'')*')$",
    )
    .expect("valid regex")
});

const MAX_IDENT_LEN: usize = 128;

/// A table or column name that passed the allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Validate a name.
    ///
    /// # Errors
    ///
    /// Returns `InvalidIdentifier` unless the name is ASCII letters, digits
    /// and `_`, does not start with a digit, and is at most 128 bytes.
    pub fn new(name: &str) -> Result<Self> {
        if name.is_empty() {
            return Err(invalid_ident(name, "cannot be empty"));
        }
        if name.len() > MAX_IDENT_LEN {
            return Err(invalid_ident(name, "exceeds 128 characters"));
        }
        if name.as_bytes()[0].is_ascii_digit() {
            return Err(invalid_ident(name, "cannot start with a digit"));
        }
        if !IDENT_RE.is_match(name) {
            return Err(invalid_ident(
                name,
                "may only contain letters, digits and '_'",
            ));
        }
        Ok(Self(name.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identifier wrapped in double quotes.
    #[must_use]
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.quoted())
    }
}

fn invalid_ident(name: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidIdentifier {
        value: name.to_string(),
        reason: reason.to_string(),
    }
}

/// A column type safe to splice into DDL. May be empty (SQLite allows untyped columns).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnType(String);

impl ColumnType {
    /// Validate a type spelling.
    ///
    /// # Errors
    ///
    /// Returns `InvalidColumnType` for anything other than words optionally
    /// followed by a parenthesized numeric size.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || TYPE_RE.is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(SchemaError::InvalidColumnType {
                value: raw.to_string(),
            })
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A column default safe to splice after `DEFAULT`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultExpr(String);

impl DefaultExpr {
    /// Validate a default as the catalog reports it or a schema file spells it.
    ///
    /// Literals (strings, numbers, blobs, `NULL`, `TRUE`/`FALSE` and
    /// `CURRENT_TIME`/`CURRENT_DATE`/`CURRENT_TIMESTAMP`) are kept as written.
    /// Anything else must be a self-contained expression: balanced
    /// parentheses, closed quotes, no `;` and no comments. It is wrapped in
    /// parentheses unless one pair already encloses it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidDefault` for text that could end the `DEFAULT` clause.
    pub fn new(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if LITERAL_RE.is_match(trimmed) {
            return Ok(Self(trimmed.to_string()));
        }
        match expression_shape(trimmed) {
            Some(true) => Ok(Self(trimmed.to_string())),
            Some(false) => Ok(Self(format!("({trimmed})"))),
            None => Err(SchemaError::InvalidDefault {
                value: raw.to_string(),
            }),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// `Some(enclosed)` when `expr` cannot escape its own parentheses, where
/// `enclosed` says one outer pair already wraps all of it.
fn expression_shape(expr: &str) -> Option<bool> {
    if expr.is_empty() || expr.contains('[') {
        return None;
    }
    let bytes = expr.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut enclosed = bytes[0] == b'(';
    let mut prev = 0u8;
    for (i, &b) in bytes.iter().enumerate() {
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            prev = b;
            continue;
        }
        match b {
            b'\'' | b'"' | b'`' => quote = Some(b),
            b'(' => depth += 1,
            b')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 && i + 1 < bytes.len() {
                    enclosed = false;
                }
            }
            b';' => return None,
            b'-' if prev == b'-' => return None,
            b'*' if prev == b'/' => return None,
            _ => {}
        }
        prev = b;
    }
    (depth == 0 && quote.is_none()).then_some(enclosed)
}

/// A column reference plus its type, rendered as `"name" TYPE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: Ident,
    pub column_type: ColumnType,
}

impl ColumnSpec {
    /// # Errors
    ///
    /// Returns an error if the name or the type fails validation.
    pub fn new(name: &str, column_type: &str) -> Result<Self> {
        Ok(Self {
            name: Ident::new(name)?,
            column_type: ColumnType::new(column_type)?,
        })
    }

    fn to_sql(&self) -> String {
        if self.column_type.is_empty() {
            self.name.quoted()
        } else {
            format!("{} {}", self.name.quoted(), self.column_type.as_str())
        }
    }
}

/// One DDL statement issued by the applier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Create a table holding only its anchor column.
    CreateTable { table: Ident, anchor: ColumnSpec },
    /// Add one column to an existing table.
    AddColumn { table: Ident, column: ColumnSpec },
    /// Drop a table.
    DropTable { table: Ident },
}

impl Statement {
    /// # Errors
    ///
    /// Returns an error if any name or type fails validation.
    pub fn create_table(table: &str, anchor: &str, anchor_type: &str) -> Result<Self> {
        Ok(Self::CreateTable {
            table: Ident::new(table)?,
            anchor: ColumnSpec::new(anchor, anchor_type)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if any name or type fails validation.
    pub fn add_column(table: &str, column: &str, column_type: &str) -> Result<Self> {
        Ok(Self::AddColumn {
            table: Ident::new(table)?,
            column: ColumnSpec::new(column, column_type)?,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the table name fails validation.
    pub fn drop_table(table: &str) -> Result<Self> {
        Ok(Self::DropTable {
            table: Ident::new(table)?,
        })
    }

    /// The table this statement touches.
    #[must_use]
    pub const fn table(&self) -> &Ident {
        match self {
            Self::CreateTable { table, .. }
            | Self::AddColumn { table, .. }
            | Self::DropTable { table } => table,
        }
    }

    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::CreateTable { table, anchor } => {
                format!("CREATE TABLE {} ({});", table.quoted(), anchor.to_sql())
            }
            Self::AddColumn { table, column } => {
                format!("ALTER TABLE {} ADD COLUMN {};", table.quoted(), column.to_sql())
            }
            Self::DropTable { table } => format!("DROP TABLE {};", table.quoted()),
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
