//! Tokenless, regex-driven SQL parser.
//!
//! Each recognized statement shape is matched with its own regex rather
//! than a hand-written tokenizer. This keeps the grammar (deliberately
//! small, §6) easy to read off the source, at the cost of opaque error
//! locations for malformed input — an acceptable trade for a grammar
//! this size.

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::common::{Error, Result};
use crate::sql::where_clause::{CompareOp, Predicate};
use crate::sql::statement::{JoinType, OrderKey, ShowKind, Statement};
use crate::table::column::ColumnType;
use crate::table::ColumnDef;

static LEADING_KEYWORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(\w+)").unwrap());

static SELECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^SELECT\s+(?P<cols>.+?)\s+FROM\s+(?P<table>\w+)(?:\s+WHERE\s+(?P<where>.+?))?(?:\s+ORDER\s+BY\s+(?P<order>.+?))?(?:\s+LIMIT\s+(?P<limit>\d+))?(?:\s+OFFSET\s+(?P<offset>\d+))?\s*;?\s*$",
    )
    .unwrap()
});

static JOIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^SELECT\s+(?P<cols>.+?)\s+FROM\s+(?P<left>\w+)\s+(?:(?P<kind>INNER|LEFT|RIGHT|FULL)\s+)?JOIN\s+(?P<right>\w+)\s+ON\s+(?P<lt>\w+)\.(?P<lc>\w+)\s*=\s*(?P<rt>\w+)\.(?P<rc>\w+)(?:\s+WHERE\s+(?P<where>.+?))?\s*;?\s*$",
    )
    .unwrap()
});

static INSERT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^INSERT\s+INTO\s+(?P<table>\w+)\s*\((?P<cols>[^)]+)\)\s*VALUES\s*\((?P<vals>.+)\)\s*;?\s*$",
    )
    .unwrap()
});

static UPDATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^UPDATE\s+(?P<table>\w+)\s+SET\s+(?P<assigns>.+?)(?:\s+WHERE\s+(?P<where>.+?))?\s*;?\s*$")
        .unwrap()
});

static DELETE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^DELETE\s+FROM\s+(?P<table>\w+)(?:\s+WHERE\s+(?P<where>.+?))?\s*;?\s*$")
        .unwrap()
});

static CREATE_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^CREATE\s+TABLE\s+(?P<table>\w+)\s*\((?P<cols>.+)\)\s*;?\s*$").unwrap()
});

static CREATE_INDEX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?is)^CREATE\s+INDEX\s+(?P<idx>\w+)\s+ON\s+(?P<table>\w+)\s*\((?P<col>\w+)\)\s*;?\s*$",
    )
    .unwrap()
});

static SHOW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^SHOW\s+(?P<kind>TABLES|STATS|INDEXES|DATABASES)(?:\s+FROM\s+(?P<table>\w+))?\s*;?\s*$")
        .unwrap()
});

static VACUUM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^VACUUM(?:\s+(?P<table>\w+))?\s*;?\s*$").unwrap());

static ANALYZE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^ANALYZE(?:\s+(?P<table>\w+))?\s*;?\s*$").unwrap());

static ORDER_ITEM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^\s*(\w+)(?:\s+(ASC|DESC))?\s*$").unwrap());

static IS_NULL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*(\w+)\s+IS\s+(NOT\s+)?NULL\s*$").unwrap());
static LIKE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*(\w+)\s+(NOT\s+)?LIKE\s+'([^']*)'\s*$").unwrap());
static BETWEEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^\s*(\w+)\s+(NOT\s+)?BETWEEN\s+(\S+)\s+AND\s+(\S+)\s*$").unwrap()
});
static IN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*(\w+)\s+(NOT\s+)?IN\s*\((.+)\)\s*$").unwrap());
static BINOP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)^\s*(\w+)\s*(>=|<=|!=|<>|>|<|=)\s*(.+?)\s*$").unwrap());

/// Parses statement text into a [`Statement`]. Holds no mutable state —
/// every recognized regex is a process-wide `Lazy` static.
#[derive(Default)]
pub struct SqlParser;

impl SqlParser {
    pub fn new() -> Self {
        SqlParser
    }

    pub fn parse(&self, sql: &str) -> Result<Statement> {
        let trimmed = sql.trim();
        let keyword = LEADING_KEYWORD
            .captures(trimmed)
            .map(|c| c[1].to_ascii_uppercase())
            .ok_or_else(|| Error::Parse("empty statement".to_string()))?;

        match keyword.as_str() {
            "SELECT" => {
                if let Some(caps) = JOIN_RE.captures(trimmed) {
                    return parse_join(&caps);
                }
                if let Some(caps) = SELECT_RE.captures(trimmed) {
                    return parse_select(&caps);
                }
                Err(Error::Parse(format!("malformed SELECT statement: {trimmed}")))
            }
            "INSERT" => match INSERT_RE.captures(trimmed) {
                Some(caps) => parse_insert(&caps),
                None => Err(Error::Parse(format!("malformed INSERT statement: {trimmed}"))),
            },
            "UPDATE" => match UPDATE_RE.captures(trimmed) {
                Some(caps) => parse_update(&caps),
                None => Err(Error::Parse(format!("malformed UPDATE statement: {trimmed}"))),
            },
            "DELETE" => match DELETE_RE.captures(trimmed) {
                Some(caps) => parse_delete(&caps),
                None => Err(Error::Parse(format!("malformed DELETE statement: {trimmed}"))),
            },
            "CREATE" => parse_create(trimmed),
            "SHOW" => match SHOW_RE.captures(trimmed) {
                Some(caps) => parse_show(&caps),
                None => Err(Error::Parse(format!("malformed SHOW statement: {trimmed}"))),
            },
            "EXPLAIN" => {
                let rest = LEADING_KEYWORD.replace(trimmed, "").trim().to_string();
                let inner = self.parse(&rest)?;
                Ok(Statement::Explain {
                    inner: Box::new(inner),
                })
            }
            "VACUUM" => match VACUUM_RE.captures(trimmed) {
                Some(caps) => Ok(Statement::Vacuum {
                    table: caps.name("table").map(|m| m.as_str().to_string()),
                }),
                None => Err(Error::Parse(format!("malformed VACUUM statement: {trimmed}"))),
            },
            "ANALYZE" => match ANALYZE_RE.captures(trimmed) {
                Some(caps) => Ok(Statement::Analyze {
                    table: caps.name("table").map(|m| m.as_str().to_string()),
                }),
                None => Err(Error::Parse(format!("malformed ANALYZE statement: {trimmed}"))),
            },
            other => Err(Error::Parse(format!("unsupported statement: {other}"))),
        }
    }
}

fn parse_select(caps: &regex::Captures) -> Result<Statement> {
    let columns = split_top_level(&caps["cols"], ',')
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let table = caps["table"].to_string();
    let where_clause = caps.name("where").map(|m| parse_where(m.as_str())).transpose()?;
    let order_by = caps
        .name("order")
        .map(|m| parse_order_by(m.as_str()))
        .transpose()?
        .unwrap_or_default();
    let limit = caps.name("limit").map(|m| m.as_str().parse().unwrap());
    let offset = caps.name("offset").map(|m| m.as_str().parse().unwrap());

    Ok(Statement::Select {
        table,
        columns,
        where_clause,
        order_by,
        limit,
        offset,
    })
}

fn parse_join(caps: &regex::Captures) -> Result<Statement> {
    let columns = split_top_level(&caps["cols"], ',')
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let join_type = match caps.name("kind").map(|m| m.as_str().to_ascii_uppercase()) {
        Some(k) if k == "LEFT" => JoinType::Left,
        Some(k) if k == "RIGHT" => JoinType::Right,
        Some(k) if k == "FULL" => JoinType::Full,
        _ => JoinType::Inner,
    };
    let where_clause = caps.name("where").map(|m| parse_where(m.as_str())).transpose()?;

    Ok(Statement::Join {
        columns,
        left_table: caps["left"].to_string(),
        right_table: caps["right"].to_string(),
        left_column: caps["lc"].to_string(),
        right_column: caps["rc"].to_string(),
        join_type,
        where_clause,
    })
}

fn parse_insert(caps: &regex::Captures) -> Result<Statement> {
    let table = caps["table"].to_string();
    let cols: Vec<String> = split_top_level(&caps["cols"], ',')
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();
    let vals: Vec<String> = split_top_level(&caps["vals"], ',')
        .into_iter()
        .map(|v| unquote_literal(v.trim()))
        .collect();

    if cols.len() != vals.len() {
        return Err(Error::Parse(format!(
            "INSERT column count ({}) does not match value count ({})",
            cols.len(),
            vals.len()
        )));
    }

    let mut values = IndexMap::new();
    for (col, val) in cols.into_iter().zip(vals.into_iter()) {
        if val != "NULL" {
            values.insert(col, val);
        }
    }

    Ok(Statement::Insert { table, values })
}

fn parse_update(caps: &regex::Captures) -> Result<Statement> {
    let table = caps["table"].to_string();
    let mut updates = IndexMap::new();
    for assign in split_top_level(&caps["assigns"], ',') {
        let (col, val) = assign
            .split_once('=')
            .ok_or_else(|| Error::Parse(format!("malformed SET assignment: {assign}")))?;
        updates.insert(col.trim().to_string(), unquote_literal(val.trim()));
    }
    let where_clause = caps.name("where").map(|m| parse_where(m.as_str())).transpose()?;

    Ok(Statement::Update {
        table,
        updates,
        where_clause,
    })
}

fn parse_delete(caps: &regex::Captures) -> Result<Statement> {
    let table = caps["table"].to_string();
    let where_clause = caps.name("where").map(|m| parse_where(m.as_str())).transpose()?;
    Ok(Statement::Delete { table, where_clause })
}

fn parse_create(trimmed: &str) -> Result<Statement> {
    if let Some(caps) = CREATE_TABLE_RE.captures(trimmed) {
        let table = caps["table"].to_string();
        let columns = split_top_level(&caps["cols"], ',')
            .into_iter()
            .map(|c| parse_column_def(c.trim()))
            .collect::<Result<Vec<_>>>()?;
        return Ok(Statement::CreateTable { table, columns });
    }
    if let Some(caps) = CREATE_INDEX_RE.captures(trimmed) {
        return Ok(Statement::CreateIndex {
            index_name: caps["idx"].to_string(),
            table: caps["table"].to_string(),
            column: caps["col"].to_string(),
        });
    }
    Err(Error::Parse(format!("malformed CREATE statement: {trimmed}")))
}

static COLUMN_DEF_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?is)^(?P<name>\w+)\s+(?P<type>\w+)(?:\s*\(\s*\d+\s*\))?(?P<rest>.*)$").unwrap()
});
static DEFAULT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)DEFAULT\s+('(?:[^']*)'|\S+)").unwrap());

fn parse_column_def(text: &str) -> Result<ColumnDef> {
    let caps = COLUMN_DEF_RE
        .captures(text)
        .ok_or_else(|| Error::Parse(format!("malformed column definition: {text}")))?;
    let name = caps["name"].to_string();
    let col_type = ColumnType::parse(&caps["type"])?;
    let rest = caps["rest"].to_ascii_uppercase();

    let primary_key = rest.contains("PRIMARY KEY");
    let not_null = rest.contains("NOT NULL");
    let auto_increment = rest.contains("AUTO_INCREMENT");
    let unique = rest.contains("UNIQUE");
    let default = DEFAULT_RE
        .captures(&caps["rest"])
        .map(|c| unquote_literal(c[1].trim()));

    Ok(ColumnDef::new(
        name,
        col_type,
        primary_key,
        not_null,
        auto_increment,
        unique,
        default,
    ))
}

fn parse_show(caps: &regex::Captures) -> Result<Statement> {
    let kind = match caps["kind"].to_ascii_uppercase().as_str() {
        "TABLES" => ShowKind::Tables,
        "STATS" => ShowKind::Stats,
        "INDEXES" => ShowKind::Indexes,
        "DATABASES" => ShowKind::Databases,
        other => return Err(Error::Parse(format!("unsupported SHOW target: {other}"))),
    };
    let table = caps.name("table").map(|m| m.as_str().to_string());
    Ok(Statement::Show { kind, table })
}

fn parse_order_by(text: &str) -> Result<Vec<OrderKey>> {
    split_top_level(text, ',')
        .into_iter()
        .map(|item| {
            let caps = ORDER_ITEM_RE
                .captures(item.trim())
                .ok_or_else(|| Error::Parse(format!("malformed ORDER BY item: {item}")))?;
            let ascending = caps
                .get(2)
                .map(|m| !m.as_str().eq_ignore_ascii_case("DESC"))
                .unwrap_or(true);
            Ok(OrderKey {
                column: caps[1].to_string(),
                ascending,
            })
        })
        .collect()
}

/// Parse a WHERE-clause body against the five recognized predicate
/// forms, left-to-right, first match wins.
pub fn parse_where(text: &str) -> Result<Predicate> {
    let text = text.trim();

    if let Some(caps) = IS_NULL_RE.captures(text) {
        return Ok(if caps.get(2).is_some() {
            Predicate::IsNotNull(caps[1].to_string())
        } else {
            Predicate::IsNull(caps[1].to_string())
        });
    }

    if let Some(caps) = LIKE_RE.captures(text) {
        let col = caps[1].to_string();
        let pattern = caps[3].to_string();
        return Ok(if caps.get(2).is_some() {
            Predicate::NotLike(col, pattern)
        } else {
            Predicate::Like(col, pattern)
        });
    }

    if let Some(caps) = BETWEEN_RE.captures(text) {
        let col = caps[1].to_string();
        let lo = unquote_literal(&caps[3]);
        let hi = unquote_literal(&caps[4]);
        return Ok(if caps.get(2).is_some() {
            Predicate::NotBetween(col, lo, hi)
        } else {
            Predicate::Between(col, lo, hi)
        });
    }

    if let Some(caps) = IN_RE.captures(text) {
        let col = caps[1].to_string();
        let values = split_top_level(&caps[3], ',')
            .into_iter()
            .map(|v| unquote_literal(v.trim()))
            .collect();
        return Ok(if caps.get(2).is_some() {
            Predicate::NotIn(col, values)
        } else {
            Predicate::In(col, values)
        });
    }

    if let Some(caps) = BINOP_RE.captures(text) {
        let col = caps[1].to_string();
        let op = match &caps[2] {
            ">=" => CompareOp::Ge,
            "<=" => CompareOp::Le,
            "!=" | "<>" => CompareOp::Ne,
            ">" => CompareOp::Gt,
            "<" => CompareOp::Lt,
            "=" => CompareOp::Eq,
            other => return Err(Error::Parse(format!("unknown operator: {other}"))),
        };
        let value = unquote_literal(caps[3].trim());
        return Ok(Predicate::Compare(col, op, value));
    }

    Err(Error::Parse(format!("malformed where-clause: {text}")))
}

/// Strip surrounding single quotes from a literal, leaving bare numeric
/// literals untouched. Quote-escaping (`''`) is not required by the
/// grammar.
fn unquote_literal(text: &str) -> String {
    let text = text.trim();
    if text.len() >= 2 && text.starts_with('\'') && text.ends_with('\'') {
        text[1..text.len() - 1].to_string()
    } else {
        text.to_string()
    }
}

/// Split `text` on `delim`, ignoring delimiters inside parentheses or
/// single-quoted strings.
fn split_top_level(text: &str, delim: char) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut depth = 0i32;
    let mut in_quotes = false;

    for ch in text.chars() {
        match ch {
            '\'' => {
                in_quotes = !in_quotes;
                current.push(ch);
            }
            '(' if !in_quotes => {
                depth += 1;
                current.push(ch);
            }
            ')' if !in_quotes => {
                depth -= 1;
                current.push(ch);
            }
            c if c == delim && !in_quotes && depth == 0 => {
                parts.push(current.clone());
                current.clear();
            }
            c => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}
