//! The parsed statement forms the parser produces and the executor
//! dispatches on.

use indexmap::IndexMap;

use crate::sql::where_clause::Predicate;
use crate::table::ColumnDef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowKind {
    Tables,
    Indexes,
    Stats,
    Databases,
}

/// An ORDER BY clause entry: column name and whether it sorts ascending.
#[derive(Debug, Clone)]
pub struct OrderKey {
    pub column: String,
    pub ascending: bool,
}

/// A parsed SQL statement, tagged by variant. No base class, no
/// reflection — the executor matches on this enum directly.
#[derive(Debug, Clone)]
pub enum Statement {
    Select {
        table: String,
        columns: Vec<String>,
        where_clause: Option<Predicate>,
        order_by: Vec<OrderKey>,
        limit: Option<usize>,
        offset: Option<usize>,
    },
    Join {
        columns: Vec<String>,
        left_table: String,
        right_table: String,
        left_column: String,
        right_column: String,
        join_type: JoinType,
        where_clause: Option<Predicate>,
    },
    Insert {
        table: String,
        values: IndexMap<String, String>,
    },
    Update {
        table: String,
        updates: IndexMap<String, String>,
        where_clause: Option<Predicate>,
    },
    Delete {
        table: String,
        where_clause: Option<Predicate>,
    },
    CreateTable {
        table: String,
        columns: Vec<ColumnDef>,
    },
    CreateIndex {
        index_name: String,
        table: String,
        column: String,
    },
    Show {
        kind: ShowKind,
        table: Option<String>,
    },
    Explain {
        inner: Box<Statement>,
    },
    Vacuum {
        table: Option<String>,
    },
    Analyze {
        table: Option<String>,
    },
}

impl Statement {
    /// True for statements the query cache may store (reads only).
    pub fn is_select(&self) -> bool {
        matches!(self, Statement::Select { .. } | Statement::Join { .. })
    }

    /// True for statements the executor treats as writes: invalidate
    /// the cache and append to the audit log.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Statement::Insert { .. }
                | Statement::Update { .. }
                | Statement::Delete { .. }
                | Statement::CreateTable { .. }
                | Statement::CreateIndex { .. }
        )
    }

    /// The table name(s) this statement references, for lock
    /// acquisition and cache invalidation.
    pub fn referenced_tables(&self) -> Vec<&str> {
        match self {
            Statement::Select { table, .. } => vec![table.as_str()],
            Statement::Join {
                left_table,
                right_table,
                ..
            } => vec![left_table.as_str(), right_table.as_str()],
            Statement::Insert { table, .. } => vec![table.as_str()],
            Statement::Update { table, .. } => vec![table.as_str()],
            Statement::Delete { table, .. } => vec![table.as_str()],
            Statement::CreateTable { table, .. } => vec![table.as_str()],
            Statement::CreateIndex { table, .. } => vec![table.as_str()],
            Statement::Show { table, .. } => table.as_deref().into_iter().collect(),
            Statement::Explain { inner } => inner.referenced_tables(),
            Statement::Vacuum { table } => table.as_deref().into_iter().collect(),
            Statement::Analyze { table } => table.as_deref().into_iter().collect(),
        }
    }
}
