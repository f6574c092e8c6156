//! One-line summaries of SQL statements: statement kind plus referenced tables

use log::debug;
use sqlparser::{
    ast::{ObjectName, ObjectType, SetExpr, Statement, Visit, Visitor},
    dialect::MySqlDialect,
    parser::Parser,
};
use std::fmt;
use std::ops::ControlFlow;

/// Syntactic category of a statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatementKind {
    Select,
    SetOpr,
    Insert,
    Update,
    Delete,
    CreateTable,
    CreateIndex,
    CreateView,
    CreateDatabase,
    AlterTable,
    DropTable,
    Drop,
    TruncateTable,
    AnalyzeTable,
    Explain,
    Show,
    Set,
    Begin,
    Commit,
    Rollback,
    Use,
    Call,
    LockTables,
    UnlockTables,
    Grant,
    Revoke,
    Prepare,
    Execute,
    Deallocate,
    Kill,
    Other,
}

impl StatementKind {
    /// Classify the outermost statement
    pub fn from_statement(stmt: &Statement) -> Self {
        match stmt {
            Statement::Query(query) => match query.body.as_ref() {
                SetExpr::SetOperation { .. } => StatementKind::SetOpr,
                _ => StatementKind::Select,
            },
            Statement::Insert { .. } => StatementKind::Insert,
            Statement::Update { .. } => StatementKind::Update,
            Statement::Delete { .. } => StatementKind::Delete,
            Statement::CreateTable { .. } => StatementKind::CreateTable,
            Statement::CreateIndex { .. } => StatementKind::CreateIndex,
            Statement::CreateView { .. } => StatementKind::CreateView,
            Statement::CreateDatabase { .. } | Statement::CreateSchema { .. } => {
                StatementKind::CreateDatabase
            }
            Statement::AlterTable { .. } => StatementKind::AlterTable,
            Statement::Drop { object_type, .. } => match object_type {
                ObjectType::Table => StatementKind::DropTable,
                _ => StatementKind::Drop,
            },
            Statement::Truncate { .. } => StatementKind::TruncateTable,
            Statement::Analyze { .. } => StatementKind::AnalyzeTable,
            Statement::Explain { .. } | Statement::ExplainTable { .. } => StatementKind::Explain,
            Statement::ShowTables { .. }
            | Statement::ShowColumns { .. }
            | Statement::ShowVariables { .. }
            | Statement::ShowVariable { .. }
            | Statement::ShowCreate { .. } => StatementKind::Show,
            Statement::SetVariable { .. } | Statement::SetNames { .. } => StatementKind::Set,
            Statement::StartTransaction { .. } => StatementKind::Begin,
            Statement::Commit { .. } => StatementKind::Commit,
            Statement::Rollback { .. } => StatementKind::Rollback,
            Statement::Use { .. } => StatementKind::Use,
            Statement::Call { .. } => StatementKind::Call,
            Statement::LockTables { .. } => StatementKind::LockTables,
            Statement::UnlockTables { .. } => StatementKind::UnlockTables,
            Statement::Grant { .. } => StatementKind::Grant,
            Statement::Revoke { .. } => StatementKind::Revoke,
            Statement::Prepare { .. } => StatementKind::Prepare,
            Statement::Execute { .. } => StatementKind::Execute,
            Statement::Deallocate { .. } => StatementKind::Deallocate,
            Statement::Kill { .. } => StatementKind::Kill,
            _ => StatementKind::Other,
        }
    }

    /// Upper-case display label, one word per part of the kind name
    pub fn label(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::SetOpr => "SET OPR",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::CreateTable => "CREATE TABLE",
            StatementKind::CreateIndex => "CREATE INDEX",
            StatementKind::CreateView => "CREATE VIEW",
            StatementKind::CreateDatabase => "CREATE DATABASE",
            StatementKind::AlterTable => "ALTER TABLE",
            StatementKind::DropTable => "DROP TABLE",
            StatementKind::Drop => "DROP",
            StatementKind::TruncateTable => "TRUNCATE TABLE",
            StatementKind::AnalyzeTable => "ANALYZE TABLE",
            StatementKind::Explain => "EXPLAIN",
            StatementKind::Show => "SHOW",
            StatementKind::Set => "SET",
            StatementKind::Begin => "BEGIN",
            StatementKind::Commit => "COMMIT",
            StatementKind::Rollback => "ROLLBACK",
            StatementKind::Use => "USE",
            StatementKind::Call => "CALL",
            StatementKind::LockTables => "LOCK TABLES",
            StatementKind::UnlockTables => "UNLOCK TABLES",
            StatementKind::Grant => "GRANT",
            StatementKind::Revoke => "REVOKE",
            StatementKind::Prepare => "PREPARE",
            StatementKind::Execute => "EXECUTE",
            StatementKind::Deallocate => "DEALLOCATE",
            StatementKind::Kill => "KILL",
            StatementKind::Other => "OTHER",
        }
    }
}

impl fmt::Display for StatementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Collects the statement kind and every table reference of one statement
#[derive(Debug, Default)]
pub struct SummaryQuery {
    pub kind: Option<StatementKind>,
    pub tables: Vec<String>,
}

impl Visitor for SummaryQuery {
    type Break = ();

    fn pre_visit_statement(&mut self, statement: &Statement) -> ControlFlow<Self::Break> {
        if self.kind.is_none() {
            self.kind = Some(StatementKind::from_statement(statement));
        }
        ControlFlow::Continue(())
    }

    fn pre_visit_relation(&mut self, relation: &ObjectName) -> ControlFlow<Self::Break> {
        self.tables.push(table_name(relation));
        ControlFlow::Continue(())
    }
}

impl fmt::Display for SummaryQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(kind) = self.kind else {
            return Ok(());
        };
        write!(f, "{}", kind)?;
        for table in &self.tables {
            write!(f, " {}", table)?;
        }
        Ok(())
    }
}

/// `schema.table` when qualified, otherwise `table`
fn table_name(name: &ObjectName) -> String {
    let parts = &name.0;
    let start = parts.len().saturating_sub(2);
    parts[start..]
        .iter()
        .map(|ident| ident.value.as_str())
        .collect::<Vec<_>>()
        .join(".")
}

/// Summarize one SQL statement as `KIND table1 table2 ...`.
///
/// Tables are listed in order of appearance, duplicates included. Text the
/// parser rejects yields an empty string.
pub fn summarize(sql: &str) -> String {
    let statements = match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) => statements,
        Err(e) => {
            debug!("Cannot summarize query: {}", e);
            return String::new();
        }
    };
    let Some(statement) = statements.first() else {
        return String::new();
    };

    let mut summary = SummaryQuery::default();
    let _ = statement.visit(&mut summary);
    summary.to_string()
}
