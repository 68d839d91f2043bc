// Relational sinks: portable SQL dump and SQLite database

use crate::collection::DocumentMap;
use crate::error::Result;
use crate::relation::{EntityTable, JoinTable, RelationalModel, SqlValue};
use crate::schema::KEY_COLUMN;
use rusqlite::Connection;
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Destination for an extracted relational model.
///
/// Emitting the same model twice must leave byte-identical output behind.
pub trait RelationalSink {
    fn emit(&self, model: &RelationalModel) -> Result<()>;

    fn destination(&self) -> &Path;
}

/// Writes the model as a self-contained SQL script
pub struct SqlDumpSink {
    path: PathBuf,
}

impl SqlDumpSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqlDumpSink { path: path.into() }
    }
}

impl RelationalSink for SqlDumpSink {
    fn emit(&self, model: &RelationalModel) -> Result<()> {
        write_atomic(&self.path, render_sql(model).as_bytes())?;
        log::info!("wrote SQL dump to {}", self.path.display());
        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.path
    }
}

/// Materializes the model into a fresh SQLite database file
pub struct SqliteSink {
    path: PathBuf,
}

impl SqliteSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteSink { path: path.into() }
    }
}

impl RelationalSink for SqliteSink {
    fn emit(&self, model: &RelationalModel) -> Result<()> {
        // Build next to the destination, then swap it in with one rename
        let tmp = NamedTempFile::new_in(parent_dir(&self.path))?;
        let conn = Connection::open(tmp.path())?;
        load_into(&conn, model)?;
        conn.close().map_err(|(_, e)| e)?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        log::info!("wrote SQLite database to {}", self.path.display());
        Ok(())
    }

    fn destination(&self) -> &Path {
        &self.path
    }
}

/// Run the rendered script against a connection. The SQLite sink and the
/// dump share this one renderer so both describe the same database.
pub fn load_into(conn: &Connection, model: &RelationalModel) -> Result<()> {
    conn.execute_batch(&render_sql(model))?;
    Ok(())
}

/// Open an in-memory database holding the model
pub fn open_in_memory(model: &RelationalModel) -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    load_into(&conn, model)?;
    Ok(conn)
}

/// Render the model as SQL: entity tables first so join-table foreign keys
/// always point at tables that already exist.
pub fn render_sql(model: &RelationalModel) -> String {
    let mut out = String::new();
    out.push_str("-- corpusdb relational model\n");
    out.push_str("PRAGMA foreign_keys = ON;\n");
    out.push_str("BEGIN TRANSACTION;\n");
    for table in &model.entity_tables {
        render_entity_table(&mut out, table);
    }
    for table in &model.join_tables {
        render_join_table(&mut out, table);
    }
    out.push_str("COMMIT;\n");
    out
}

fn render_entity_table(out: &mut String, table: &EntityTable) {
    let _ = writeln!(out, "\nCREATE TABLE {} (", quote_ident(&table.name));
    let _ = write!(out, "  {} TEXT NOT NULL PRIMARY KEY", quote_ident(KEY_COLUMN));
    for column in &table.columns {
        let _ = write!(
            out,
            ",\n  {} {}{}",
            quote_ident(&column.name),
            column.sql_type.as_sql(),
            if column.not_null { " NOT NULL" } else { "" }
        );
    }
    out.push_str("\n);\n");

    let column_list = std::iter::once(quote_ident(KEY_COLUMN))
        .chain(table.columns.iter().map(|c| quote_ident(&c.name)))
        .collect::<Vec<_>>()
        .join(", ");
    for row in &table.rows {
        let values = std::iter::once(quote_text(&row.id))
            .chain(row.values.iter().map(sql_literal))
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(
            out,
            "INSERT INTO {} ({column_list}) VALUES ({values});",
            quote_ident(&table.name)
        );
    }
}

fn render_join_table(out: &mut String, table: &JoinTable) {
    let name = quote_ident(&table.name);
    let source = quote_ident(&table.source_column);
    let target = quote_ident(&table.target_column);
    let _ = writeln!(
        out,
        "\n-- {}.{} -> {} (cardinality {})",
        table.source_table, table.property, table.target_table, table.cardinality
    );
    let _ = writeln!(out, "CREATE TABLE {name} (");
    let _ = writeln!(
        out,
        "  {source} TEXT NOT NULL REFERENCES {} ({}),",
        quote_ident(&table.source_table),
        quote_ident(KEY_COLUMN)
    );
    let _ = writeln!(
        out,
        "  {target} TEXT NOT NULL REFERENCES {} ({}),",
        quote_ident(&table.target_table),
        quote_ident(KEY_COLUMN)
    );
    let _ = writeln!(out, "  PRIMARY KEY ({source}, {target})");
    out.push_str(");\n");
    for row in &table.rows {
        let _ = writeln!(
            out,
            "INSERT INTO {name} ({source}, {target}) VALUES ({}, {});",
            quote_text(&row.source),
            quote_text(&row.target)
        );
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn quote_text(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn sql_literal(value: &SqlValue) -> String {
    match value {
        SqlValue::Null => "NULL".to_string(),
        SqlValue::Text(s) => quote_text(s),
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => format!("{f:?}"),
    }
}

/// Write the document map as pretty JSON
pub fn write_document_map(map: &DocumentMap, path: &Path) -> Result<()> {
    let mut json = map.to_json_pretty()?;
    json.push('\n');
    write_atomic(path, json.as_bytes())?;
    log::info!("wrote collections map to {}", path.display());
    Ok(())
}

/// Write through a temp file in the destination directory and rename it
/// over the target, so readers never observe a half-written file.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let mut tmp = NamedTempFile::new_in(parent_dir(path))?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
