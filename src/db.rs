use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection, OptionalExtension, Result, Row};

use crate::error::AppError;
use crate::models::{CompletionUpdate, Todo, TodoFilter, TodoInput};
use crate::validation::now_timestamp;

pub type DbPool = Arc<Mutex<Connection>>;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS todos (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        due_date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        completed_at TEXT,
        deleted_at TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_todos_deleted_at ON todos (deleted_at);
    CREATE INDEX IF NOT EXISTS idx_todos_completed_at ON todos (completed_at);
    CREATE INDEX IF NOT EXISTS idx_todos_due_date ON todos (due_date);
";

/// Rows matching this are live. Every read and write lookup goes through it.
const LIVE: &str = "deleted_at IS NULL";

const TODO_COLUMNS: &str =
    "id, title, description, due_date, created_at, updated_at, completed_at, deleted_at";

pub fn init_db(path: &Path) -> Result<DbPool, AppError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .map_err(|err| AppError::Database(format!("creating {}: {err}", dir.display())))?;
    }

    let conn = Connection::open(path)?;
    migrate(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn init_in_memory() -> Result<DbPool> {
    let conn = Connection::open_in_memory()?;
    migrate(&conn)?;
    Ok(Arc::new(Mutex::new(conn)))
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
}

fn row_to_todo(row: &Row<'_>) -> Result<Todo> {
    Ok(Todo {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
        completed_at: row.get(6)?,
        deleted_at: row.get(7)?,
    })
}

fn find_live(conn: &Connection, id: i64) -> Result<Option<Todo>> {
    conn.query_row(
        &format!("SELECT {TODO_COLUMNS} FROM todos WHERE id = ?1 AND {LIVE}"),
        [id],
        row_to_todo,
    )
    .optional()
}

pub fn list_todos(pool: &DbPool, filter: TodoFilter) -> Result<Vec<Todo>, AppError> {
    let conn = pool.lock()?;

    let completion = match filter {
        TodoFilter::All => "",
        TodoFilter::Active => " AND completed_at IS NULL",
        TodoFilter::Completed => " AND completed_at IS NOT NULL",
    };

    let mut stmt = conn.prepare(&format!(
        "SELECT {TODO_COLUMNS} FROM todos WHERE {LIVE}{completion}
         ORDER BY completed_at IS NOT NULL, due_date ASC, created_at ASC, id ASC"
    ))?;
    let todos = stmt
        .query_map([], row_to_todo)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(todos)
}

pub fn get_todo(pool: &DbPool, id: i64) -> Result<Option<Todo>, AppError> {
    let conn = pool.lock()?;
    Ok(find_live(&conn, id)?)
}

/// Expects already validated input.
pub fn create_todo(pool: &DbPool, input: &TodoInput) -> Result<Todo, AppError> {
    let conn = pool.lock()?;
    let now = now_timestamp()?;

    let todo = conn.query_row(
        &format!(
            "INSERT INTO todos (title, description, due_date, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?4)
             RETURNING {TODO_COLUMNS}"
        ),
        params![input.title, input.description, input.due_date, now],
        row_to_todo,
    )?;

    Ok(todo)
}

/// Replaces the text fields and applies the completion change.
/// Returns `None` when `id` is not a live todo.
pub fn update_todo(
    pool: &DbPool,
    id: i64,
    input: &TodoInput,
    completion: CompletionUpdate,
) -> Result<Option<Todo>, AppError> {
    let conn = pool.lock()?;

    let Some(existing) = find_live(&conn, id)? else {
        return Ok(None);
    };

    let now = now_timestamp()?;
    let completed_at = match completion {
        CompletionUpdate::Unchanged => existing.completed_at,
        CompletionUpdate::Complete => Some(now.clone()),
        CompletionUpdate::Reopen => None,
    };

    // MAX keeps updated_at from moving backwards if the wall clock does.
    let todo = conn
        .query_row(
            &format!(
                "UPDATE todos
                 SET title = ?1, description = ?2, due_date = ?3, completed_at = ?4,
                     updated_at = MAX(updated_at, ?5)
                 WHERE id = ?6 AND {LIVE}
                 RETURNING {TODO_COLUMNS}"
            ),
            params![input.title, input.description, input.due_date, completed_at, now, id],
            row_to_todo,
        )
        .optional()?;

    Ok(todo)
}

/// Marks a live todo deleted. Returns `false` when there was nothing live to delete.
pub fn soft_delete_todo(pool: &DbPool, id: i64) -> Result<bool, AppError> {
    let conn = pool.lock()?;
    let now = now_timestamp()?;
    let rows = conn.execute(
        &format!(
            "UPDATE todos SET deleted_at = ?1, updated_at = MAX(updated_at, ?1)
             WHERE id = ?2 AND {LIVE}"
        ),
        params![now, id],
    )?;
    Ok(rows > 0)
}
