// ==========================================
// 高校考试排考系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为,避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout,减少并发写入时的偶发 busy 错误
// - 提供参考 schema 的一次性建表入口
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout (毫秒)
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明: 版本号用于提示/告警 (不做自动迁移),避免静默在旧库上运行。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明:
/// - foreign_keys 需要"每个连接"单独开启
/// - busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version (若表不存在则返回 None)
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| {
            row.get(0)
        })?;
    Ok(v)
}

/// 初始化参考 schema (幂等)
///
/// 排考引擎的参考存储: 配置 + 参考数据 + 方案/考试明细。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS students (
            student_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            formation_id TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS professors (
            professor_id TEXT PRIMARY KEY,
            full_name TEXT NOT NULL,
            department_id TEXT NOT NULL,
            max_exams_per_day INTEGER NOT NULL DEFAULT 0,
            max_exams_per_week INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS professor_unavailability (
            professor_id TEXT NOT NULL REFERENCES professors(professor_id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            PRIMARY KEY (professor_id, date)
        );

        CREATE TABLE IF NOT EXISTS rooms (
            room_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            capacity INTEGER NOT NULL,
            room_type TEXT NOT NULL DEFAULT 'CLASSROOM',
            campus TEXT NOT NULL DEFAULT '',
            available INTEGER NOT NULL DEFAULT 1
        );

        CREATE TABLE IF NOT EXISTS modules (
            module_id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            formation_id TEXT NOT NULL,
            department_id TEXT NOT NULL,
            duration_minutes INTEGER NOT NULL DEFAULT 0,
            preferred_room_type TEXT
        );

        CREATE TABLE IF NOT EXISTS enrollments (
            student_id TEXT NOT NULL REFERENCES students(student_id) ON DELETE CASCADE,
            module_id TEXT NOT NULL REFERENCES modules(module_id) ON DELETE CASCADE,
            PRIMARY KEY (student_id, module_id)
        );

        CREATE TABLE IF NOT EXISTS schedules (
            version_id TEXT PRIMARY KEY,
            horizon_start TEXT NOT NULL,
            horizon_end TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS exams (
            version_id TEXT NOT NULL REFERENCES schedules(version_id) ON DELETE CASCADE,
            exam_id TEXT NOT NULL,
            module_id TEXT NOT NULL,
            exam_date TEXT,
            slot_no INTEGER,
            room_id TEXT,
            professor_id TEXT,
            duration_minutes INTEGER NOT NULL,
            status TEXT NOT NULL DEFAULT 'UNSCHEDULED',
            PRIMARY KEY (version_id, exam_id)
        );

        CREATE INDEX IF NOT EXISTS idx_exams_date ON exams(version_id, exam_date);
        CREATE INDEX IF NOT EXISTS idx_enrollments_module ON enrollments(module_id);

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;
    Ok(())
}
