// ==========================================
// 印版排版系统 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免"部分模块外键开启/部分不开启"
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中建表语句，库与测试共用同一份 schema
// ==========================================

use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
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

/// 初始化数据库 schema（幂等）
///
/// 表结构：
/// - plate: 印版主表（含 revision 乐观锁列）
/// - placement: 落位表（seq_no 保持提交顺序）
/// - job_order: 订单作业表（外部协作方只读数据，材质兼容校验用）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS plate (
            plate_id TEXT PRIMARY KEY,
            name TEXT,
            width_cm REAL NOT NULL,
            height_cm REAL NOT NULL,
            margin_left_cm REAL NOT NULL DEFAULT 2.0,
            margin_right_cm REAL NOT NULL DEFAULT 2.0,
            material TEXT NOT NULL,
            material_thickness REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            completed_at TEXT,
            created_at TEXT NOT NULL,
            created_by TEXT,
            revision INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS placement (
            placement_id TEXT PRIMARY KEY,
            plate_id TEXT NOT NULL REFERENCES plate(plate_id) ON DELETE CASCADE,
            seq_no INTEGER NOT NULL,
            order_ref TEXT,
            width_cm REAL NOT NULL,
            height_cm REAL NOT NULL,
            x_cm REAL NOT NULL,
            y_cm REAL NOT NULL,
            rotated INTEGER NOT NULL DEFAULT 0,
            placed_at TEXT NOT NULL,
            placed_by TEXT,
            UNIQUE(plate_id, seq_no)
        );

        CREATE TABLE IF NOT EXISTS job_order (
            job_id TEXT PRIMARY KEY,
            material TEXT NOT NULL,
            material_thickness REAL NOT NULL
        );
        "#,
    )?;
    Ok(())
}
