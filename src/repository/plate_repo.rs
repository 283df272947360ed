// ==========================================
// 印版排版系统 - 印版仓储
// ==========================================
// 并发控制: plate.revision 乐观锁
// 所有变更走 "UPDATE ... WHERE revision = ?" 条件写,
// 0 行受影响时区分 NotFound 与乐观锁冲突
// 红线: 落位按 seq_no 保序读取,提交顺序不可变
// ==========================================

use crate::domain::types::PlateStatus;
use crate::domain::{Placement, Plate};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

const PLATE_COLUMNS: &str = "plate_id, name, width_cm, height_cm, \
     margin_left_cm, margin_right_cm, material, material_thickness, \
     status, completed_at, created_at, created_by, revision";

// ==========================================
// PlateRepository - 印版仓储
// ==========================================
pub struct PlateRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PlateRepository {
    /// 创建新的 PlateRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 创建印版
    pub fn create(&self, plate: &Plate) -> RepositoryResult<String> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO plate (
                plate_id, name, width_cm, height_cm,
                margin_left_cm, margin_right_cm, material, material_thickness,
                status, completed_at, created_at, created_by, revision
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &plate.plate_id,
                &plate.name,
                plate.width_cm,
                plate.height_cm,
                plate.margin_left_cm,
                plate.margin_right_cm,
                &plate.material,
                plate.material_thickness,
                plate.status.to_db_str(),
                &plate.completed_at,
                &plate.created_at,
                &plate.created_by,
                plate.revision,
            ],
        )?;

        Ok(plate.plate_id.clone())
    }

    /// 追加落位 (带乐观锁检查)
    ///
    /// 同一事务内: 校验并递增 revision -> 分配下一个 seq_no -> 插入落位。
    /// seq_no 在事务内取 MAX+1,保证同一印版上提交顺序的原子分配。
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配 (其他提交已写入)
    /// - `RepositoryError::NotFound`: plate_id 不存在
    pub fn append_placement(
        &self,
        plate_id: &str,
        expected_revision: i32,
        placement: &Placement,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::bump_revision(&tx, plate_id, expected_revision)?;

        let next_seq: i64 = tx.query_row(
            "SELECT COALESCE(MAX(seq_no), -1) + 1 FROM placement WHERE plate_id = ?",
            params![plate_id],
            |row| row.get(0),
        )?;

        tx.execute(
            r#"INSERT INTO placement (
                placement_id, plate_id, seq_no, order_ref,
                width_cm, height_cm, x_cm, y_cm, rotated,
                placed_at, placed_by
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &placement.placement_id,
                plate_id,
                next_seq,
                &placement.order_ref,
                placement.width_cm,
                placement.height_cm,
                placement.x_cm,
                placement.y_cm,
                placement.rotated,
                &placement.placed_at,
                &placement.placed_by,
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    /// 移除落位 (带乐观锁检查)
    ///
    /// 按稳定 placement_id 删除,剩余落位保持原有顺序。
    pub fn remove_placement(
        &self,
        plate_id: &str,
        expected_revision: i32,
        placement_id: &str,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::bump_revision(&tx, plate_id, expected_revision)?;

        let deleted = tx.execute(
            "DELETE FROM placement WHERE plate_id = ? AND placement_id = ?",
            params![plate_id, placement_id],
        )?;

        if deleted == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Placement".to_string(),
                id: placement_id.to_string(),
            });
        }

        tx.commit()?;
        Ok(())
    }

    /// 完成印版 (带乐观锁检查)
    ///
    /// 写入 status = COMPLETED 与 completed_at。
    pub fn complete(
        &self,
        plate_id: &str,
        expected_revision: i32,
        completed_at: DateTime<Utc>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        Self::bump_revision(&tx, plate_id, expected_revision)?;

        tx.execute(
            "UPDATE plate SET status = ?, completed_at = ? WHERE plate_id = ?",
            params![
                PlateStatus::Completed.to_db_str(),
                &completed_at,
                plate_id
            ],
        )?;

        tx.commit()?;
        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按 plate_id 查询印版（含落位列表,按提交顺序）
    pub fn find_by_id(&self, plate_id: &str) -> RepositoryResult<Option<Plate>> {
        let conn = self.get_conn()?;

        let mut plate = match conn.query_row(
            &format!("SELECT {PLATE_COLUMNS} FROM plate WHERE plate_id = ?"),
            params![plate_id],
            Self::map_plate_row,
        ) {
            Ok(plate) => plate,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        plate.placements = Self::load_placements(&conn, plate_id)?;
        Ok(Some(plate))
    }

    /// 查询印版列表（可选状态过滤,按创建时间倒序,含落位列表）
    pub fn list(&self, status: Option<PlateStatus>) -> RepositoryResult<Vec<Plate>> {
        let conn = self.get_conn()?;

        let mut plates = match status {
            Some(s) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PLATE_COLUMNS} FROM plate WHERE status = ? ORDER BY created_at DESC"
                ))?;
                let rows = stmt
                    .query_map(params![s.to_db_str()], Self::map_plate_row)?
                    .collect::<Result<Vec<Plate>, _>>()?;
                rows
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PLATE_COLUMNS} FROM plate ORDER BY created_at DESC"
                ))?;
                let rows = stmt
                    .query_map([], Self::map_plate_row)?
                    .collect::<Result<Vec<Plate>, _>>()?;
                rows
            }
        };

        for plate in &mut plates {
            plate.placements = Self::load_placements(&conn, &plate.plate_id)?;
        }
        Ok(plates)
    }

    /// 最近创建的印版（聚合看板用）
    pub fn find_recent(&self, limit: i64) -> RepositoryResult<Vec<Plate>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PLATE_COLUMNS} FROM plate ORDER BY created_at DESC LIMIT ?"
        ))?;
        let mut plates = stmt
            .query_map(params![limit], Self::map_plate_row)?
            .collect::<Result<Vec<Plate>, _>>()?;

        for plate in &mut plates {
            plate.placements = Self::load_placements(&conn, &plate.plate_id)?;
        }
        Ok(plates)
    }

    /// 印版总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM plate", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 指定状态的印版数量
    pub fn count_by_status(&self, status: PlateStatus) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM plate WHERE status = ?",
            params![status.to_db_str()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 条件递增 revision;0 行受影响时区分 NotFound 与乐观锁冲突
    fn bump_revision(
        tx: &rusqlite::Transaction,
        plate_id: &str,
        expected_revision: i32,
    ) -> RepositoryResult<()> {
        let rows_affected = tx.execute(
            "UPDATE plate SET revision = revision + 1 WHERE plate_id = ? AND revision = ?",
            params![plate_id, expected_revision],
        )?;

        if rows_affected == 0 {
            let actual: Result<i32, _> = tx.query_row(
                "SELECT revision FROM plate WHERE plate_id = ?",
                params![plate_id],
                |row| row.get(0),
            );

            return match actual {
                Ok(actual_revision) => Err(RepositoryError::OptimisticLockFailure {
                    plate_id: plate_id.to_string(),
                    expected: expected_revision,
                    actual: actual_revision,
                }),
                Err(_) => Err(RepositoryError::NotFound {
                    entity: "Plate".to_string(),
                    id: plate_id.to_string(),
                }),
            };
        }

        Ok(())
    }

    /// 读取印版的落位列表（按 seq_no 升序 = 提交顺序）
    fn load_placements(conn: &Connection, plate_id: &str) -> RepositoryResult<Vec<Placement>> {
        let mut stmt = conn.prepare(
            r#"SELECT placement_id, order_ref, width_cm, height_cm,
                      x_cm, y_cm, rotated, placed_at, placed_by
               FROM placement
               WHERE plate_id = ?
               ORDER BY seq_no ASC"#,
        )?;

        let placements = stmt
            .query_map(params![plate_id], |row| {
                Ok(Placement {
                    placement_id: row.get(0)?,
                    order_ref: row.get(1)?,
                    width_cm: row.get(2)?,
                    height_cm: row.get(3)?,
                    x_cm: row.get(4)?,
                    y_cm: row.get(5)?,
                    rotated: row.get(6)?,
                    placed_at: row.get(7)?,
                    placed_by: row.get(8)?,
                })
            })?
            .collect::<Result<Vec<Placement>, _>>()?;

        Ok(placements)
    }

    /// 映射数据库行到 Plate 对象（落位列表由调用方另行加载）
    fn map_plate_row(row: &rusqlite::Row) -> rusqlite::Result<Plate> {
        let status_str: String = row.get(8)?;
        Ok(Plate {
            plate_id: row.get(0)?,
            name: row.get(1)?,
            width_cm: row.get(2)?,
            height_cm: row.get(3)?,
            margin_left_cm: row.get(4)?,
            margin_right_cm: row.get(5)?,
            material: row.get(6)?,
            material_thickness: row.get(7)?,
            status: PlateStatus::from_db_str(&status_str),
            completed_at: row.get(9)?,
            placements: Vec::new(),
            created_at: row.get(10)?,
            created_by: row.get(11)?,
            revision: row.get(12)?,
        })
    }
}
