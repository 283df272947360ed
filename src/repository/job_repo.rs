// ==========================================
// 印版排版系统 - 订单作业仓储
// ==========================================
// 用途: 外部协作方数据的只读查询（材质兼容校验）
// 写入接口仅用于数据同步/测试铺底
// ==========================================

use crate::domain::JobOrder;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// JobOrderRepository - 订单作业仓储
// ==========================================
pub struct JobOrderRepository {
    conn: Arc<Mutex<Connection>>,
}

impl JobOrderRepository {
    /// 创建新的 JobOrderRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 按 job_id 查询作业
    pub fn find_by_id(&self, job_id: &str) -> RepositoryResult<Option<JobOrder>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            "SELECT job_id, material, material_thickness FROM job_order WHERE job_id = ?",
            params![job_id],
            |row| {
                Ok(JobOrder {
                    job_id: row.get(0)?,
                    material: row.get(1)?,
                    material_thickness: row.get(2)?,
                })
            },
        ) {
            Ok(job) => Ok(Some(job)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入作业（数据同步/测试铺底用）
    pub fn upsert(&self, job: &JobOrder) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"INSERT INTO job_order (job_id, material, material_thickness)
               VALUES (?, ?, ?)
               ON CONFLICT(job_id) DO UPDATE SET
                   material = excluded.material,
                   material_thickness = excluded.material_thickness"#,
            params![&job.job_id, &job.material, job.material_thickness],
        )?;

        Ok(())
    }
}
