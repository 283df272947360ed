// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、API 装配等功能
// ==========================================

use plate_layout::api::PlateApi;
use plate_layout::db;
use plate_layout::repository::{JobOrderRepository, PlateRepository};
use std::error::Error;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    plate_layout::logging::init_test();

    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = db::open_sqlite_connection(&db_path)?;
    db::init_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 在指定数据库上装配一套 PlateApi（独立连接）
pub fn build_api(db_path: &str) -> Result<(Arc<PlateApi>, Arc<JobOrderRepository>), Box<dyn Error>> {
    let conn = Arc::new(Mutex::new(db::open_sqlite_connection(db_path)?));
    let plate_repo = Arc::new(PlateRepository::new(conn.clone()));
    let job_repo = Arc::new(JobOrderRepository::new(conn));
    let api = Arc::new(PlateApi::new(plate_repo, job_repo.clone()));
    Ok((api, job_repo))
}

/// 创建测试环境: 临时库 + 已装配的 API
pub fn setup_test_env() -> (
    NamedTempFile,
    String,
    Arc<PlateApi>,
    Arc<JobOrderRepository>,
) {
    let (temp_file, db_path) = create_test_db().unwrap();
    let (api, job_repo) = build_api(&db_path).unwrap();
    (temp_file, db_path, api, job_repo)
}
