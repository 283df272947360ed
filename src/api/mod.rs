// ==========================================
// 印版排版系统 - API 层
// ==========================================
// 职责: 对外业务接口（与传输层无关）
// 红线: 所有错误信息必须包含显式原因（可解释性）
// ==========================================

pub mod error;
pub mod plate_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use plate_api::{
    AggregateStats, CreatePlateRequest, PlacementOutcome, PlateApi, PlateDetail,
    SimulationResult,
};
