// ==========================================
// 印版排版系统 - 领域层
// ==========================================
// 职责: 定义实体与类型,不含数据访问逻辑
// 红线: 领域实体不依赖仓储层
// ==========================================

pub mod job;
pub mod plate;
pub mod types;

// 重导出核心实体
pub use job::JobOrder;
pub use plate::{Placement, Plate, DEFAULT_MARGIN_CM};
pub use types::PlateStatus;
