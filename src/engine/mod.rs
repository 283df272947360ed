// ==========================================
// 印版排版系统 - 引擎层
// ==========================================
// 红线: 引擎不直接写库,只计算和返回结果
// 职责: 几何计算 + 首次适应落位搜索
// ==========================================

pub mod geometry;
pub mod planner;

// 重导出核心引擎类型
pub use geometry::PlateStats;
pub use planner::{PlacementPlanner, Position};
