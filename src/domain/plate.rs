// ==========================================
// 印版排版系统 - 印版领域模型
// ==========================================
// 坐标系: 原点在印版左上角,x 向右,y 向下(跨行递增)
// 边距: 仅左右夹边,无上下边距概念
// ==========================================

use crate::domain::types::PlateStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 默认左右边距（厘米）
pub const DEFAULT_MARGIN_CM: f64 = 2.0;

// ==========================================
// Plate - 印版聚合根
// ==========================================
// 红线: 落位列表按提交顺序保存,不得重排
// 并发: revision 为乐观锁计数器,仓储层写入时校验
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plate {
    // ===== 主键 =====
    pub plate_id: String, // 印版唯一标识（UUID）

    // ===== 基础信息 =====
    pub name: Option<String>, // 显示名称

    // ===== 物理尺寸 =====
    pub width_cm: f64,        // 印版宽度（cm，正数）
    pub height_cm: f64,       // 印版高度（cm，正数）
    pub margin_left_cm: f64,  // 左边距（cm，非负）
    pub margin_right_cm: f64, // 右边距（cm，非负）

    // ===== 版材信息（与订单作业交叉校验）=====
    pub material: String,        // 版材材质代码
    pub material_thickness: f64, // 版材厚度（mm）

    // ===== 状态 =====
    pub status: PlateStatus,                 // ACTIVE / COMPLETED
    pub completed_at: Option<DateTime<Utc>>, // 完成时间（转换到 COMPLETED 时写入一次）

    // ===== 落位列表（插入顺序 = 提交顺序）=====
    pub placements: Vec<Placement>,

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,  // 记录创建时间
    pub created_by: Option<String>, // 创建操作员

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号
}

impl Plate {
    /// 创建新的在用印版（空落位列表）
    pub fn new(
        name: Option<String>,
        width_cm: f64,
        height_cm: f64,
        margin_left_cm: f64,
        margin_right_cm: f64,
        material: String,
        material_thickness: f64,
        created_by: Option<String>,
    ) -> Self {
        Self {
            plate_id: Uuid::new_v4().to_string(),
            name,
            width_cm,
            height_cm,
            margin_left_cm,
            margin_right_cm,
            material,
            material_thickness,
            status: PlateStatus::Active,
            completed_at: None,
            placements: Vec::new(),
            created_at: Utc::now(),
            created_by,
            revision: 0,
        }
    }
}

// ==========================================
// Placement - 落位（已提交的作业矩形）
// ==========================================
// 说明: width/height 为"落位后"尺寸,旋转时已互换
// placement_id 为稳定标识,展示/移除顺序仍按提交顺序
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub placement_id: String,      // 落位稳定标识（UUID）
    pub order_ref: Option<String>, // 关联订单作业（可选,仅溯源）

    // ===== 落位矩形 =====
    pub width_cm: f64,  // 落位宽度（cm）
    pub height_cm: f64, // 落位高度（cm）
    pub x_cm: f64,      // 左边缘位置（印版坐标系）
    pub y_cm: f64,      // 上边缘位置（y 向下递增）
    pub rotated: bool,  // 是否相对请求旋转 90°（宽高互换）

    // ===== 审计字段 =====
    pub placed_at: DateTime<Utc>,  // 落位时间
    pub placed_by: Option<String>, // 操作员（仅归属,无所有权语义）
}
