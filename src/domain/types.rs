// ==========================================
// 印版排版系统 - 领域类型定义
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 印版状态 (Plate Status)
// ==========================================
// 红线: ACTIVE -> COMPLETED 单向转换,不可逆
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlateStatus {
    Active,    // 在用(可继续贴版)
    Completed, // 已完成(已曝光,不再接收落位)
}

impl PlateStatus {
    /// 转换为数据库字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            PlateStatus::Active => "ACTIVE",
            PlateStatus::Completed => "COMPLETED",
        }
    }

    /// 从数据库字符串解析（未知值按 ACTIVE 处理）
    pub fn from_db_str(s: &str) -> Self {
        match s {
            "COMPLETED" => PlateStatus::Completed,
            _ => PlateStatus::Active,
        }
    }
}

impl fmt::Display for PlateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}
