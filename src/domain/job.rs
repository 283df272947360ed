// ==========================================
// 印版排版系统 - 订单作业领域模型
// ==========================================
// 用途: 外部协作方数据（只读）,提交落位时做版材兼容校验
// 红线: 本系统不管理订单生命周期,只消费材质/厚度两个字段
// ==========================================

use serde::{Deserialize, Serialize};

/// 订单作业（外部协作方视图）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobOrder {
    pub job_id: String,          // 作业唯一标识
    pub material: String,        // 要求的版材材质代码
    pub material_thickness: f64, // 要求的版材厚度（mm）
}

impl JobOrder {
    /// 判断版材是否与印版兼容（材质与厚度都必须一致）
    pub fn is_compatible(&self, plate_material: &str, plate_thickness: f64) -> bool {
        self.material == plate_material
            && (self.material_thickness - plate_thickness).abs() < 1e-9
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_compatibility() {
        let job = JobOrder {
            job_id: "J001".to_string(),
            material: "Flint".to_string(),
            material_thickness: 1.7,
        };

        assert!(job.is_compatible("Flint", 1.7));
        // 材质不同
        assert!(!job.is_compatible("Strong", 1.7));
        // 厚度不同
        assert!(!job.is_compatible("Flint", 1.14));
    }
}
