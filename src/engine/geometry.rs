// ==========================================
// 印版排版系统 - 几何计算
// ==========================================
// 职责: 对印版快照做纯函数计算,无 I/O
// 坐标系: 原点左上角,x 向右,y 向下
// 红线: 统计值按需重算,永不缓存
// ==========================================

use crate::domain::{Placement, Plate};
use serde::{Deserialize, Serialize};

/// 浮点比较容差（边界包含判断用；重叠判断保持严格开区间）
pub const EPS: f64 = 1e-9;

// ==========================================
// 基础几何
// ==========================================

/// 可用 x 区间 [margin_left, width - margin_right]
pub fn usable_x_range(plate: &Plate) -> (f64, f64) {
    (plate.margin_left_cm, plate.width_cm - plate.margin_right_cm)
}

/// 可用宽度（扣除左右边距）
pub fn usable_width(plate: &Plate) -> f64 {
    let (left, right) = usable_x_range(plate);
    right - left
}

/// 印版总面积
pub fn total_area(plate: &Plate) -> f64 {
    plate.width_cm * plate.height_cm
}

/// 可用面积（可用宽度 × 高度）
pub fn usable_area(plate: &Plate) -> f64 {
    usable_width(plate) * plate.height_cm
}

/// 已占用面积（所有落位矩形面积之和）
pub fn used_area(plate: &Plate) -> f64 {
    plate
        .placements
        .iter()
        .map(|p| p.width_cm * p.height_cm)
        .sum()
}

/// 剩余面积 max(0, 可用 - 已占用)
pub fn remaining_area(plate: &Plate) -> f64 {
    (usable_area(plate) - used_area(plate)).max(0.0)
}

/// 两个轴对齐矩形是否重叠
///
/// 严格开区间判定: 仅边缘相接不算重叠
pub fn overlaps(
    ax: f64,
    ay: f64,
    aw: f64,
    ah: f64,
    bx: f64,
    by: f64,
    bw: f64,
    bh: f64,
) -> bool {
    ax < bx + bw && bx < ax + aw && ay < by + bh && by < ay + ah
}

/// 候选矩形 (x, y, w, h) 是否合法落位
///
/// 条件:
/// - x >= margin_left 且 x + w <= width - margin_right
/// - y >= 0 且 y + h <= height（无上下边距概念）
/// - 与现有落位均不重叠
pub fn fits(plate: &Plate, placements: &[Placement], x: f64, y: f64, w: f64, h: f64) -> bool {
    let (left, right) = usable_x_range(plate);

    if x + EPS < left || x + w > right + EPS {
        return false;
    }
    if y + EPS < 0.0 || y + h > plate.height_cm + EPS {
        return false;
    }

    placements
        .iter()
        .all(|p| !overlaps(x, y, w, h, p.x_cm, p.y_cm, p.width_cm, p.height_cm))
}

// ==========================================
// PlateStats - 印版统计
// ==========================================

/// 印版统计（每次查询从当前落位列表重算）
///
/// 注意: waste_pct 只由印版几何（边距 vs 总尺寸）决定,
/// 与落位无关,不代表实际排版浪费。该口径不得改动。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateStats {
    pub total_area_cm2: f64,     // 总面积
    pub usable_area_cm2: f64,    // 可用面积（扣除边距）
    pub used_area_cm2: f64,      // 已占用面积
    pub remaining_area_cm2: f64, // 剩余面积
    pub used_pct: f64,           // 占用率（相对总面积）
    pub waste_pct: f64,          // 边距损耗率（纯几何口径）
    pub placement_count: usize,  // 落位数
}

/// 计算印版统计
pub fn compute_stats(plate: &Plate) -> PlateStats {
    let total = total_area(plate);
    let usable = usable_area(plate);
    let used = used_area(plate);

    // 总面积为 0 时占比一律按 0 处理
    let (used_pct, waste_pct) = if total > 0.0 {
        (used / total * 100.0, (1.0 - usable / total) * 100.0)
    } else {
        (0.0, 0.0)
    };

    PlateStats {
        total_area_cm2: total,
        usable_area_cm2: usable,
        used_area_cm2: used,
        remaining_area_cm2: remaining_area(plate),
        used_pct,
        waste_pct,
        placement_count: plate.placements.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn test_plate(width: f64, height: f64, margin_left: f64, margin_right: f64) -> Plate {
        Plate::new(
            None,
            width,
            height,
            margin_left,
            margin_right,
            "Flint".to_string(),
            1.7,
            None,
        )
    }

    fn test_placement(x: f64, y: f64, w: f64, h: f64) -> Placement {
        Placement {
            placement_id: uuid::Uuid::new_v4().to_string(),
            order_ref: None,
            width_cm: w,
            height_cm: h,
            x_cm: x,
            y_cm: y,
            rotated: false,
            placed_at: Utc::now(),
            placed_by: None,
        }
    }

    #[test]
    fn test_usable_range_and_areas() {
        // 场景A: 100x100, 左右边距各5
        let plate = test_plate(100.0, 100.0, 5.0, 5.0);

        assert_eq!(usable_x_range(&plate), (5.0, 95.0));
        assert_eq!(usable_width(&plate), 90.0);
        assert_eq!(total_area(&plate), 10000.0);
        assert_eq!(usable_area(&plate), 9000.0);

        let stats = compute_stats(&plate);
        assert_eq!(stats.usable_area_cm2, 9000.0);
        assert!((stats.waste_pct - 10.0).abs() < EPS);
    }

    #[test]
    fn test_waste_pct_independent_of_placements() {
        let mut plate = test_plate(100.0, 100.0, 5.0, 5.0);
        let before = compute_stats(&plate).waste_pct;

        plate.placements.push(test_placement(5.0, 0.0, 40.0, 50.0));
        let after = compute_stats(&plate).waste_pct;

        assert_eq!(before, after);
    }

    #[test]
    fn test_zero_area_guard() {
        let plate = test_plate(0.0, 0.0, 0.0, 0.0);
        let stats = compute_stats(&plate);
        assert_eq!(stats.used_pct, 0.0);
        assert_eq!(stats.waste_pct, 0.0);
    }

    #[test]
    fn test_overlaps_strict() {
        // 相交
        assert!(overlaps(0.0, 0.0, 10.0, 10.0, 5.0, 5.0, 10.0, 10.0));
        // 边缘相接不算重叠
        assert!(!overlaps(0.0, 0.0, 10.0, 10.0, 10.0, 0.0, 10.0, 10.0));
        assert!(!overlaps(0.0, 0.0, 10.0, 10.0, 0.0, 10.0, 10.0, 10.0));
        // 完全分离
        assert!(!overlaps(0.0, 0.0, 5.0, 5.0, 20.0, 20.0, 5.0, 5.0));
        // 包含
        assert!(overlaps(0.0, 0.0, 20.0, 20.0, 5.0, 5.0, 5.0, 5.0));
    }

    #[test]
    fn test_fits_boundaries() {
        let plate = test_plate(100.0, 50.0, 5.0, 5.0);

        // 贴左边距
        assert!(fits(&plate, &[], 5.0, 0.0, 40.0, 50.0));
        // 越过左边距
        assert!(!fits(&plate, &[], 4.0, 0.0, 40.0, 50.0));
        // 贴右边距 (55 + 40 = 95)
        assert!(fits(&plate, &[], 55.0, 0.0, 40.0, 50.0));
        // 越过右边距
        assert!(!fits(&plate, &[], 56.0, 0.0, 40.0, 50.0));
        // 超高
        assert!(!fits(&plate, &[], 5.0, 1.0, 40.0, 50.0));
    }

    #[test]
    fn test_fits_overlap_rejection() {
        let plate = test_plate(100.0, 50.0, 0.0, 0.0);
        let existing = vec![test_placement(0.0, 0.0, 40.0, 50.0)];

        // 与现有落位重叠
        assert!(!fits(&plate, &existing, 30.0, 0.0, 40.0, 50.0));
        // 紧贴右侧边缘,不重叠
        assert!(fits(&plate, &existing, 40.0, 0.0, 40.0, 50.0));
    }
}
