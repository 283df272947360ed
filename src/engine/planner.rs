// ==========================================
// 印版排版系统 - 落位规划引擎
// ==========================================
// 算法: 确定性首次适应,行优先
// 平局规则: 最小 y -> 最小 x -> 不旋转优先于旋转
// 红线: 引擎无状态,对同一输入必须返回同一结果
// ==========================================

use crate::domain::{Placement, Plate};
use crate::engine::geometry::{self, EPS};
use serde::{Deserialize, Serialize};

// ==========================================
// Position - 搜索结果
// ==========================================

/// 落位搜索结果（尺寸为"落位后"口径,旋转时已互换）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x_cm: f64,
    pub y_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
    pub rotated: bool,
}

// ==========================================
// PlacementPlanner - 首次适应搜索
// ==========================================

pub struct PlacementPlanner;

impl PlacementPlanner {
    /// 为请求矩形寻找合法落位
    ///
    /// 算法:
    /// 1. 两个朝向的宽度都超过可用宽度时直接失败（宽度预检,免扫描）
    /// 2. 朝向固定顺序: 先不旋转,再旋转（宽高互换）;宽度超限的朝向整体跳过
    /// 3. 候选行集合 = {0} ∪ {每个现有落位的下边缘},升序
    /// 4. 每个候选行内从 margin_left 起扫描 x;被阻挡时跳到
    ///    max(x + 1, 首个阻挡落位的右边缘),不做逐单位爬行
    /// 5. 首个通过 fits 的 (朝向, y, x) 即为结果
    ///
    /// # 返回
    /// - Some(Position): 合法落位（满足全部几何约束）
    /// - None: 不存在合法落位
    pub fn find_position(
        plate: &Plate,
        placements: &[Placement],
        requested_width: f64,
        requested_height: f64,
    ) -> Option<Position> {
        let usable_w = geometry::usable_width(plate);

        // 宽度预检: 两个朝向宽度方向上都放不下,任何扫描都是徒劳
        if requested_width > usable_w + EPS && requested_height > usable_w + EPS {
            return None;
        }

        // 朝向候选: 不旋转优先
        let orientations = [
            (requested_width, requested_height, false),
            (requested_height, requested_width, true),
        ];

        for (w, h, rotated) in orientations {
            if w > usable_w + EPS {
                continue;
            }
            if let Some((x, y)) = Self::scan_orientation(plate, placements, w, h) {
                return Some(Position {
                    x_cm: x,
                    y_cm: y,
                    width_cm: w,
                    height_cm: h,
                    rotated,
                });
            }
        }

        None
    }

    /// 候选行集合: {0} ∪ {落位下边缘},升序去重
    ///
    /// 把搜索限制在"货架"行上,不逐像素扫描
    fn candidate_rows(placements: &[Placement]) -> Vec<f64> {
        let mut rows: Vec<f64> = Vec::with_capacity(placements.len() + 1);
        rows.push(0.0);
        rows.extend(placements.iter().map(|p| p.y_cm + p.height_cm));
        rows.sort_by(f64::total_cmp);
        rows.dedup_by(|a, b| (*a - *b).abs() < EPS);
        rows
    }

    /// 单朝向扫描,返回首个合法 (x, y)
    fn scan_orientation(
        plate: &Plate,
        placements: &[Placement],
        w: f64,
        h: f64,
    ) -> Option<(f64, f64)> {
        let (left, right) = geometry::usable_x_range(plate);

        for y in Self::candidate_rows(placements) {
            // 行高超出印版,后续更低的行只会更差,但行集合无序性由排序保证,直接跳过即可
            if y + h > plate.height_cm + EPS {
                continue;
            }

            let mut x = left;
            while x + w <= right + EPS {
                if geometry::fits(plate, placements, x, y, w, h) {
                    return Some((x, y));
                }

                // 跳到首个阻挡落位（按右边缘升序）的右边缘,至少前进 1
                let next_edge = placements
                    .iter()
                    .filter(|p| {
                        geometry::overlaps(x, y, w, h, p.x_cm, p.y_cm, p.width_cm, p.height_cm)
                    })
                    .map(|p| p.x_cm + p.width_cm)
                    .fold(f64::INFINITY, f64::min);

                if !next_edge.is_finite() {
                    // fits 失败但无阻挡落位 => 边界约束失败,该行无解
                    break;
                }
                x = next_edge.max(x + 1.0);
            }
        }

        None
    }
}
