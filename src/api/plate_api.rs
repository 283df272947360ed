// ==========================================
// 印版排版系统 - 印版 API
// ==========================================
// 职责: 印版生命周期管理 + 落位模拟/提交
// 并发契约: 提交路径为 "读取 -> 搜索 -> 条件写 -> 冲突重试",
//           模拟路径只读,可无限并发
// 红线: 拒绝的提交不得留下任何部分变更
// ==========================================

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::error::{ApiError, ApiResult};
use crate::domain::types::PlateStatus;
use crate::domain::{Placement, Plate, DEFAULT_MARGIN_CM};
use crate::engine::geometry::{self, PlateStats};
use crate::engine::planner::{PlacementPlanner, Position};
use crate::repository::error::RepositoryError;
use crate::repository::{JobOrderRepository, PlateRepository};

/// 乐观锁冲突时整段 "读取->搜索->条件写" 的最大重试次数
const MAX_COMMIT_RETRIES: u32 = 3;

/// 聚合看板返回的最近印版数量
const RECENT_PLATES_LIMIT: i64 = 5;

// ==========================================
// 请求/响应结构
// ==========================================

/// 创建印版请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlateRequest {
    pub name: Option<String>,
    pub width_cm: f64,
    pub height_cm: f64,
    /// 左边距,缺省 2cm
    pub margin_left_cm: Option<f64>,
    /// 右边距,缺省 2cm
    pub margin_right_cm: Option<f64>,
    pub material: String,
    pub material_thickness: f64,
}

/// 印版详情（统计每次重算,不缓存）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlateDetail {
    pub plate: Plate,
    pub stats: PlateStats,
}

/// 落位模拟结果（只读,不落库）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    pub fits: bool,
    pub position: Option<Position>,
    pub stats: PlateStats,
}

/// 落位提交结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementOutcome {
    pub plate: Plate,
    pub stats: PlateStats,
    pub position: Position,
}

/// 聚合统计（简单读聚合,无算法内容）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_plates: i64,
    pub active_plates: i64,
    pub completed_plates: i64,
    pub recent_plates: Vec<Plate>,
}

// ==========================================
// PlateApi - 印版 API
// ==========================================

/// 印版 API
///
/// 职责：
/// 1. 印版创建/查询/完成
/// 2. 落位模拟（只读）与提交（乐观锁重试）
/// 3. 版材兼容校验（提交前,失败不落库）
pub struct PlateApi {
    plate_repo: Arc<PlateRepository>,
    job_repo: Arc<JobOrderRepository>,
}

impl PlateApi {
    /// 创建新的 PlateApi 实例
    pub fn new(plate_repo: Arc<PlateRepository>, job_repo: Arc<JobOrderRepository>) -> Self {
        Self {
            plate_repo,
            job_repo,
        }
    }

    // ==========================================
    // 印版生命周期
    // ==========================================

    /// 创建印版（初始状态 ACTIVE,空落位列表）
    ///
    /// # 参数
    /// - req: 物理尺寸/边距/版材
    /// - operator: 操作员标识（审计归属）
    pub fn create_plate(&self, req: CreatePlateRequest, operator: &str) -> ApiResult<Plate> {
        if !(req.width_cm > 0.0) || !(req.height_cm > 0.0) {
            return Err(ApiError::ValidationError(format!(
                "印版尺寸必须为正数: width={}, height={}",
                req.width_cm, req.height_cm
            )));
        }

        let margin_left = req.margin_left_cm.unwrap_or(DEFAULT_MARGIN_CM);
        let margin_right = req.margin_right_cm.unwrap_or(DEFAULT_MARGIN_CM);
        if margin_left < 0.0 || margin_right < 0.0 {
            return Err(ApiError::ValidationError(format!(
                "边距不得为负数: left={}, right={}",
                margin_left, margin_right
            )));
        }
        if margin_left + margin_right > req.width_cm {
            return Err(ApiError::ValidationError(format!(
                "左右边距之和({})超过印版宽度({})",
                margin_left + margin_right,
                req.width_cm
            )));
        }
        if req.material.trim().is_empty() {
            return Err(ApiError::ValidationError("版材材质不能为空".to_string()));
        }

        let plate = Plate::new(
            req.name,
            req.width_cm,
            req.height_cm,
            margin_left,
            margin_right,
            req.material,
            req.material_thickness,
            Some(operator.to_string()),
        );

        self.plate_repo.create(&plate)?;
        info!(plate_id = %plate.plate_id, width = plate.width_cm, height = plate.height_cm, "印版已创建");
        Ok(plate)
    }

    /// 查询印版列表（可选状态过滤）
    pub fn list_plates(&self, status: Option<PlateStatus>) -> ApiResult<Vec<Plate>> {
        Ok(self.plate_repo.list(status)?)
    }

    /// 查询印版详情（统计从当前落位列表重算）
    pub fn get_plate(&self, plate_id: &str) -> ApiResult<PlateDetail> {
        let plate = self.load_plate(plate_id)?;
        let stats = geometry::compute_stats(&plate);
        Ok(PlateDetail { plate, stats })
    }

    /// 完成印版（ACTIVE -> COMPLETED,写入 completed_at）
    ///
    /// 重复完成被拒绝: 状态转换只发生一次,completed_at 不被覆盖
    pub fn complete_plate(&self, plate_id: &str) -> ApiResult<Plate> {
        for _attempt in 0..MAX_COMMIT_RETRIES {
            let plate = self.load_plate(plate_id)?;

            if plate.status != PlateStatus::Active {
                return Err(ApiError::InvalidState(format!(
                    "印版{}已处于{}状态,不可重复完成",
                    plate_id, plate.status
                )));
            }

            match self
                .plate_repo
                .complete(plate_id, plate.revision, chrono::Utc::now())
            {
                Ok(()) => {
                    info!(plate_id = %plate_id, "印版已完成");
                    return self.load_plate(plate_id);
                }
                Err(RepositoryError::OptimisticLockFailure { .. }) => {
                    warn!(plate_id = %plate_id, "完成印版遇乐观锁冲突,重试");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::OptimisticLockFailure(format!(
            "印版{}并发修改频繁,完成操作重试{}次后放弃",
            plate_id, MAX_COMMIT_RETRIES
        )))
    }

    // ==========================================
    // 落位模拟与提交
    // ==========================================

    /// 模拟落位（只读,不产生任何变更,可并发调用）
    ///
    /// 对同一印版状态与同一输入,结果完全确定
    pub fn simulate_placement(
        &self,
        plate_id: &str,
        width_cm: f64,
        height_cm: f64,
    ) -> ApiResult<SimulationResult> {
        Self::validate_dimensions(width_cm, height_cm)?;

        let plate = self.load_plate(plate_id)?;
        let position =
            PlacementPlanner::find_position(&plate, &plate.placements, width_cm, height_cm);
        let stats = geometry::compute_stats(&plate);

        debug!(
            plate_id = %plate_id,
            width = width_cm,
            height = height_cm,
            fits = position.is_some(),
            "落位模拟完成"
        );

        Ok(SimulationResult {
            fits: position.is_some(),
            position,
            stats,
        })
    }

    /// 提交落位
    ///
    /// 流程（每次重试都完整重走）:
    /// 1. 读取印版最新状态（NotFound / InvalidState 检查）
    /// 2. order_ref 存在时做版材兼容校验（失败不落库）
    /// 3. 对最新落位列表重跑首次适应搜索（无解 -> DoesNotFit）
    /// 4. 条件写入（revision 校验）,冲突则重试整段流程
    ///
    /// # 参数
    /// - order_ref: 关联订单作业（可选）
    /// - operator: 操作员标识,写入 placed_by
    pub fn add_placement(
        &self,
        plate_id: &str,
        width_cm: f64,
        height_cm: f64,
        order_ref: Option<String>,
        operator: &str,
    ) -> ApiResult<PlacementOutcome> {
        Self::validate_dimensions(width_cm, height_cm)?;

        for _attempt in 0..MAX_COMMIT_RETRIES {
            let plate = self.load_plate(plate_id)?;

            if plate.status != PlateStatus::Active {
                return Err(ApiError::InvalidState(format!(
                    "印版{}处于{}状态,不再接收落位",
                    plate_id, plate.status
                )));
            }

            // 版材兼容校验在搜索之前,失败时不产生任何落位
            if let Some(ref job_id) = order_ref {
                let job = self
                    .job_repo
                    .find_by_id(job_id)?
                    .ok_or_else(|| ApiError::NotFound(format!("订单作业(id={})不存在", job_id)))?;

                if !job.is_compatible(&plate.material, plate.material_thickness) {
                    return Err(ApiError::IncompatibleMaterial {
                        job_material: job.material,
                        job_thickness: job.material_thickness,
                        plate_material: plate.material.clone(),
                        plate_thickness: plate.material_thickness,
                    });
                }
            }

            let position =
                PlacementPlanner::find_position(&plate, &plate.placements, width_cm, height_cm)
                    .ok_or(ApiError::DoesNotFit {
                        width_cm,
                        height_cm,
                    })?;

            let placement = Placement {
                placement_id: Uuid::new_v4().to_string(),
                order_ref: order_ref.clone(),
                width_cm: position.width_cm,
                height_cm: position.height_cm,
                x_cm: position.x_cm,
                y_cm: position.y_cm,
                rotated: position.rotated,
                placed_at: chrono::Utc::now(),
                placed_by: Some(operator.to_string()),
            };

            match self
                .plate_repo
                .append_placement(plate_id, plate.revision, &placement)
            {
                Ok(()) => {
                    info!(
                        plate_id = %plate_id,
                        x = position.x_cm,
                        y = position.y_cm,
                        rotated = position.rotated,
                        "落位已提交"
                    );
                    let updated = self.load_plate(plate_id)?;
                    let stats = geometry::compute_stats(&updated);
                    return Ok(PlacementOutcome {
                        plate: updated,
                        stats,
                        position,
                    });
                }
                Err(RepositoryError::OptimisticLockFailure { .. }) => {
                    // 其他提交先行写入,对最新状态重新搜索
                    warn!(plate_id = %plate_id, "提交落位遇乐观锁冲突,重试");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::OptimisticLockFailure(format!(
            "印版{}并发提交频繁,落位提交重试{}次后放弃",
            plate_id, MAX_COMMIT_RETRIES
        )))
    }

    /// 移除落位（按提交顺序索引）
    ///
    /// 剩余落位保持原有顺序,后续条目索引前移。
    /// 不做状态保护: 已完成印版同样允许移除（与原始行为一致）。
    pub fn remove_placement(&self, plate_id: &str, index: usize) -> ApiResult<PlateDetail> {
        for _attempt in 0..MAX_COMMIT_RETRIES {
            let plate = self.load_plate(plate_id)?;

            // 索引在每次重试时对最新列表重新校验
            let placement = plate.placements.get(index).ok_or_else(|| {
                ApiError::ValidationError(format!(
                    "落位索引越界: index={}, 当前落位数={}",
                    index,
                    plate.placements.len()
                ))
            })?;

            match self.plate_repo.remove_placement(
                plate_id,
                plate.revision,
                &placement.placement_id,
            ) {
                Ok(()) => {
                    info!(plate_id = %plate_id, index = index, "落位已移除");
                    return self.get_plate(plate_id);
                }
                Err(RepositoryError::OptimisticLockFailure { .. }) => {
                    warn!(plate_id = %plate_id, "移除落位遇乐观锁冲突,重试");
                    continue;
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(ApiError::OptimisticLockFailure(format!(
            "印版{}并发修改频繁,移除操作重试{}次后放弃",
            plate_id, MAX_COMMIT_RETRIES
        )))
    }

    // ==========================================
    // 聚合统计
    // ==========================================

    /// 聚合看板: 印版总数/完成数/最近印版
    pub fn aggregate_stats(&self) -> ApiResult<AggregateStats> {
        let total_plates = self.plate_repo.count_all()?;
        let completed_plates = self.plate_repo.count_by_status(PlateStatus::Completed)?;
        let active_plates = self.plate_repo.count_by_status(PlateStatus::Active)?;
        let recent_plates = self.plate_repo.find_recent(RECENT_PLATES_LIMIT)?;

        Ok(AggregateStats {
            total_plates,
            active_plates,
            completed_plates,
            recent_plates,
        })
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 读取印版,缺失时返回 NotFound
    fn load_plate(&self, plate_id: &str) -> ApiResult<Plate> {
        self.plate_repo
            .find_by_id(plate_id)?
            .ok_or_else(|| ApiError::NotFound(format!("印版(id={})不存在", plate_id)))
    }

    /// 落位请求尺寸校验
    fn validate_dimensions(width_cm: f64, height_cm: f64) -> ApiResult<()> {
        if !(width_cm > 0.0) || !(height_cm > 0.0) {
            return Err(ApiError::ValidationError(format!(
                "落位尺寸必须为正数: width={}, height={}",
                width_cm, height_cm
            )));
        }
        Ok(())
    }
}
