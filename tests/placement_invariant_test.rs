// ==========================================
// 落位不变量测试（随机序列）
// ==========================================
// 职责: 对随机尺寸的提交序列验证两条核心不变量:
//   1. 每个落位都落在可用区间内
//   2. 任意两个落位互不重叠（严格开区间口径）
// 随机源使用固定种子,保证可复现
// ==========================================

#[path = "test_helpers.rs"]
mod test_helpers;

#[cfg(test)]
mod placement_invariant_test {
    use plate_layout::api::CreatePlateRequest;
    use plate_layout::domain::Plate;
    use plate_layout::engine::geometry;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use crate::test_helpers::setup_test_env;

    const EPS: f64 = 1e-9;

    /// 校验印版当前落位列表满足包含性与互不重叠
    fn assert_invariants(plate: &Plate) {
        let (left, right) = geometry::usable_x_range(plate);

        for p in &plate.placements {
            assert!(p.x_cm >= left - EPS, "落位越过左边距: x={}", p.x_cm);
            assert!(
                p.x_cm + p.width_cm <= right + EPS,
                "落位越过右边距: x+w={}",
                p.x_cm + p.width_cm
            );
            assert!(p.y_cm >= -EPS, "落位越过上边缘: y={}", p.y_cm);
            assert!(
                p.y_cm + p.height_cm <= plate.height_cm + EPS,
                "落位越过下边缘: y+h={}",
                p.y_cm + p.height_cm
            );
        }

        for (i, a) in plate.placements.iter().enumerate() {
            for b in plate.placements.iter().skip(i + 1) {
                assert!(
                    !geometry::overlaps(
                        a.x_cm, a.y_cm, a.width_cm, a.height_cm,
                        b.x_cm, b.y_cm, b.width_cm, b.height_cm
                    ),
                    "落位重叠: a=({},{},{},{}) b=({},{},{},{})",
                    a.x_cm, a.y_cm, a.width_cm, a.height_cm,
                    b.x_cm, b.y_cm, b.width_cm, b.height_cm
                );
            }
        }
    }

    #[test]
    fn test_random_commit_sequences_hold_invariants() {
        let (_temp, _path, api, _jobs) = setup_test_env();
        let mut rng = StdRng::seed_from_u64(20260823);

        for round in 0..15 {
            let width = rng.gen_range(60.0..160.0_f64).round();
            let height = rng.gen_range(60.0..160.0_f64).round();
            let margin_left = rng.gen_range(0.0..8.0_f64).round();
            let margin_right = rng.gen_range(0.0..8.0_f64).round();

            let plate = api
                .create_plate(
                    CreatePlateRequest {
                        name: Some(format!("随机印版-{}", round)),
                        width_cm: width,
                        height_cm: height,
                        margin_left_cm: Some(margin_left),
                        margin_right_cm: Some(margin_right),
                        material: "Flint".to_string(),
                        material_thickness: 1.7,
                    },
                    "rand-op",
                )
                .unwrap();

            // 随机提交直到连续若干次放不下为止
            let mut consecutive_misses = 0;
            while consecutive_misses < 6 {
                let w = rng.gen_range(15.0..80.0_f64).round();
                let h = rng.gen_range(15.0..80.0_f64).round();

                match api.add_placement(&plate.plate_id, w, h, None, "rand-op") {
                    Ok(outcome) => {
                        consecutive_misses = 0;
                        assert_invariants(&outcome.plate);
                    }
                    Err(plate_layout::api::ApiError::DoesNotFit { .. }) => {
                        consecutive_misses += 1;
                        // 失败的提交不得改变落位数
                        let detail = api.get_plate(&plate.plate_id).unwrap();
                        assert_invariants(&detail.plate);
                    }
                    Err(e) => panic!("意外错误: {}", e),
                }
            }

            // 随机移除部分落位后不变量仍成立
            let detail = api.get_plate(&plate.plate_id).unwrap();
            let mut remaining = detail.plate.placements.len();
            while remaining > 0 && rng.gen_bool(0.4) {
                let idx = rng.gen_range(0..remaining);
                let detail = api.remove_placement(&plate.plate_id, idx).unwrap();
                assert_invariants(&detail.plate);
                remaining = detail.plate.placements.len();
            }
        }
    }
}
