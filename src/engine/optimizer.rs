// ==========================================
// 高校考试排考系统 - 局部搜索优化引擎
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 6. Optimizer
// 红线: 优化器不得破坏硬约束有效性; 输出成本 <= 输入成本
// ==========================================
// 职责: 对硬有效方案做软成本改进 (爬山 / 模拟退火)
// 移动算子: 单场迁移 / 两场换教室 / 两场换时段
// 预算: 移动次数与墙钟截止取先到者,移动之间检查
// ==========================================

use crate::domain::exam::Placement;
use crate::domain::schedule::Schedule;
use crate::domain::types::{AcceptanceMode, ExamStatus};
use crate::engine::constraint::ConstraintCatalog;
use crate::engine::conflict_detector::ConflictDetector;
use crate::engine::context::ScheduleContext;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument};

// ==========================================
// 错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum OptimizeError {
    /// 输入方案未通过硬约束审计,原样退回
    #[error("前置条件不满足: 输入方案存在 {violation_count} 条硬违规")]
    PreconditionFailed { violation_count: usize },
}

// ==========================================
// OptimizeOutcome - 优化结果
// ==========================================
#[derive(Debug, Clone)]
pub struct OptimizeOutcome {
    pub schedule: Schedule,  // 优化后方案 (硬有效, 成本 <= 输入)
    pub initial_cost: f64,   // 输入软成本
    pub final_cost: f64,     // 输出软成本
    pub moves_tried: u32,    // 尝试的移动数
    pub moves_accepted: u32, // 接受的移动数
}

// ==========================================
// 候选移动 (对 SolverForge 的 change/swap 移动族裁剪)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveKind {
    Relocate,          // 单场迁移到空闲 (日期, 时段, 教室)
    SwapRooms,         // 两场互换教室
    SwapSlots,         // 两场互换 (日期, 时段)
    ReassignProfessor, // 单场更换监考教师 (摊平负载)
}

// ==========================================
// ScheduleOptimizer - 局部搜索优化引擎
// ==========================================
pub struct ScheduleOptimizer {
    catalog: ConstraintCatalog,
    detector: ConflictDetector,
}

impl ScheduleOptimizer {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            catalog: ConstraintCatalog::new(),
            detector: ConflictDetector::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 局部搜索改进
    ///
    /// 前置条件: 输入方案硬约束审计为空,否则原样退回并报
    /// PreconditionFailed。每个移动原子执行: 生成候选 → 校验 →
    /// 接受或丢弃; 取消粒度为"当前移动之后"。
    ///
    /// # 参数
    /// - `schedule`: 输入方案 (只读,内部克隆)
    /// - `ctx`: 引擎上下文 (含预算/接受准则配置)
    ///
    /// # 返回
    /// - Ok(OptimizeOutcome): 硬有效且成本不高于输入的方案
    /// - Err(PreconditionFailed): 输入方案无效
    #[instrument(skip(self, schedule, ctx), fields(
        version_id = %schedule.version_id,
        exam_count = schedule.len(),
        mode = %ctx.config.acceptance_mode
    ))]
    pub fn improve(
        &self,
        schedule: &Schedule,
        ctx: &ScheduleContext,
    ) -> Result<OptimizeOutcome, OptimizeError> {
        // === 前置条件: 输入必须硬有效 ===
        let precheck = self.detector.detect(schedule, ctx);
        if !precheck.is_clean() {
            return Err(OptimizeError::PreconditionFailed {
                violation_count: precheck.total(),
            });
        }

        let mut rng = match ctx.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let initial_cost = self.catalog.schedule_cost(schedule, ctx);
        let mut current = schedule.clone();
        let mut current_cost = initial_cost;
        let mut best = schedule.clone();
        let mut best_cost = initial_cost;

        let budget = &ctx.config.budget;
        let deadline = budget.deadline_ms.map(Duration::from_millis);
        let started = Instant::now();
        let mut temperature = ctx.config.annealing.start_temperature;

        let mut moves_tried: u32 = 0;
        let mut moves_accepted: u32 = 0;

        info!(initial_cost, max_moves = budget.max_moves, "开始局部搜索");

        while moves_tried < budget.max_moves {
            // 预算在移动之间检查 (取消粒度 = 当前移动之后)
            if let Some(deadline) = deadline {
                if started.elapsed() >= deadline {
                    debug!(moves_tried, "墙钟截止,搜索提前终止");
                    break;
                }
            }
            moves_tried += 1;

            let (candidate_schedule, touched) = match self.propose_move(&current, ctx, &mut rng)
            {
                Some(c) => c,
                None => {
                    // 本次抽样无法构成移动 (如无可移动考试); 消耗预算继续
                    temperature *= ctx.config.annealing.decay;
                    continue;
                }
            };

            // 移动只影响被触达考试,仅对其复检硬约束即可保持全局有效
            let valid = touched.iter().all(|exam_id| {
                candidate_schedule
                    .exam_by_id(exam_id)
                    .map(|exam| {
                        self.catalog
                            .hard_violations(&candidate_schedule, exam, ctx)
                            .is_empty()
                    })
                    .unwrap_or(false)
            });
            if !valid {
                temperature *= ctx.config.annealing.decay;
                continue;
            }

            let candidate_cost = self.catalog.schedule_cost(&candidate_schedule, ctx);
            let accepted = self.accept(
                current_cost,
                candidate_cost,
                temperature,
                ctx.config.acceptance_mode,
                ctx.config.hill_climb_tolerance,
                &mut rng,
            );

            if accepted {
                moves_accepted += 1;
                current = candidate_schedule;
                current_cost = candidate_cost;
                if current_cost < best_cost {
                    best = current.clone();
                    best_cost = current_cost;
                }
            }

            temperature *= ctx.config.annealing.decay;
        }

        // 输出取历史最优; 理论上必然硬有效,仍复检一次兜底
        let final_report = self.detector.detect(&best, ctx);
        let outcome = if final_report.is_clean() && best_cost <= initial_cost {
            OptimizeOutcome {
                schedule: best,
                initial_cost,
                final_cost: best_cost,
                moves_tried,
                moves_accepted,
            }
        } else {
            OptimizeOutcome {
                schedule: schedule.clone(),
                initial_cost,
                final_cost: initial_cost,
                moves_tried,
                moves_accepted: 0,
            }
        };

        info!(
            final_cost = outcome.final_cost,
            moves_tried = outcome.moves_tried,
            moves_accepted = outcome.moves_accepted,
            "局部搜索结束"
        );

        Ok(outcome)
    }

    // ==========================================
    // 移动生成
    // ==========================================

    /// 生成一个候选移动,返回 (变异方案, 被触达的考试ID)
    fn propose_move(
        &self,
        current: &Schedule,
        ctx: &ScheduleContext,
        rng: &mut StdRng,
    ) -> Option<(Schedule, Vec<String>)> {
        // 只移动 Scheduled 考试 (前置条件下不存在 Conflicted)
        let movable: Vec<String> = current
            .exams()
            .iter()
            .filter(|e| e.status == ExamStatus::Scheduled && e.is_placed())
            .map(|e| e.exam_id.clone())
            .collect();
        if movable.is_empty() {
            return None;
        }

        let kind = match rng.random_range(0..4) {
            0 => MoveKind::Relocate,
            1 => MoveKind::SwapRooms,
            2 => MoveKind::SwapSlots,
            _ => MoveKind::ReassignProfessor,
        };

        let mut mutated = current.clone();
        match kind {
            MoveKind::Relocate => {
                let exam_id = &movable[rng.random_range(0..movable.len())];
                let dates = current.horizon.dates();
                let date = dates[rng.random_range(0..dates.len())];
                let slot = &ctx.config.slot_list
                    [rng.random_range(0..ctx.config.slot_list.len())];
                let rooms: Vec<&str> = ctx
                    .rooms()
                    .filter(|r| r.available)
                    .map(|r| r.room_id.as_str())
                    .collect();
                if rooms.is_empty() {
                    return None;
                }
                let room_id = rooms[rng.random_range(0..rooms.len())].to_string();

                let exam = mutated
                    .exams_mut()
                    .iter_mut()
                    .find(|e| e.exam_id == *exam_id)?;
                let professor_id = exam.placement.as_ref()?.professor_id.clone();
                exam.place(Placement {
                    date,
                    slot_no: slot.slot_no,
                    room_id,
                    professor_id,
                });
                Some((mutated, vec![exam_id.clone()]))
            }
            MoveKind::ReassignProfessor => {
                let exam_id = &movable[rng.random_range(0..movable.len())];
                let module_id = current.exam_by_id(exam_id)?.module_id.clone();
                let department_id = ctx.module(&module_id)?.department_id.clone();
                let date = current.exam_by_id(exam_id)?.date()?;

                let candidates: Vec<&str> = ctx
                    .professors()
                    .filter(|p| p.qualifies_for(&department_id))
                    .filter(|p| p.is_available_on(date))
                    .map(|p| p.professor_id.as_str())
                    .collect();
                if candidates.is_empty() {
                    return None;
                }
                let professor_id = candidates[rng.random_range(0..candidates.len())].to_string();

                let exam = mutated
                    .exams_mut()
                    .iter_mut()
                    .find(|e| e.exam_id == *exam_id)?;
                let placement = exam.placement.clone()?;
                exam.place(Placement {
                    professor_id,
                    ..placement
                });
                Some((mutated, vec![exam_id.clone()]))
            }
            MoveKind::SwapRooms | MoveKind::SwapSlots => {
                if movable.len() < 2 {
                    return None;
                }
                let i = rng.random_range(0..movable.len());
                let mut j = rng.random_range(0..movable.len());
                while j == i {
                    j = rng.random_range(0..movable.len());
                }
                let (id_a, id_b) = (movable[i].clone(), movable[j].clone());

                let placement_a = current.exam_by_id(&id_a)?.placement.clone()?;
                let placement_b = current.exam_by_id(&id_b)?.placement.clone()?;

                let (new_a, new_b) = match kind {
                    MoveKind::SwapRooms => (
                        Placement {
                            room_id: placement_b.room_id.clone(),
                            ..placement_a.clone()
                        },
                        Placement {
                            room_id: placement_a.room_id.clone(),
                            ..placement_b.clone()
                        },
                    ),
                    _ => (
                        Placement {
                            date: placement_b.date,
                            slot_no: placement_b.slot_no,
                            ..placement_a.clone()
                        },
                        Placement {
                            date: placement_a.date,
                            slot_no: placement_a.slot_no,
                            ..placement_b.clone()
                        },
                    ),
                };

                for exam in mutated.exams_mut() {
                    if exam.exam_id == id_a {
                        exam.place(new_a.clone());
                    } else if exam.exam_id == id_b {
                        exam.place(new_b.clone());
                    }
                }
                Some((mutated, vec![id_a, id_b]))
            }
        }
    }

    // ==========================================
    // 接受准则
    // ==========================================

    /// 接受判定
    ///
    /// 爬山: cost_new <= cost_old + tolerance
    /// 退火: 改进必收; 劣化按 exp(-delta/T) 概率接受,T 几何衰减
    fn accept(
        &self,
        cost_old: f64,
        cost_new: f64,
        temperature: f64,
        mode: AcceptanceMode,
        tolerance: f64,
        rng: &mut StdRng,
    ) -> bool {
        match mode {
            AcceptanceMode::HillClimb => cost_new <= cost_old + tolerance,
            AcceptanceMode::Annealing => {
                if cost_new <= cost_old {
                    return true;
                }
                if temperature <= f64::EPSILON {
                    return false;
                }
                let delta = cost_new - cost_old;
                rng.random::<f64>() < (-delta / temperature).exp()
            }
        }
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ScheduleOptimizer {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScheduleConfig;
    use crate::domain::exam::{Exam, Horizon, Placement};
    use crate::domain::module::Module;
    use crate::domain::resources::{Professor, Room};
    use crate::domain::types::{RoomType, StudentConflictRule};
    use chrono::NaiveDate;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn test_room(room_id: &str, capacity: i32) -> Room {
        Room {
            room_id: room_id.to_string(),
            name: room_id.to_string(),
            capacity,
            room_type: RoomType::Classroom,
            campus: "MAIN".to_string(),
            available: true,
        }
    }

    fn test_professor(professor_id: &str) -> Professor {
        Professor {
            professor_id: professor_id.to_string(),
            full_name: professor_id.to_string(),
            department_id: "CS".to_string(),
            max_exams_per_day: 1,
            max_exams_per_week: 20,
            unavailable_dates: Vec::new(),
        }
    }

    fn test_module(module_id: &str, students: &[&str]) -> Module {
        Module {
            module_id: module_id.to_string(),
            name: module_id.to_string(),
            formation_id: "F1".to_string(),
            department_id: "CS".to_string(),
            enrolled_count: students.len() as i32,
            enrolled_students: students.iter().map(|s| s.to_string()).collect(),
            duration_minutes: 90,
            preferred_room_type: None,
        }
    }

    fn placed(exam_id: &str, module_id: &str, day: u32, slot_no: i32, room: &str, prof: &str) -> Exam {
        let mut exam = Exam::new_unscheduled(exam_id, module_id, 90);
        exam.place(Placement {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            slot_no,
            room_id: room.to_string(),
            professor_id: prof.to_string(),
        });
        exam
    }

    fn test_horizon() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 16).unwrap(),
        )
        .unwrap()
    }

    // ==========================================
    // 测试用例
    // ==========================================

    #[test]
    fn test_precondition_failed_on_invalid_input() {
        let ctx = ScheduleContext::new(
            vec![test_room("R101", 50)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
            ScheduleConfig::default(),
        );
        // 同教室同时段: 硬无效
        let schedule = Schedule::from_exams(
            "V001",
            test_horizon(),
            vec![
                placed("E001", "M001", 10, 1, "R101", "P001"),
                placed("E002", "M002", 10, 1, "R101", "P002"),
            ],
        );

        let result = ScheduleOptimizer::new().improve(&schedule, &ctx);
        assert!(matches!(
            result,
            Err(OptimizeError::PreconditionFailed { violation_count: 1 })
        ));
    }

    #[test]
    fn test_improve_reduces_professor_overload_cost() {
        // P001 单日上限 1,却被外部编辑安排了同日两场 (不同时段,硬有效);
        // P002 空闲 → 优化器应把负载摊平,软成本严格下降
        let mut config = ScheduleConfig::default();
        config.student_conflict_rule = StudentConflictRule::SameSlot;
        config.budget.max_moves = 500;
        config.rng_seed = Some(42);

        let ctx = ScheduleContext::new(
            vec![test_room("R101", 10), test_room("R102", 10)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
            config,
        );
        let schedule = Schedule::from_exams(
            "V001",
            test_horizon(),
            vec![
                placed("E001", "M001", 10, 1, "R101", "P001"),
                placed("E002", "M002", 10, 2, "R102", "P001"),
            ],
        );

        let optimizer = ScheduleOptimizer::new();
        let outcome = optimizer.improve(&schedule, &ctx).unwrap();

        assert!(
            outcome.final_cost < outcome.initial_cost,
            "initial={}, final={}",
            outcome.initial_cost,
            outcome.final_cost
        );
        // 输出必须硬有效
        let report = ConflictDetector::new().detect(&outcome.schedule, &ctx);
        assert!(report.is_clean());
    }

    #[test]
    fn test_improve_never_increases_cost() {
        let mut config = ScheduleConfig::default();
        config.budget.max_moves = 200;
        config.rng_seed = Some(7);
        config.acceptance_mode = AcceptanceMode::Annealing;

        let ctx = ScheduleContext::new(
            vec![test_room("R101", 10), test_room("R102", 10)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
            config,
        );
        let schedule = Schedule::from_exams(
            "V001",
            test_horizon(),
            vec![
                placed("E001", "M001", 10, 1, "R101", "P001"),
                placed("E002", "M002", 12, 1, "R102", "P002"),
            ],
        );

        let outcome = ScheduleOptimizer::new().improve(&schedule, &ctx).unwrap();
        // 退火可接受劣化移动,但最终输出取历史最优,不得高于输入
        assert!(outcome.final_cost <= outcome.initial_cost);
    }

    #[test]
    fn test_improve_respects_move_budget() {
        let mut config = ScheduleConfig::default();
        config.budget.max_moves = 10;
        config.rng_seed = Some(1);

        let ctx = ScheduleContext::new(
            vec![test_room("R101", 10)],
            vec![test_professor("P001")],
            vec![test_module("M001", &["S1"])],
            config,
        );
        let schedule = Schedule::from_exams(
            "V001",
            test_horizon(),
            vec![placed("E001", "M001", 10, 1, "R101", "P001")],
        );

        let outcome = ScheduleOptimizer::new().improve(&schedule, &ctx).unwrap();
        assert!(outcome.moves_tried <= 10);
    }

    #[test]
    fn test_improve_empty_schedule_is_noop() {
        let ctx = ScheduleContext::new(
            vec![test_room("R101", 10)],
            vec![test_professor("P001")],
            vec![],
            ScheduleConfig::default(),
        );
        let schedule = Schedule::new("V001", test_horizon());

        let outcome = ScheduleOptimizer::new().improve(&schedule, &ctx).unwrap();
        assert_eq!(outcome.final_cost, outcome.initial_cost);
        assert!(outcome.schedule.is_empty());
    }
}
