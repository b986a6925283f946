// ==========================================
// 高校考试排考系统 - 约束目录引擎
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 3. Constraint Catalog
// 红线: 硬约束检查为纯谓词,逐候选可独立求值,不修改方案
// ==========================================
// 职责: 硬约束违规判定 + 软约束成本计算
// 输入: Schedule + 候选 Exam + ScheduleContext
// 输出: Vec<Violation> / f64 成本
// ==========================================

use crate::domain::conflict::Violation;
use crate::domain::exam::Exam;
use crate::domain::schedule::Schedule;
use crate::domain::types::{StudentConflictRule, ViolationKind};
use crate::engine::constraint_core::ConstraintCore;
use crate::engine::context::ScheduleContext;
use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;

// ==========================================
// ConstraintCatalog - 约束目录
// ==========================================
pub struct ConstraintCatalog {
    // 无状态引擎,不需要注入依赖
}

impl ConstraintCatalog {
    /// 构造函数
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 硬约束检查
    // ==========================================

    /// 检查候选考试相对当前方案的全部硬约束违规
    ///
    /// 候选可以是方案外的新考试,也可以是方案内既有考试 (按
    /// exam_id / module_id 排除自身后比对)。未落位考试无可检内容。
    ///
    /// # 参数
    /// - `schedule`: 当前方案 (只读)
    /// - `exam`: 候选考试
    /// - `ctx`: 引擎上下文
    ///
    /// # 返回
    /// 全部违规 (空列表 = 通过)
    pub fn hard_violations(
        &self,
        schedule: &Schedule,
        exam: &Exam,
        ctx: &ScheduleContext,
    ) -> Vec<Violation> {
        let pool = match exam.date() {
            Some(date) => schedule.exams_on(date),
            None => Vec::new(),
        };
        self.hard_violations_among(&pool, exam, ctx)
    }

    /// 检查候选考试相对同日考试池的全部硬约束违规
    ///
    /// 检测器按日期分桶后逐场调用本方法,成对检查只发生在桶内
    /// (全量审计 O(n log n) 而非全窗口 O(n^2) 的基础)。
    pub fn hard_violations_among(
        &self,
        same_day_pool: &[&Exam],
        exam: &Exam,
        ctx: &ScheduleContext,
    ) -> Vec<Violation> {
        let placement = match &exam.placement {
            Some(p) => p,
            None => return Vec::new(),
        };

        let mut violations = Vec::new();
        let date = placement.date;

        // === 检查 1: 时段已配置 ===
        let slot = match ctx.slot(placement.slot_no) {
            Some(slot) => Some(slot),
            None => {
                violations.push(
                    Violation::new(
                        ViolationKind::ResourceUnavailable,
                        &exam.exam_id,
                        &exam.module_id,
                        Some(date),
                        format!("时段未配置: slot_no={}", placement.slot_no),
                    ),
                );
                None
            }
        };

        // === 检查 2: 模块存在 (选课数据是容量/学生检查的前提) ===
        let module = match ctx.module(&exam.module_id) {
            Some(module) => Some(module),
            None => {
                violations.push(Violation::new(
                    ViolationKind::ResourceUnavailable,
                    &exam.exam_id,
                    &exam.module_id,
                    Some(date),
                    format!("模块不存在: module_id={}", exam.module_id),
                ));
                None
            }
        };

        // === 检查 3: 教室启用且容量充足 ===
        match ctx.room(&placement.room_id) {
            None => {
                violations.push(
                    Violation::new(
                        ViolationKind::ResourceUnavailable,
                        &exam.exam_id,
                        &exam.module_id,
                        Some(date),
                        format!("教室不存在: room_id={}", placement.room_id),
                    )
                    .with_room(&placement.room_id),
                );
            }
            Some(room) => {
                if !room.available {
                    violations.push(
                        Violation::new(
                            ViolationKind::ResourceUnavailable,
                            &exam.exam_id,
                            &exam.module_id,
                            Some(date),
                            format!("教室已停用: room_id={}", room.room_id),
                        )
                        .with_room(&room.room_id),
                    );
                }
                if let Some(module) = module {
                    let enrolled = module.effective_enrollment();
                    if !room.fits(enrolled, ctx.config.room_capacity_margin) {
                        violations.push(
                            Violation::new(
                                ViolationKind::RoomOverCapacity,
                                &exam.exam_id,
                                &exam.module_id,
                                Some(date),
                                format!(
                                    "教室容量不足: room={}, capacity={}, enrolled={}, margin={}",
                                    room.room_id,
                                    room.capacity,
                                    enrolled,
                                    ctx.config.room_capacity_margin
                                ),
                            )
                            .with_room(&room.room_id),
                        );
                    }
                }
            }
        }

        // === 检查 4: 教师存在且当日可用 ===
        match ctx.professor(&placement.professor_id) {
            None => {
                violations.push(
                    Violation::new(
                        ViolationKind::ResourceUnavailable,
                        &exam.exam_id,
                        &exam.module_id,
                        Some(date),
                        format!("教师不存在: professor_id={}", placement.professor_id),
                    )
                    .with_professor(&placement.professor_id),
                );
            }
            Some(professor) => {
                if !professor.is_available_on(date) {
                    violations.push(
                        Violation::new(
                            ViolationKind::ResourceUnavailable,
                            &exam.exam_id,
                            &exam.module_id,
                            Some(date),
                            format!(
                                "教师声明不可用: professor={}, date={}",
                                professor.professor_id, date
                            ),
                        )
                        .with_professor(&professor.professor_id),
                    );
                }
            }
        }

        // === 检查 5: 同日两两冲突 (教室/教师/学生) ===
        let candidate_start = slot.map(|s| s.start_minute());
        let candidate_duration = ctx.config.duration_for(exam.duration_minutes);

        // 同日考试按 exam_id 升序遍历,保证违规输出确定性
        let mut same_day: Vec<&Exam> = same_day_pool
            .iter()
            .copied()
            .filter(|other| {
                other.exam_id != exam.exam_id
                    && other.module_id != exam.module_id
                    && other.date() == Some(date)
            })
            .collect();
        same_day.sort_by(|a, b| a.exam_id.cmp(&b.exam_id));

        for other in &same_day {
            let other_placement = match &other.placement {
                Some(p) => p,
                None => continue,
            };
            let other_start = ctx.slot(other_placement.slot_no).map(|s| s.start_minute());
            let other_duration = ctx.config.duration_for(other.duration_minutes);

            let overlaps = match (candidate_start, other_start) {
                (Some(a), Some(b)) => ConstraintCore::intervals_overlap(
                    a,
                    candidate_duration,
                    b,
                    other_duration,
                ),
                // 时段缺失已单独报 ResourceUnavailable,此处按同时段保守处理
                _ => placement.slot_no == other_placement.slot_no,
            };

            // 教室时段冲突
            if overlaps && other_placement.room_id == placement.room_id {
                violations.push(
                    Violation::new(
                        ViolationKind::RoomDoubleBooking,
                        &exam.exam_id,
                        &exam.module_id,
                        Some(date),
                        format!(
                            "教室时段冲突: room={}, date={}, 对端考试={}",
                            placement.room_id, date, other.exam_id
                        ),
                    )
                    .with_room(&placement.room_id)
                    .with_other_exam(&other.exam_id),
                );
            }

            // 监考教师时段冲突
            if overlaps && other_placement.professor_id == placement.professor_id {
                violations.push(
                    Violation::new(
                        ViolationKind::ProfessorDoubleBooking,
                        &exam.exam_id,
                        &exam.module_id,
                        Some(date),
                        format!(
                            "监考教师时段冲突: professor={}, date={}, 对端考试={}",
                            placement.professor_id, date, other.exam_id
                        ),
                    )
                    .with_professor(&placement.professor_id)
                    .with_other_exam(&other.exam_id),
                );
            }
        }

        // 学生冲突 (按口径)
        if let Some(module) = module {
            violations.extend(self.student_conflicts(
                exam,
                module.module_id.as_str(),
                date,
                candidate_start,
                candidate_duration,
                &same_day,
                ctx,
            ));
        }

        violations
    }

    /// 学生冲突检查
    ///
    /// SAME_DAY 口径: 每名学生当日场次 (含候选) 不得超过上限;
    /// SAME_SLOT 口径: 仅禁止时段重叠的共同学生。
    #[allow(clippy::too_many_arguments)]
    fn student_conflicts(
        &self,
        exam: &Exam,
        module_id: &str,
        date: NaiveDate,
        candidate_start: Option<i32>,
        candidate_duration: i32,
        same_day: &[&Exam],
        ctx: &ScheduleContext,
    ) -> Vec<Violation> {
        let module = match ctx.module(module_id) {
            Some(m) => m,
            None => return Vec::new(),
        };
        let mut violations = Vec::new();

        match ctx.config.student_conflict_rule {
            StudentConflictRule::SameDay => {
                // 统计每名共同学生当日既有场次
                let mut existing_count: HashMap<&str, (i32, &str)> = HashMap::new();
                for other in same_day {
                    let other_module = match ctx.module(&other.module_id) {
                        Some(m) => m,
                        None => continue,
                    };
                    for student in ConstraintCore::shared_students(module, other_module) {
                        if let Some(student_ref) = module
                            .enrolled_students
                            .iter()
                            .find(|s| **s == student)
                        {
                            let entry = existing_count
                                .entry(student_ref.as_str())
                                .or_insert((0, other.exam_id.as_str()));
                            entry.0 += 1;
                        }
                    }
                }

                let cap = ctx.config.max_exams_per_day_student;
                let mut offenders: Vec<(&str, (i32, &str))> =
                    existing_count.into_iter().collect();
                offenders.sort_by(|a, b| a.0.cmp(&b.0));

                for (student, (count, first_other)) in offenders {
                    if ConstraintCore::exceeds_daily_cap(count, cap) {
                        violations.push(
                            Violation::new(
                                ViolationKind::StudentSameDayConflict,
                                &exam.exam_id,
                                module_id,
                                Some(date),
                                format!(
                                    "学生同日冲突: student={}, date={}, 当日已有 {} 场 (上限 {})",
                                    student, date, count, cap
                                ),
                            )
                            .with_student(student)
                            .with_other_exam(first_other),
                        );
                    }
                }
            }
            StudentConflictRule::SameSlot => {
                for other in same_day {
                    let other_placement = match &other.placement {
                        Some(p) => p,
                        None => continue,
                    };
                    let other_start =
                        ctx.slot(other_placement.slot_no).map(|s| s.start_minute());
                    let other_duration = ctx.config.duration_for(other.duration_minutes);
                    let overlaps = match (candidate_start, other_start) {
                        (Some(a), Some(b)) => ConstraintCore::intervals_overlap(
                            a,
                            candidate_duration,
                            b,
                            other_duration,
                        ),
                        _ => false,
                    };
                    if !overlaps {
                        continue;
                    }
                    let other_module = match ctx.module(&other.module_id) {
                        Some(m) => m,
                        None => continue,
                    };
                    let shared = ConstraintCore::shared_students(module, other_module);
                    if let Some(student) = shared.first() {
                        violations.push(
                            Violation::new(
                                ViolationKind::StudentSameDayConflict,
                                &exam.exam_id,
                                module_id,
                                Some(date),
                                format!(
                                    "学生时段冲突: {} 名共同学生 (首个 {}), 对端考试={}",
                                    shared.len(),
                                    student,
                                    other.exam_id
                                ),
                            )
                            .with_student(student)
                            .with_other_exam(&other.exam_id),
                        );
                    }
                }
            }
        }

        violations
    }

    // ==========================================
    // 软约束成本
    // ==========================================

    /// 单场考试的局部软成本 (教室容量浪费 + 类型偏好)
    ///
    /// 全局项 (教师负载/考期分散/学生同日/跨校区移动) 见 schedule_cost。
    pub fn exam_soft_cost(&self, exam: &Exam, ctx: &ScheduleContext) -> f64 {
        let placement = match &exam.placement {
            Some(p) => p,
            None => return 0.0,
        };
        let module = match ctx.module(&exam.module_id) {
            Some(m) => m,
            None => return 0.0,
        };
        let weights = &ctx.config.weights;
        let mut cost = 0.0;

        if let Some(room) = ctx.room(&placement.room_id) {
            // 容量浪费: 越大的教室配越小的考试,浪费比越高
            let required =
                crate::domain::resources::required_seats(module.effective_enrollment(), 0.0);
            if room.capacity > 0 && room.capacity > required {
                let waste_ratio = (room.capacity - required) as f64 / room.capacity as f64;
                cost += weights.room_capacity * waste_ratio;
            }

            // 教室类型偏好不符
            if let Some(preferred) = module.preferred_room_type {
                if room.room_type != preferred {
                    cost += weights.room_preference;
                }
            }
        }

        cost
    }

    /// 整方案软成本 (优化器目标函数)
    ///
    /// = Σ 局部成本
    ///   + 教师日/周负载超标
    ///   + 考期分散度 (占用天数)
    ///   + 学生同日堆叠 (超出上限的场次)
    ///   + 学生跨校区连场移动
    pub fn schedule_cost(&self, schedule: &Schedule, ctx: &ScheduleContext) -> f64 {
        let weights = &ctx.config.weights;
        let mut cost = 0.0;

        for exam in schedule.placed_exams() {
            cost += self.exam_soft_cost(exam, ctx);
        }

        // === 教师负载 ===
        let mut daily_load: HashMap<(&str, NaiveDate), i32> = HashMap::new();
        let mut weekly_load: HashMap<(&str, i32, u32), i32> = HashMap::new();
        for exam in schedule.placed_exams() {
            if let Some(p) = &exam.placement {
                *daily_load
                    .entry((p.professor_id.as_str(), p.date))
                    .or_insert(0) += 1;
                let week = p.date.iso_week();
                *weekly_load
                    .entry((p.professor_id.as_str(), week.year(), week.week()))
                    .or_insert(0) += 1;
            }
        }
        for ((professor_id, _date), count) in &daily_load {
            let cap = ctx
                .professor(professor_id)
                .map(|p| ctx.professor_daily_cap(p))
                .unwrap_or(ctx.config.max_exams_per_day_professor);
            if *count > cap {
                cost += weights.professor_load * (*count - cap) as f64;
            }
        }
        for ((professor_id, _, _), count) in &weekly_load {
            let cap = ctx
                .professor(professor_id)
                .map(|p| ctx.professor_weekly_cap(p))
                .unwrap_or(ctx.config.max_exams_per_week_professor);
            if *count > cap {
                cost += weights.professor_load * (*count - cap) as f64;
            }
        }

        // === 考期分散度 ===
        cost += weights.day_spread * schedule.distinct_exam_days() as f64;

        // === 学生同日堆叠 + 跨校区移动 ===
        cost += self.student_day_cost(schedule, ctx);

        cost
    }

    /// 学生同日堆叠与跨校区移动成本
    fn student_day_cost(&self, schedule: &Schedule, ctx: &ScheduleContext) -> f64 {
        let weights = &ctx.config.weights;
        // (student, date) → 该生当日考试所在 (slot_no, campus) 列表
        let mut per_student_day: HashMap<(String, NaiveDate), Vec<(i32, String)>> =
            HashMap::new();

        for exam in schedule.placed_exams() {
            let placement = match &exam.placement {
                Some(p) => p,
                None => continue,
            };
            let module = match ctx.module(&exam.module_id) {
                Some(m) => m,
                None => continue,
            };
            let campus = ctx
                .room(&placement.room_id)
                .map(|r| r.campus.clone())
                .unwrap_or_default();
            for student in &module.enrolled_students {
                per_student_day
                    .entry((student.clone(), placement.date))
                    .or_default()
                    .push((placement.slot_no, campus.clone()));
            }
        }

        let cap = ctx.config.max_exams_per_day_student;
        let mut cost = 0.0;
        for ((_, _), mut entries) in per_student_day {
            let count = entries.len() as i32;
            if count > cap {
                cost += weights.student_conflict * (count - cap) as f64;
            }
            // 连场跨校区移动: 按时段序比较相邻两场的校区
            entries.sort_by_key(|(slot_no, _)| *slot_no);
            for pair in entries.windows(2) {
                if pair[0].1 != pair[1].1 && !pair[0].1.is_empty() && !pair[1].1.is_empty() {
                    cost += weights.room_preference;
                }
            }
        }
        cost
    }

    /// 偏好类发现 (Low 优先级,仅供报告展示,不影响方案有效性)
    pub fn preference_findings(
        &self,
        schedule: &Schedule,
        ctx: &ScheduleContext,
    ) -> Vec<Violation> {
        let mut findings = Vec::new();
        for exam in schedule.placed_exams() {
            let placement = match &exam.placement {
                Some(p) => p,
                None => continue,
            };
            let module = match ctx.module(&exam.module_id) {
                Some(m) => m,
                None => continue,
            };
            let room = match ctx.room(&placement.room_id) {
                Some(r) => r,
                None => continue,
            };
            if let Some(preferred) = module.preferred_room_type {
                if room.room_type != preferred {
                    findings.push(
                        Violation::new(
                            ViolationKind::RoomTypeMismatch,
                            &exam.exam_id,
                            &exam.module_id,
                            Some(placement.date),
                            format!(
                                "教室类型偏好不符: 期望 {}, 实际 {} (room={})",
                                preferred, room.room_type, room.room_id
                            ),
                        )
                        .with_room(&room.room_id),
                    );
                }
            }
        }
        findings
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ConstraintCatalog {
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
    use crate::domain::types::RoomType;

    // ==========================================
    // 测试辅助函数
    // ==========================================

    fn test_horizon() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        )
        .unwrap()
    }

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
            max_exams_per_day: 3,
            max_exams_per_week: 10,
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

    fn test_ctx(rooms: Vec<Room>, professors: Vec<Professor>, modules: Vec<Module>) -> ScheduleContext {
        ScheduleContext::new(rooms, professors, modules, ScheduleConfig::default())
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

    // ==========================================
    // 硬约束测试
    // ==========================================

    #[test]
    fn test_clean_candidate_passes() {
        let ctx = test_ctx(
            vec![test_room("R101", 50)],
            vec![test_professor("P001")],
            vec![test_module("M001", &["S1", "S2"])],
        );
        let schedule = Schedule::new("V001", test_horizon());
        let exam = placed("E001", "M001", 10, 1, "R101", "P001");

        let violations = ConstraintCatalog::new().hard_violations(&schedule, &exam, &ctx);
        assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn test_room_double_booking_detected() {
        let ctx = test_ctx(
            vec![test_room("R101", 50)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        let candidate = placed("E002", "M002", 10, 1, "R101", "P002");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &candidate, &ctx);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::RoomDoubleBooking);
        assert_eq!(violations[0].other_exam_id.as_deref(), Some("E001"));
    }

    #[test]
    fn test_different_slots_no_room_conflict() {
        let ctx = test_ctx(
            vec![test_room("R101", 50)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        // 时段2 (14:00) 与时段1 (09:00, 90分钟) 不重叠
        let candidate = placed("E002", "M002", 10, 2, "R101", "P002");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &candidate, &ctx);
        assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn test_professor_double_booking_detected() {
        let ctx = test_ctx(
            vec![test_room("R101", 50), test_room("R102", 50)],
            vec![test_professor("P001")],
            vec![test_module("M001", &["S1"]), test_module("M002", &["S2"])],
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        let candidate = placed("E002", "M002", 10, 1, "R102", "P001");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &candidate, &ctx);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::ProfessorDoubleBooking);
    }

    #[test]
    fn test_student_same_day_conflict_detected() {
        let ctx = test_ctx(
            vec![test_room("R101", 50), test_room("R102", 50)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![
                test_module("M001", &["S1", "S2"]),
                test_module("M002", &["S2", "S3"]),
            ],
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        // 不同教室不同时段,但 S2 同日两场 (默认上限 1)
        let candidate = placed("E002", "M002", 10, 2, "R102", "P002");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &candidate, &ctx);

        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::StudentSameDayConflict);
        assert_eq!(violations[0].student_id.as_deref(), Some("S2"));
    }

    #[test]
    fn test_student_same_slot_rule_allows_disjoint_slots() {
        let mut config = ScheduleConfig::default();
        config.student_conflict_rule = StudentConflictRule::SameSlot;
        let ctx = ScheduleContext::new(
            vec![test_room("R101", 50), test_room("R102", 50)],
            vec![test_professor("P001"), test_professor("P002")],
            vec![
                test_module("M001", &["S1", "S2"]),
                test_module("M002", &["S2", "S3"]),
            ],
            config,
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        // 同时段 → 违规
        let same_slot = placed("E002", "M002", 10, 1, "R102", "P002");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &same_slot, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::StudentSameDayConflict);

        // 不同时段 → 放行
        let other_slot = placed("E002", "M002", 10, 2, "R102", "P002");
        let violations = ConstraintCatalog::new().hard_violations(&schedule, &other_slot, &ctx);
        assert!(violations.is_empty(), "violations: {:?}", violations);
    }

    #[test]
    fn test_room_over_capacity_detected() {
        let students: Vec<String> = (0..60).map(|i| format!("S{:03}", i)).collect();
        let student_refs: Vec<&str> = students.iter().map(|s| s.as_str()).collect();
        let ctx = test_ctx(
            vec![test_room("R101", 50)],
            vec![test_professor("P001")],
            vec![test_module("M001", &student_refs)],
        );
        let schedule = Schedule::new("V001", test_horizon());
        let exam = placed("E001", "M001", 10, 1, "R101", "P001");

        let violations = ConstraintCatalog::new().hard_violations(&schedule, &exam, &ctx);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, ViolationKind::RoomOverCapacity);
    }

    #[test]
    fn test_unavailable_resources_detected() {
        let mut room = test_room("R101", 50);
        room.available = false;
        let date = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let mut professor = test_professor("P001");
        professor.unavailable_dates.push(date);

        let ctx = test_ctx(
            vec![room],
            vec![professor],
            vec![test_module("M001", &["S1"])],
        );
        let schedule = Schedule::new("V001", test_horizon());
        let exam = placed("E001", "M001", 10, 1, "R101", "P001");

        let violations = ConstraintCatalog::new().hard_violations(&schedule, &exam, &ctx);
        assert_eq!(violations.len(), 2);
        assert!(violations
            .iter()
            .all(|v| v.kind == ViolationKind::ResourceUnavailable));
    }

    // ==========================================
    // 软成本测试
    // ==========================================

    #[test]
    fn test_soft_cost_room_waste_and_preference() {
        let mut module = test_module("M001", &["S1", "S2"]);
        module.preferred_room_type = Some(RoomType::Amphitheater);
        let ctx = test_ctx(
            vec![test_room("R101", 100)],
            vec![test_professor("P001")],
            vec![module],
        );
        let exam = placed("E001", "M001", 10, 1, "R101", "P001");

        let catalog = ConstraintCatalog::new();
        let cost = catalog.exam_soft_cost(&exam, &ctx);
        // 容量浪费 (98/100) * 5.0 + 偏好不符 1.0
        assert!(cost > 4.9 && cost < 6.0, "cost = {}", cost);
    }

    #[test]
    fn test_schedule_cost_counts_professor_overload() {
        let modules: Vec<Module> = (1..=4)
            .map(|i| test_module(&format!("M{:03}", i), &[]))
            .collect();
        let mut professor = test_professor("P001");
        professor.max_exams_per_day = 3;
        let ctx = test_ctx(
            vec![
                test_room("R101", 50),
                test_room("R102", 50),
                test_room("R103", 50),
                test_room("R104", 50),
            ],
            vec![professor],
            modules,
        );

        // P001 同日 4 场 (上限 3),其中两对时段重叠是硬违规,这里只看软成本口径
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));
        schedule.upsert(placed("E002", "M002", 10, 1, "R102", "P001"));
        schedule.upsert(placed("E003", "M003", 10, 2, "R103", "P001"));
        schedule.upsert(placed("E004", "M004", 10, 2, "R104", "P001"));

        let catalog = ConstraintCatalog::new();
        let cost = catalog.schedule_cost(&schedule, &ctx);
        // 日负载超标 1 场 → professor_load 3.0 计入
        let base = ctx.config.weights.day_spread * 1.0;
        assert!(cost >= base + ctx.config.weights.professor_load, "cost = {}", cost);
    }

    #[test]
    fn test_preference_findings_low_priority() {
        let mut module = test_module("M001", &["S1"]);
        module.preferred_room_type = Some(RoomType::Lab);
        let ctx = test_ctx(
            vec![test_room("R101", 50)],
            vec![test_professor("P001")],
            vec![module],
        );
        let mut schedule = Schedule::new("V001", test_horizon());
        schedule.upsert(placed("E001", "M001", 10, 1, "R101", "P001"));

        let findings = ConstraintCatalog::new().preference_findings(&schedule, &ctx);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ViolationKind::RoomTypeMismatch);
        assert_eq!(
            findings[0].priority,
            crate::domain::types::ConflictPriority::Low
        );
    }
}
