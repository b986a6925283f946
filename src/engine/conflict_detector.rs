// ==========================================
// 高校考试排考系统 - 冲突检测引擎
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 4. Conflict Detector
// 红线: 检测必须幂等; 冲突考试只标记不删除
// ==========================================
// 职责: 对任意方案 (引擎产出或外部编辑) 做全量硬约束审计
// 输入: Schedule + ScheduleContext
// 输出: ConflictReport (按类型/优先级分组)
// ==========================================

use crate::domain::conflict::{ConflictReport, Violation};
use crate::domain::schedule::Schedule;
use crate::engine::constraint::ConstraintCatalog;
use crate::engine::context::ScheduleContext;
use std::collections::HashSet;
use tracing::instrument;

// ==========================================
// ConflictDetector - 冲突检测引擎
// ==========================================
pub struct ConflictDetector {
    catalog: ConstraintCatalog,
}

impl ConflictDetector {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            catalog: ConstraintCatalog::new(),
        }
    }

    /// 全量硬约束审计
    ///
    /// 按日期分桶后逐场调用约束目录,成对违规做无序对去重,
    /// 保证同一方案重复检测输出完全一致。
    ///
    /// # 参数
    /// - `schedule`: 被审计方案
    /// - `ctx`: 引擎上下文
    ///
    /// # 返回
    /// 冲突报告 (空违规 = 方案硬有效)
    #[instrument(skip(self, schedule, ctx), fields(
        version_id = %schedule.version_id,
        exam_count = schedule.len()
    ))]
    pub fn detect(&self, schedule: &Schedule, ctx: &ScheduleContext) -> ConflictReport {
        let mut violations = Vec::new();

        // 日期分桶: 成对检查只发生在同日考试之间
        let buckets = schedule.exams_by_date();
        let mut dates: Vec<_> = buckets.keys().copied().collect();
        dates.sort();

        for date in dates {
            let mut exams = buckets[&date].clone();
            exams.sort_by(|a, b| a.exam_id.cmp(&b.exam_id));
            for exam in &exams {
                violations.extend(self.catalog.hard_violations_among(&exams, exam, ctx));
            }
        }

        ConflictReport::from_violations(
            &schedule.version_id,
            Self::dedup_pairwise(violations),
        )
    }

    /// 审计 + 偏好类发现 (Low 优先级一并纳入报告)
    pub fn detect_with_preferences(
        &self,
        schedule: &Schedule,
        ctx: &ScheduleContext,
    ) -> ConflictReport {
        let mut report = self.detect(schedule, ctx);
        let mut violations = report.violations.clone();
        violations.extend(self.catalog.preference_findings(schedule, ctx));
        report = ConflictReport::from_violations(&schedule.version_id, violations);
        report
    }

    /// 将报告中的违规考试标记为 Conflicted
    ///
    /// 红线: 只标记,不删除; 返回标记的考试数。
    pub fn mark_conflicted(&self, schedule: &mut Schedule, report: &ConflictReport) -> usize {
        let offending: HashSet<String> = report
            .violations
            .iter()
            .filter(|v| v.kind.is_hard())
            .flat_map(|v| {
                std::iter::once(v.exam_id.clone()).chain(v.other_exam_id.clone())
            })
            .collect();

        let mut marked = 0;
        for exam in schedule.exams_mut() {
            if offending.contains(&exam.exam_id) && exam.is_placed() {
                exam.mark_conflicted();
                marked += 1;
            }
        }
        marked
    }

    /// 成对违规的无序对去重
    ///
    /// 同一对考试的同一种冲突会从两侧各报一次; 保留 exam_id 较小一侧,
    /// 使输出与遍历顺序无关。
    fn dedup_pairwise(violations: Vec<Violation>) -> Vec<Violation> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut result = Vec::new();

        for v in violations {
            let key = match &v.other_exam_id {
                Some(other) => {
                    let (lo, hi) = if v.exam_id <= *other {
                        (v.exam_id.as_str(), other.as_str())
                    } else {
                        (other.as_str(), v.exam_id.as_str())
                    };
                    format!(
                        "{}|{}|{}|{}",
                        v.kind.to_db_str(),
                        lo,
                        hi,
                        v.student_id.as_deref().unwrap_or("")
                    )
                }
                None => format!(
                    "{}|{}|{}",
                    v.kind.to_db_str(),
                    v.exam_id,
                    v.student_id.as_deref().unwrap_or("")
                ),
            };
            if seen.insert(key) {
                result.push(v);
            }
        }
        result
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ConflictDetector {
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
    use crate::domain::types::{ConflictPriority, ExamStatus, RoomType, ViolationKind};
    use chrono::NaiveDate;

    fn test_ctx(modules: Vec<Module>) -> ScheduleContext {
        let rooms = vec![
            Room {
                room_id: "R101".to_string(),
                name: "一教101".to_string(),
                capacity: 100,
                room_type: RoomType::Classroom,
                campus: "MAIN".to_string(),
                available: true,
            },
            Room {
                room_id: "R102".to_string(),
                name: "一教102".to_string(),
                capacity: 100,
                room_type: RoomType::Classroom,
                campus: "MAIN".to_string(),
                available: true,
            },
        ];
        let professors = vec![
            Professor {
                professor_id: "P001".to_string(),
                full_name: "张老师".to_string(),
                department_id: "CS".to_string(),
                max_exams_per_day: 3,
                max_exams_per_week: 10,
                unavailable_dates: Vec::new(),
            },
            Professor {
                professor_id: "P002".to_string(),
                full_name: "李老师".to_string(),
                department_id: "CS".to_string(),
                max_exams_per_day: 3,
                max_exams_per_week: 10,
                unavailable_dates: Vec::new(),
            },
        ];
        ScheduleContext::new(rooms, professors, modules, ScheduleConfig::default())
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

    fn test_schedule(exams: Vec<Exam>) -> Schedule {
        let horizon = Horizon::new(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        )
        .unwrap();
        Schedule::from_exams("V001", horizon, exams)
    }

    #[test]
    fn test_detect_clean_schedule() {
        let ctx = test_ctx(vec![
            test_module("M001", &["S1"]),
            test_module("M002", &["S2"]),
        ]);
        let schedule = test_schedule(vec![
            placed("E001", "M001", 10, 1, "R101", "P001"),
            placed("E002", "M002", 12, 1, "R101", "P001"),
        ]);

        let report = ConflictDetector::new().detect(&schedule, &ctx);
        assert!(report.is_clean());
    }

    #[test]
    fn test_detect_pairwise_dedup() {
        // 同教室同时段: 两侧各报一次,报告只保留一条
        let ctx = test_ctx(vec![
            test_module("M001", &["S1"]),
            test_module("M002", &["S2"]),
        ]);
        let schedule = test_schedule(vec![
            placed("E001", "M001", 10, 1, "R101", "P001"),
            placed("E002", "M002", 10, 1, "R101", "P002"),
        ]);

        let report = ConflictDetector::new().detect(&schedule, &ctx);
        assert_eq!(report.total(), 1);
        assert_eq!(report.violations[0].kind, ViolationKind::RoomDoubleBooking);
        assert_eq!(report.violations[0].exam_id, "E001");
        assert_eq!(report.count_at(ConflictPriority::High), 1);
    }

    #[test]
    fn test_detect_is_idempotent() {
        let ctx = test_ctx(vec![
            test_module("M001", &["S1", "S2"]),
            test_module("M002", &["S2"]),
        ]);
        let mut schedule = test_schedule(vec![
            placed("E001", "M001", 10, 1, "R101", "P001"),
            placed("E002", "M002", 10, 2, "R102", "P002"),
        ]);

        let detector = ConflictDetector::new();
        let first = detector.detect(&schedule, &ctx);
        assert_eq!(first.total(), 1); // S2 同日冲突

        // 标记后再测: 违规内容不变 (幂等)
        detector.mark_conflicted(&mut schedule, &first);
        let second = detector.detect(&schedule, &ctx);
        assert_eq!(first.total(), second.total());
        assert_eq!(
            first.violations[0].description,
            second.violations[0].description
        );
    }

    #[test]
    fn test_mark_conflicted_flips_status_only() {
        let ctx = test_ctx(vec![
            test_module("M001", &["S1"]),
            test_module("M002", &["S2"]),
        ]);
        let mut schedule = test_schedule(vec![
            placed("E001", "M001", 10, 1, "R101", "P001"),
            placed("E002", "M002", 10, 1, "R101", "P002"),
        ]);

        let detector = ConflictDetector::new();
        let report = detector.detect(&schedule, &ctx);
        let marked = detector.mark_conflicted(&mut schedule, &report);

        assert_eq!(marked, 2);
        assert_eq!(schedule.count_by_status(ExamStatus::Conflicted), 2);
        // 落位信息保留
        assert!(schedule.exams().iter().all(|e| e.placement.is_some()));
    }

    #[test]
    fn test_detect_with_preferences_adds_low_findings() {
        let mut module = test_module("M001", &["S1"]);
        module.preferred_room_type = Some(RoomType::Amphitheater);
        let ctx = test_ctx(vec![module]);
        let schedule = test_schedule(vec![placed("E001", "M001", 10, 1, "R101", "P001")]);

        let detector = ConflictDetector::new();
        assert!(detector.detect(&schedule, &ctx).is_clean());

        let report = detector.detect_with_preferences(&schedule, &ctx);
        assert_eq!(report.total(), 1);
        assert_eq!(report.count_at(ConflictPriority::Low), 1);
    }
}
