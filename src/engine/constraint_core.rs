// ==========================================
// 高校考试排考系统 - Constraint Core 纯函数库
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 3. Constraint Catalog
// 职责: 提供时段重叠、选课交集等纯谓词
// 红线: 无状态、无副作用、无 I/O 操作
// ==========================================

use crate::domain::module::Module;

// ==========================================
// ConstraintCore - 纯函数工具类
// ==========================================
pub struct ConstraintCore;

impl ConstraintCore {
    /// 半开区间重叠判定
    ///
    /// 区间为 [start, start + duration),单位: 自午夜起算的分钟数。
    /// 非正时长按零长度区间处理 (不与任何区间重叠)。
    ///
    /// # 参数
    /// - a_start_min / a_duration_min: 区间A
    /// - b_start_min / b_duration_min: 区间B
    pub fn intervals_overlap(
        a_start_min: i32,
        a_duration_min: i32,
        b_start_min: i32,
        b_duration_min: i32,
    ) -> bool {
        if a_duration_min <= 0 || b_duration_min <= 0 {
            return false;
        }
        let a_end = a_start_min + a_duration_min;
        let b_end = b_start_min + b_duration_min;
        a_start_min < b_end && b_start_min < a_end
    }

    /// 两模块的共同选课学生 (升序去重)
    pub fn shared_students(a: &Module, b: &Module) -> Vec<String> {
        let mut shared: Vec<String> = a
            .enrolled_students
            .iter()
            .filter(|s| b.enrolled_students.contains(s))
            .cloned()
            .collect();
        shared.sort();
        shared.dedup();
        shared
    }

    /// 当日场次是否超出上限
    ///
    /// # 参数
    /// - existing_count: 已有场次数 (不含候选)
    /// - cap: 单日上限
    pub fn exceeds_daily_cap(existing_count: i32, cap: i32) -> bool {
        existing_count + 1 > cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RoomType;

    fn module(module_id: &str, students: &[&str]) -> Module {
        Module {
            module_id: module_id.to_string(),
            name: module_id.to_string(),
            formation_id: "F1".to_string(),
            department_id: "CS".to_string(),
            enrolled_count: students.len() as i32,
            enrolled_students: students.iter().map(|s| s.to_string()).collect(),
            duration_minutes: 90,
            preferred_room_type: Some(RoomType::Classroom),
        }
    }

    #[test]
    fn test_intervals_overlap_basic() {
        // [540, 630) vs [600, 690) → 重叠
        assert!(ConstraintCore::intervals_overlap(540, 90, 600, 90));
        // [540, 630) vs [630, 720) → 首尾相接不算重叠
        assert!(!ConstraintCore::intervals_overlap(540, 90, 630, 90));
        // 完全包含
        assert!(ConstraintCore::intervals_overlap(540, 180, 600, 30));
        // 完全分离
        assert!(!ConstraintCore::intervals_overlap(540, 90, 840, 90));
    }

    #[test]
    fn test_intervals_overlap_zero_duration() {
        assert!(!ConstraintCore::intervals_overlap(540, 0, 540, 90));
        assert!(!ConstraintCore::intervals_overlap(540, -10, 540, 90));
    }

    #[test]
    fn test_shared_students() {
        let a = module("M001", &["S1", "S2", "S3"]);
        let b = module("M002", &["S3", "S1", "S9"]);
        assert_eq!(ConstraintCore::shared_students(&a, &b), vec!["S1", "S3"]);

        let c = module("M003", &["S7"]);
        assert!(ConstraintCore::shared_students(&a, &c).is_empty());
    }

    #[test]
    fn test_exceeds_daily_cap() {
        assert!(!ConstraintCore::exceeds_daily_cap(0, 1));
        assert!(ConstraintCore::exceeds_daily_cap(1, 1));
        assert!(!ConstraintCore::exceeds_daily_cap(2, 3));
        assert!(ConstraintCore::exceeds_daily_cap(3, 3));
    }
}
