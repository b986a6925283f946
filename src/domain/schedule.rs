// ==========================================
// 高校考试排考系统 - 排考方案聚合
// ==========================================
// 依据: Timetabling_Master_Spec.md - PART A2 红线
// 红线: 窗口内一个模块至多一场考试; 考试由方案聚合独占持有
// ==========================================

use crate::domain::exam::{Exam, Horizon};
use crate::domain::types::ExamStatus;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ==========================================
// Schedule - 排考方案
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schedule {
    pub version_id: String, // 方案版本ID
    pub horizon: Horizon,   // 排考窗口
    exams: Vec<Exam>,       // 考试明细 (经 upsert 保证模块唯一)
}

impl Schedule {
    /// 创建空方案
    pub fn new(version_id: &str, horizon: Horizon) -> Self {
        Self {
            version_id: version_id.to_string(),
            horizon,
            exams: Vec::new(),
        }
    }

    /// 从既有考试明细重建方案 (同模块保留后出现者)
    pub fn from_exams(version_id: &str, horizon: Horizon, exams: Vec<Exam>) -> Self {
        let mut schedule = Self::new(version_id, horizon);
        for exam in exams {
            schedule.upsert(exam);
        }
        schedule
    }

    /// 写入考试; 同模块的既有考试被替换 (窗口内一模块一考试)
    pub fn upsert(&mut self, exam: Exam) {
        match self
            .exams
            .iter()
            .position(|e| e.module_id == exam.module_id)
        {
            Some(idx) => self.exams[idx] = exam,
            None => self.exams.push(exam),
        }
    }

    /// 全部考试 (含未排/冲突)
    pub fn exams(&self) -> &[Exam] {
        &self.exams
    }

    /// 全部考试的可变引用 (供检测器标记冲突)
    pub fn exams_mut(&mut self) -> &mut [Exam] {
        &mut self.exams
    }

    /// 按模块查找考试
    pub fn exam_for_module(&self, module_id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.module_id == module_id)
    }

    /// 按考试ID查找
    pub fn exam_by_id(&self, exam_id: &str) -> Option<&Exam> {
        self.exams.iter().find(|e| e.exam_id == exam_id)
    }

    /// 已落位考试 (Scheduled + Conflicted, 二者均占用资源)
    pub fn placed_exams(&self) -> impl Iterator<Item = &Exam> {
        self.exams.iter().filter(|e| e.is_placed())
    }

    /// 指定日期的已落位考试
    pub fn exams_on(&self, date: NaiveDate) -> Vec<&Exam> {
        self.exams
            .iter()
            .filter(|e| e.date() == Some(date))
            .collect()
    }

    /// 按日期分桶 (检测器 O(n log n) 扫描的基础)
    pub fn exams_by_date(&self) -> HashMap<NaiveDate, Vec<&Exam>> {
        let mut buckets: HashMap<NaiveDate, Vec<&Exam>> = HashMap::new();
        for exam in self.placed_exams() {
            if let Some(date) = exam.date() {
                buckets.entry(date).or_default().push(exam);
            }
        }
        buckets
    }

    /// 各状态考试数
    pub fn count_by_status(&self, status: ExamStatus) -> usize {
        self.exams.iter().filter(|e| e.status == status).count()
    }

    /// 占用的不同考试日数
    pub fn distinct_exam_days(&self) -> usize {
        let mut dates: Vec<NaiveDate> = self.placed_exams().filter_map(|e| e.date()).collect();
        dates.sort();
        dates.dedup();
        dates.len()
    }

    /// 考试总数
    pub fn len(&self) -> usize {
        self.exams.len()
    }

    /// 是否为空方案
    pub fn is_empty(&self) -> bool {
        self.exams.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::exam::Placement;

    fn horizon() -> Horizon {
        Horizon::new(
            NaiveDate::from_ymd_opt(2026, 1, 10).unwrap(),
            NaiveDate::from_ymd_opt(2026, 1, 20).unwrap(),
        )
        .unwrap()
    }

    fn placed_exam(exam_id: &str, module_id: &str, day: u32, slot_no: i32) -> Exam {
        let mut exam = Exam::new_unscheduled(exam_id, module_id, 90);
        exam.place(Placement {
            date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
            slot_no,
            room_id: "R101".to_string(),
            professor_id: "P001".to_string(),
        });
        exam
    }

    #[test]
    fn test_upsert_enforces_one_exam_per_module() {
        let mut schedule = Schedule::new("V001", horizon());
        schedule.upsert(placed_exam("E001", "M001", 10, 1));
        schedule.upsert(placed_exam("E002", "M001", 12, 2));

        assert_eq!(schedule.len(), 1);
        let exam = schedule.exam_for_module("M001").unwrap();
        assert_eq!(exam.exam_id, "E002");
        assert_eq!(
            exam.date(),
            Some(NaiveDate::from_ymd_opt(2026, 1, 12).unwrap())
        );
    }

    #[test]
    fn test_exams_by_date_buckets_only_placed() {
        let mut schedule = Schedule::new("V001", horizon());
        schedule.upsert(placed_exam("E001", "M001", 10, 1));
        schedule.upsert(placed_exam("E002", "M002", 10, 2));
        schedule.upsert(Exam::new_unscheduled("E003", "M003", 90));

        let buckets = schedule.exams_by_date();
        assert_eq!(buckets.len(), 1);
        assert_eq!(
            buckets[&NaiveDate::from_ymd_opt(2026, 1, 10).unwrap()].len(),
            2
        );
        assert_eq!(schedule.count_by_status(ExamStatus::Unscheduled), 1);
    }

    #[test]
    fn test_distinct_exam_days() {
        let mut schedule = Schedule::new("V001", horizon());
        schedule.upsert(placed_exam("E001", "M001", 10, 1));
        schedule.upsert(placed_exam("E002", "M002", 10, 2));
        schedule.upsert(placed_exam("E003", "M003", 14, 1));

        assert_eq!(schedule.distinct_exam_days(), 2);
    }
}
