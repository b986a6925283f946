// ==========================================
// 高校考试排考系统 - 冲突报告领域模型
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 4. Conflict Detector
// 红线: 所有违规必须携带实体ID与可读原因,不得吞掉
// ==========================================

use crate::domain::types::{ConflictPriority, ViolationKind};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// Violation - 单条违规
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub kind: ViolationKind,           // 违规类型
    pub priority: ConflictPriority,    // 处理优先级 (由类型确定性映射)
    pub exam_id: String,               // 违规考试
    pub other_exam_id: Option<String>, // 冲突对端考试 (成对违规时)
    pub module_id: String,             // 关联模块
    pub date: Option<NaiveDate>,       // 发生日期
    pub room_id: Option<String>,       // 涉及教室
    pub professor_id: Option<String>,  // 涉及教师
    pub student_id: Option<String>,    // 涉及学生
    pub description: String,           // 可读描述 (红线: 可解释性)
}

impl Violation {
    /// 构造违规,优先级由类型映射得出
    pub fn new(
        kind: ViolationKind,
        exam_id: &str,
        module_id: &str,
        date: Option<NaiveDate>,
        description: String,
    ) -> Self {
        Self {
            kind,
            priority: kind.priority(),
            exam_id: exam_id.to_string(),
            other_exam_id: None,
            module_id: module_id.to_string(),
            date,
            room_id: None,
            professor_id: None,
            student_id: None,
            description,
        }
    }

    /// 设置冲突对端考试
    pub fn with_other_exam(mut self, other_exam_id: &str) -> Self {
        self.other_exam_id = Some(other_exam_id.to_string());
        self
    }

    /// 设置涉及教室
    pub fn with_room(mut self, room_id: &str) -> Self {
        self.room_id = Some(room_id.to_string());
        self
    }

    /// 设置涉及教师
    pub fn with_professor(mut self, professor_id: &str) -> Self {
        self.professor_id = Some(professor_id.to_string());
        self
    }

    /// 设置涉及学生
    pub fn with_student(mut self, student_id: &str) -> Self {
        self.student_id = Some(student_id.to_string());
        self
    }
}

// ==========================================
// ConflictReport - 冲突报告
// ==========================================
// 幂等: 同一方案重复检测得到相同的违规内容
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConflictReport {
    pub version_id: String,                           // 被检方案版本
    pub violations: Vec<Violation>,                   // 全部违规 (按优先级/类型排序)
    pub count_by_kind: BTreeMap<ViolationKind, usize>, // 按类型计数
    pub count_by_priority: BTreeMap<ConflictPriority, usize>, // 按优先级计数
}

impl ConflictReport {
    /// 由违规列表构建报告 (排序 + 分组计数)
    pub fn from_violations(version_id: &str, mut violations: Vec<Violation>) -> Self {
        // 稳定排序: 优先级 → 类型 → 考试ID,保证幂等输出
        violations.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.kind.cmp(&b.kind))
                .then(a.exam_id.cmp(&b.exam_id))
                .then(a.other_exam_id.cmp(&b.other_exam_id))
                .then(a.student_id.cmp(&b.student_id))
        });

        let mut count_by_kind: BTreeMap<ViolationKind, usize> = BTreeMap::new();
        let mut count_by_priority: BTreeMap<ConflictPriority, usize> = BTreeMap::new();
        for v in &violations {
            *count_by_kind.entry(v.kind).or_insert(0) += 1;
            *count_by_priority.entry(v.priority).or_insert(0) += 1;
        }

        Self {
            version_id: version_id.to_string(),
            violations,
            count_by_kind,
            count_by_priority,
        }
    }

    /// 是否无违规
    pub fn is_clean(&self) -> bool {
        self.violations.is_empty()
    }

    /// 违规总数
    pub fn total(&self) -> usize {
        self.violations.len()
    }

    /// 指定类型的违规
    pub fn of_kind(&self, kind: ViolationKind) -> Vec<&Violation> {
        self.violations.iter().filter(|v| v.kind == kind).collect()
    }

    /// 指定优先级的违规数
    pub fn count_at(&self, priority: ConflictPriority) -> usize {
        self.count_by_priority.get(&priority).copied().unwrap_or(0)
    }

    /// 违规涉及的考试ID集合 (去重,升序)
    pub fn offending_exam_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self
            .violations
            .iter()
            .flat_map(|v| {
                std::iter::once(v.exam_id.clone()).chain(v.other_exam_id.clone())
            })
            .collect();
        ids.sort();
        ids.dedup();
        ids
    }
}

// ==========================================
// UnplacedModule - 未落位模块
// ==========================================
// 红线: 排不下的模块必须连同阻塞原因一并上报,不得静默丢弃
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnplacedModule {
    pub module_id: String,                // 模块ID
    pub module_name: String,              // 课程名称
    pub enrolled_count: i32,              // 应考人数
    pub blocking_kinds: Vec<ViolationKind>, // 阻塞全部候选的违规类型 (去重)
    pub detail: String,                   // 可读说明
}
