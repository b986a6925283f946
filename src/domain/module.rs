// ==========================================
// 高校考试排考系统 - 课程模块领域模型
// ==========================================
// 依据: Timetabling_Master_Spec.md - PART B2 课程与选课
// ==========================================

use crate::domain::types::RoomType;
use serde::{Deserialize, Serialize};

// ==========================================
// Module - 课程模块
// ==========================================
// 每个模块在一个排考窗口内至多对应一场考试
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    pub module_id: String,                    // 模块ID
    pub name: String,                         // 课程名称
    pub formation_id: String,                 // 所属培养方案
    pub department_id: String,                // 所属院系
    pub enrolled_count: i32,                  // 应考人数 (由选课关系汇总)
    pub enrolled_students: Vec<String>,       // 应考学生学号列表
    pub duration_minutes: i32,                // 考试时长 (分钟)
    pub preferred_room_type: Option<RoomType>, // 教室类型偏好 (软约束)
}

impl Module {
    /// 应考人数口径统一取 enrolled_students 与 enrolled_count 的较大者
    ///
    /// 选课明细与汇总计数可能来自不同查询,取较大者保证容量校验保守。
    pub fn effective_enrollment(&self) -> i32 {
        (self.enrolled_students.len() as i32).max(self.enrolled_count)
    }
}

// ==========================================
// Enrollment - 选课关系
// ==========================================
// Student ↔ Module 多对多; 引擎内仅在导入与查询时使用
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub student_id: String, // 学号
    pub module_id: String,  // 模块ID
}
