// ==========================================
// 高校考试排考系统 - 领域类型定义
// ==========================================
// 依据: Timetabling_Master_Spec.md - PART A2 红线
// 依据: Engine_Specs_v0.2_Exam.md - 0.2 违规类型体系
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 考试状态 (Exam Status)
// ==========================================
// 红线: 冲突考试只标记,不删除
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExamStatus {
    Unscheduled, // 未排
    Scheduled,   // 已排
    Conflicted,  // 冲突待处理
}

impl fmt::Display for ExamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExamStatus::Unscheduled => write!(f, "UNSCHEDULED"),
            ExamStatus::Scheduled => write!(f, "SCHEDULED"),
            ExamStatus::Conflicted => write!(f, "CONFLICTED"),
        }
    }
}

impl ExamStatus {
    /// 从字符串解析状态
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SCHEDULED" => ExamStatus::Scheduled,
            "CONFLICTED" => ExamStatus::Conflicted,
            _ => ExamStatus::Unscheduled, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ExamStatus::Unscheduled => "UNSCHEDULED",
            ExamStatus::Scheduled => "SCHEDULED",
            ExamStatus::Conflicted => "CONFLICTED",
        }
    }
}

// ==========================================
// 教室类型 (Room Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomType {
    Amphitheater, // 阶梯教室
    Lab,          // 实验室
    Classroom,    // 普通教室
    Special,      // 特殊用途
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomType::Amphitheater => write!(f, "AMPHITHEATER"),
            RoomType::Lab => write!(f, "LAB"),
            RoomType::Classroom => write!(f, "CLASSROOM"),
            RoomType::Special => write!(f, "SPECIAL"),
        }
    }
}

impl RoomType {
    /// 从字符串解析教室类型
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "AMPHITHEATER" => RoomType::Amphitheater,
            "LAB" => RoomType::Lab,
            "SPECIAL" => RoomType::Special,
            _ => RoomType::Classroom, // 默认值
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            RoomType::Amphitheater => "AMPHITHEATER",
            RoomType::Lab => "LAB",
            RoomType::Classroom => "CLASSROOM",
            RoomType::Special => "SPECIAL",
        }
    }
}

// ==========================================
// 违规类型 (Violation Kind)
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 3. Constraint Catalog
// 硬约束违规 5 类 + 软偏好违规 1 类 (RoomTypeMismatch)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ViolationKind {
    RoomDoubleBooking,      // 教室时段冲突
    ProfessorDoubleBooking, // 监考教师时段冲突
    StudentSameDayConflict, // 学生同日(或同时段)冲突
    RoomOverCapacity,       // 教室容量不足
    ResourceUnavailable,    // 教室停用/教师不可用日期
    RoomTypeMismatch,       // 教室类型偏好不符 (仅软成本)
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::RoomDoubleBooking => write!(f, "ROOM_DOUBLE_BOOKING"),
            ViolationKind::ProfessorDoubleBooking => write!(f, "PROFESSOR_DOUBLE_BOOKING"),
            ViolationKind::StudentSameDayConflict => write!(f, "STUDENT_SAME_DAY_CONFLICT"),
            ViolationKind::RoomOverCapacity => write!(f, "ROOM_OVER_CAPACITY"),
            ViolationKind::ResourceUnavailable => write!(f, "RESOURCE_UNAVAILABLE"),
            ViolationKind::RoomTypeMismatch => write!(f, "ROOM_TYPE_MISMATCH"),
        }
    }
}

impl ViolationKind {
    /// 从字符串解析违规类型
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ROOM_DOUBLE_BOOKING" => Some(ViolationKind::RoomDoubleBooking),
            "PROFESSOR_DOUBLE_BOOKING" => Some(ViolationKind::ProfessorDoubleBooking),
            "STUDENT_SAME_DAY_CONFLICT" => Some(ViolationKind::StudentSameDayConflict),
            "ROOM_OVER_CAPACITY" => Some(ViolationKind::RoomOverCapacity),
            "RESOURCE_UNAVAILABLE" => Some(ViolationKind::ResourceUnavailable),
            "ROOM_TYPE_MISMATCH" => Some(ViolationKind::RoomTypeMismatch),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ViolationKind::RoomDoubleBooking => "ROOM_DOUBLE_BOOKING",
            ViolationKind::ProfessorDoubleBooking => "PROFESSOR_DOUBLE_BOOKING",
            ViolationKind::StudentSameDayConflict => "STUDENT_SAME_DAY_CONFLICT",
            ViolationKind::RoomOverCapacity => "ROOM_OVER_CAPACITY",
            ViolationKind::ResourceUnavailable => "RESOURCE_UNAVAILABLE",
            ViolationKind::RoomTypeMismatch => "ROOM_TYPE_MISMATCH",
        }
    }

    /// 是否为硬约束违规
    ///
    /// 硬约束违规使排考方案无效; RoomTypeMismatch 只参与软成本。
    pub fn is_hard(&self) -> bool {
        !matches!(self, ViolationKind::RoomTypeMismatch)
    }

    /// 违规类型到处理优先级的确定性映射
    ///
    /// 规则 (Engine_Specs 4.2):
    /// - 时段冲突类 (学生/教师/教室) → High
    /// - 容量不足 / 资源不可用 → Medium
    /// - 偏好不符 → Low
    pub fn priority(&self) -> ConflictPriority {
        match self {
            ViolationKind::StudentSameDayConflict
            | ViolationKind::ProfessorDoubleBooking
            | ViolationKind::RoomDoubleBooking => ConflictPriority::High,
            ViolationKind::RoomOverCapacity | ViolationKind::ResourceUnavailable => {
                ConflictPriority::Medium
            }
            ViolationKind::RoomTypeMismatch => ConflictPriority::Low,
        }
    }
}

// ==========================================
// 冲突处理优先级 (Conflict Priority)
// ==========================================
// 顺序: High 排在最前 (Ord 按声明序,升序遍历时先处理 High)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConflictPriority {
    High,   // 必须处理
    Medium, // 应当处理
    Low,    // 建议处理
}

impl fmt::Display for ConflictPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictPriority::High => write!(f, "HIGH"),
            ConflictPriority::Medium => write!(f, "MEDIUM"),
            ConflictPriority::Low => write!(f, "LOW"),
        }
    }
}

impl ConflictPriority {
    /// 从字符串解析优先级
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "HIGH" => ConflictPriority::High,
            "MEDIUM" => ConflictPriority::Medium,
            _ => ConflictPriority::Low,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ConflictPriority::High => "HIGH",
            ConflictPriority::Medium => "MEDIUM",
            ConflictPriority::Low => "LOW",
        }
    }
}

// ==========================================
// 学生冲突口径 (Student Conflict Rule)
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 0.3 开放问题裁定
// 同日口径为默认; 同时段口径供宽松场景选用
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StudentConflictRule {
    SameDay,  // 同一学生同日至多 max_exams_per_day_student 场
    SameSlot, // 仅禁止时段重叠
}

impl fmt::Display for StudentConflictRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StudentConflictRule::SameDay => write!(f, "SAME_DAY"),
            StudentConflictRule::SameSlot => write!(f, "SAME_SLOT"),
        }
    }
}

impl StudentConflictRule {
    /// 从字符串解析冲突口径
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "SAME_SLOT" => StudentConflictRule::SameSlot,
            _ => StudentConflictRule::SameDay, // 默认同日口径
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            StudentConflictRule::SameDay => "SAME_DAY",
            StudentConflictRule::SameSlot => "SAME_SLOT",
        }
    }
}

// ==========================================
// 接受准则模式 (Acceptance Mode)
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 6. Optimizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AcceptanceMode {
    HillClimb, // 爬山: 软成本不增 (容差内) 才接受
    Annealing, // 退火: 按温度概率接受劣化移动
}

impl fmt::Display for AcceptanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AcceptanceMode::HillClimb => write!(f, "HILL_CLIMB"),
            AcceptanceMode::Annealing => write!(f, "ANNEALING"),
        }
    }
}

impl AcceptanceMode {
    /// 从字符串解析接受准则
    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ANNEALING" => AcceptanceMode::Annealing,
            _ => AcceptanceMode::HillClimb, // 默认爬山
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            AcceptanceMode::HillClimb => "HILL_CLIMB",
            AcceptanceMode::Annealing => "ANNEALING",
        }
    }
}
