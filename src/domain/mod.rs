// ==========================================
// 高校考试排考系统 - 领域层
// ==========================================
// 依据: Timetabling_Master_Spec.md - PART B 领域模型
// 职责: 实体与不变量,不含引擎逻辑
// ==========================================

pub mod conflict;
pub mod exam;
pub mod module;
pub mod resources;
pub mod schedule;
pub mod types;

// 重导出核心实体
pub use conflict::{ConflictReport, UnplacedModule, Violation};
pub use exam::{Exam, Horizon, Placement, TimeSlot};
pub use module::{Enrollment, Module};
pub use resources::{required_seats, Professor, Room, Student};
pub use schedule::Schedule;
pub use types::{
    AcceptanceMode, ConflictPriority, ExamStatus, RoomType, StudentConflictRule, ViolationKind,
};
