// ==========================================
// 高校考试排考系统 - 引擎层
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 1.2 模块拆分
// ==========================================
// 职责: 实现排考业务规则,不拼 SQL
// 红线: Engine 不拼 SQL, 所有判定必须输出 reason
// ==========================================

pub mod conflict_detector;
pub mod constraint;
pub mod constraint_core;
pub mod context;
pub mod optimizer;
pub mod orchestrator;
pub mod scheduler;

// 重导出核心引擎
pub use conflict_detector::ConflictDetector;
pub use constraint::ConstraintCatalog;
pub use constraint_core::ConstraintCore;
pub use context::ScheduleContext;
pub use optimizer::{OptimizeError, OptimizeOutcome, ScheduleOptimizer};
pub use orchestrator::{BuildRunResult, ScheduleOrchestrator};
pub use scheduler::ExamScheduler;
