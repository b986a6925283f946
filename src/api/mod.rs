// ==========================================
// 高校考试排考系统 - API 层
// ==========================================
// 职责: 面向调用方的排考业务接口
// ==========================================

pub mod error;
pub mod schedule_api;

pub use error::{ApiError, ApiResult};
pub use schedule_api::{BuildOutcome, ScheduleSummary, TimetableApi};
