// ==========================================
// 高校考试排考系统 - 数据访问接口
// ==========================================
// 红线: Repository 不含业务逻辑; 引擎只依赖本接口
// ==========================================
// 职责: 抽象数据访问协作方 (参考数据读取 + 方案持久化)
// 约定: 同步返回或报错; 任何错误对当次运行都是致命的
// ==========================================

use crate::domain::exam::Horizon;
use crate::domain::module::Module;
use crate::domain::resources::{Professor, Room};
use crate::domain::schedule::Schedule;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// ScheduleDataAccess Trait
// ==========================================
#[async_trait]
pub trait ScheduleDataAccess: Send + Sync {
    /// 待排模块 (窗口内尚无已落位考试的模块,附带选课明细)
    async fn fetch_unscheduled_modules(&self, horizon: Horizon) -> RepositoryResult<Vec<Module>>;

    /// 全部模块 (可按院系过滤,附带选课明细; 审计既有方案时使用)
    async fn fetch_modules(&self, department_id: Option<&str>) -> RepositoryResult<Vec<Module>>;

    /// 全部教室
    async fn fetch_rooms(&self) -> RepositoryResult<Vec<Room>>;

    /// 教师 (可按院系过滤),附带不可用日期
    async fn fetch_professors(
        &self,
        department_id: Option<&str>,
    ) -> RepositoryResult<Vec<Professor>>;

    /// 窗口内最近一次持久化的方案 (审计/仅优化运行使用)
    async fn fetch_existing_schedule(&self, horizon: Horizon) -> RepositoryResult<Schedule>;

    /// 持久化方案 (事务内全量替换该版本的考试明细)
    async fn persist_schedule(&self, schedule: &Schedule) -> RepositoryResult<()>;
}
