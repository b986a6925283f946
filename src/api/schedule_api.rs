// ==========================================
// 高校考试排考系统 - 排考业务接口
// ==========================================
// 职责: 面向调用方 (CLI/服务/看板) 的排考门面
// 红线: 公开操作要么完整成功,要么完整失败; 持久化在运行结束后执行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ScheduleConfig, ScheduleConfigReader};
use crate::domain::conflict::{ConflictReport, UnplacedModule};
use crate::domain::exam::Horizon;
use crate::domain::schedule::Schedule;
use crate::domain::types::ExamStatus;
use crate::engine::{OptimizeError, OptimizeOutcome, ScheduleContext, ScheduleOrchestrator};
use crate::repository::ScheduleDataAccess;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

// ==========================================
// BuildOutcome - 构造运行输出
// ==========================================
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub schedule: Schedule,
    pub unplaced: Vec<UnplacedModule>,
    pub report: ConflictReport,
    pub soft_cost: f64,
}

// ==========================================
// ScheduleSummary - 方案统计
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub version_id: String,        // 方案版本
    pub total_exams: usize,        // 考试总数
    pub scheduled_count: usize,    // 已排
    pub unscheduled_count: usize,  // 未排
    pub conflicted_count: usize,   // 冲突待处理
    pub distinct_exam_days: usize, // 占用考试日数
    pub mean_fill_ratio: f64,      // 平均坐席利用率 (应考人数/教室容量)
    pub soft_cost: f64,            // 软成本
}

// ==========================================
// TimetableApi - 排考门面
// ==========================================
pub struct TimetableApi<D, C>
where
    D: ScheduleDataAccess,
    C: ScheduleConfigReader,
{
    data: Arc<D>,
    config: Arc<C>,
    orchestrator: ScheduleOrchestrator,
}

impl<D, C> TimetableApi<D, C>
where
    D: ScheduleDataAccess,
    C: ScheduleConfigReader,
{
    /// 创建排考门面
    ///
    /// # 参数
    /// - data: 数据访问协作方
    /// - config: 配置读取器
    pub fn new(data: Arc<D>, config: Arc<C>) -> Self {
        Self {
            data,
            config,
            orchestrator: ScheduleOrchestrator::new(),
        }
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 加载并校验配置 (非法配置在任何搜索前拒绝)
    async fn load_config(&self) -> ApiResult<ScheduleConfig> {
        let config = self
            .config
            .load_schedule_config()
            .await
            .map_err(|e| ApiError::DataAccessError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// 以全部模块构建审计/优化上下文
    async fn audit_context(&self, config: ScheduleConfig) -> ApiResult<ScheduleContext> {
        let modules = self.data.fetch_modules(None).await?;
        let rooms = self.data.fetch_rooms().await?;
        let professors = self.data.fetch_professors(None).await?;
        Ok(ScheduleContext::new(rooms, professors, modules, config))
    }

    // ==========================================
    // Build - 构造排考
    // ==========================================

    /// 构造排考方案 (全校)
    pub async fn build(&self, horizon: Horizon) -> ApiResult<BuildOutcome> {
        self.build_for_department(horizon, None).await
    }

    /// 构造排考方案 (可按院系圈定模块与教师)
    ///
    /// 运行不落库; 由调用方在确认后调用 persist。
    #[instrument(skip(self), fields(department = department.unwrap_or("ALL")))]
    pub async fn build_for_department(
        &self,
        horizon: Horizon,
        department: Option<&str>,
    ) -> ApiResult<BuildOutcome> {
        let config = self.load_config().await?;

        let mut modules = self.data.fetch_unscheduled_modules(horizon).await?;
        if let Some(dept) = department {
            modules.retain(|m| m.department_id == dept);
        }
        let rooms = self.data.fetch_rooms().await?;
        let professors = self.data.fetch_professors(department).await?;

        let ctx = ScheduleContext::new(rooms, professors, modules, config);
        let version_id = format!("V-{}", Uuid::new_v4());

        let result = self.orchestrator.execute_build(horizon, &version_id, &ctx);

        info!(
            version_id = %version_id,
            unplaced = result.unplaced.len(),
            "构造运行完成"
        );

        Ok(BuildOutcome {
            schedule: result.schedule,
            unplaced: result.unplaced,
            report: result.report,
            soft_cost: result.soft_cost,
        })
    }

    /// 构造排考方案,要求全量落位
    ///
    /// 任一模块排不下即整体报错 (方案不落库)。
    pub async fn build_strict(&self, horizon: Horizon) -> ApiResult<BuildOutcome> {
        let outcome = self.build(horizon).await?;
        if let Some(first) = outcome.unplaced.first() {
            return Err(ApiError::UnplaceableModule {
                module_count: outcome.unplaced.len(),
                first_module_id: first.module_id.clone(),
            });
        }
        Ok(outcome)
    }

    // ==========================================
    // Audit - 审计
    // ==========================================

    /// 审计给定方案 (含外部编辑过的方案)
    pub async fn audit(&self, schedule: &Schedule) -> ApiResult<ConflictReport> {
        let config = self.load_config().await?;
        let ctx = self.audit_context(config).await?;
        Ok(self.orchestrator.audit(schedule, &ctx))
    }

    /// 审计窗口内最近持久化的方案
    pub async fn audit_horizon(&self, horizon: Horizon) -> ApiResult<ConflictReport> {
        let schedule = self.data.fetch_existing_schedule(horizon).await?;
        self.audit(&schedule).await
    }

    /// 审计并标记冲突考试,返回 (标记后方案, 报告)
    ///
    /// 冲突考试只标记不删除,等待人工或优化器处理。
    pub async fn audit_and_mark(
        &self,
        mut schedule: Schedule,
    ) -> ApiResult<(Schedule, ConflictReport)> {
        let config = self.load_config().await?;
        let ctx = self.audit_context(config).await?;
        let (report, marked) = self.orchestrator.audit_and_mark(&mut schedule, &ctx);
        info!(marked, violations = report.total(), "审计标记完成");
        Ok((schedule, report))
    }

    // ==========================================
    // Optimize - 优化
    // ==========================================

    /// 局部搜索优化 (目标/预算取自配置)
    pub async fn optimize(&self, schedule: &Schedule) -> ApiResult<OptimizeOutcome> {
        let config = self.load_config().await?;
        self.optimize_with_config(schedule, config).await
    }

    /// 局部搜索优化 (调用方显式传入目标权重与预算)
    pub async fn optimize_with_config(
        &self,
        schedule: &Schedule,
        config: ScheduleConfig,
    ) -> ApiResult<OptimizeOutcome> {
        config.validate()?;
        let ctx = self.audit_context(config).await?;
        match self.orchestrator.execute_optimize(schedule, &ctx) {
            Ok(outcome) => Ok(outcome),
            Err(OptimizeError::PreconditionFailed { violation_count }) => Err(
                ApiError::PreconditionFailed(format!(
                    "输入方案存在 {} 条硬违规,已原样退回",
                    violation_count
                )),
            ),
        }
    }

    // ==========================================
    // Persist - 持久化
    // ==========================================

    /// 持久化方案 (事务内全量替换; 失败不留半成品)
    pub async fn persist(&self, schedule: &Schedule) -> ApiResult<()> {
        self.data.persist_schedule(schedule).await?;
        Ok(())
    }

    /// 读取窗口内最近持久化的方案
    pub async fn fetch_schedule(&self, horizon: Horizon) -> ApiResult<Schedule> {
        Ok(self.data.fetch_existing_schedule(horizon).await?)
    }

    // ==========================================
    // Summary - 统计
    // ==========================================

    /// 方案统计 (看板数据)
    pub async fn summary(&self, schedule: &Schedule) -> ApiResult<ScheduleSummary> {
        let config = self.load_config().await?;
        let ctx = self.audit_context(config).await?;

        let mut fill_ratios = Vec::new();
        for exam in schedule.placed_exams() {
            let placement = match &exam.placement {
                Some(p) => p,
                None => continue,
            };
            if let (Some(room), Some(module)) =
                (ctx.room(&placement.room_id), ctx.module(&exam.module_id))
            {
                if room.capacity > 0 {
                    fill_ratios
                        .push(module.effective_enrollment() as f64 / room.capacity as f64);
                }
            }
        }
        let mean_fill_ratio = if fill_ratios.is_empty() {
            0.0
        } else {
            fill_ratios.iter().sum::<f64>() / fill_ratios.len() as f64
        };

        Ok(ScheduleSummary {
            version_id: schedule.version_id.clone(),
            total_exams: schedule.len(),
            scheduled_count: schedule.count_by_status(ExamStatus::Scheduled),
            unscheduled_count: schedule.count_by_status(ExamStatus::Unscheduled),
            conflicted_count: schedule.count_by_status(ExamStatus::Conflicted),
            distinct_exam_days: schedule.distinct_exam_days(),
            mean_fill_ratio,
            soft_cost: self.orchestrator.soft_cost(schedule, &ctx),
        })
    }

    // ==========================================
    // 考期窗口
    // ==========================================

    /// 下一个排考窗口 (配置化的考期清单)
    pub async fn next_exam_session(&self, today: NaiveDate) -> ApiResult<Horizon> {
        self.config
            .get_next_exam_session(today)
            .await
            .map_err(|e| ApiError::DataAccessError(e.to_string()))
    }
}
