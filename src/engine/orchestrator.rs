// ==========================================
// 高校考试排考系统 - 引擎编排器
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 1.1 计算主流程
// 用途: 协调约束目录/排考/检测/优化四个核心引擎的执行顺序
// ==========================================

use crate::domain::conflict::{ConflictReport, UnplacedModule};
use crate::domain::exam::Horizon;
use crate::domain::schedule::Schedule;
use crate::engine::conflict_detector::ConflictDetector;
use crate::engine::constraint::ConstraintCatalog;
use crate::engine::context::ScheduleContext;
use crate::engine::optimizer::{OptimizeError, OptimizeOutcome, ScheduleOptimizer};
use crate::engine::scheduler::ExamScheduler;
use tracing::{debug, info};

// ==========================================
// BuildRunResult - 构造运行结果
// ==========================================
#[derive(Debug, Clone)]
pub struct BuildRunResult {
    // Scheduler 输出
    pub schedule: Schedule,
    pub unplaced: Vec<UnplacedModule>,

    // Detector 输出 (构造产出的落位部分必须为空违规)
    pub report: ConflictReport,

    // 软成本 (供前端/优化器对照)
    pub soft_cost: f64,
}

// ==========================================
// ScheduleOrchestrator - 引擎编排器
// ==========================================
pub struct ScheduleOrchestrator {
    scheduler: ExamScheduler,
    detector: ConflictDetector,
    optimizer: ScheduleOptimizer,
    catalog: ConstraintCatalog,
}

impl ScheduleOrchestrator {
    /// 创建新的编排器实例
    pub fn new() -> Self {
        Self {
            scheduler: ExamScheduler::new(),
            detector: ConflictDetector::new(),
            optimizer: ScheduleOptimizer::new(),
            catalog: ConstraintCatalog::new(),
        }
    }

    /// 执行完整构造流程: 排考 → 审计 → 成本核算
    ///
    /// # 参数
    /// - `horizon`: 排考窗口
    /// - `version_id`: 方案版本ID
    /// - `ctx`: 引擎上下文
    pub fn execute_build(
        &self,
        horizon: Horizon,
        version_id: &str,
        ctx: &ScheduleContext,
    ) -> BuildRunResult {
        info!(
            version_id = %version_id,
            module_count = ctx.modules().count(),
            "开始执行排考流程"
        );

        // ==========================================
        // 步骤1: Exam Placer - 构造式落位
        // ==========================================
        debug!("步骤1: 执行构造式落位");
        let (schedule, unplaced) = self.scheduler.build(horizon, version_id, ctx);

        // ==========================================
        // 步骤2: Conflict Detector - 全量审计
        // ==========================================
        debug!("步骤2: 执行全量审计");
        let report = self.detector.detect(&schedule, ctx);

        // ==========================================
        // 步骤3: 软成本核算
        // ==========================================
        debug!("步骤3: 执行软成本核算");
        let soft_cost = self.catalog.schedule_cost(&schedule, ctx);

        info!(
            placed = schedule.len() - unplaced.len(),
            unplaced = unplaced.len(),
            violations = report.total(),
            soft_cost,
            "排考流程完成"
        );

        BuildRunResult {
            schedule,
            unplaced,
            report,
            soft_cost,
        }
    }

    /// 全量审计 (硬约束)
    pub fn audit(&self, schedule: &Schedule, ctx: &ScheduleContext) -> ConflictReport {
        self.detector.detect(schedule, ctx)
    }

    /// 全量审计 + 偏好发现
    pub fn audit_with_preferences(
        &self,
        schedule: &Schedule,
        ctx: &ScheduleContext,
    ) -> ConflictReport {
        self.detector.detect_with_preferences(schedule, ctx)
    }

    /// 审计并把违规考试标记为 Conflicted
    ///
    /// # 返回
    /// (报告, 被标记的考试数)
    pub fn audit_and_mark(
        &self,
        schedule: &mut Schedule,
        ctx: &ScheduleContext,
    ) -> (ConflictReport, usize) {
        let report = self.detector.detect(schedule, ctx);
        let marked = self.detector.mark_conflicted(schedule, &report);
        (report, marked)
    }

    /// 局部搜索优化 (前置条件: 输入硬有效)
    pub fn execute_optimize(
        &self,
        schedule: &Schedule,
        ctx: &ScheduleContext,
    ) -> Result<OptimizeOutcome, OptimizeError> {
        self.optimizer.improve(schedule, ctx)
    }

    /// 方案软成本
    pub fn soft_cost(&self, schedule: &Schedule, ctx: &ScheduleContext) -> f64 {
        self.catalog.schedule_cost(schedule, ctx)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ScheduleOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}
