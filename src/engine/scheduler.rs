// ==========================================
// 高校考试排考系统 - 构造式排考引擎
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 5. Exam Placer
// 红线: 落位考试必须零硬违规; 排不下的模块必须连同原因上报
// ==========================================
// 职责: 大考先排 (most-constrained-first) + 首个合法候选落位
// 输入: ScheduleContext (模块/教室/教师/配置) + 排考窗口
// 输出: Schedule + 未落位模块清单
// ==========================================

use crate::domain::conflict::UnplacedModule;
use crate::domain::exam::{Exam, Horizon, Placement};
use crate::domain::module::Module;
use crate::domain::resources::Room;
use crate::domain::schedule::Schedule;
use crate::domain::types::ViolationKind;
use crate::engine::constraint::ConstraintCatalog;
use crate::engine::context::ScheduleContext;
use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, instrument};

// ==========================================
// ExamScheduler - 构造式排考引擎
// ==========================================
pub struct ExamScheduler {
    catalog: ConstraintCatalog,
}

/// 教师负载账本 (排考过程中增量维护)
#[derive(Default)]
struct ProfessorLoadLedger {
    daily: HashMap<(String, NaiveDate), i32>,
    weekly: HashMap<(String, i32, u32), i32>,
    total: HashMap<String, i32>,
}

impl ProfessorLoadLedger {
    fn load_on(&self, professor_id: &str, date: NaiveDate) -> i32 {
        self.daily
            .get(&(professor_id.to_string(), date))
            .copied()
            .unwrap_or(0)
    }

    fn weekly_load(&self, professor_id: &str, date: NaiveDate) -> i32 {
        let week = date.iso_week();
        self.weekly
            .get(&(professor_id.to_string(), week.year(), week.week()))
            .copied()
            .unwrap_or(0)
    }

    fn total_load(&self, professor_id: &str) -> i32 {
        self.total.get(professor_id).copied().unwrap_or(0)
    }

    fn record(&mut self, professor_id: &str, date: NaiveDate) {
        *self
            .daily
            .entry((professor_id.to_string(), date))
            .or_insert(0) += 1;
        let week = date.iso_week();
        *self
            .weekly
            .entry((professor_id.to_string(), week.year(), week.week()))
            .or_insert(0) += 1;
        *self.total.entry(professor_id.to_string()).or_insert(0) += 1;
    }
}

impl ExamScheduler {
    /// 构造函数
    pub fn new() -> Self {
        Self {
            catalog: ConstraintCatalog::new(),
        }
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 构造排考方案
    ///
    /// 规则 (Engine_Specs 5.2):
    /// 1) 模块按应考人数降序处理 (大考更难排,先占位减少回溯)
    /// 2) 候选 (日期, 时段, 教室) 按窗口×时段×容量升序枚举,
    ///    教室先过容量/启用过滤
    /// 3) 每个候选选当日负载最小的同院系教师 (并列取总负载最小)
    /// 4) 首个零硬违规候选落位; 候选耗尽则上报 UnplacedModule
    ///
    /// 未落位模块在方案中保留 UNSCHEDULED 考试记录,不静默丢弃。
    ///
    /// # 参数
    /// - `horizon`: 排考窗口
    /// - `version_id`: 方案版本ID
    /// - `ctx`: 引擎上下文 (待排模块 + 资源 + 配置)
    ///
    /// # 返回
    /// (排考方案, 未落位模块清单)
    #[instrument(skip(self, ctx), fields(
        version_id = %version_id,
        module_count = ctx.modules().count(),
    ))]
    pub fn build(
        &self,
        horizon: Horizon,
        version_id: &str,
        ctx: &ScheduleContext,
    ) -> (Schedule, Vec<UnplacedModule>) {
        let mut schedule = Schedule::new(version_id, horizon);
        let mut unplaced = Vec::new();
        let mut ledger = ProfessorLoadLedger::default();

        // 大考先排; 并列按 module_id 保证确定性
        let mut modules: Vec<&Module> = ctx.modules().collect();
        modules.sort_by(|a, b| {
            b.effective_enrollment()
                .cmp(&a.effective_enrollment())
                .then(a.module_id.cmp(&b.module_id))
        });

        // 教室按容量升序: 刚好装得下的教室优先,减少容量浪费
        let mut rooms: Vec<&Room> = ctx.rooms().collect();
        rooms.sort_by(|a, b| a.capacity.cmp(&b.capacity).then(a.room_id.cmp(&b.room_id)));

        let dates = horizon.dates();

        info!(
            module_count = modules.len(),
            room_count = rooms.len(),
            day_count = dates.len(),
            slot_count = ctx.config.slot_list.len(),
            "开始构造排考方案"
        );

        for module in modules {
            match self.place_module(module, &schedule, &dates, &rooms, &mut ledger, ctx) {
                Ok(exam) => {
                    debug!(
                        module_id = %module.module_id,
                        exam_id = %exam.exam_id,
                        "模块落位成功"
                    );
                    schedule.upsert(exam);
                }
                Err(report) => {
                    debug!(
                        module_id = %module.module_id,
                        blocking = ?report.blocking_kinds,
                        "模块无法落位"
                    );
                    // 保留 UNSCHEDULED 考试记录
                    schedule.upsert(Exam::new_unscheduled(
                        &Self::exam_id_for(&module.module_id),
                        &module.module_id,
                        ctx.config.duration_for(module.duration_minutes),
                    ));
                    unplaced.push(report);
                }
            }
        }

        info!(
            placed = schedule.len() - unplaced.len(),
            unplaced = unplaced.len(),
            "排考方案构造完成"
        );

        (schedule, unplaced)
    }

    /// 为单个模块寻找首个合法候选
    fn place_module(
        &self,
        module: &Module,
        schedule: &Schedule,
        dates: &[NaiveDate],
        rooms: &[&Room],
        ledger: &mut ProfessorLoadLedger,
        ctx: &ScheduleContext,
    ) -> Result<Exam, UnplacedModule> {
        let enrolled = module.effective_enrollment();
        let margin = ctx.config.room_capacity_margin;
        let duration = ctx.config.duration_for(module.duration_minutes);
        let exam_id = Self::exam_id_for(&module.module_id);

        let mut blocking: BTreeSet<ViolationKind> = BTreeSet::new();
        let mut candidates_tried: u32 = 0;
        let mut any_fitting_room = false;
        let mut any_enabled_room = false;

        for &date in dates {
            for slot in &ctx.config.slot_list {
                for room in rooms {
                    if !room.available {
                        continue;
                    }
                    any_enabled_room = true;
                    if !room.fits(enrolled, margin) {
                        continue;
                    }
                    any_fitting_room = true;

                    // 教师选择: 当日负载最小 → 总负载最小 → 工号
                    let professor_id = match self.pick_professor(module, date, ledger, ctx) {
                        Some(id) => id,
                        None => {
                            blocking.insert(ViolationKind::ResourceUnavailable);
                            continue;
                        }
                    };

                    candidates_tried += 1;
                    let mut exam = Exam::new_unscheduled(&exam_id, &module.module_id, duration);
                    exam.place(Placement {
                        date,
                        slot_no: slot.slot_no,
                        room_id: room.room_id.clone(),
                        professor_id: professor_id.clone(),
                    });

                    let violations = self.catalog.hard_violations(schedule, &exam, ctx);
                    if violations.is_empty() {
                        ledger.record(&professor_id, date);
                        return Ok(exam);
                    }
                    for v in violations {
                        blocking.insert(v.kind);
                    }
                }
            }
        }

        // 候选耗尽: 归纳阻塞原因
        if !any_enabled_room {
            blocking.insert(ViolationKind::ResourceUnavailable);
        } else if !any_fitting_room {
            blocking.insert(ViolationKind::RoomOverCapacity);
        }

        let kinds: Vec<ViolationKind> = blocking.into_iter().collect();
        let detail = format!(
            "候选耗尽: 尝试 {} 个候选, 阻塞原因 [{}] (enrolled={})",
            candidates_tried,
            kinds
                .iter()
                .map(|k| k.to_db_str())
                .collect::<Vec<_>>()
                .join(", "),
            enrolled
        );

        Err(UnplacedModule {
            module_id: module.module_id.clone(),
            module_name: module.name.clone(),
            enrolled_count: enrolled,
            blocking_kinds: kinds,
            detail,
        })
    }

    /// 教师选择: 同院系 + 当日可用 + 日/周上限未满,
    /// 按 (当日负载, 总负载, 工号) 升序取首个
    fn pick_professor(
        &self,
        module: &Module,
        date: NaiveDate,
        ledger: &ProfessorLoadLedger,
        ctx: &ScheduleContext,
    ) -> Option<String> {
        let mut qualified: Vec<_> = ctx
            .professors()
            .filter(|p| p.qualifies_for(&module.department_id))
            .filter(|p| p.is_available_on(date))
            .filter(|p| ledger.load_on(&p.professor_id, date) < ctx.professor_daily_cap(p))
            .filter(|p| ledger.weekly_load(&p.professor_id, date) < ctx.professor_weekly_cap(p))
            .collect();

        qualified.sort_by(|a, b| {
            ledger
                .load_on(&a.professor_id, date)
                .cmp(&ledger.load_on(&b.professor_id, date))
                .then(
                    ledger
                        .total_load(&a.professor_id)
                        .cmp(&ledger.total_load(&b.professor_id)),
                )
                .then(a.professor_id.cmp(&b.professor_id))
        });

        qualified.first().map(|p| p.professor_id.clone())
    }

    /// 模块对应的考试ID (确定性,支持持久化回读比对)
    fn exam_id_for(module_id: &str) -> String {
        format!("EX_{}", module_id)
    }
}

// ==========================================
// Default trait 实现
// ==========================================
impl Default for ExamScheduler {
    fn default() -> Self {
        Self::new()
    }
}
