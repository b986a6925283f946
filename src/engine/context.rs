// ==========================================
// 高校考试排考系统 - 引擎上下文
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 2. 引擎输入口径
// 职责: 以索引形式承载参考数据 + 配置,供各引擎只读查询
// 红线: 参考数据只读; 配置显式传入,禁止进程级缓存
// ==========================================

use crate::config::ScheduleConfig;
use crate::domain::exam::TimeSlot;
use crate::domain::module::Module;
use crate::domain::resources::{Professor, Room};
use std::collections::HashMap;

// ==========================================
// ScheduleContext - 引擎只读上下文
// ==========================================
pub struct ScheduleContext {
    rooms: HashMap<String, Room>,
    professors: HashMap<String, Professor>,
    modules: HashMap<String, Module>,
    pub config: ScheduleConfig,
}

impl ScheduleContext {
    /// 由参考数据与配置构建上下文
    pub fn new(
        rooms: Vec<Room>,
        professors: Vec<Professor>,
        modules: Vec<Module>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            rooms: rooms.into_iter().map(|r| (r.room_id.clone(), r)).collect(),
            professors: professors
                .into_iter()
                .map(|p| (p.professor_id.clone(), p))
                .collect(),
            modules: modules
                .into_iter()
                .map(|m| (m.module_id.clone(), m))
                .collect(),
            config,
        }
    }

    /// 查教室
    pub fn room(&self, room_id: &str) -> Option<&Room> {
        self.rooms.get(room_id)
    }

    /// 查教师
    pub fn professor(&self, professor_id: &str) -> Option<&Professor> {
        self.professors.get(professor_id)
    }

    /// 查模块
    pub fn module(&self, module_id: &str) -> Option<&Module> {
        self.modules.get(module_id)
    }

    /// 全部教室 (迭代顺序不保证)
    pub fn rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.values()
    }

    /// 全部教师
    pub fn professors(&self) -> impl Iterator<Item = &Professor> {
        self.professors.values()
    }

    /// 全部模块
    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    /// 按序号查时段
    pub fn slot(&self, slot_no: i32) -> Option<&TimeSlot> {
        self.config.slot(slot_no)
    }

    /// 教师单日上限: 教师自报值优先,否则用全局默认
    pub fn professor_daily_cap(&self, professor: &Professor) -> i32 {
        if professor.max_exams_per_day > 0 {
            professor.max_exams_per_day
        } else {
            self.config.max_exams_per_day_professor
        }
    }

    /// 教师单周上限: 教师自报值优先,否则用全局默认
    pub fn professor_weekly_cap(&self, professor: &Professor) -> i32 {
        if professor.max_exams_per_week > 0 {
            professor.max_exams_per_week
        } else {
            self.config.max_exams_per_week_professor
        }
    }
}
