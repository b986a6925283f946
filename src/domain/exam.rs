// ==========================================
// 高校考试排考系统 - 考试领域模型
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 1. 考试生命周期
// 红线: 考试由排考引擎创建与移动,冲突时只标记不删除
// ==========================================

use crate::domain::types::ExamStatus;
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

// ==========================================
// TimeSlot - 考试时段
// ==========================================
// 时段清单由外部配置提供,考试区间 = [start_time, start_time + duration)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub slot_no: i32,          // 时段序号 (当日内唯一)
    pub start_time: NaiveTime, // 开始时间
}

impl TimeSlot {
    /// 自午夜起算的开始分钟数 (供区间重叠计算)
    pub fn start_minute(&self) -> i32 {
        (self.start_time.hour() * 60 + self.start_time.minute()) as i32
    }
}

// ==========================================
// Horizon - 排考窗口
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub start_date: NaiveDate, // 窗口首日 (含)
    pub end_date: NaiveDate,   // 窗口末日 (含)
}

impl Horizon {
    /// 构造排考窗口
    ///
    /// # 返回
    /// - Some(Horizon): start_date <= end_date
    /// - None: 窗口非法
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        if start_date <= end_date {
            Some(Self {
                start_date,
                end_date,
            })
        } else {
            None
        }
    }

    /// 窗口内全部日期 (升序)
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        let mut d = self.start_date;
        while d <= self.end_date {
            dates.push(d);
            match d.succ_opt() {
                Some(next) => d = next,
                None => break,
            }
        }
        dates
    }

    /// 日期是否落在窗口内
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// 窗口天数
    pub fn day_count(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }
}

// ==========================================
// Placement - 落位信息
// ==========================================
// 不变量: status != UNSCHEDULED 当且仅当 placement 存在
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub date: NaiveDate,       // 考试日期
    pub slot_no: i32,          // 时段序号
    pub room_id: String,       // 教室
    pub professor_id: String,  // 监考教师
}

// ==========================================
// Exam - 考试
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exam {
    pub exam_id: String,              // 考试ID
    pub module_id: String,            // 关联模块 (窗口内一对一)
    pub duration_minutes: i32,        // 考试时长 (分钟)
    pub placement: Option<Placement>, // 落位信息 (未排时为 None)
    pub status: ExamStatus,           // 状态
}

impl Exam {
    /// 创建未排状态的考试
    pub fn new_unscheduled(exam_id: &str, module_id: &str, duration_minutes: i32) -> Self {
        Self {
            exam_id: exam_id.to_string(),
            module_id: module_id.to_string(),
            duration_minutes,
            placement: None,
            status: ExamStatus::Unscheduled,
        }
    }

    /// 落位 (Unscheduled/Conflicted → Scheduled)
    pub fn place(&mut self, placement: Placement) {
        self.placement = Some(placement);
        self.status = ExamStatus::Scheduled;
    }

    /// 标记冲突 (保留落位信息,等待人工或优化器处理)
    pub fn mark_conflicted(&mut self) {
        if self.placement.is_some() {
            self.status = ExamStatus::Conflicted;
        }
    }

    /// 是否已落位 (Scheduled 或 Conflicted 均占用资源)
    pub fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    /// 考试日期 (未排时为 None)
    pub fn date(&self) -> Option<NaiveDate> {
        self.placement.as_ref().map(|p| p.date)
    }
}
