// ==========================================
// 高校考试排考系统 - 排考配置
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 10. 配置项全集
// 红线: 配置显式传入每次调用,禁止进程级可变缓存
// ==========================================

use crate::domain::exam::TimeSlot;
use crate::domain::types::{AcceptanceMode, StudentConflictRule};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ==========================================
// 配置校验错误
// ==========================================
// 红线: 非法配置在任何搜索开始前拒绝
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("时段清单为空")]
    EmptySlotList,

    #[error("时段序号重复: slot_no={0}")]
    DuplicateSlotNo(i32),

    #[error("配置值非法 (field={field}): {message}")]
    InvalidValue { field: String, message: String },
}

impl ConfigError {
    fn invalid(field: &str, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

// ==========================================
// ConstraintWeights - 软约束权重
// ==========================================
// 默认次序: 学生冲突 > 教室容量 > 教师负载 > 考期集中度 > 教室偏好
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintWeights {
    pub student_conflict: f64, // 学生冲突权重 (最高)
    pub room_capacity: f64,    // 教室容量浪费权重
    pub professor_load: f64,   // 教师负载超标权重
    pub day_spread: f64,       // 考期分散度权重
    pub room_preference: f64,  // 教室类型偏好权重 (最低)
}

impl Default for ConstraintWeights {
    fn default() -> Self {
        Self {
            student_conflict: 10.0,
            room_capacity: 5.0,
            professor_load: 3.0,
            day_spread: 2.0,
            room_preference: 1.0,
        }
    }
}

impl ConstraintWeights {
    /// 权重项遍历 (校验用)
    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("student_conflict", self.student_conflict),
            ("room_capacity", self.room_capacity),
            ("professor_load", self.professor_load),
            ("day_spread", self.day_spread),
            ("room_preference", self.room_preference),
        ]
    }
}

// ==========================================
// SearchBudget - 搜索预算
// ==========================================
// 移动次数与墙钟截止二者取先到者; 预算在移动之间检查
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchBudget {
    pub max_moves: u32,           // 最大候选移动数
    pub deadline_ms: Option<u64>, // 墙钟截止 (毫秒, 可选)
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_moves: 2_000,
            deadline_ms: None,
        }
    }
}

// ==========================================
// AnnealingParams - 退火参数
// ==========================================
// 温度按步几何衰减: T(k+1) = T(k) * decay
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingParams {
    pub start_temperature: f64, // 初始温度
    pub decay: f64,             // 每步衰减系数 (0, 1]
}

impl Default for AnnealingParams {
    fn default() -> Self {
        Self {
            start_temperature: 1.0,
            decay: 0.99,
        }
    }
}

// ==========================================
// ScheduleConfig - 排考配置全集
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    // ===== 时段与时长 =====
    pub slot_list: Vec<TimeSlot>,   // 当日时段清单
    pub exam_duration_minutes: i32, // 默认考试时长 (模块未指定时使用)

    // ===== 学生约束 =====
    pub max_exams_per_day_student: i32,           // 学生单日考试上限
    pub student_conflict_rule: StudentConflictRule, // 冲突口径 (默认同日)

    // ===== 教师约束 =====
    pub max_exams_per_day_professor: i32,  // 教师单日监考上限 (全局默认)
    pub max_exams_per_week_professor: i32, // 教师单周监考上限 (全局默认)

    // ===== 教室约束 =====
    pub room_capacity_margin: f64, // 容量安全余量比例 (0.1 = 10%)

    // ===== 软约束权重 =====
    pub weights: ConstraintWeights,

    // ===== 优化器 =====
    pub budget: SearchBudget,          // 搜索预算
    pub acceptance_mode: AcceptanceMode, // 接受准则
    pub hill_climb_tolerance: f64,     // 爬山容差 (成本增幅 <= 容差仍接受)
    pub annealing: AnnealingParams,    // 退火参数
    pub rng_seed: Option<u64>,         // 随机种子 (可复现运行)
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            // 历史系统的上午/下午两个标准时段
            slot_list: vec![
                TimeSlot {
                    slot_no: 1,
                    start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or(NaiveTime::MIN),
                },
                TimeSlot {
                    slot_no: 2,
                    start_time: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or(NaiveTime::MIN),
                },
            ],
            exam_duration_minutes: 90,
            max_exams_per_day_student: 1,
            student_conflict_rule: StudentConflictRule::SameDay,
            max_exams_per_day_professor: 3,
            max_exams_per_week_professor: 10,
            room_capacity_margin: 0.1,
            weights: ConstraintWeights::default(),
            budget: SearchBudget::default(),
            acceptance_mode: AcceptanceMode::HillClimb,
            hill_climb_tolerance: 0.0,
            annealing: AnnealingParams::default(),
            rng_seed: None,
        }
    }
}

impl ScheduleConfig {
    /// 配置校验
    ///
    /// 任何搜索开始之前调用; 校验失败拒绝整个运行。
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slot_list.is_empty() {
            return Err(ConfigError::EmptySlotList);
        }

        let mut seen = std::collections::HashSet::new();
        for slot in &self.slot_list {
            if !seen.insert(slot.slot_no) {
                return Err(ConfigError::DuplicateSlotNo(slot.slot_no));
            }
        }

        if self.exam_duration_minutes <= 0 {
            return Err(ConfigError::invalid(
                "exam_duration_minutes",
                format!("必须为正数, 实际 {}", self.exam_duration_minutes),
            ));
        }
        if self.max_exams_per_day_student < 1 {
            return Err(ConfigError::invalid(
                "max_exams_per_day_student",
                "至少为 1",
            ));
        }
        if self.max_exams_per_day_professor < 1 {
            return Err(ConfigError::invalid(
                "max_exams_per_day_professor",
                "至少为 1",
            ));
        }
        if self.max_exams_per_week_professor < 1 {
            return Err(ConfigError::invalid(
                "max_exams_per_week_professor",
                "至少为 1",
            ));
        }
        if !self.room_capacity_margin.is_finite()
            || self.room_capacity_margin < 0.0
            || self.room_capacity_margin > 1.0
        {
            return Err(ConfigError::invalid(
                "room_capacity_margin",
                format!("必须落在 [0, 1], 实际 {}", self.room_capacity_margin),
            ));
        }

        for (field, value) in self.weights.entries() {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(
                    &format!("weights.{}", field),
                    format!("必须为非负有限值, 实际 {}", value),
                ));
            }
        }

        if self.budget.max_moves == 0 {
            return Err(ConfigError::invalid("budget.max_moves", "至少为 1"));
        }
        if let Some(deadline_ms) = self.budget.deadline_ms {
            if deadline_ms == 0 {
                return Err(ConfigError::invalid("budget.deadline_ms", "必须为正数"));
            }
        }
        if !self.hill_climb_tolerance.is_finite() || self.hill_climb_tolerance < 0.0 {
            return Err(ConfigError::invalid(
                "hill_climb_tolerance",
                "必须为非负有限值",
            ));
        }
        if !self.annealing.start_temperature.is_finite()
            || self.annealing.start_temperature <= 0.0
        {
            return Err(ConfigError::invalid(
                "annealing.start_temperature",
                "必须为正数",
            ));
        }
        if !self.annealing.decay.is_finite()
            || self.annealing.decay <= 0.0
            || self.annealing.decay > 1.0
        {
            return Err(ConfigError::invalid(
                "annealing.decay",
                format!("必须落在 (0, 1], 实际 {}", self.annealing.decay),
            ));
        }

        Ok(())
    }

    /// 按序号查找时段
    pub fn slot(&self, slot_no: i32) -> Option<&TimeSlot> {
        self.slot_list.iter().find(|s| s.slot_no == slot_no)
    }

    /// 模块时长口径: 模块指定值优先,否则用配置默认
    pub fn duration_for(&self, module_duration_minutes: i32) -> i32 {
        if module_duration_minutes > 0 {
            module_duration_minutes
        } else {
            self.exam_duration_minutes
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(ScheduleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_empty_slot_list_rejected() {
        let mut config = ScheduleConfig::default();
        config.slot_list.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptySlotList)
        ));
    }

    #[test]
    fn test_duplicate_slot_no_rejected() {
        let mut config = ScheduleConfig::default();
        config.slot_list.push(TimeSlot {
            slot_no: 1,
            start_time: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateSlotNo(1))
        ));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut config = ScheduleConfig::default();
        config.weights.professor_load = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_annealing_decay_rejected() {
        let mut config = ScheduleConfig::default();
        config.annealing.decay = 1.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duration_fallback() {
        let config = ScheduleConfig::default();
        assert_eq!(config.duration_for(120), 120);
        assert_eq!(config.duration_for(0), 90);
    }
}
