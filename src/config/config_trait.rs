// ==========================================
// 高校考试排考系统 - 配置读取接口
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 10. 配置项全集
// 职责: 屏蔽配置存储细节,引擎只依赖本接口
// ==========================================

use crate::config::schedule_config::{
    AnnealingParams, ConstraintWeights, ScheduleConfig, SearchBudget,
};
use crate::domain::exam::{Horizon, TimeSlot};
use crate::domain::types::{AcceptanceMode, StudentConflictRule};
use async_trait::async_trait;
use chrono::NaiveDate;
use std::error::Error;

// ==========================================
// ScheduleConfigReader Trait
// ==========================================
#[async_trait(?Send)]
pub trait ScheduleConfigReader: Send + Sync {
    // ===== 时段与时长 =====

    async fn get_slot_list(&self) -> Result<Vec<TimeSlot>, Box<dyn Error>>;

    async fn get_exam_duration_minutes(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 学生约束 =====

    async fn get_max_exams_per_day_student(&self) -> Result<i32, Box<dyn Error>>;

    async fn get_student_conflict_rule(&self) -> Result<StudentConflictRule, Box<dyn Error>>;

    // ===== 教师约束 =====

    async fn get_max_exams_per_day_professor(&self) -> Result<i32, Box<dyn Error>>;

    async fn get_max_exams_per_week_professor(&self) -> Result<i32, Box<dyn Error>>;

    // ===== 教室约束 =====

    async fn get_room_capacity_margin(&self) -> Result<f64, Box<dyn Error>>;

    // ===== 软约束权重 =====

    async fn get_constraint_weights(&self) -> Result<ConstraintWeights, Box<dyn Error>>;

    // ===== 优化器 =====

    async fn get_search_budget(&self) -> Result<SearchBudget, Box<dyn Error>>;

    async fn get_acceptance_mode(&self) -> Result<AcceptanceMode, Box<dyn Error>>;

    async fn get_hill_climb_tolerance(&self) -> Result<f64, Box<dyn Error>>;

    async fn get_annealing_params(&self) -> Result<AnnealingParams, Box<dyn Error>>;

    async fn get_rng_seed(&self) -> Result<Option<u64>, Box<dyn Error>>;

    // ===== 排考窗口 =====

    /// 下一个排考窗口 (历史系统固定为一月/六月两个考期)
    async fn get_next_exam_session(&self, today: NaiveDate) -> Result<Horizon, Box<dyn Error>>;

    // ===== 组装 =====

    /// 组装完整配置 (未经 validate, 由调用方在搜索前校验)
    async fn load_schedule_config(&self) -> Result<ScheduleConfig, Box<dyn Error>> {
        Ok(ScheduleConfig {
            slot_list: self.get_slot_list().await?,
            exam_duration_minutes: self.get_exam_duration_minutes().await?,
            max_exams_per_day_student: self.get_max_exams_per_day_student().await?,
            student_conflict_rule: self.get_student_conflict_rule().await?,
            max_exams_per_day_professor: self.get_max_exams_per_day_professor().await?,
            max_exams_per_week_professor: self.get_max_exams_per_week_professor().await?,
            room_capacity_margin: self.get_room_capacity_margin().await?,
            weights: self.get_constraint_weights().await?,
            budget: self.get_search_budget().await?,
            acceptance_mode: self.get_acceptance_mode().await?,
            hill_climb_tolerance: self.get_hill_climb_tolerance().await?,
            annealing: self.get_annealing_params().await?,
            rng_seed: self.get_rng_seed().await?,
        })
    }
}
