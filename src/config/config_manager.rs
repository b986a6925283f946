// ==========================================
// 高校考试排考系统 - 配置管理器
// ==========================================
// 依据: Engine_Specs_v0.2_Exam.md - 10. 配置项全集
// ==========================================
// 职责: 配置加载、查询
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::config_trait::ScheduleConfigReader;
use crate::config::schedule_config::{AnnealingParams, ConstraintWeights, SearchBudget};
use crate::db::open_sqlite_connection;
use crate::domain::exam::{Horizon, TimeSlot};
use crate::domain::types::{AcceptanceMode, StudentConflictRule};
use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明: 为保证连接行为一致,会对传入连接再次应用统一 PRAGMA (幂等)。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值 (scope_id='global')
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 从 config_kv 表读取配置值,带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入 global scope 配置值 (UPSERT)
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    /// 解析 "HH:MM,HH:MM,..." 形式的时段清单 (序号按出现顺序 1 起)
    fn parse_slot_list(raw: &str) -> Vec<TimeSlot> {
        raw.split(',')
            .filter_map(|s| NaiveTime::parse_from_str(s.trim(), "%H:%M").ok())
            .enumerate()
            .map(|(idx, start_time)| TimeSlot {
                slot_no: idx as i32 + 1,
                start_time,
            })
            .collect()
    }

    /// 解析 "MM-DD:MM-DD,MM-DD:MM-DD" 形式的考期窗口清单
    fn parse_session_windows(raw: &str) -> Vec<(u32, u32, u32, u32)> {
        raw.split(',')
            .filter_map(|pair| {
                let (start, end) = pair.trim().split_once(':')?;
                let parse_md = |s: &str| -> Option<(u32, u32)> {
                    let (m, d) = s.trim().split_once('-')?;
                    Some((m.parse().ok()?, d.parse().ok()?))
                };
                let (sm, sd) = parse_md(start)?;
                let (em, ed) = parse_md(end)?;
                Some((sm, sd, em, ed))
            })
            .collect()
    }
}

// ==========================================
// ScheduleConfigReader Trait 实现
// ==========================================
#[async_trait(?Send)]
impl ScheduleConfigReader for ConfigManager {
    // ===== 时段与时长 =====

    async fn get_slot_list(&self) -> Result<Vec<TimeSlot>, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::SLOT_LIST, "09:00,14:00")?;
        let slots = Self::parse_slot_list(&value);

        if slots.is_empty() {
            // 配置损坏时退回历史系统的上午/下午两段
            Ok(Self::parse_slot_list("09:00,14:00"))
        } else {
            Ok(slots)
        }
    }

    async fn get_exam_duration_minutes(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::EXAM_DURATION_MINUTES, "90")?;
        Ok(value.parse::<i32>().unwrap_or(90))
    }

    // ===== 学生约束 =====

    async fn get_max_exams_per_day_student(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MAX_EXAMS_PER_DAY_STUDENT, "1")?;
        Ok(value.parse::<i32>().unwrap_or(1))
    }

    async fn get_student_conflict_rule(&self) -> Result<StudentConflictRule, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::STUDENT_CONFLICT_RULE, "SAME_DAY")?;
        Ok(StudentConflictRule::from_str(&value))
    }

    // ===== 教师约束 =====

    async fn get_max_exams_per_day_professor(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MAX_EXAMS_PER_DAY_PROFESSOR, "3")?;
        Ok(value.parse::<i32>().unwrap_or(3))
    }

    async fn get_max_exams_per_week_professor(&self) -> Result<i32, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::MAX_EXAMS_PER_WEEK_PROFESSOR, "10")?;
        Ok(value.parse::<i32>().unwrap_or(10))
    }

    // ===== 教室约束 =====

    async fn get_room_capacity_margin(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ROOM_CAPACITY_MARGIN, "0.1")?;
        Ok(value.parse::<f64>().unwrap_or(0.1))
    }

    // ===== 软约束权重 =====

    async fn get_constraint_weights(&self) -> Result<ConstraintWeights, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::CONSTRAINT_WEIGHTS, "{}")?;
        let weights: ConstraintWeights = serde_json::from_str(&value).unwrap_or_else(|_| {
            tracing::warn!(
                config_key = config_keys::CONSTRAINT_WEIGHTS,
                raw_value = %value,
                "权重配置格式错误,使用默认权重"
            );
            ConstraintWeights::default()
        });
        Ok(weights)
    }

    // ===== 优化器 =====

    async fn get_search_budget(&self) -> Result<SearchBudget, Box<dyn Error>> {
        let max_moves = self
            .get_config_or_default(config_keys::SEARCH_MAX_MOVES, "2000")?
            .parse::<u32>()
            .unwrap_or(2_000);
        let deadline_ms = self
            .get_config_value(config_keys::SEARCH_DEADLINE_MS)?
            .and_then(|v| v.parse::<u64>().ok());

        Ok(SearchBudget {
            max_moves,
            deadline_ms,
        })
    }

    async fn get_acceptance_mode(&self) -> Result<AcceptanceMode, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::ACCEPTANCE_MODE, "HILL_CLIMB")?;
        Ok(AcceptanceMode::from_str(&value))
    }

    async fn get_hill_climb_tolerance(&self) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(config_keys::HILL_CLIMB_TOLERANCE, "0.0")?;
        Ok(value.parse::<f64>().unwrap_or(0.0))
    }

    async fn get_annealing_params(&self) -> Result<AnnealingParams, Box<dyn Error>> {
        let start_temperature = self
            .get_config_or_default(config_keys::ANNEALING_START_TEMPERATURE, "1.0")?
            .parse::<f64>()
            .unwrap_or(1.0);
        let decay = self
            .get_config_or_default(config_keys::ANNEALING_DECAY, "0.99")?
            .parse::<f64>()
            .unwrap_or(0.99);

        Ok(AnnealingParams {
            start_temperature,
            decay,
        })
    }

    async fn get_rng_seed(&self) -> Result<Option<u64>, Box<dyn Error>> {
        Ok(self
            .get_config_value(config_keys::RNG_SEED)?
            .and_then(|v| v.parse::<u64>().ok()))
    }

    // ===== 排考窗口 =====

    async fn get_next_exam_session(&self, today: NaiveDate) -> Result<Horizon, Box<dyn Error>> {
        let value = self.get_config_or_default(
            config_keys::EXAM_SESSION_WINDOWS,
            "01-10:01-31,06-10:06-30",
        )?;
        let mut windows = Self::parse_session_windows(&value);
        if windows.is_empty() {
            windows = Self::parse_session_windows("01-10:01-31,06-10:06-30");
        }

        let year = today.year();
        // 当年内尚未结束的第一个考期
        for (sm, sd, em, ed) in &windows {
            let start = NaiveDate::from_ymd_opt(year, *sm, *sd);
            let end = NaiveDate::from_ymd_opt(year, *em, *ed);
            if let (Some(start), Some(end)) = (start, end) {
                if today <= end {
                    if let Some(horizon) = Horizon::new(start, end) {
                        return Ok(horizon);
                    }
                }
            }
        }

        // 当年考期全部结束,取次年第一个
        let (sm, sd, em, ed) = windows[0];
        let start = NaiveDate::from_ymd_opt(year + 1, sm, sd)
            .ok_or_else(|| format!("考期窗口起始日非法: {}-{}", sm, sd))?;
        let end = NaiveDate::from_ymd_opt(year + 1, em, ed)
            .ok_or_else(|| format!("考期窗口结束日非法: {}-{}", em, ed))?;
        Horizon::new(start, end).ok_or_else(|| "考期窗口起止颠倒".to_string().into())
    }
}

// ==========================================
// 配置键常量 (依据 Engine_Specs 10)
// ==========================================
pub mod config_keys {
    // 时段与时长
    pub const SLOT_LIST: &str = "slot_list";
    pub const EXAM_DURATION_MINUTES: &str = "exam_duration_minutes";

    // 学生约束
    pub const MAX_EXAMS_PER_DAY_STUDENT: &str = "max_exams_per_day_student";
    pub const STUDENT_CONFLICT_RULE: &str = "student_conflict_rule";

    // 教师约束
    pub const MAX_EXAMS_PER_DAY_PROFESSOR: &str = "max_exams_per_day_professor";
    pub const MAX_EXAMS_PER_WEEK_PROFESSOR: &str = "max_exams_per_week_professor";

    // 教室约束
    pub const ROOM_CAPACITY_MARGIN: &str = "room_capacity_margin";

    // 软约束权重 (JSON)
    pub const CONSTRAINT_WEIGHTS: &str = "constraint_weights";

    // 优化器
    pub const SEARCH_MAX_MOVES: &str = "search_max_moves";
    pub const SEARCH_DEADLINE_MS: &str = "search_deadline_ms";
    pub const ACCEPTANCE_MODE: &str = "acceptance_mode";
    pub const HILL_CLIMB_TOLERANCE: &str = "hill_climb_tolerance";
    pub const ANNEALING_START_TEMPERATURE: &str = "annealing_start_temperature";
    pub const ANNEALING_DECAY: &str = "annealing_decay";
    pub const RNG_SEED: &str = "rng_seed";

    // 排考窗口 ("MM-DD:MM-DD,..." 清单)
    pub const EXAM_SESSION_WINDOWS: &str = "exam_session_windows";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_slot_list() {
        let slots = ConfigManager::parse_slot_list("09:00, 14:00,bad,16:30");
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0].slot_no, 1);
        assert_eq!(
            slots[2].start_time,
            NaiveTime::from_hms_opt(16, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_parse_session_windows() {
        let windows = ConfigManager::parse_session_windows("01-10:01-31,06-10:06-30");
        assert_eq!(windows, vec![(1, 10, 1, 31), (6, 10, 6, 30)]);
        assert!(ConfigManager::parse_session_windows("garbage").is_empty());
    }
}
