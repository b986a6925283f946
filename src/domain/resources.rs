// ==========================================
// 高校考试排考系统 - 资源领域模型
// ==========================================
// 依据: Timetabling_Master_Spec.md - PART B1 参考数据
// 红线: 学生/教师/教室为只读参考数据,引擎不得修改
// ==========================================

use crate::domain::types::RoomType;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==========================================
// Student - 学生
// ==========================================
// 用途: 选课关系 (Enrollment) 的一端,冲突检测的主体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub student_id: String,   // 学号
    pub full_name: String,    // 姓名
    pub formation_id: String, // 所属培养方案 (专业/年级)
}

// ==========================================
// Professor - 监考教师
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Professor {
    pub professor_id: String,              // 工号
    pub full_name: String,                 // 姓名
    pub department_id: String,             // 所属院系
    pub max_exams_per_day: i32,            // 单日监考上限
    pub max_exams_per_week: i32,           // 单周监考上限
    pub unavailable_dates: Vec<NaiveDate>, // 声明的不可用日期
}

impl Professor {
    /// 指定日期是否可用
    pub fn is_available_on(&self, date: NaiveDate) -> bool {
        !self.unavailable_dates.contains(&date)
    }

    /// 是否具备监考指定院系模块的资格
    ///
    /// 口径: 同院系教师均可监考该院系模块。
    pub fn qualifies_for(&self, department_id: &str) -> bool {
        self.department_id == department_id
    }
}

// ==========================================
// Room - 教室
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: String,     // 教室编号
    pub name: String,        // 教室名称
    pub capacity: i32,       // 容量 (座位数)
    pub room_type: RoomType, // 教室类型
    pub campus: String,      // 所在校区
    pub available: bool,     // 是否启用
}

impl Room {
    /// 在给定安全余量下是否容纳得下指定人数
    ///
    /// 规则: capacity >= ceil(enrolled * (1 + margin))
    ///
    /// # 参数
    /// - `enrolled`: 应考人数
    /// - `margin`: 安全余量比例 (例如 0.1 表示 10%)
    pub fn fits(&self, enrolled: i32, margin: f64) -> bool {
        self.capacity >= required_seats(enrolled, margin)
    }
}

/// 含安全余量的所需座位数
///
/// margin 为非法值 (负数/NaN) 时按 0 处理。
pub fn required_seats(enrolled: i32, margin: f64) -> i32 {
    let margin = if margin.is_finite() && margin > 0.0 {
        margin
    } else {
        0.0
    };
    (enrolled as f64 * (1.0 + margin)).ceil() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room(capacity: i32) -> Room {
        Room {
            room_id: "R101".to_string(),
            name: "一教101".to_string(),
            capacity,
            room_type: RoomType::Classroom,
            campus: "MAIN".to_string(),
            available: true,
        }
    }

    #[test]
    fn test_required_seats_with_margin() {
        assert_eq!(required_seats(60, 0.1), 66); // 60 * 1.1
        assert_eq!(required_seats(55, 0.1), 61); // 60.5 向上取整
        assert_eq!(required_seats(60, 0.0), 60);
        assert_eq!(required_seats(60, -1.0), 60); // 非法余量按 0 处理
    }

    #[test]
    fn test_room_fits() {
        assert!(room(66).fits(60, 0.1));
        assert!(!room(65).fits(60, 0.1));
        assert!(room(60).fits(60, 0.0));
    }

    #[test]
    fn test_professor_availability() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
        let prof = Professor {
            professor_id: "P001".to_string(),
            full_name: "张老师".to_string(),
            department_id: "CS".to_string(),
            max_exams_per_day: 3,
            max_exams_per_week: 10,
            unavailable_dates: vec![date],
        };

        assert!(!prof.is_available_on(date));
        assert!(prof.is_available_on(date.succ_opt().unwrap()));
        assert!(prof.qualifies_for("CS"));
        assert!(!prof.qualifies_for("MATH"));
    }
}
