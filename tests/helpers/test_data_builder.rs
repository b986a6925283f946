// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use chrono::NaiveDate;
use exam_timetabling::domain::exam::Horizon;
use exam_timetabling::domain::module::Module;
use exam_timetabling::domain::resources::{Professor, Room};
use exam_timetabling::domain::types::RoomType;

// ==========================================
// Module 构建器
// ==========================================

pub struct ModuleBuilder {
    module_id: String,
    name: String,
    formation_id: String,
    department_id: String,
    enrolled_students: Vec<String>,
    duration_minutes: i32,
    preferred_room_type: Option<RoomType>,
}

impl ModuleBuilder {
    pub fn new(module_id: &str) -> Self {
        Self {
            module_id: module_id.to_string(),
            name: module_id.to_string(),
            formation_id: "F1".to_string(),
            department_id: "CS".to_string(),
            enrolled_students: Vec::new(),
            duration_minutes: 90,
            preferred_room_type: None,
        }
    }

    pub fn department(mut self, department_id: &str) -> Self {
        self.department_id = department_id.to_string();
        self
    }

    pub fn students(mut self, students: &[&str]) -> Self {
        self.enrolled_students = students.iter().map(|s| s.to_string()).collect();
        self
    }

    /// 批量生成指定数量的学生 (前缀_序号)
    pub fn generated_students(mut self, prefix: &str, count: usize) -> Self {
        self.enrolled_students = (0..count).map(|i| format!("{}_{:04}", prefix, i)).collect();
        self
    }

    pub fn duration(mut self, minutes: i32) -> Self {
        self.duration_minutes = minutes;
        self
    }

    pub fn prefers(mut self, room_type: RoomType) -> Self {
        self.preferred_room_type = Some(room_type);
        self
    }

    pub fn build(self) -> Module {
        Module {
            enrolled_count: self.enrolled_students.len() as i32,
            module_id: self.module_id,
            name: self.name,
            formation_id: self.formation_id,
            department_id: self.department_id,
            enrolled_students: self.enrolled_students,
            duration_minutes: self.duration_minutes,
            preferred_room_type: self.preferred_room_type,
        }
    }
}

// ==========================================
// Room 构建器
// ==========================================

pub struct RoomBuilder {
    room_id: String,
    capacity: i32,
    room_type: RoomType,
    campus: String,
    available: bool,
}

impl RoomBuilder {
    pub fn new(room_id: &str, capacity: i32) -> Self {
        Self {
            room_id: room_id.to_string(),
            capacity,
            room_type: RoomType::Classroom,
            campus: "MAIN".to_string(),
            available: true,
        }
    }

    pub fn room_type(mut self, room_type: RoomType) -> Self {
        self.room_type = room_type;
        self
    }

    pub fn campus(mut self, campus: &str) -> Self {
        self.campus = campus.to_string();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.available = false;
        self
    }

    pub fn build(self) -> Room {
        Room {
            name: self.room_id.clone(),
            room_id: self.room_id,
            capacity: self.capacity,
            room_type: self.room_type,
            campus: self.campus,
            available: self.available,
        }
    }
}

// ==========================================
// Professor 构建器
// ==========================================

pub struct ProfessorBuilder {
    professor_id: String,
    department_id: String,
    max_exams_per_day: i32,
    max_exams_per_week: i32,
    unavailable_dates: Vec<NaiveDate>,
}

impl ProfessorBuilder {
    pub fn new(professor_id: &str) -> Self {
        Self {
            professor_id: professor_id.to_string(),
            department_id: "CS".to_string(),
            max_exams_per_day: 3,
            max_exams_per_week: 15,
            unavailable_dates: Vec::new(),
        }
    }

    pub fn department(mut self, department_id: &str) -> Self {
        self.department_id = department_id.to_string();
        self
    }

    pub fn daily_cap(mut self, cap: i32) -> Self {
        self.max_exams_per_day = cap;
        self
    }

    pub fn unavailable_on(mut self, date: NaiveDate) -> Self {
        self.unavailable_dates.push(date);
        self
    }

    pub fn build(self) -> Professor {
        Professor {
            full_name: self.professor_id.clone(),
            professor_id: self.professor_id,
            department_id: self.department_id,
            max_exams_per_day: self.max_exams_per_day,
            max_exams_per_week: self.max_exams_per_week,
            unavailable_dates: self.unavailable_dates,
        }
    }
}

// ==========================================
// 公共窗口
// ==========================================

/// 2026 年一月考期内的一段窗口
pub fn january_window(from_day: u32, to_day: u32) -> Horizon {
    Horizon::new(
        NaiveDate::from_ymd_opt(2026, 1, from_day).unwrap(),
        NaiveDate::from_ymd_opt(2026, 1, to_day).unwrap(),
    )
    .unwrap()
}
