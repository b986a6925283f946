// ==========================================
// 高校考试排考系统 - 排考数据仓储 (SQLite 参考实现)
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

use crate::domain::exam::{Exam, Horizon, Placement};
use crate::domain::module::Module;
use crate::domain::resources::{Professor, Room};
use crate::domain::schedule::Schedule;
use crate::domain::types::{ExamStatus, RoomType};
use crate::repository::data_access::ScheduleDataAccess;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

const DATE_FMT: &str = "%Y-%m-%d";

// ==========================================
// SqliteScheduleRepository - SQLite 仓储
// ==========================================
pub struct SqliteScheduleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteScheduleRepository {
    /// 创建新的仓储实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 日期解析 (存储格式 %Y-%m-%d)
    fn parse_date(raw: &str) -> RepositoryResult<NaiveDate> {
        NaiveDate::parse_from_str(raw, DATE_FMT).map_err(|e| RepositoryError::FieldValueError {
            field: "date".to_string(),
            message: format!("{}: {}", raw, e),
        })
    }

    /// 模块的选课学生 (升序)
    fn enrolled_students(
        conn: &Connection,
        module_id: &str,
    ) -> RepositoryResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT student_id FROM enrollments WHERE module_id = ?1 ORDER BY student_id",
        )?;
        let rows = stmt.query_map(params![module_id], |row| row.get::<_, String>(0))?;
        let mut students = Vec::new();
        for row in rows {
            students.push(row?);
        }
        Ok(students)
    }

    /// 教师的不可用日期 (升序)
    fn unavailable_dates(
        conn: &Connection,
        professor_id: &str,
    ) -> RepositoryResult<Vec<NaiveDate>> {
        let mut stmt = conn.prepare(
            "SELECT date FROM professor_unavailability WHERE professor_id = ?1 ORDER BY date",
        )?;
        let rows = stmt.query_map(params![professor_id], |row| row.get::<_, String>(0))?;
        let mut dates = Vec::new();
        for row in rows {
            dates.push(Self::parse_date(&row?)?);
        }
        Ok(dates)
    }

    /// 读取指定版本的全部考试明细
    fn load_exams(conn: &Connection, version_id: &str) -> RepositoryResult<Vec<Exam>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT exam_id, module_id, exam_date, slot_no, room_id, professor_id,
                   duration_minutes, status
            FROM exams
            WHERE version_id = ?1
            ORDER BY exam_id
            "#,
        )?;

        let rows = stmt.query_map(params![version_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<i32>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
                row.get::<_, i32>(6)?,
                row.get::<_, String>(7)?,
            ))
        })?;

        let mut exams = Vec::new();
        for row in rows {
            let (exam_id, module_id, date, slot_no, room_id, professor_id, duration, status) =
                row?;
            let mut exam = Exam::new_unscheduled(&exam_id, &module_id, duration);
            if let (Some(date), Some(slot_no), Some(room_id), Some(professor_id)) =
                (date, slot_no, room_id, professor_id)
            {
                exam.place(Placement {
                    date: Self::parse_date(&date)?,
                    slot_no,
                    room_id,
                    professor_id,
                });
                // 落位信息就绪后再覆盖为持久化时的状态 (CONFLICTED 不得丢失)
                exam.status = ExamStatus::from_str(&status);
            }
            exams.push(exam);
        }
        Ok(exams)
    }

    /// 指定版本中某教师某日的监考场次 (负载查询辅助)
    pub fn professor_load_on(
        &self,
        version_id: &str,
        professor_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<i32> {
        let conn = self.get_conn()?;
        let count: i32 = conn.query_row(
            r#"
            SELECT COUNT(*) FROM exams
            WHERE version_id = ?1 AND professor_id = ?2 AND exam_date = ?3
              AND status != 'UNSCHEDULED'
            "#,
            params![version_id, professor_id, date.format(DATE_FMT).to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ==========================================
// ScheduleDataAccess Trait 实现
// ==========================================
#[async_trait]
impl ScheduleDataAccess for SqliteScheduleRepository {
    async fn fetch_unscheduled_modules(&self, horizon: Horizon) -> RepositoryResult<Vec<Module>> {
        let conn = self.get_conn()?;
        let start = horizon.start_date.format(DATE_FMT).to_string();
        let end = horizon.end_date.format(DATE_FMT).to_string();

        let mut stmt = conn.prepare(
            r#"
            SELECT m.module_id, m.name, m.formation_id, m.department_id,
                   m.duration_minutes, m.preferred_room_type
            FROM modules m
            WHERE m.module_id NOT IN (
                SELECT e.module_id FROM exams e
                WHERE e.status = 'SCHEDULED'
                  AND e.exam_date BETWEEN ?1 AND ?2
            )
            ORDER BY m.module_id
            "#,
        )?;

        let rows = stmt.query_map(params![start, end], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i32>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut modules = Vec::new();
        for row in rows {
            let (module_id, name, formation_id, department_id, duration_minutes, preferred) =
                row?;
            let enrolled_students = Self::enrolled_students(&conn, &module_id)?;
            modules.push(Module {
                enrolled_count: enrolled_students.len() as i32,
                enrolled_students,
                module_id,
                name,
                formation_id,
                department_id,
                duration_minutes,
                preferred_room_type: preferred.as_deref().map(RoomType::from_str),
            });
        }
        Ok(modules)
    }

    async fn fetch_modules(&self, department_id: Option<&str>) -> RepositoryResult<Vec<Module>> {
        let conn = self.get_conn()?;

        let base_sql = r#"
            SELECT module_id, name, formation_id, department_id,
                   duration_minutes, preferred_room_type
            FROM modules
        "#;

        let mut raw: Vec<(String, String, String, String, i32, Option<String>)> = Vec::new();
        match department_id {
            Some(dept) => {
                let mut stmt = conn
                    .prepare(&format!("{} WHERE department_id = ?1 ORDER BY module_id", base_sql))?;
                let rows = stmt.query_map(params![dept], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?;
                for row in rows {
                    raw.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!("{} ORDER BY module_id", base_sql))?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                    ))
                })?;
                for row in rows {
                    raw.push(row?);
                }
            }
        }

        let mut modules = Vec::new();
        for (module_id, name, formation_id, department_id, duration_minutes, preferred) in raw {
            let enrolled_students = Self::enrolled_students(&conn, &module_id)?;
            modules.push(Module {
                enrolled_count: enrolled_students.len() as i32,
                enrolled_students,
                module_id,
                name,
                formation_id,
                department_id,
                duration_minutes,
                preferred_room_type: preferred.as_deref().map(RoomType::from_str),
            });
        }
        Ok(modules)
    }

    async fn fetch_rooms(&self) -> RepositoryResult<Vec<Room>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT room_id, name, capacity, room_type, campus, available
            FROM rooms
            ORDER BY room_id
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(Room {
                room_id: row.get(0)?,
                name: row.get(1)?,
                capacity: row.get(2)?,
                room_type: RoomType::from_str(&row.get::<_, String>(3)?),
                campus: row.get(4)?,
                available: row.get::<_, i32>(5)? != 0,
            })
        })?;

        let mut rooms = Vec::new();
        for row in rows {
            rooms.push(row?);
        }
        Ok(rooms)
    }

    async fn fetch_professors(
        &self,
        department_id: Option<&str>,
    ) -> RepositoryResult<Vec<Professor>> {
        let conn = self.get_conn()?;

        let fetch = |sql: &str, args: &[&dyn rusqlite::ToSql]| -> RepositoryResult<Vec<(String, String, String, i32, i32)>> {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt.query_map(args, |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, i32>(4)?,
                ))
            })?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row?);
            }
            Ok(out)
        };

        let raw = match department_id {
            Some(dept) => fetch(
                r#"
                SELECT professor_id, full_name, department_id, max_exams_per_day, max_exams_per_week
                FROM professors WHERE department_id = ?1 ORDER BY professor_id
                "#,
                &[&dept as &dyn rusqlite::ToSql],
            )?,
            None => fetch(
                r#"
                SELECT professor_id, full_name, department_id, max_exams_per_day, max_exams_per_week
                FROM professors ORDER BY professor_id
                "#,
                &[],
            )?,
        };

        let mut professors = Vec::new();
        for (professor_id, full_name, department_id, max_day, max_week) in raw {
            let unavailable_dates = Self::unavailable_dates(&conn, &professor_id)?;
            professors.push(Professor {
                professor_id,
                full_name,
                department_id,
                max_exams_per_day: max_day,
                max_exams_per_week: max_week,
                unavailable_dates,
            });
        }
        Ok(professors)
    }

    async fn fetch_existing_schedule(&self, horizon: Horizon) -> RepositoryResult<Schedule> {
        let conn = self.get_conn()?;
        let start = horizon.start_date.format(DATE_FMT).to_string();
        let end = horizon.end_date.format(DATE_FMT).to_string();

        let version_id: Option<String> = conn
            .query_row(
                r#"
                SELECT version_id FROM schedules
                WHERE horizon_start = ?1 AND horizon_end = ?2
                ORDER BY created_at DESC, version_id DESC
                LIMIT 1
                "#,
                params![start, end],
                |row| row.get(0),
            )
            .optional()?;

        let version_id = version_id.ok_or_else(|| RepositoryError::NotFound {
            entity: "Schedule".to_string(),
            id: format!("{}..{}", start, end),
        })?;

        let exams = Self::load_exams(&conn, &version_id)?;
        Ok(Schedule::from_exams(&version_id, horizon, exams))
    }

    async fn persist_schedule(&self, schedule: &Schedule) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let start = schedule.horizon.start_date.format(DATE_FMT).to_string();
        let end = schedule.horizon.end_date.format(DATE_FMT).to_string();

        conn.execute("BEGIN TRANSACTION", [])
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let result = (|| -> RepositoryResult<()> {
            conn.execute(
                r#"
                INSERT INTO schedules (version_id, horizon_start, horizon_end)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(version_id) DO UPDATE SET horizon_start = ?2, horizon_end = ?3
                "#,
                params![schedule.version_id, start, end],
            )?;

            // 全量替换该版本的考试明细
            conn.execute(
                "DELETE FROM exams WHERE version_id = ?1",
                params![schedule.version_id],
            )?;

            for exam in schedule.exams() {
                let (date, slot_no, room_id, professor_id) = match &exam.placement {
                    Some(p) => (
                        Some(p.date.format(DATE_FMT).to_string()),
                        Some(p.slot_no),
                        Some(p.room_id.clone()),
                        Some(p.professor_id.clone()),
                    ),
                    None => (None, None, None, None),
                };
                conn.execute(
                    r#"
                    INSERT INTO exams
                        (version_id, exam_id, module_id, exam_date, slot_no,
                         room_id, professor_id, duration_minutes, status)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        schedule.version_id,
                        exam.exam_id,
                        exam.module_id,
                        date,
                        slot_no,
                        room_id,
                        professor_id,
                        exam.duration_minutes,
                        exam.status.to_db_str(),
                    ],
                )?;
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])
                    .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(e)
            }
        }
    }
}
