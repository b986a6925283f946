// ==========================================
// 高校考试排考系统 - 参考数据 CSV 导入器
// ==========================================
// 职责: 学生/教师/教室/模块/选课/教师不可用日期 六类参考数据入库
// 约定: 逐行校验,坏行进拒绝清单,不中断整个文件
// ==========================================

use crate::importer::error::ImportError;
use chrono::NaiveDate;
use csv::ReaderBuilder;
use rusqlite::{params, Connection};
use serde::Deserialize;
use std::fs::File;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{info, warn};

// ==========================================
// ImportReport - 导入结果
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub imported: usize,                 // 成功行数
    pub rejected: Vec<(usize, String)>,  // (行号, 拒绝原因)
}

impl ImportReport {
    /// 是否全部成功
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

// ==========================================
// 行结构 (与 CSV 表头对应)
// ==========================================

#[derive(Debug, Deserialize)]
struct StudentRow {
    student_id: String,
    full_name: String,
    formation_id: String,
}

#[derive(Debug, Deserialize)]
struct ProfessorRow {
    professor_id: String,
    full_name: String,
    department_id: String,
    #[serde(default)]
    max_exams_per_day: i32,
    #[serde(default)]
    max_exams_per_week: i32,
}

#[derive(Debug, Deserialize)]
struct RoomRow {
    room_id: String,
    name: String,
    capacity: i32,
    #[serde(default)]
    room_type: String,
    #[serde(default)]
    campus: String,
    #[serde(default = "default_available")]
    available: i32,
}

fn default_available() -> i32 {
    1
}

#[derive(Debug, Deserialize)]
struct ModuleRow {
    module_id: String,
    name: String,
    formation_id: String,
    department_id: String,
    #[serde(default)]
    duration_minutes: i32,
    #[serde(default)]
    preferred_room_type: String,
}

#[derive(Debug, Deserialize)]
struct EnrollmentRow {
    student_id: String,
    module_id: String,
}

#[derive(Debug, Deserialize)]
struct UnavailabilityRow {
    professor_id: String,
    date: String,
}

// ==========================================
// ReferenceDataImporter - 参考数据导入器
// ==========================================
pub struct ReferenceDataImporter {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceDataImporter {
    /// 从已有连接创建导入器
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> Result<MutexGuard<'_, Connection>, ImportError> {
        self.conn
            .lock()
            .map_err(|e| ImportError::DatabaseError(format!("锁获取失败: {}", e)))
    }

    /// 打开 CSV 文件 (仅支持 .csv,带表头)
    fn open_reader(path: &Path) -> Result<csv::Reader<File>, ImportError> {
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }
        if let Some(ext) = path.extension() {
            if ext != "csv" {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }
        let file =
            File::open(path).map_err(|e| ImportError::FileReadError(e.to_string()))?;
        Ok(ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(file))
    }

    /// 通用逐行导入骨架: 解析 → 校验 → 写库, 坏行进拒绝清单
    fn import_rows<T, F>(&self, path: &Path, mut insert: F) -> Result<ImportReport, ImportError>
    where
        T: for<'de> Deserialize<'de>,
        F: FnMut(&Connection, usize, T) -> Result<(), ImportError>,
    {
        let mut reader = Self::open_reader(path)?;
        let conn = self.get_conn()?;
        let mut report = ImportReport::default();

        for (idx, row) in reader.deserialize::<T>().enumerate() {
            let row_no = idx + 2; // 表头占第 1 行
            match row {
                Ok(record) => match insert(&conn, row_no, record) {
                    Ok(()) => report.imported += 1,
                    Err(e) => {
                        warn!(row = row_no, error = %e, "行被拒绝");
                        report.rejected.push((row_no, e.to_string()));
                    }
                },
                Err(e) => {
                    warn!(row = row_no, error = %e, "行解析失败");
                    report.rejected.push((row_no, e.to_string()));
                }
            }
        }

        info!(
            file = %path.display(),
            imported = report.imported,
            rejected = report.rejected.len(),
            "导入完成"
        );
        Ok(report)
    }

    fn require_key(row: usize, field: &str, value: &str) -> Result<(), ImportError> {
        if value.trim().is_empty() {
            Err(ImportError::PrimaryKeyMissing {
                row,
                field: field.to_string(),
            })
        } else {
            Ok(())
        }
    }

    // ==========================================
    // 各类参考数据导入
    // ==========================================

    /// 导入学生
    pub fn import_students(&self, path: &Path) -> Result<ImportReport, ImportError> {
        self.import_rows::<StudentRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "student_id", &r.student_id)?;
            conn.execute(
                "INSERT OR REPLACE INTO students (student_id, full_name, formation_id)
                 VALUES (?1, ?2, ?3)",
                params![r.student_id, r.full_name, r.formation_id],
            )?;
            Ok(())
        })
    }

    /// 导入教师
    pub fn import_professors(&self, path: &Path) -> Result<ImportReport, ImportError> {
        self.import_rows::<ProfessorRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "professor_id", &r.professor_id)?;
            if r.max_exams_per_day < 0 || r.max_exams_per_week < 0 {
                return Err(ImportError::TypeConversionError {
                    row: row_no,
                    field: "max_exams_per_day/max_exams_per_week".to_string(),
                    message: "负载上限不得为负数".to_string(),
                });
            }
            conn.execute(
                "INSERT OR REPLACE INTO professors
                     (professor_id, full_name, department_id, max_exams_per_day, max_exams_per_week)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    r.professor_id,
                    r.full_name,
                    r.department_id,
                    r.max_exams_per_day,
                    r.max_exams_per_week
                ],
            )?;
            Ok(())
        })
    }

    /// 导入教室
    pub fn import_rooms(&self, path: &Path) -> Result<ImportReport, ImportError> {
        self.import_rows::<RoomRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "room_id", &r.room_id)?;
            if r.capacity <= 0 {
                return Err(ImportError::TypeConversionError {
                    row: row_no,
                    field: "capacity".to_string(),
                    message: format!("容量必须为正数, 实际 {}", r.capacity),
                });
            }
            conn.execute(
                "INSERT OR REPLACE INTO rooms
                     (room_id, name, capacity, room_type, campus, available)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    r.room_id,
                    r.name,
                    r.capacity,
                    if r.room_type.is_empty() {
                        "CLASSROOM".to_string()
                    } else {
                        r.room_type.to_uppercase()
                    },
                    r.campus,
                    r.available
                ],
            )?;
            Ok(())
        })
    }

    /// 导入模块
    pub fn import_modules(&self, path: &Path) -> Result<ImportReport, ImportError> {
        self.import_rows::<ModuleRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "module_id", &r.module_id)?;
            let preferred = if r.preferred_room_type.trim().is_empty() {
                None
            } else {
                Some(r.preferred_room_type.to_uppercase())
            };
            conn.execute(
                "INSERT OR REPLACE INTO modules
                     (module_id, name, formation_id, department_id, duration_minutes, preferred_room_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    r.module_id,
                    r.name,
                    r.formation_id,
                    r.department_id,
                    r.duration_minutes,
                    preferred
                ],
            )?;
            Ok(())
        })
    }

    /// 导入选课关系
    pub fn import_enrollments(&self, path: &Path) -> Result<ImportReport, ImportError> {
        self.import_rows::<EnrollmentRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "student_id", &r.student_id)?;
            Self::require_key(row_no, "module_id", &r.module_id)?;
            conn.execute(
                "INSERT OR REPLACE INTO enrollments (student_id, module_id) VALUES (?1, ?2)",
                params![r.student_id, r.module_id],
            )?;
            Ok(())
        })
    }

    /// 导入教师不可用日期
    pub fn import_professor_unavailability(
        &self,
        path: &Path,
    ) -> Result<ImportReport, ImportError> {
        self.import_rows::<UnavailabilityRow, _>(path, |conn, row_no, r| {
            Self::require_key(row_no, "professor_id", &r.professor_id)?;
            let date = NaiveDate::parse_from_str(r.date.trim(), "%Y-%m-%d").map_err(|_| {
                ImportError::DateFormatError {
                    row: row_no,
                    field: "date".to_string(),
                    value: r.date.clone(),
                }
            })?;
            conn.execute(
                "INSERT OR REPLACE INTO professor_unavailability (professor_id, date)
                 VALUES (?1, ?2)",
                params![r.professor_id, date.format("%Y-%m-%d").to_string()],
            )?;
            Ok(())
        })
    }
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn setup() -> (tempfile::NamedTempFile, ReferenceDataImporter) {
        let db_file = tempfile::NamedTempFile::new().unwrap();
        let conn = crate::db::open_sqlite_connection(db_file.path().to_str().unwrap()).unwrap();
        crate::db::init_schema(&conn).unwrap();
        let importer = ReferenceDataImporter::from_connection(Arc::new(Mutex::new(conn)));
        (db_file, importer)
    }

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_import_students_rejects_missing_key() {
        let (_db, importer) = setup();
        let csv = write_csv(
            "student_id,full_name,formation_id\n\
             S001,小王,CS2024\n\
             ,无学号,CS2024\n\
             S002,小李,CS2024\n",
        );

        let report = importer.import_students(csv.path()).unwrap();
        assert_eq!(report.imported, 2);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(report.rejected[0].0, 3); // 第 3 行 (含表头)
    }

    #[test]
    fn test_import_rooms_rejects_bad_capacity() {
        let (_db, importer) = setup();
        let csv = write_csv(
            "room_id,name,capacity,room_type,campus,available\n\
             R101,一教101,60,CLASSROOM,MAIN,1\n\
             R102,一教102,0,CLASSROOM,MAIN,1\n",
        );

        let report = importer.import_rooms(csv.path()).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].1.contains("容量"));
    }

    #[test]
    fn test_import_unavailability_date_format() {
        let (_db, importer) = setup();
        // 先导入教师 (外键)
        let profs = write_csv(
            "professor_id,full_name,department_id,max_exams_per_day,max_exams_per_week\n\
             P001,张老师,CS,3,10\n",
        );
        assert!(importer.import_professors(profs.path()).unwrap().is_clean());

        let csv = write_csv(
            "professor_id,date\n\
             P001,2026-01-15\n\
             P001,15/01/2026\n",
        );
        let report = importer.import_professor_unavailability(csv.path()).unwrap();
        assert_eq!(report.imported, 1);
        assert_eq!(report.rejected.len(), 1);
        assert!(report.rejected[0].1.contains("日期格式错误"));
    }

    #[test]
    fn test_import_rejects_non_csv_extension() {
        let (_db, importer) = setup();
        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        file.write_all(b"whatever").unwrap();

        let result = importer.import_students(file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }
}
