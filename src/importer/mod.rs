// ==========================================
// 医院就诊负荷预测 - 导入层
// ==========================================
// 职责: 历史就诊数据导入 / 训练数据导出
// 支持: Excel, CSV
// ==========================================

pub mod error;
pub mod file_parser;
pub mod history_importer;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, FileParser, RawRow, UniversalFileParser};
pub use history_importer::{
    export_daily_series, export_external_factors, export_hourly_visits, HistoryImporter,
};
