//! # 统一错误处理模块
//!
//! 定义 ctrkit 的所有错误类型，使用 `thiserror` 派生。
//!
//! 注意几何退化（不可测量点、零重叠、零偏振分母）不算错误：
//! 相应的校正因子返回 0，数据点保留在数据集中。
//! 这里的错误类型只覆盖真正的调用方配置缺陷和 I/O 失败。
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// ctrkit 统一错误类型
#[derive(Error, Debug)]
pub enum CtrError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("File not found: {path}")]
    FileNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 解析错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to parse {format} file: {path}\nReason: {reason}")]
    ParseError {
        format: String,
        path: String,
        reason: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    // ─────────────────────────────────────────────────────────────
    // 数据集错误
    // ─────────────────────────────────────────────────────────────
    #[error("Point index {index} out of range (dataset has {len} points)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("No default available for '{what}': pass it explicitly on the first append")]
    MissingDefault { what: String },

    #[error("Invalid correction parameters: {0}")]
    InvalidCorrectionParams(String),

    #[error("Invalid scan geometry: {0}")]
    InvalidGeometry(String),

    // ─────────────────────────────────────────────────────────────
    // 参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid parameter value for '{key}': {value}")]
    InvalidParameterValue { key: String, value: String },

    // ─────────────────────────────────────────────────────────────
    // CSV 错误
    // ─────────────────────────────────────────────────────────────
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("No matching files found with pattern: {pattern}")]
    NoFilesFound { pattern: String },

    #[error("{0}")]
    Other(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, CtrError>;
