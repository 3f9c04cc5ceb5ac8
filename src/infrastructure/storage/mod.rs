//! 存储层
//!
//! - TempFileRegistry / CleanupWorker: 临时文件登记与延迟清理
//! - OutputWriter: 持久化输出

pub mod output_writer;
pub mod temp_registry;

pub use output_writer::OutputWriter;
pub use temp_registry::{purge_orphaned, CleanupConfig, CleanupWorker, TempFileRegistry};
