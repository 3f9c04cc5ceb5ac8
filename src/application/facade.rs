//! Blocking Facade - 阻塞调用入口
//!
//! 把阻塞调用方接入异步管线的桥。两条显式路径：
//! - 调用线程上没有活跃调度器：构建一个自有的单线程运行时，驱动管线
//!   到完成
//! - 调度器已在运行（从运行时内部调用）：委托给拥有独立运行时的专用
//!   工作线程，当前线程阻塞等待其结果，避免死锁活跃的调度器
//!
//! 清理任务不依赖这里的临时运行时：注册表消息发往常驻的清理 worker

use std::path::PathBuf;
use std::sync::Arc;

use crate::application::error::SynthesisError;
use crate::application::pipeline::{SpeechPipeline, SpeechRequest};

/// 阻塞调用门面
///
/// 路由层的唯一入口
#[derive(Clone)]
pub struct BlockingFacade {
    pipeline: Arc<SpeechPipeline>,
}

impl BlockingFacade {
    pub fn new(pipeline: Arc<SpeechPipeline>) -> Self {
        Self { pipeline }
    }

    /// 同步执行一次合成
    ///
    /// 任一内部失败（解析/远程/转码）都归一为 `SynthesisError`，
    /// 失败时绝不返回部分产物路径
    pub fn generate_speech(&self, request: SpeechRequest) -> Result<PathBuf, SynthesisError> {
        match tokio::runtime::Handle::try_current() {
            Err(_) => self.run_on_owned_runtime(request),
            Ok(_) => self.run_on_worker_thread(request),
        }
    }

    /// 无活跃调度器：自建运行时驱动管线
    fn run_on_owned_runtime(&self, request: SpeechRequest) -> Result<PathBuf, SynthesisError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SynthesisError::Internal(format!("failed to build runtime: {}", e)))?;

        runtime.block_on(self.pipeline.generate(request))
    }

    /// 调度器已活跃：隔离的工作线程承载独立运行时，结果经一次性通道传回
    fn run_on_worker_thread(&self, request: SpeechRequest) -> Result<PathBuf, SynthesisError> {
        let pipeline = self.pipeline.clone();
        let (tx, rx) = std::sync::mpsc::channel();

        std::thread::Builder::new()
            .name("speech-pipeline".to_string())
            .spawn(move || {
                let result = match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(pipeline.generate(request)),
                    Err(e) => Err(SynthesisError::Internal(format!(
                        "failed to build worker runtime: {}",
                        e
                    ))),
                };
                let _ = tx.send(result);
            })
            .map_err(|e| SynthesisError::Internal(format!("failed to spawn worker: {}", e)))?;

        rx.recv().map_err(|_| {
            SynthesisError::Internal("pipeline worker exited without a result".to_string())
        })?
    }
}
