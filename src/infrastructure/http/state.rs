//! Application State

use crate::application::ports::AudioFormat;
use crate::application::BlockingFacade;

/// 请求级默认值
#[derive(Debug, Clone)]
pub struct RequestDefaults {
    /// 默认音色
    pub voice: String,
    /// 默认输出格式
    pub format: AudioFormat,
    /// 语音参数上限（用于 speed 归一化）
    pub max_param: u8,
}

/// 应用状态
pub struct AppState {
    pub facade: BlockingFacade,
    pub defaults: RequestDefaults,
}

impl AppState {
    pub fn new(facade: BlockingFacade, defaults: RequestDefaults) -> Self {
        Self { facade, defaults }
    }
}
