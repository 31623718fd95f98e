use serde::{Deserialize, Serialize};

/// 全局设置所在路径。
pub const SETTINGS_PATH: &str = "settings";

/// 停车场全局设置。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// 每小时费用
    pub fee: f64,
    /// PromptPay 收款号
    pub promptpay: String,
}
