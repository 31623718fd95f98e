//! # 状态机解释
//!
//! 把节点发布的 `current_state` 映射为 Kiosk 展示视图。
//! 对入口/出口状态联合做穷尽匹配，新增状态时编译即报错。
//!
//! 视图只描述“显示什么”；倒计时只是提示，归零不会触发本地状态转移，
//! 真正的转移由硬件节点推送。

mod countdown;
mod view;

pub use countdown::{
    ENTRANCE_DETECT_DEADLINE, ENTRANCE_FAILED_DEADLINE, EXIT_DETECT_DEADLINE,
    EXIT_FAILED_DEADLINE, EXIT_PAYMENT_DEADLINE, countdown,
};
pub use view::{KioskView, interpret, matching_transaction};
