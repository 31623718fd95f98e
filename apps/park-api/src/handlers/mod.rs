//! Handlers 模块

pub mod commands;
pub mod directory;
pub mod health;
pub mod metrics;
pub mod nodes;
pub mod payments;
pub mod reports;
pub mod settings;
pub mod transactions;

pub use commands::*;
pub use directory::*;
pub use health::*;
pub use metrics::*;
pub use nodes::*;
pub use payments::*;
pub use reports::*;
pub use settings::*;
pub use transactions::*;
