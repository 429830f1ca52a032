//! 拓扑构建
//!
//! 单一参数化的 DDoS 实验拓扑构建器，以及构建期的配置错误类型。

mod ddos;

pub use ddos::{BotWiring, DdosOpts, DdosTopology, build_ddos};

use thiserror::Error;

use crate::net::AddrError;

/// 配置错误：全部在仿真开始前检出并报告，不产生部分运行。
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("topology needs at least one legitimate node")]
    NoLegitimateNodes,

    #[error("mitigation requires the through-firewall wiring")]
    MitigationWithoutFirewall,

    #[error("invalid flow {flow_id}: {reason}")]
    InvalidFlow { flow_id: u64, reason: &'static str },

    #[error(transparent)]
    Addr(#[from] AddrError),
}
