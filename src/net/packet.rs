//! 数据包类型
//!
//! 定义网络数据包及其相关操作。packet 是纯仿真对象，携带完整路由
//! （节点序列）与流归属信息；不存在真实的线上协议。

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::id::{FlowId, NodeId};

/// 传输协议标签。
///
/// 攻击流使用 UDP，合法流使用 TCP；两者的发送行为都是恒定速率 on/off
/// 模型，协议标签用于流分类与报表归属。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Udp,
    Tcp,
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub flow_id: FlowId,
    pub size_bytes: u32,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub route: Vec<NodeId>,
    pub hop: usize, // 当前所在节点在 route 中的索引
}

impl Packet {
    /// 获取源节点
    pub fn src(&self) -> NodeId {
        self.route[0]
    }

    /// 获取目标节点
    pub fn dst(&self) -> NodeId {
        *self.route.last().expect("route non-empty")
    }

    /// 获取当前所在节点
    pub fn at(&self) -> NodeId {
        self.route[self.hop]
    }

    /// 检查是否有下一跳
    pub fn has_next(&self) -> bool {
        self.hop + 1 < self.route.len()
    }

    /// 获取下一跳节点（如果有）
    pub fn next(&self) -> Option<NodeId> {
        self.route.get(self.hop + 1).copied()
    }

    /// 前进到下一跳
    pub fn advance(mut self) -> Self {
        self.hop += 1;
        self
    }
}
