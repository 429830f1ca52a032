//! 节点类型
//!
//! 定义网络节点：节点 trait、普通主机（按角色区分合法节点 / bot /
//! 额外用户）以及缓解点（防火墙）节点。角色在拓扑构建时确定，之后
//! 不可变。

use super::id::NodeId;
use super::network::Network;
use super::packet::Packet;
use crate::firewall::Verdict;
use crate::sim::Simulator;
use tracing::{debug, trace};

/// 节点角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// 合法主机（含入口与受害者）
    Legitimate,
    /// 攻击 bot
    Bot,
    /// 额外的合法用户
    Extra,
    /// 缓解点（防火墙）
    Firewall,
}

/// 节点接口
pub trait Node: Send {
    /// 获取节点标识符
    fn id(&self) -> NodeId;

    /// 获取节点名称
    fn name(&self) -> &str;

    /// 获取节点角色
    fn role(&self) -> NodeRole;

    /// 处理到达的数据包
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network);
}

/// 主机节点
#[derive(Debug)]
pub struct Host {
    id: NodeId,
    name: String,
    role: NodeRole,
}

impl Host {
    /// 创建新主机
    pub fn new(id: NodeId, name: impl Into<String>, role: NodeRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }
}

impl Node for Host {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        self.role
    }

    #[tracing::instrument(skip(self, sim, net), fields(node_name = %self.name(), node_id = ?self.id(), pkt_id = pkt.id, flow_id = ?pkt.flow_id))]
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        trace!(dst = ?pkt.dst(), hop = pkt.hop, "🖥️  主机处理数据包");

        if self.id != pkt.dst() {
            trace!("未到达目的地，继续转发");
            net.forward_from(self.id, pkt, sim);
        } else {
            trace!("已到达目的地，标记为已送达");
            net.on_delivered(pkt);
        }
    }
}

/// 防火墙节点：对每个到达的 packet 比对源地址，命中规则则丢弃。
#[derive(Debug)]
pub struct FirewallNode {
    id: NodeId,
    name: String,
}

impl FirewallNode {
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

impl Node for FirewallNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn role(&self) -> NodeRole {
        NodeRole::Firewall
    }

    #[tracing::instrument(skip(self, sim, net), fields(node_name = %self.name(), node_id = ?self.id(), pkt_id = pkt.id, flow_id = ?pkt.flow_id))]
    fn on_packet(&mut self, pkt: Packet, sim: &mut Simulator, net: &mut Network) {
        if net.firewall_verdict(pkt.src_addr) == Verdict::Drop {
            debug!(src = %pkt.src_addr, "🛡️  命中防火墙规则，丢弃");
            net.on_firewall_drop(pkt);
            return;
        }

        if self.id != pkt.dst() {
            trace!("源地址放行，继续转发");
            net.forward_from(self.id, pkt, sim);
        } else {
            net.on_delivered(pkt);
        }
    }
}
