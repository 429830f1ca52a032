//! 流级遥测
//!
//! 观察全网每一次发送 / 送达 / 丢弃，按所属流累计计数。被缓解引擎
//! 丢弃的 packet 同样计入来源流的丢失——攻击流量"发了多少、到了多少"
//! 正是评估缓解效果的依据。运行结束后产出按 flow id 排序的只读快照，
//! 供外部报表 / 可视化协作方序列化。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::net::{FlowId, Protocol};

/// 丢包原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    /// 命中缓解点的防火墙规则
    FirewallBlocked,
    /// 链路出口队列溢出
    QueueOverflow,
    /// 目的地址没有可达路由
    Unreachable,
}

/// 单条流的统计。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowStats {
    pub flow_id: FlowId,
    pub protocol: Protocol,
    pub src_addr: Ipv4Addr,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
    pub tx_pkts: u64,
    pub tx_bytes: u64,
    pub rx_pkts: u64,
    pub rx_bytes: u64,
    pub lost_pkts: u64,
    /// lost_pkts 中由防火墙丢弃的部分
    pub firewall_drops: u64,
}

impl FlowStats {
    fn new(
        flow_id: FlowId,
        protocol: Protocol,
        src_addr: Ipv4Addr,
        dst_addr: Ipv4Addr,
        dst_port: u16,
    ) -> Self {
        Self {
            flow_id,
            protocol,
            src_addr,
            dst_addr,
            dst_port,
            tx_pkts: 0,
            tx_bytes: 0,
            rx_pkts: 0,
            rx_bytes: 0,
            lost_pkts: 0,
            firewall_drops: 0,
        }
    }
}

/// 遥测收集器：持有自己的计数表，按流归属累加。
#[derive(Debug, Default)]
pub struct FlowTelemetry {
    table: HashMap<FlowId, FlowStats>,
}

impl FlowTelemetry {
    /// 登记一条流及其解析后的 (源, 目的) 地址。
    pub fn register(
        &mut self,
        flow_id: FlowId,
        protocol: Protocol,
        src_addr: Ipv4Addr,
        dst_addr: Ipv4Addr,
        dst_port: u16,
    ) {
        self.table
            .entry(flow_id)
            .or_insert_with(|| FlowStats::new(flow_id, protocol, src_addr, dst_addr, dst_port));
    }

    pub fn on_sent(&mut self, flow_id: FlowId, bytes: u64) {
        let Some(st) = self.table.get_mut(&flow_id) else {
            trace!(?flow_id, "未登记的流，忽略发送记账");
            return;
        };
        st.tx_pkts += 1;
        st.tx_bytes += bytes;
    }

    pub fn on_delivered(&mut self, flow_id: FlowId, bytes: u64) {
        let Some(st) = self.table.get_mut(&flow_id) else {
            trace!(?flow_id, "未登记的流，忽略送达记账");
            return;
        };
        st.rx_pkts += 1;
        st.rx_bytes += bytes;
    }

    pub fn on_dropped(&mut self, flow_id: FlowId, reason: DropReason) {
        let Some(st) = self.table.get_mut(&flow_id) else {
            trace!(?flow_id, "未登记的流，忽略丢弃记账");
            return;
        };
        st.lost_pkts += 1;
        if reason == DropReason::FirewallBlocked {
            st.firewall_drops += 1;
        }
        trace!(?flow_id, ?reason, lost = st.lost_pkts, "丢包记账");
    }

    /// 产出只读快照：按 flow id 排序，保证相同配置的两次运行序列化
    /// 结果逐字节一致。
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut flows: Vec<FlowStats> = self.table.values().cloned().collect();
        flows.sort_by_key(|f| f.flow_id);
        TelemetrySnapshot { flows }
    }
}

/// 运行结束时的只读统计快照。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub flows: Vec<FlowStats>,
}

impl TelemetrySnapshot {
    pub fn flow(&self, id: FlowId) -> Option<&FlowStats> {
        self.flows.iter().find(|f| f.flow_id == id)
    }

    /// 按协议聚合的发送字节数。
    pub fn tx_bytes(&self, protocol: Protocol) -> u64 {
        self.flows
            .iter()
            .filter(|f| f.protocol == protocol)
            .map(|f| f.tx_bytes)
            .sum()
    }

    /// 按协议聚合的送达字节数。
    pub fn rx_bytes(&self, protocol: Protocol) -> u64 {
        self.flows
            .iter()
            .filter(|f| f.protocol == protocol)
            .map(|f| f.rx_bytes)
            .sum()
    }

    /// 按协议聚合的丢包数。
    pub fn lost_pkts(&self, protocol: Protocol) -> u64 {
        self.flows
            .iter()
            .filter(|f| f.protocol == protocol)
            .map(|f| f.lost_pkts)
            .sum()
    }
}
