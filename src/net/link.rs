//! 链路类型
//!
//! 定义网络链路及其传输时延计算。链路是单向的，拓扑构建器成对创建；
//! 出口缓冲为 DropTail 队列，溢出丢包计入所属流的遥测。

use super::id::NodeId;
use crate::queue::{DropTailQueue, PacketQueue};
use crate::sim::SimTime;

/// 链路属性表的一项：同一类链路共享带宽/时延/队列容量。
#[derive(Debug, Clone, Copy)]
pub struct LinkClass {
    pub bandwidth_bps: u64,
    pub latency: SimTime,
    pub queue_bytes: u64,
}

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub from: NodeId,
    pub to: NodeId,
    pub latency: SimTime,
    pub bandwidth_bps: u64,
    pub busy_until: SimTime,
    /// 链路出口队列（DropTail）
    pub queue: Box<dyn PacketQueue>,
}

impl Link {
    /// 创建新链路
    pub fn new(from: NodeId, to: NodeId, class: &LinkClass) -> Self {
        Self {
            from,
            to,
            latency: class.latency,
            bandwidth_bps: class.bandwidth_bps,
            busy_until: SimTime::ZERO,
            queue: Box::new(DropTailQueue::new(class.queue_bytes)),
        }
    }

    /// 计算传输指定字节数所需的时间
    pub(crate) fn tx_time(&self, bytes: u32) -> SimTime {
        // ceil(bytes*8 / bps) 秒 -> 纳秒
        if self.bandwidth_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.bandwidth_bps as u128 - 1))
            / self.bandwidth_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }
}
