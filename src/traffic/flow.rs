//! 流描述符

use std::net::Ipv4Addr;

use tracing::debug;

use super::events::StartFlow;
use crate::net::{FlowId, Network, NodeId, Protocol};
use crate::sim::{SimTime, Simulator};
use crate::topo::ConfigError;

/// 合法流量的接收端口
pub const TCP_SINK_PORT: u16 = 9000;
/// 攻击流量的接收端口
pub const UDP_SINK_PORT: u16 = 9001;

/// 一条配置好的 sender -> receiver 流量模式。
///
/// `off_duration` 为零表示持续发送（on/off 周期退化为常开）；攻击流
/// 即是这种形态。`start == stop` 的流产生零次发送，是合法的空操作。
#[derive(Debug, Clone, Copy)]
pub struct FlowSpec {
    pub flow_id: FlowId,
    pub src: NodeId,
    pub dst_addr: Ipv4Addr,
    pub dst_port: u16,
    pub protocol: Protocol,
    pub rate_bps: u64,
    pub pkt_bytes: u32,
    pub start: SimTime,
    pub stop: SimTime,
    pub on_duration: SimTime,
    pub off_duration: SimTime,
}

impl FlowSpec {
    /// 攻击流：UDP、恒定速率、从 0 时刻持续泛洪到 `stop`。
    pub fn attack(
        flow_id: FlowId,
        src: NodeId,
        dst_addr: Ipv4Addr,
        rate_bps: u64,
        pkt_bytes: u32,
        stop: SimTime,
    ) -> Self {
        Self {
            flow_id,
            src,
            dst_addr,
            dst_port: UDP_SINK_PORT,
            protocol: Protocol::Udp,
            rate_bps,
            pkt_bytes,
            start: SimTime::ZERO,
            stop,
            on_duration: SimTime::from_secs(30),
            off_duration: SimTime::ZERO,
        }
    }

    /// 合法流：TCP、恒定速率、延迟起步（网络稳定后才开始正常使用）。
    pub fn legit(
        flow_id: FlowId,
        src: NodeId,
        dst_addr: Ipv4Addr,
        rate_bps: u64,
        pkt_bytes: u32,
        start: SimTime,
        stop: SimTime,
    ) -> Self {
        Self {
            flow_id,
            src,
            dst_addr,
            dst_port: TCP_SINK_PORT,
            protocol: Protocol::Tcp,
            rate_bps,
            pkt_bytes,
            start,
            stop,
            on_duration: SimTime::from_secs(30),
            off_duration: SimTime::ZERO,
        }
    }

    /// 相邻两次发包的间隔：ceil(pkt_bytes*8 / rate) 秒 -> 纳秒。
    pub fn send_gap(&self) -> SimTime {
        if self.rate_bps == 0 {
            return SimTime(u64::MAX / 4);
        }
        let bits = (self.pkt_bytes as u128).saturating_mul(8);
        let nanos = (bits.saturating_mul(1_000_000_000u128) + (self.rate_bps as u128 - 1))
            / self.rate_bps as u128;
        SimTime(nanos.min(u64::MAX as u128) as u64)
    }

    /// 有效的 on 周期：off 为零时退化为常开（None）。
    pub(crate) fn effective_on(&self) -> Option<SimTime> {
        if self.off_duration == SimTime::ZERO {
            None
        } else {
            Some(self.on_duration)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rate_bps == 0 {
            return Err(ConfigError::InvalidFlow {
                flow_id: self.flow_id.0,
                reason: "rate must be positive",
            });
        }
        if self.pkt_bytes == 0 {
            return Err(ConfigError::InvalidFlow {
                flow_id: self.flow_id.0,
                reason: "packet size must be positive",
            });
        }
        if self.stop < self.start {
            return Err(ConfigError::InvalidFlow {
                flow_id: self.flow_id.0,
                reason: "stop precedes start",
            });
        }
        Ok(())
    }
}

/// 注册一条流：校验描述符、登记到网络与遥测、调度起始事件。
///
/// 必须在仿真开始前调用（`start` 不得早于当前仿真时间）。
pub fn register_flow(
    net: &mut Network,
    sim: &mut Simulator,
    spec: FlowSpec,
) -> Result<(), ConfigError> {
    spec.validate()?;
    debug!(
        flow_id = ?spec.flow_id,
        protocol = ?spec.protocol,
        rate_bps = spec.rate_bps,
        start = ?spec.start,
        stop = ?spec.stop,
        "注册流量"
    );
    let flow_id = spec.flow_id;
    let start = spec.start;
    net.add_flow(spec);
    sim.schedule(start, StartFlow { flow_id });
    Ok(())
}
