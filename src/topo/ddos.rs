//! DDoS 实验拓扑构建
//!
//! 一次性构建固定拓扑：合法节点核心网、攻击 bot、额外合法用户，以及
//! 可选的缓解点（防火墙）。支持两种观测到的接线形态：
//!
//! - direct-to-ingress：bot 直连入口合法节点；
//! - through-firewall：bot 全部经由专用防火墙节点接入入口。
//!
//! 每条双向链路从分配器切出一个新鲜子网，两端各取一个主机地址；
//! 地址空间耗尽在这里（仿真开始前）即报错。

use std::net::Ipv4Addr;

use tracing::{debug, info};

use super::ConfigError;
use crate::net::{LinkClass, NetWorld, NodeId, NodeRole, SubnetAllocator};
use crate::queue::mem_from_pkt;
use crate::sim::SimTime;

/// bot 接线方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotWiring {
    /// bot 直连入口合法节点
    DirectToIngress,
    /// bot 经由专用防火墙节点接入
    ThroughFirewall,
}

/// DDoS 拓扑配置选项
#[derive(Debug, Clone)]
pub struct DdosOpts {
    pub legitimate: usize,
    pub bots: usize,
    pub extras: usize,
    pub wiring: BotWiring,
    /// 合法节点核心网链路
    pub core_link: LinkClass,
    /// bot / 额外用户的接入链路
    pub edge_link: LinkClass,
    /// bot 与防火墙之间的链路（through-firewall 接线）
    pub firewall_link: LinkClass,
    pub addr_base: Ipv4Addr,
    pub addr_space_prefix: u8,
    pub subnet_prefix: u8,
}

impl Default for DdosOpts {
    fn default() -> Self {
        Self {
            legitimate: 4,
            bots: 50,
            extras: 6,
            wiring: BotWiring::DirectToIngress,
            core_link: LinkClass {
                bandwidth_bps: 500_000,
                latency: SimTime::from_millis(10),
                queue_bytes: mem_from_pkt(100),
            },
            edge_link: LinkClass {
                bandwidth_bps: 1_000_000,
                latency: SimTime::from_millis(1),
                queue_bytes: mem_from_pkt(100),
            },
            firewall_link: LinkClass {
                bandwidth_bps: 500_000,
                latency: SimTime::from_millis(1),
                queue_bytes: mem_from_pkt(100),
            },
            addr_base: Ipv4Addr::new(10, 0, 0, 0),
            addr_space_prefix: 8,
            subnet_prefix: 30,
        }
    }
}

/// 构建结果：各角色的节点句柄与关键地址。
#[derive(Debug, Clone)]
pub struct DdosTopology {
    pub legit: Vec<NodeId>,
    pub bots: Vec<NodeId>,
    pub extras: Vec<NodeId>,
    pub firewall: Option<NodeId>,
    /// 攻击流量的汇入节点（legit[0]）
    pub ingress: NodeId,
    /// 受害者（最后一个合法节点）
    pub victim: NodeId,
    /// 每个 bot 的接口地址，顺序与 `bots` 一致
    pub bot_addrs: Vec<Ipv4Addr>,
    /// 受害者的首个接口地址（流量的目的地址）
    pub victim_addr: Option<Ipv4Addr>,
}

/// 构建 DDoS 实验拓扑
#[tracing::instrument(skip(world, opts), fields(legitimate = opts.legitimate, bots = opts.bots, extras = opts.extras, wiring = ?opts.wiring))]
pub fn build_ddos(world: &mut NetWorld, opts: &DdosOpts) -> Result<DdosTopology, ConfigError> {
    if opts.legitimate == 0 {
        return Err(ConfigError::NoLegitimateNodes);
    }

    let mut alloc =
        SubnetAllocator::new(opts.addr_base, opts.addr_space_prefix, opts.subnet_prefix)?;
    let net = &mut world.net;

    // 合法节点核心网：节点 i 连到 i+1 与 i+2。4 个节点时恰好得到
    // 原始实验的五条链路 (0-1, 0-2, 1-2, 1-3, 2-3)，其他规模下目的
    // 子图保持连通并带冗余路径。
    let legit: Vec<NodeId> = (0..opts.legitimate)
        .map(|i| net.add_host(format!("n{i}"), NodeRole::Legitimate))
        .collect();
    for i in 0..opts.legitimate {
        for d in 1..=2usize {
            let j = i + d;
            if j < opts.legitimate {
                net.connect_duplex(legit[i], legit[j], &opts.core_link, alloc.next_subnet()?);
            }
        }
    }

    let ingress = legit[0];
    let victim = *legit.last().expect("at least one legitimate node");

    // bot 接入：直连入口，或经由防火墙节点
    let mut bots = Vec::with_capacity(opts.bots);
    let mut bot_addrs = Vec::with_capacity(opts.bots);
    let firewall = match opts.wiring {
        BotWiring::DirectToIngress => {
            for i in 0..opts.bots {
                let b = net.add_host(format!("bot{i}"), NodeRole::Bot);
                net.connect_duplex(b, ingress, &opts.edge_link, alloc.next_subnet()?);
                bot_addrs.push(net.iface_addr(b, ingress).expect("bot iface assigned"));
                bots.push(b);
            }
            None
        }
        BotWiring::ThroughFirewall => {
            let fw = net.add_firewall_node("fw");
            net.connect_duplex(fw, ingress, &opts.core_link, alloc.next_subnet()?);
            for i in 0..opts.bots {
                let b = net.add_host(format!("bot{i}"), NodeRole::Bot);
                net.connect_duplex(b, fw, &opts.firewall_link, alloc.next_subnet()?);
                bot_addrs.push(net.iface_addr(b, fw).expect("bot iface assigned"));
                bots.push(b);
            }
            Some(fw)
        }
    };

    // 额外用户轮转接到非受害者的合法节点上：4 合法 + 6 额外时得到
    // 原始实验的 2/2/2 分布
    let attach_count = opts.legitimate.saturating_sub(1).max(1);
    let mut extras = Vec::with_capacity(opts.extras);
    for i in 0..opts.extras {
        let e = net.add_host(format!("extra{i}"), NodeRole::Extra);
        let attach = legit[i % attach_count];
        net.connect_duplex(e, attach, &opts.edge_link, alloc.next_subnet()?);
        extras.push(e);
        debug!(extra = ?e, attach = ?attach, "接入额外用户");
    }

    let victim_addr = net.node_addr(victim);

    info!(
        nodes = net.node_count(),
        links = net.link_count(),
        subnets = alloc.allocated(),
        victim = ?victim,
        victim_addr = ?victim_addr,
        "🕸️  拓扑构建完成"
    );

    Ok(DdosTopology {
        legit,
        bots,
        extras,
        firewall,
        ingress,
        victim,
        bot_addrs,
        victim_addr,
    })
}
