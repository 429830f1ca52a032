//! 网络拓扑管理
//!
//! 定义网络拓扑结构：节点、链路、地址表、路由、流表与防火墙状态，
//! 以及数据包的转发 / 排队 / 送达 / 丢弃路径。所有可变状态只在事件
//! 回调内（或仿真开始前的构建阶段）被修改。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use super::addr::Subnet;
use super::deliver_packet::DeliverPacket;
use super::id::{FlowId, LinkId, NodeId};
use super::link::{Link, LinkClass};
use super::link_ready::LinkReady;
use super::node::{FirewallNode, Host, Node, NodeRole};
use super::packet::Packet;
use super::routing::RoutingTable;
use crate::firewall::{Firewall, Verdict};
use crate::sim::Simulator;
use crate::telemetry::{DropReason, FlowTelemetry};
use crate::traffic::FlowSpec;
use tracing::{debug, trace};

/// 一条已注册的流：描述符加上注册时解析出的路由与源地址。
#[derive(Debug)]
struct FlowState {
    spec: FlowSpec,
    /// 到目的节点的完整路径；目的不可达时为 None（发出的包全部计损）
    route: Option<Vec<NodeId>>,
    src_addr: Ipv4Addr,
}

/// 网络拓扑
#[derive(Default)]
pub struct Network {
    nodes: Vec<Option<Box<dyn Node>>>,
    links: Vec<Link>,
    edges: HashMap<(NodeId, NodeId), LinkId>,
    adj: Vec<Vec<NodeId>>,
    routing: RoutingTable,

    // 地址层：节点在朝向某邻居的链路上的接口地址
    iface_addr: HashMap<(NodeId, NodeId), Ipv4Addr>,
    addr_node: HashMap<Ipv4Addr, NodeId>,
    node_addrs: Vec<Vec<Ipv4Addr>>,
    subnets: Vec<Subnet>,

    flows: HashMap<FlowId, FlowState>,
    firewall: Option<Firewall>,
    next_pkt_id: u64,
    pub telemetry: FlowTelemetry,
}

impl Network {
    /// 添加主机节点
    pub fn add_host(&mut self, name: impl Into<String>, role: NodeRole) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Box::new(Host::new(id, name, role))));
        self.adj.push(Vec::new());
        self.node_addrs.push(Vec::new());
        id
    }

    /// 添加防火墙（缓解点）节点
    pub fn add_firewall_node(&mut self, name: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Some(Box::new(FirewallNode::new(id, name))));
        self.adj.push(Vec::new());
        self.node_addrs.push(Vec::new());
        id
    }

    /// 在两个节点之间创建一对方向相反的链路，并把 `subnet` 的两个
    /// 主机地址分配给两端接口。
    ///
    /// 不变式：一条链路的两端地址共享同一个子网；子网由调用方从
    /// 分配器切出，绝不重复。
    pub fn connect_duplex(
        &mut self,
        a: NodeId,
        b: NodeId,
        class: &LinkClass,
        subnet: Subnet,
    ) -> (LinkId, LinkId) {
        let ab = LinkId(self.links.len());
        self.links.push(Link::new(a, b, class));
        self.edges.insert((a, b), ab);
        let ba = LinkId(self.links.len());
        self.links.push(Link::new(b, a, class));
        self.edges.insert((b, a), ba);

        self.adj[a.0].push(b);
        self.adj[b.0].push(a);

        let a_addr = subnet.host(1);
        let b_addr = subnet.host(2);
        self.iface_addr.insert((a, b), a_addr);
        self.iface_addr.insert((b, a), b_addr);
        self.addr_node.insert(a_addr, a);
        self.addr_node.insert(b_addr, b);
        self.node_addrs[a.0].push(a_addr);
        self.node_addrs[b.0].push(b_addr);
        self.subnets.push(subnet);

        self.routing.mark_dirty();

        trace!(?a, ?b, %a_addr, %b_addr, "创建双向链路");
        (ab, ba)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// 链路两端 (from, to)。
    pub fn link_endpoints(&self, id: LinkId) -> (NodeId, NodeId) {
        let link = &self.links[id.0];
        (link.from, link.to)
    }

    pub fn node_name(&self, id: NodeId) -> &str {
        self.nodes[id.0].as_ref().expect("node exists").name()
    }

    pub fn node_role(&self, id: NodeId) -> NodeRole {
        self.nodes[id.0].as_ref().expect("node exists").role()
    }

    /// 节点的首个接口地址（按链路接入顺序）。
    pub fn node_addr(&self, id: NodeId) -> Option<Ipv4Addr> {
        self.node_addrs[id.0].first().copied()
    }

    /// 节点的全部接口地址。
    pub fn node_addrs(&self, id: NodeId) -> &[Ipv4Addr] {
        &self.node_addrs[id.0]
    }

    /// 节点在朝向 `neighbor` 的链路上的接口地址。
    pub fn iface_addr(&self, node: NodeId, neighbor: NodeId) -> Option<Ipv4Addr> {
        self.iface_addr.get(&(node, neighbor)).copied()
    }

    /// 地址归属的节点。
    pub fn addr_owner(&self, addr: Ipv4Addr) -> Option<NodeId> {
        self.addr_node.get(&addr).copied()
    }

    /// 已分配子网台账（每条双向链路一项）。
    pub fn subnets(&self) -> &[Subnet] {
        &self.subnets
    }

    /// from -> dst 的最短路径（含两端）。
    pub fn route_path(&mut self, from: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        self.routing.ensure_built(&self.adj);
        self.routing.path(from, dst)
    }

    /// 注册一条流：解析目的节点、路由与源地址，并登记遥测。
    ///
    /// 目的地址不可达不是错误（发出的包会被计为丢失）；重复注册同一
    /// flow id 是调用方的逻辑 bug。
    pub fn add_flow(&mut self, spec: FlowSpec) {
        assert!(
            !self.flows.contains_key(&spec.flow_id),
            "flow {:?} registered twice",
            spec.flow_id
        );

        let dst_node = self.addr_owner(spec.dst_addr);
        let route = dst_node.and_then(|d| self.route_path(spec.src, d));
        let src_addr = route
            .as_ref()
            .and_then(|r| r.get(1))
            .and_then(|&nh| self.iface_addr(spec.src, nh))
            .or_else(|| self.node_addr(spec.src))
            .unwrap_or(Ipv4Addr::UNSPECIFIED);

        debug!(
            flow_id = ?spec.flow_id,
            src = %src_addr,
            dst = %spec.dst_addr,
            reachable = route.is_some(),
            "注册流"
        );

        self.telemetry.register(
            spec.flow_id,
            spec.protocol,
            src_addr,
            spec.dst_addr,
            spec.dst_port,
        );
        self.flows.insert(
            spec.flow_id,
            FlowState {
                spec,
                route,
                src_addr,
            },
        );
    }

    /// 流描述符（拷贝）。
    pub fn flow_spec(&self, id: FlowId) -> Option<FlowSpec> {
        self.flows.get(&id).map(|st| st.spec)
    }

    /// 流注册时解析出的源地址。
    pub fn flow_src_addr(&self, id: FlowId) -> Option<Ipv4Addr> {
        self.flows.get(&id).map(|st| st.src_addr)
    }

    /// 发出一个属于 `flow_id` 的 packet：记账后沿缓存路由转发。
    #[tracing::instrument(skip(self, sim), fields(flow_id = ?flow_id))]
    pub fn send_flow_packet(&mut self, flow_id: FlowId, sim: &mut Simulator) {
        let st = self.flows.get(&flow_id).expect("flow registered");
        let spec = st.spec;
        let src_addr = st.src_addr;
        let route = st.route.clone();

        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);

        self.telemetry.on_sent(flow_id, spec.pkt_bytes as u64);

        let Some(route) = route else {
            // 目的不可达：预期的仿真结果，记损即可
            trace!("目的不可达，计入丢失");
            self.telemetry.on_dropped(flow_id, DropReason::Unreachable);
            return;
        };

        let pkt = Packet {
            id,
            flow_id,
            size_bytes: spec.pkt_bytes,
            src_addr,
            dst_addr: spec.dst_addr,
            dst_port: spec.dst_port,
            protocol: spec.protocol,
            route,
            hop: 0,
        };

        if !pkt.has_next() {
            // 源即目的：直接送达
            self.on_delivered(pkt);
            return;
        }
        self.forward_from(spec.src, pkt, sim);
    }

    /// 将数据包交付给节点处理
    #[tracing::instrument(skip(self, sim), fields(pkt_id = pkt.id, to = ?to))]
    pub fn deliver(&mut self, to: NodeId, pkt: Packet, sim: &mut Simulator) {
        trace!("📬 将数据包交付给节点处理");

        // 暂时把节点取出来，避免 &mut self 与 &mut node 的重叠借用。
        let mut node = self.nodes[to.0].take().expect("node exists");
        node.on_packet(pkt, sim, self);
        self.nodes[to.0] = Some(node);
    }

    /// 从指定节点转发数据包：出口链路空闲则立即发送，忙则入队，
    /// 队满则丢弃并计入所属流。
    #[tracing::instrument(skip(self, sim), fields(pkt_id = pkt.id, from = ?from, hop = pkt.hop))]
    pub fn forward_from(&mut self, from: NodeId, pkt: Packet, sim: &mut Simulator) {
        let to = pkt.next().expect("has_next checked by caller");
        let link_id = *self
            .edges
            .get(&(from, to))
            .unwrap_or_else(|| panic!("no link from {from:?} to {to:?}"));

        // 队列非空时即使链路恰好空闲也要排队，保持 FIFO 次序
        let now = sim.now();
        if self.links[link_id.0].busy_until > now || !self.links[link_id.0].queue.is_empty() {
            let link = &mut self.links[link_id.0];
            if let Err(dropped) = link.queue.enqueue(pkt) {
                debug!(
                    link_id = ?link_id,
                    q_bytes = link.queue.bytes(),
                    q_cap = link.queue.capacity_bytes(),
                    flow_id = ?dropped.flow_id,
                    "队列溢出，尾丢弃"
                );
                self.telemetry
                    .on_dropped(dropped.flow_id, DropReason::QueueOverflow);
            }
            return;
        }
        self.transmit(link_id, pkt, sim);
    }

    /// 在空闲链路上开始发送：占用链路到 depart 时刻，调度链路就绪与
    /// 到达事件。
    fn transmit(&mut self, link_id: LinkId, pkt: Packet, sim: &mut Simulator) {
        let link = &mut self.links[link_id.0];
        let now = sim.now();
        let tx_time = link.tx_time(pkt.size_bytes);
        let depart = now.plus(tx_time);
        link.busy_until = depart;
        let arrive = depart.plus(link.latency);
        let to = link.to;

        trace!(
            link_id = ?link_id,
            ?tx_time,
            ?depart,
            ?arrive,
            "链路开始发送"
        );

        sim.schedule(depart, LinkReady { link_id });
        sim.schedule(
            arrive,
            DeliverPacket {
                to,
                pkt: pkt.advance(),
            },
        );
    }

    /// 链路完成一次序列化发送后驱动队列出队。
    pub(crate) fn on_link_ready(&mut self, link_id: LinkId, sim: &mut Simulator) {
        if self.links[link_id.0].busy_until > sim.now() {
            return;
        }
        if let Some(pkt) = self.links[link_id.0].queue.dequeue() {
            self.transmit(link_id, pkt, sim);
        }
    }

    /// 数据包送达目的地时的处理
    #[tracing::instrument(skip(self), fields(pkt_id = pkt.id, flow_id = ?pkt.flow_id))]
    pub(crate) fn on_delivered(&mut self, pkt: Packet) {
        trace!(size_bytes = pkt.size_bytes, "✅ 数据包送达目的地");
        self.telemetry.on_delivered(pkt.flow_id, pkt.size_bytes as u64);
    }

    /// 防火墙丢包：计入所属流的丢失，而不是悄悄消失。
    pub(crate) fn on_firewall_drop(&mut self, pkt: Packet) {
        self.telemetry
            .on_dropped(pkt.flow_id, DropReason::FirewallBlocked);
    }

    /// 安装防火墙状态（缓解点唯一）。
    pub fn install_firewall(&mut self, fw: Firewall) {
        self.firewall = Some(fw);
    }

    pub fn firewall(&self) -> Option<&Firewall> {
        self.firewall.as_ref()
    }

    pub fn firewall_mut(&mut self) -> Option<&mut Firewall> {
        self.firewall.as_mut()
    }

    /// 对一个源地址的裁决；未安装防火墙时一律放行。
    pub(crate) fn firewall_verdict(&self, src: Ipv4Addr) -> Verdict {
        match &self.firewall {
            Some(fw) => fw.verdict(src),
            None => Verdict::Forward,
        }
    }
}
