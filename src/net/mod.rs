//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、链路、地址、数据包与网络拓扑。

// 子模块声明
mod addr;
mod deliver_packet;
mod id;
mod link;
mod link_ready;
mod net_world;
mod network;
mod node;
mod packet;
mod routing;

// 重新导出公共接口
pub use addr::{AddrError, Subnet, SubnetAllocator};
pub use deliver_packet::DeliverPacket;
pub use id::{FlowId, LinkId, NodeId};
pub use link::{Link, LinkClass};
pub use link_ready::LinkReady;
pub use net_world::NetWorld;
pub use network::Network;
pub use node::{Host, FirewallNode, Node, NodeRole};
pub use packet::{Packet, Protocol};
pub use routing::RoutingTable;
