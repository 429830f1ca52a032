//! 路由表
//!
//! packet 需要在发出前携带完整的 `route`（节点序列）。本模块为每个
//! (from, dst) 预计算最短跳数下一跳；拓扑是静态的，同一 (from, dst)
//! 总是得到同一条路径（按邻接插入顺序取第一个候选），保证两次运行
//! 产生逐字节相同的遥测快照。

use std::collections::{HashMap, VecDeque};

use super::id::NodeId;

#[derive(Debug, Default, Clone)]
pub struct RoutingTable {
    dirty: bool,
    /// (from, dst) -> 最短路径下一跳
    next_hop: HashMap<(NodeId, NodeId), NodeId>,
}

impl RoutingTable {
    pub fn new() -> Self {
        Self {
            dirty: true,
            next_hop: HashMap::new(),
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// 确保路由表基于当前拓扑是最新的。
    ///
    /// `adj[from]` 为 `from` 的所有出边邻居。构建器只创建成对的双向
    /// 链路，因此邻接表同时可当作反向图做 BFS。
    pub fn ensure_built(&mut self, adj: &[Vec<NodeId>]) {
        if !self.dirty {
            return;
        }

        let n = adj.len();
        self.next_hop.clear();

        // 对每个 dst 做 BFS 得到最短跳数距离，再为每个 from 选出
        // 第一个满足 dist[next] == dist[from] - 1 的邻居。
        let mut dist: Vec<i32> = vec![i32::MAX; n];
        let mut q: VecDeque<NodeId> = VecDeque::new();

        for dst_idx in 0..n {
            dist.fill(i32::MAX);
            q.clear();

            let dst = NodeId(dst_idx);
            dist[dst_idx] = 0;
            q.push_back(dst);

            while let Some(v) = q.pop_front() {
                let dv = dist[v.0];
                for &pred in &adj[v.0] {
                    if dist[pred.0] == i32::MAX {
                        dist[pred.0] = dv.saturating_add(1);
                        q.push_back(pred);
                    }
                }
            }

            for from_idx in 0..n {
                let from = NodeId(from_idx);
                if from == dst {
                    continue;
                }
                let df = dist[from_idx];
                if df == i32::MAX {
                    continue; // unreachable
                }
                for &nh in &adj[from_idx] {
                    if dist[nh.0] == df - 1 {
                        self.next_hop.insert((from, dst), nh);
                        break;
                    }
                }
            }
        }

        self.dirty = false;
    }

    /// 获取 (from, dst) 的下一跳。
    pub fn next_hop(&self, from: NodeId, dst: NodeId) -> Option<NodeId> {
        self.next_hop.get(&(from, dst)).copied()
    }

    /// 展开 from -> dst 的完整路径（含两端）。不可达返回 None。
    pub fn path(&self, from: NodeId, dst: NodeId) -> Option<Vec<NodeId>> {
        if from == dst {
            return Some(vec![from]);
        }
        let mut route = vec![from];
        let mut cur = from;
        while cur != dst {
            cur = self.next_hop(cur, dst)?;
            route.push(cur);
        }
        Some(route)
    }
}
