//! 缓解引擎
//!
//! 区分攻击流量与合法流量并压制前者。两种可互换的策略：
//!
//! - 路由抑制：地址分配完成后、流量开始前，为每个已知 bot 源地址一次
//!   性安装黑洞路由（无下一跳），整个运行期间静态不变；
//! - 在线检查：缓解点对每个到达的 packet 比对源地址集合，命中即丢弃。
//!
//! 对本仿真中封闭枚举的 bot 集合，两种策略产生完全相同的丢弃行为；
//! 但只有在线检查能推广到运行期动态发现的地址集（`block_source` 即为
//! 该扩展点）。规则按源地址精确匹配，只增不减。

use std::collections::HashMap;
use std::net::Ipv4Addr;

use tracing::{debug, info};

use crate::net::{Network, NodeId};
use crate::topo::{ConfigError, DdosTopology};

/// 缓解策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MitigationStrategy {
    /// 为已知 bot 地址安装静态黑洞路由
    RouteSuppression,
    /// 缓解点逐包检查源地址
    InlineInspection,
}

/// 规则动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleAction {
    /// 在线检查命中后丢弃
    Drop,
    /// 黑洞路由：无有效下一跳，静默丢弃
    NullRoute,
}

/// 一条防火墙规则：被封锁的源地址与对应动作。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirewallRule {
    pub src: Ipv4Addr,
    pub action: RuleAction,
}

/// 对单个 packet 的裁决。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Forward,
    Drop,
}

/// 缓解点的防火墙状态。
///
/// 规则集是集合语义：同一地址重复安装与安装一次效果相同。
#[derive(Debug)]
pub struct Firewall {
    node: NodeId,
    rules: HashMap<Ipv4Addr, RuleAction>,
}

impl Firewall {
    pub fn new(node: NodeId) -> Self {
        Self {
            node,
            rules: HashMap::new(),
        }
    }

    /// 防火墙所在的节点。
    pub fn node(&self) -> NodeId {
        self.node
    }

    /// 安装一条规则。返回该地址是否是首次被封锁（幂等）。
    pub fn install(&mut self, rule: FirewallRule) -> bool {
        let fresh = self.rules.insert(rule.src, rule.action).is_none();
        if fresh {
            debug!(src = %rule.src, action = ?rule.action, "安装防火墙规则");
        }
        fresh
    }

    /// 在线路径的运行期封锁入口：动态发现的源地址从这里加入。
    /// 规则只增不减——运行期间没有解封。
    pub fn block_source(&mut self, src: Ipv4Addr) -> bool {
        self.install(FirewallRule {
            src,
            action: RuleAction::Drop,
        })
    }

    pub fn is_blocked(&self, src: Ipv4Addr) -> bool {
        self.rules.contains_key(&src)
    }

    /// 源地址精确匹配：命中任一规则（Drop 或黑洞）都判丢弃。
    pub fn verdict(&self, src: Ipv4Addr) -> Verdict {
        if self.rules.contains_key(&src) {
            Verdict::Drop
        } else {
            Verdict::Forward
        }
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

/// 按选定策略在拓扑的缓解点上启用缓解。
///
/// 必须在流量开始之前调用；两种策略都要求 through-firewall 接线，
/// 否则是致命的配置错误（没有可安装规则的缓解点）。
pub fn apply_mitigation(
    net: &mut Network,
    topo: &DdosTopology,
    strategy: MitigationStrategy,
) -> Result<(), ConfigError> {
    let Some(fw_node) = topo.firewall else {
        return Err(ConfigError::MitigationWithoutFirewall);
    };

    let mut fw = Firewall::new(fw_node);
    match strategy {
        MitigationStrategy::RouteSuppression => {
            // bot 地址在构建期即全部已知：一次性安装，运行期不再变化
            for &addr in &topo.bot_addrs {
                fw.install(FirewallRule {
                    src: addr,
                    action: RuleAction::NullRoute,
                });
            }
        }
        MitigationStrategy::InlineInspection => {
            // 同一个封闭集合，但走运行期封锁入口——动态检测器接在这里
            for &addr in &topo.bot_addrs {
                fw.block_source(addr);
            }
        }
    }

    info!(
        strategy = ?strategy,
        rules = fw.rule_count(),
        node = ?fw_node,
        "🛡️  缓解已启用"
    );
    net.install_firewall(fw);
    Ok(())
}
