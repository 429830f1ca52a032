//! 实验场景描述
//!
//! 外部配置协作方（CLI / JSON 文件）用这组 serde 类型描述一次攻防实验：
//! 节点数量、接线方式、缓解策略、流量速率与时长。缺省值复刻原始实验
//! （4 个合法节点、50 个 bot、6 个额外用户、1 Mb/s、60 秒）。

use serde::{Deserialize, Serialize};

/// bot 接线方式
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BotWiringSpec {
    /// bot 直连入口合法节点
    Direct,
    /// bot 经由专用防火墙节点接入
    Firewall,
}

/// 缓解策略选择
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MitigationSpec {
    /// 不做任何缓解（基线）
    Off,
    /// 路由抑制：为每个已知 bot 源地址安装黑洞路由
    NullRoute,
    /// 在线检查：防火墙逐包比对源地址
    Inspect,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioSpec {
    pub schema_version: u32,
    #[serde(default)]
    pub legitimate: Option<usize>,
    #[serde(default)]
    pub bots: Option<usize>,
    #[serde(default)]
    pub extras: Option<usize>,
    #[serde(default)]
    pub wiring: Option<BotWiringSpec>,
    #[serde(default)]
    pub mitigation: Option<MitigationSpec>,
    /// 单个 bot 的攻击速率（bps）
    #[serde(default)]
    pub attack_rate_bps: Option<u64>,
    /// 单个合法用户的数据速率（bps）
    #[serde(default)]
    pub data_rate_bps: Option<u64>,
    #[serde(default)]
    pub attack_pkt_bytes: Option<u32>,
    #[serde(default)]
    pub data_pkt_bytes: Option<u32>,
    /// 仿真时长（秒），到点硬截止
    #[serde(default)]
    pub duration_s: Option<u64>,
    /// 合法流量起始时刻（秒）：网络稳定后才开始正常使用
    #[serde(default)]
    pub legit_start_s: Option<u64>,
}

impl Default for ScenarioSpec {
    fn default() -> Self {
        Self {
            schema_version: 1,
            legitimate: None,
            bots: None,
            extras: None,
            wiring: None,
            mitigation: None,
            attack_rate_bps: None,
            data_rate_bps: None,
            attack_pkt_bytes: None,
            data_pkt_bytes: None,
            duration_s: None,
            legit_start_s: None,
        }
    }
}

impl ScenarioSpec {
    pub fn legitimate(&self) -> usize {
        self.legitimate.unwrap_or(4)
    }
    pub fn bots(&self) -> usize {
        self.bots.unwrap_or(50)
    }
    pub fn extras(&self) -> usize {
        self.extras.unwrap_or(6)
    }
    pub fn wiring(&self) -> BotWiringSpec {
        self.wiring.unwrap_or(BotWiringSpec::Direct)
    }
    pub fn mitigation(&self) -> MitigationSpec {
        self.mitigation.unwrap_or(MitigationSpec::Off)
    }
    pub fn attack_rate_bps(&self) -> u64 {
        self.attack_rate_bps.unwrap_or(1_000_000)
    }
    pub fn data_rate_bps(&self) -> u64 {
        self.data_rate_bps.unwrap_or(1_000_000)
    }
    pub fn attack_pkt_bytes(&self) -> u32 {
        self.attack_pkt_bytes.unwrap_or(512)
    }
    pub fn data_pkt_bytes(&self) -> u32 {
        self.data_pkt_bytes.unwrap_or(512)
    }
    pub fn duration_s(&self) -> u64 {
        self.duration_s.unwrap_or(60)
    }
    pub fn legit_start_s(&self) -> u64 {
        self.legit_start_s.unwrap_or(5)
    }
}
