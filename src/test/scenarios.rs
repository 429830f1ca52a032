use crate::firewall::{MitigationStrategy, apply_mitigation};
use crate::net::{FlowId, NetWorld, Protocol};
use crate::sim::{SimTime, Simulator};
use crate::telemetry::TelemetrySnapshot;
use crate::topo::{BotWiring, DdosOpts, build_ddos};
use crate::traffic::{FlowSpec, register_flow};

// 性质与规模无关：用小流量 / 短时长保持测试轻快
pub(crate) const ATTACK_RATE_BPS: u64 = 204_800; // 512 B 包每 20 ms 一个
pub(crate) const DATA_RATE_BPS: u64 = 102_400; // 512 B 包每 40 ms 一个

pub(crate) struct RunCfg {
    pub bots: usize,
    pub extras: usize,
    pub wiring: BotWiring,
    pub strategy: Option<MitigationStrategy>,
    pub duration: SimTime,
}

/// 跑一轮完整实验：建拓扑、按需启用缓解、注册流量、硬截止运行。
/// 攻击流 id 从 1 起，合法流 id 从 1000 起（两组流在不同配置下可比）。
pub(crate) fn run_ddos(cfg: &RunCfg) -> TelemetrySnapshot {
    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let opts = DdosOpts {
        legitimate: 4,
        bots: cfg.bots,
        extras: cfg.extras,
        wiring: cfg.wiring,
        ..DdosOpts::default()
    };
    let topo = build_ddos(&mut world, &opts).expect("build topology");
    if let Some(strategy) = cfg.strategy {
        apply_mitigation(&mut world.net, &topo, strategy).expect("apply mitigation");
    }

    let victim_addr = topo.victim_addr.expect("victim has an address");
    for (i, &bot) in topo.bots.iter().enumerate() {
        register_flow(
            &mut world.net,
            &mut sim,
            FlowSpec::attack(
                FlowId(1 + i as u64),
                bot,
                victim_addr,
                ATTACK_RATE_BPS,
                512,
                cfg.duration,
            ),
        )
        .expect("register attack flow");
    }
    for (i, &extra) in topo.extras.iter().enumerate() {
        register_flow(
            &mut world.net,
            &mut sim,
            FlowSpec::legit(
                FlowId(1000 + i as u64),
                extra,
                victim_addr,
                DATA_RATE_BPS,
                512,
                SimTime::from_millis(500),
                cfg.duration,
            ),
        )
        .expect("register legit flow");
    }

    sim.run_until(cfg.duration, &mut world);
    world.net.telemetry.snapshot()
}

#[test]
fn unmitigated_attack_floods_but_is_capacity_bound() {
    let snap = run_ddos(&RunCfg {
        bots: 5,
        extras: 0,
        wiring: BotWiring::DirectToIngress,
        strategy: None,
        duration: SimTime::from_secs(2),
    });

    let tx = snap.tx_bytes(Protocol::Udp);
    let rx = snap.rx_bytes(Protocol::Udp);
    assert!(rx > 0, "without mitigation attack bytes must get through");
    // 5 × 204.8 kbps 挤进 500 kbps 的核心链路：必然有容量性丢包
    assert!(rx < tx, "bottleneck must shed load: tx={tx} rx={rx}");
    assert!(snap.lost_pkts(Protocol::Udp) > 0);
}

#[test]
fn route_suppression_zeroes_attack_and_spares_legit_traffic() {
    let mitigated = run_ddos(&RunCfg {
        bots: 5,
        extras: 2,
        wiring: BotWiring::ThroughFirewall,
        strategy: Some(MitigationStrategy::RouteSuppression),
        duration: SimTime::from_secs(2),
    });
    let unmitigated = run_ddos(&RunCfg {
        bots: 5,
        extras: 2,
        wiring: BotWiring::ThroughFirewall,
        strategy: None,
        duration: SimTime::from_secs(2),
    });
    let no_bot_baseline = run_ddos(&RunCfg {
        bots: 0,
        extras: 2,
        wiring: BotWiring::ThroughFirewall,
        strategy: None,
        duration: SimTime::from_secs(2),
    });

    // 缓解前攻击字节严格为正，缓解后恰好为零
    assert!(unmitigated.rx_bytes(Protocol::Udp) > 0);
    assert_eq!(mitigated.rx_bytes(Protocol::Udp), 0);
    for f in mitigated.flows.iter().filter(|f| f.protocol == Protocol::Udp) {
        assert_eq!(f.rx_pkts, 0, "bot flow {:?} leaked through", f.flow_id);
        assert!(f.tx_pkts > 0);
        assert!(f.firewall_drops > 0, "drops must be attributed to the flow");
    }

    // 合法流量与无 bot 基线逐字节一致：没有误伤
    for i in 0..2u64 {
        let id = FlowId(1000 + i);
        let a = mitigated.flow(id).expect("legit flow (mitigated run)");
        let b = no_bot_baseline.flow(id).expect("legit flow (baseline run)");
        assert_eq!(a.rx_bytes, b.rx_bytes, "collateral damage on {id:?}");
        assert_eq!(a.lost_pkts, b.lost_pkts);
    }
}

#[test]
fn identical_configs_produce_identical_snapshots() {
    let cfg = RunCfg {
        bots: 4,
        extras: 3,
        wiring: BotWiring::ThroughFirewall,
        strategy: Some(MitigationStrategy::InlineInspection),
        duration: SimTime::from_secs(2),
    };
    let first = run_ddos(&cfg);
    let second = run_ddos(&cfg);
    assert_eq!(first, second);

    let a = serde_json::to_string(&first).expect("serialize snapshot");
    let b = serde_json::to_string(&second).expect("serialize snapshot");
    assert_eq!(a, b, "snapshots must serialize byte-identically");
}
