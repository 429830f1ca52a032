//! DDoS 攻防仿真
//!
//! 构建固定拓扑（合法节点 + bot + 额外用户 + 可选防火墙），注入攻击
//! 与合法流量，按需启用缓解策略，运行到硬截止时刻后输出逐流统计。

use clap::Parser;
use floodsim_rs::firewall::{MitigationStrategy, apply_mitigation};
use floodsim_rs::net::{FlowId, NetWorld, Protocol};
use floodsim_rs::sim::{BotWiringSpec, MitigationSpec, ScenarioSpec, SimTime, Simulator};
use floodsim_rs::topo::{BotWiring, DdosOpts, build_ddos};
use floodsim_rs::traffic::{FlowSpec, register_flow};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "ddos-sim",
    about = "DDoS 攻防仿真：固定拓扑 + 攻击/合法流量 + 可选缓解"
)]
struct Args {
    /// Scenario JSON 文件；命令行参数优先于文件内容
    #[arg(long)]
    scenario: Option<PathBuf>,

    #[arg(long)]
    legitimate: Option<usize>,
    #[arg(long)]
    bots: Option<usize>,
    #[arg(long)]
    extras: Option<usize>,

    /// 接线方式：direct 或 firewall
    #[arg(long)]
    wiring: Option<String>,

    /// 缓解策略：off、null-route 或 inspect
    #[arg(long)]
    mitigation: Option<String>,

    /// 单个 bot 的攻击速率（bps）
    #[arg(long)]
    attack_rate_bps: Option<u64>,

    /// 单个合法用户的数据速率（bps）
    #[arg(long)]
    data_rate_bps: Option<u64>,

    /// 仿真时长（秒），到点硬截止
    #[arg(long)]
    duration_s: Option<u64>,

    /// 合法流量起始时刻（秒）
    #[arg(long)]
    legit_start_s: Option<u64>,

    /// 将统计快照写成 JSON 报告
    #[arg(long)]
    report_json: Option<PathBuf>,

    /// 打印每条流的统计行
    #[arg(long)]
    flow_stats: bool,
}

fn main() -> ExitCode {
    // 初始化 tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .with_target(true)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let spec = resolve_spec(args)?;

    let wiring = match spec.wiring() {
        BotWiringSpec::Direct => BotWiring::DirectToIngress,
        BotWiringSpec::Firewall => BotWiring::ThroughFirewall,
    };
    let strategy = match spec.mitigation() {
        MitigationSpec::Off => None,
        MitigationSpec::NullRoute => Some(MitigationStrategy::RouteSuppression),
        MitigationSpec::Inspect => Some(MitigationStrategy::InlineInspection),
    };

    let mut sim = Simulator::default();
    let mut world = NetWorld::default();

    let opts = DdosOpts {
        legitimate: spec.legitimate(),
        bots: spec.bots(),
        extras: spec.extras(),
        wiring,
        ..DdosOpts::default()
    };
    let topo = build_ddos(&mut world, &opts)?;

    // 缓解必须在流量开始之前就位
    if let Some(strategy) = strategy {
        apply_mitigation(&mut world.net, &topo, strategy)?;
    }

    let duration = SimTime::from_secs(spec.duration_s());
    if let Some(victim_addr) = topo.victim_addr {
        let mut next_flow = 1u64;
        for &bot in &topo.bots {
            register_flow(
                &mut world.net,
                &mut sim,
                FlowSpec::attack(
                    FlowId(next_flow),
                    bot,
                    victim_addr,
                    spec.attack_rate_bps(),
                    spec.attack_pkt_bytes(),
                    duration,
                ),
            )?;
            next_flow += 1;
        }
        // 运行时长短于合法流量起步时刻时收拢到截止点：start == stop
        // 的流是合法的零发送
        let legit_start = SimTime::from_secs(spec.legit_start_s()).min(duration);
        for &extra in &topo.extras {
            register_flow(
                &mut world.net,
                &mut sim,
                FlowSpec::legit(
                    FlowId(next_flow),
                    extra,
                    victim_addr,
                    spec.data_rate_bps(),
                    spec.data_pkt_bytes(),
                    legit_start,
                    duration,
                ),
            )?;
            next_flow += 1;
        }
    }

    sim.run_until(duration, &mut world);

    let snap = world.net.telemetry.snapshot();

    if args.flow_stats {
        for f in &snap.flows {
            println!(
                "flow_stats flow={} proto={} src={} dst={} tx_pkts={} tx_bytes={} rx_pkts={} rx_bytes={} lost={} firewall_drops={}",
                f.flow_id.0,
                proto_str(f.protocol),
                f.src_addr,
                f.dst_addr,
                f.tx_pkts,
                f.tx_bytes,
                f.rx_pkts,
                f.rx_bytes,
                f.lost_pkts,
                f.firewall_drops,
            );
        }
    }

    println!(
        "done @ {:.3}s, attack_tx={} attack_rx={} legit_tx={} legit_rx={} lost_udp={} lost_tcp={}",
        sim.now().as_secs_f64(),
        snap.tx_bytes(Protocol::Udp),
        snap.rx_bytes(Protocol::Udp),
        snap.tx_bytes(Protocol::Tcp),
        snap.rx_bytes(Protocol::Tcp),
        snap.lost_pkts(Protocol::Udp),
        snap.lost_pkts(Protocol::Tcp),
    );

    if let Some(path) = &args.report_json {
        fs::write(path, serde_json::to_string_pretty(&snap)?)?;
    }
    Ok(())
}

fn proto_str(p: Protocol) -> &'static str {
    match p {
        Protocol::Udp => "udp",
        Protocol::Tcp => "tcp",
    }
}

/// 合并场景文件与命令行参数（命令行优先）。
fn resolve_spec(args: &Args) -> Result<ScenarioSpec, Box<dyn std::error::Error>> {
    let mut spec = match &args.scenario {
        Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
        None => ScenarioSpec::default(),
    };

    if args.legitimate.is_some() {
        spec.legitimate = args.legitimate;
    }
    if args.bots.is_some() {
        spec.bots = args.bots;
    }
    if args.extras.is_some() {
        spec.extras = args.extras;
    }
    if let Some(w) = &args.wiring {
        spec.wiring = Some(match w.as_str() {
            "direct" => BotWiringSpec::Direct,
            "firewall" => BotWiringSpec::Firewall,
            other => return Err(format!("unknown wiring: {other}").into()),
        });
    }
    if let Some(m) = &args.mitigation {
        spec.mitigation = Some(match m.as_str() {
            "off" => MitigationSpec::Off,
            "null-route" => MitigationSpec::NullRoute,
            "inspect" => MitigationSpec::Inspect,
            other => return Err(format!("unknown mitigation: {other}").into()),
        });
    }
    if args.attack_rate_bps.is_some() {
        spec.attack_rate_bps = args.attack_rate_bps;
    }
    if args.data_rate_bps.is_some() {
        spec.data_rate_bps = args.data_rate_bps;
    }
    if args.duration_s.is_some() {
        spec.duration_s = args.duration_s;
    }
    if args.legit_start_s.is_some() {
        spec.legit_start_s = args.legit_start_s;
    }
    Ok(spec)
}
