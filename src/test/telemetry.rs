use crate::net::{FlowId, Protocol};
use crate::telemetry::{DropReason, FlowTelemetry, TelemetrySnapshot};
use serde_json::Value;
use std::net::Ipv4Addr;

fn src(i: u8) -> Ipv4Addr {
    Ipv4Addr::new(10, 0, 0, i)
}

const DST: Ipv4Addr = Ipv4Addr::new(10, 0, 1, 2);

#[test]
fn counters_accumulate_per_flow() {
    let mut tel = FlowTelemetry::default();
    tel.register(FlowId(1), Protocol::Udp, src(1), DST, 9001);
    tel.register(FlowId(2), Protocol::Tcp, src(2), DST, 9000);

    tel.on_sent(FlowId(1), 512);
    tel.on_sent(FlowId(1), 512);
    tel.on_delivered(FlowId(1), 512);
    tel.on_sent(FlowId(2), 512);
    tel.on_delivered(FlowId(2), 512);

    let snap = tel.snapshot();
    let f1 = snap.flow(FlowId(1)).expect("flow 1");
    assert_eq!(f1.tx_pkts, 2);
    assert_eq!(f1.tx_bytes, 1024);
    assert_eq!(f1.rx_pkts, 1);
    assert_eq!(f1.rx_bytes, 512);
    assert_eq!(f1.lost_pkts, 0);

    let f2 = snap.flow(FlowId(2)).expect("flow 2");
    assert_eq!(f2.rx_bytes, 512);
}

#[test]
fn firewall_drops_are_attributed_to_the_owning_flow() {
    let mut tel = FlowTelemetry::default();
    tel.register(FlowId(9), Protocol::Udp, src(9), DST, 9001);

    tel.on_sent(FlowId(9), 512);
    tel.on_dropped(FlowId(9), DropReason::FirewallBlocked);
    tel.on_sent(FlowId(9), 512);
    tel.on_dropped(FlowId(9), DropReason::QueueOverflow);
    tel.on_sent(FlowId(9), 512);
    tel.on_dropped(FlowId(9), DropReason::Unreachable);

    let snap = tel.snapshot();
    let f = snap.flow(FlowId(9)).expect("flow 9");
    assert_eq!(f.lost_pkts, 3);
    // 只有防火墙丢弃计入 firewall_drops
    assert_eq!(f.firewall_drops, 1);
    assert_eq!(f.rx_pkts, 0);
}

#[test]
fn events_for_unregistered_flows_are_ignored() {
    let mut tel = FlowTelemetry::default();
    tel.on_sent(FlowId(42), 512);
    tel.on_delivered(FlowId(42), 512);
    tel.on_dropped(FlowId(42), DropReason::QueueOverflow);
    assert!(tel.snapshot().flows.is_empty());
}

#[test]
fn snapshot_is_sorted_by_flow_id() {
    let mut tel = FlowTelemetry::default();
    for id in [7u64, 3, 11, 1] {
        tel.register(FlowId(id), Protocol::Udp, src(id as u8), DST, 9001);
    }
    let ids: Vec<u64> = tel.snapshot().flows.iter().map(|f| f.flow_id.0).collect();
    assert_eq!(ids, vec![1, 3, 7, 11]);
}

#[test]
fn aggregates_split_by_protocol() {
    let mut tel = FlowTelemetry::default();
    tel.register(FlowId(1), Protocol::Udp, src(1), DST, 9001);
    tel.register(FlowId(2), Protocol::Tcp, src(2), DST, 9000);
    tel.on_sent(FlowId(1), 1000);
    tel.on_delivered(FlowId(1), 1000);
    tel.on_sent(FlowId(2), 300);
    tel.on_dropped(FlowId(2), DropReason::QueueOverflow);

    let snap = tel.snapshot();
    assert_eq!(snap.tx_bytes(Protocol::Udp), 1000);
    assert_eq!(snap.rx_bytes(Protocol::Udp), 1000);
    assert_eq!(snap.tx_bytes(Protocol::Tcp), 300);
    assert_eq!(snap.rx_bytes(Protocol::Tcp), 0);
    assert_eq!(snap.lost_pkts(Protocol::Tcp), 1);
    assert_eq!(snap.lost_pkts(Protocol::Udp), 0);
}

#[test]
fn snapshot_serializes_for_external_reporting() {
    let mut tel = FlowTelemetry::default();
    tel.register(FlowId(1), Protocol::Udp, src(1), DST, 9001);
    tel.on_sent(FlowId(1), 512);
    tel.on_dropped(FlowId(1), DropReason::FirewallBlocked);
    let snap = tel.snapshot();

    let raw = serde_json::to_string(&snap).expect("serialize snapshot");
    let v: Value = serde_json::from_str(&raw).expect("parse snapshot json");
    let flows = v.get("flows").and_then(|f| f.as_array()).expect("flows array");
    assert_eq!(flows.len(), 1);
    let f = &flows[0];
    assert_eq!(f.get("flow_id").and_then(|x| x.as_u64()), Some(1));
    assert_eq!(f.get("protocol").and_then(|x| x.as_str()), Some("udp"));
    assert_eq!(f.get("src_addr").and_then(|x| x.as_str()), Some("10.0.0.1"));
    assert_eq!(f.get("tx_bytes").and_then(|x| x.as_u64()), Some(512));
    assert_eq!(f.get("firewall_drops").and_then(|x| x.as_u64()), Some(1));

    let decoded: TelemetrySnapshot = serde_json::from_str(&raw).expect("deserialize snapshot");
    assert_eq!(decoded, snap);
}
