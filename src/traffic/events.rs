//! 流量生成事件
//!
//! StartFlow 开启一个 on 周期；SendTick 周期性发包并自我续期，on 周期
//! 结束后把接力棒交回 StartFlow。所有事件在 `stop` 时刻之后静默终止。

use super::flow::FlowSpec;
use crate::net::{FlowId, NetWorld};
use crate::sim::{Event, SimTime, Simulator, World};
use tracing::trace;

fn flow_spec(world: &mut dyn World, flow_id: FlowId) -> (FlowSpec, &mut NetWorld) {
    let w = world
        .as_any_mut()
        .downcast_mut::<NetWorld>()
        .expect("world must be NetWorld");
    let spec = w.net.flow_spec(flow_id).expect("flow registered");
    (spec, w)
}

/// 事件：流（或一个新的 on 周期）开始。
#[derive(Debug)]
pub struct StartFlow {
    pub flow_id: FlowId,
}

impl Event for StartFlow {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let StartFlow { flow_id } = *self;
        let (spec, _) = flow_spec(world, flow_id);

        // start == stop 的流在这里直接终止：零发送，不是错误
        if sim.now() >= spec.stop {
            trace!(?flow_id, "流生命期已结束，零发送");
            return;
        }

        let burst_end = spec.effective_on().map(|d| sim.now().plus(d));
        trace!(?flow_id, ?burst_end, "开始 on 周期");
        sim.schedule(sim.now(), SendTick { flow_id, burst_end });
    }
}

/// 事件：发出一个 packet 并续期。
#[derive(Debug)]
pub struct SendTick {
    pub flow_id: FlowId,
    /// 当前 on 周期的结束时刻；None 表示常开
    pub burst_end: Option<SimTime>,
}

impl Event for SendTick {
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let SendTick { flow_id, burst_end } = *self;
        let (spec, w) = flow_spec(world, flow_id);

        if sim.now() >= spec.stop {
            trace!(?flow_id, "到达停止时刻，流终止");
            return;
        }

        if let Some(be) = burst_end {
            if sim.now() >= be {
                // on 周期结束：off 周期后再开下一轮
                let resume = be.plus(spec.off_duration).max(sim.now());
                if resume < spec.stop {
                    trace!(?flow_id, ?resume, "进入 off 周期");
                    sim.schedule(resume, StartFlow { flow_id });
                }
                return;
            }
        }

        w.net.send_flow_packet(flow_id, sim);
        sim.schedule(sim.now().plus(spec.send_gap()), SendTick { flow_id, burst_end });
    }
}
