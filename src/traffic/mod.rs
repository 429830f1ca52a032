//! 流量生成
//!
//! 把一条流描述（速率、包长、起止时刻、on/off 周期）翻译成调度器上的
//! 定时事件：到点开始、按速率周期发包、到点停止。攻击流与合法流共用
//! 同一套机制，只是速率 / 协议 / 起始时刻不同。

mod events;
mod flow;

pub use events::{SendTick, StartFlow};
pub use flow::{FlowSpec, TCP_SINK_PORT, UDP_SINK_PORT, register_flow};
