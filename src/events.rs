//! # events
//!
//! Defines [`RelayEvent`] — ทุก Event ที่ระบบ Broadcast ออกไปผ่าน WebSocket
//! ไปยัง Monitor clients (`/ws/monitor`)
//!
//! ใช้ `tokio::sync::broadcast::Sender<String>` โดยแปลง RelayEvent เป็น JSON
//! String ก่อนส่ง เพื่อหลีกเลี่ยง Clone constraints ที่ซับซ้อน

use serde::Serialize;

use crate::models::Signal;
use crate::relay::RelayStats;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelayEvent {
    /// Master ส่ง Signal ใหม่เข้ามา — ทุก Slave จะเห็นใน poll ถัดไป
    SignalSubmitted {
        signal: Box<Signal>,
    },

    /// Slave ยืนยันว่า execute แล้ว — Signal นี้จะไม่โผล่ใน poll ของ Slave นั้นอีก
    SignalExecuted {
        consumer_id: String,
        signal_id:   String,
    },

    /// Frame แรกที่ Monitor client ได้รับหลังต่อ WebSocket
    Snapshot {
        #[serde(flatten)]
        stats: RelayStats,
    },

    /// สถิติ Server (ส่งทุกครั้งที่มีคน poll `/api/monitor/stats`)
    ServerStats {
        #[serde(flatten)]
        stats: RelayStats,
    },
}

impl RelayEvent {
    /// แปลงเป็น JSON String สำหรับส่งผ่าน WebSocket
    #[inline]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"event":"SERIALIZATION_ERROR"}"#.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_event_tagging() {
        let json = RelayEvent::SignalExecuted {
            consumer_id: "slaveA".into(),
            signal_id:   "M1_1_OPEN_0_0".into(),
        }
        .to_json();
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["event"], "SIGNAL_EXECUTED");
        assert_eq!(v["consumer_id"], "slaveA");

        let json = RelayEvent::ServerStats {
            stats: RelayStats { signal_count: 3, consumer_count: 1, acknowledgment_count: 2 },
        }
        .to_json();
        let v: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["event"], "SERVER_STATS");
        assert_eq!(v["signal_count"], 3);
    }
}
