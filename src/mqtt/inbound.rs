use serde::Deserialize;

use crate::config::Config;
use crate::radar::{SettingsPatch, ZoneStatusNotification};
use crate::tuya::{DpFrame, DpRecord, TuyaCommand};

use super::client::MqttMessage;

/// A message from the broker, routed by topic and decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Tuya(DpFrame),
    IasZone(ZoneStatusNotification),
    Settings(SettingsPatch),
}

/// Raw cluster command as forwarded by the coordinator; `payload` is hex.
#[derive(Deserialize)]
struct CommandEnvelope {
    command: u8,
    payload: String,
}

impl Inbound {
    /// `Ok(None)` for topics this bridge does not handle.
    pub fn parse(msg: &MqttMessage, config: &Config) -> Result<Option<Self>, String> {
        let inbound = if msg.topic == config.tuya_response_topic() {
            Self::Tuya(parse_tuya(&msg.payload)?)
        } else if msg.topic == config.ias_zone_topic() {
            Self::IasZone(
                serde_json::from_str(&msg.payload)
                    .map_err(|e| format!("Invalid IAS zone notification: {e}"))?,
            )
        } else if msg.topic == config.settings_topic() {
            Self::Settings(
                serde_json::from_str(&msg.payload)
                    .map_err(|e| format!("Invalid settings patch: {e}"))?,
            )
        } else {
            return Ok(None);
        };
        Ok(Some(inbound))
    }
}

/// Accepts decoded records (`{..}` or `[{..}, ..]`), a command envelope
/// (`{"command": 1, "payload": "<hex>"}`) or the bare hex cluster payload.
fn parse_tuya(payload: &str) -> Result<DpFrame, String> {
    let payload = payload.trim();
    let json = |e: serde_json::Error| format!("Invalid JSON payload: {e}");

    let records: Vec<DpRecord> = match payload.chars().next() {
        Some('[') => serde_json::from_str(payload).map_err(json)?,
        Some('{') => {
            let value: serde_json::Value = serde_json::from_str(payload).map_err(json)?;
            if value.get("command").is_some() {
                let envelope: CommandEnvelope = serde_json::from_value(value).map_err(json)?;
                return parse_command(&envelope);
            }
            vec![serde_json::from_value(value).map_err(json)?]
        }
        Some('"') => {
            let hex_str: String = serde_json::from_str(payload).map_err(json)?;
            return parse_hex(&hex_str);
        }
        _ => return parse_hex(payload),
    };

    if records.is_empty() {
        return Err("No data points in payload".into());
    }
    Ok(DpFrame {
        status: 0,
        transid: 0,
        records,
    })
}

fn parse_command(envelope: &CommandEnvelope) -> Result<DpFrame, String> {
    match TuyaCommand::from_code(envelope.command) {
        Some(cmd) if cmd.is_from_device() => parse_hex(&envelope.payload),
        Some(cmd) => Err(format!("{cmd:?} is not a device report")),
        None => Err(format!("Unknown command 0x{:02x}", envelope.command)),
    }
}

fn parse_hex(hex_str: &str) -> Result<DpFrame, String> {
    let bytes = hex::decode(hex_str.trim()).map_err(|e| format!("Invalid hex payload: {e}"))?;
    DpFrame::parse(&bytes).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    const RESPONSE_TOPIC: &str = "tuya/hallway_radar/tuya/response";

    fn msg(topic: &str, payload: &str) -> MqttMessage {
        MqttMessage {
            topic: topic.to_string(),
            payload: payload.to_string(),
        }
    }

    fn tuya_frame(payload: &str) -> DpFrame {
        match Inbound::parse(&msg(RESPONSE_TOPIC, payload), &test_config()) {
            Ok(Some(Inbound::Tuya(frame))) => frame,
            other => panic!("expected tuya frame for {payload}, got {other:?}"),
        }
    }

    fn tuya_error(payload: &str) -> String {
        match Inbound::parse(&msg(RESPONSE_TOPIC, payload), &test_config()) {
            Err(e) => e,
            other => panic!("expected error for {payload}, got {other:?}"),
        }
    }

    #[test]
    fn decoded_record() {
        let frame = tuya_frame(r#"{"dp":105,"datatype":4,"data":[1]}"#);
        assert_eq!(
            frame.records,
            vec![DpRecord {
                dp: 105,
                datatype: 4,
                data: vec![1],
            }]
        );
    }

    #[test]
    fn decoded_record_list() {
        let frame = tuya_frame(
            r#"[{"dp":105,"datatype":4,"data":[1]},{"dp":104,"datatype":2,"data":[0,0,0,9]}]"#,
        );
        let dps: Vec<u8> = frame.records.iter().map(|r| r.dp).collect();
        assert_eq!(dps, vec![105, 104]);
    }

    #[test]
    fn raw_hex_frame() {
        for payload in [
            "00016d02000400000096",
            " 00016d02000400000096\n",
            "\"00016d02000400000096\"",
            r#"{"cluster":61184,"command":2,"payload":"00016d02000400000096"}"#,
        ] {
            let frame = tuya_frame(payload);
            assert_eq!(frame.transid, 1);
            assert_eq!(frame.records[0].dp, 109);
            assert_eq!(frame.records[0].data, vec![0, 0, 0, 0x96]);
        }
    }

    #[test]
    fn non_report_commands_are_rejected() {
        let err = tuya_error(r#"{"command":0,"payload":"00016d02000400000096"}"#);
        assert!(err.contains("DataRequest"), "{err}");
        let err = tuya_error(r#"{"command":9,"payload":"00016d02000400000096"}"#);
        assert!(err.contains("0x09"), "{err}");
    }

    #[test]
    fn malformed_payloads_are_errors() {
        for payload in ["zz", "0001", "[]", "00016d020004", "{\"dp\":"] {
            tuya_error(payload);
        }
    }

    #[test]
    fn json_errors_are_reported_as_json() {
        let err = tuya_error(r#"{"dp":300,"datatype":2,"data":[1]}"#);
        assert!(err.starts_with("Invalid JSON payload"), "{err}");
        assert!(err.contains("u8"), "{err}");

        let err = tuya_error(r#"[{"dp":105}]"#);
        assert!(err.contains("datatype"), "{err}");
    }

    #[test]
    fn ias_zone_and_settings() {
        let config = test_config();
        let payload = r#"{"zone_status":1,"zone_id":3}"#;
        let m = msg("tuya/hallway_radar/ias_zone", payload);
        assert_eq!(
            Inbound::parse(&m, &config).unwrap(),
            Some(Inbound::IasZone(ZoneStatusNotification {
                zone_status: 1,
                zone_id: 3,
                ..Default::default()
            }))
        );

        let m = msg("tuya/hallway_radar/settings/set", r#"{"maximum_range":5}"#);
        assert_eq!(
            Inbound::parse(&m, &config).unwrap(),
            Some(Inbound::Settings(SettingsPatch {
                maximum_range: Some(5.0),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn foreign_topics_are_ignored() {
        let config = test_config();
        let m = msg("tuya/other/tuya/response", "00");
        assert_eq!(Inbound::parse(&m, &config).unwrap(), None);
    }
}
