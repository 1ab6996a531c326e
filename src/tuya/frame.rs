//! Tuya-specific cluster (0xEF00) command payloads.
//!
//! Layout after the ZCL header:
//! `status:u8 transid:u8 ( dp:u8 datatype:u8 length:u16be data[length] )+`

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt};
use serde::Deserialize;
use thiserror::Error;

use super::datapoint::{self, DataType, DpValue};

pub const TUYA_CLUSTER_ID: u16 = 0xef00;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuyaCommand {
    DataRequest = 0x00,
    DataResponse = 0x01,
    DataReport = 0x02,
}

impl TuyaCommand {
    pub fn from_code(cmd: u8) -> Option<Self> {
        match cmd {
            0x00 => Some(Self::DataRequest),
            0x01 => Some(Self::DataResponse),
            0x02 => Some(Self::DataReport),
            _ => None,
        }
    }

    /// Commands that carry device state towards the bridge.
    pub fn is_from_device(self) -> bool {
        matches!(self, Self::DataResponse | Self::DataReport)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    #[error("Frame truncated")]
    Truncated,

    #[error("Frame carries no data points")]
    Empty,

    #[error("Data point {dp} payload too long ({len} bytes)")]
    RecordTooLong { dp: u8, len: usize },
}

impl From<std::io::Error> for FrameError {
    fn from(_: std::io::Error) -> Self {
        FrameError::Truncated
    }
}

/// One data point inside a cluster frame, as delivered by the cluster event stream.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DpRecord {
    pub dp: u8,
    pub datatype: u8,
    #[serde(default)]
    pub data: Vec<u8>,
}

impl DpRecord {
    pub fn value(&self) -> Option<DpValue> {
        datapoint::decode(self.datatype, &self.data)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DpFrame {
    pub status: u8,
    pub transid: u8,
    pub records: Vec<DpRecord>,
}

impl DpFrame {
    pub fn parse(data: &[u8]) -> Result<Self, FrameError> {
        let mut rdr = Cursor::new(data);
        let status = rdr.read_u8()?;
        let transid = rdr.read_u8()?;

        let mut records = Vec::new();
        while (rdr.position() as usize) < data.len() {
            let dp = rdr.read_u8()?;
            let datatype = rdr.read_u8()?;
            let len = rdr.read_u16::<BigEndian>()?;
            let mut payload = vec![0; usize::from(len)];
            rdr.read_exact(&mut payload)?;
            records.push(DpRecord {
                dp,
                datatype,
                data: payload,
            });
        }

        if records.is_empty() {
            return Err(FrameError::Empty);
        }

        Ok(Self {
            status,
            transid,
            records,
        })
    }

    pub fn encode(&self) -> Result<Vec<u8>, FrameError> {
        let body: usize = self.records.iter().map(|r| 4 + r.data.len()).sum();
        let mut out = Vec::with_capacity(2 + body);
        out.push(self.status);
        out.push(self.transid);
        for record in &self.records {
            let Ok(len) = u16::try_from(record.data.len()) else {
                return Err(FrameError::RecordTooLong {
                    dp: record.dp,
                    len: record.data.len(),
                });
            };
            out.push(record.dp);
            out.push(record.datatype);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&record.data);
        }
        Ok(out)
    }

    /// Write a 4-byte `value` data point (the device's only writable type).
    pub fn write_value(transid: u8, dp: u8, value: u32) -> Self {
        Self {
            status: 0,
            transid,
            records: vec![DpRecord {
                dp,
                datatype: DataType::Value as u8,
                data: value.to_be_bytes().to_vec(),
            }],
        }
    }
}
