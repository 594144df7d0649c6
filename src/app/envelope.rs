//! Response envelope shared by every request kind.
//!
//! ```json
//! {"date": 1718000000000, "dataName": "allCards", "data": [..],
//!  "status": {"code": 200, "message": "OK"}}
//! ```

use serde::Serialize;
use serde_json::Value;

use crate::error::BenchError;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Status {
    pub code: u16,
    pub message: String,
    /// Stable error tag, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    /// Wall-clock milliseconds since the Unix epoch.
    pub date: u64,
    #[serde(rename = "dataName")]
    pub data_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    pub status: Status,
}

impl Envelope {
    pub fn ok(date: u64, data_name: &str, data: Option<Value>) -> Self {
        Self {
            date,
            data_name: data_name.into(),
            data,
            status: Status {
                code: 200,
                message: "OK".into(),
                kind: None,
            },
        }
    }

    pub fn error(date: u64, data_name: &str, err: &BenchError) -> Self {
        Self::failure(date, data_name, err.code(), err.kind(), err.to_string())
    }

    pub fn failure(
        date: u64,
        data_name: &str,
        code: u16,
        kind: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            date,
            data_name: data_name.into(),
            data: None,
            status: Status {
                code,
                message: message.into(),
                kind: Some(kind),
            },
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.code == 200
    }
}
