//! The fixed tool catalog and typed request arguments.

use std::fmt;
use std::str::FromStr;

use genail_core::error::ScriptError;
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

/// Every tool a script may call. Anything else is `ToolNotAllowed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    ListRecords,
    GetRecord,
    GetReceipt,
    GetAudit,
    FetchEvidence,
    VerifyOnchain,
}

impl ToolName {
    pub const ALL: [ToolName; 6] = [
        Self::ListRecords,
        Self::GetRecord,
        Self::GetReceipt,
        Self::GetAudit,
        Self::FetchEvidence,
        Self::VerifyOnchain,
    ];

    /// Name used in `call <tool> into ...`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ListRecords => "mmv_list_records",
            Self::GetRecord => "mmv_get_record",
            Self::GetReceipt => "mmv_get_receipt",
            Self::GetAudit => "mmv_get_audit",
            Self::FetchEvidence => "mmv_fetch_evidence",
            Self::VerifyOnchain => "mmv_verify_onchain",
        }
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolName {
    type Err = ScriptError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == name)
            .ok_or_else(|| ScriptError::ToolNotAllowed(name.to_string()))
    }
}

/// Default minimum score filter for `mmv_list_records`, in basis points.
pub const DEFAULT_MIN_SCORE_BPS: i64 = 8000;
/// Default page size for `mmv_list_records`.
pub const DEFAULT_PAGE_LIMIT: i64 = 50;

fn default_min_score_bps() -> i64 {
    DEFAULT_MIN_SCORE_BPS
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_LIMIT
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListRecordsArgs {
    #[serde(default = "default_min_score_bps")]
    pub min_score_bps: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
    #[serde(default)]
    pub program_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TaskArgs {
    #[serde(deserialize_with = "string_or_integer")]
    pub task_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FetchEvidenceArgs {
    pub bundle_uri: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifyOnchainArgs {
    #[serde(deserialize_with = "string_or_integer")]
    pub task_id: String,
    pub bundle_hash: String,
    #[serde(deserialize_with = "string_or_integer")]
    pub chain_id: String,
    pub contract_address: String,
    #[serde(default)]
    pub rpc_url: Option<String>,
}

/// A validated request for one catalog tool.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolRequest {
    ListRecords(ListRecordsArgs),
    GetRecord(TaskArgs),
    GetReceipt(TaskArgs),
    GetAudit(TaskArgs),
    FetchEvidence(FetchEvidenceArgs),
    VerifyOnchain(VerifyOnchainArgs),
}

impl ToolRequest {
    /// Bind a JSON argument object to the tool's request type.
    pub fn from_args(tool: ToolName, args: Map<String, JsonValue>) -> Result<Self, ScriptError> {
        let args = JsonValue::Object(args);
        Ok(match tool {
            ToolName::ListRecords => Self::ListRecords(bind(tool, args)?),
            ToolName::GetRecord => Self::GetRecord(bind(tool, args)?),
            ToolName::GetReceipt => Self::GetReceipt(bind(tool, args)?),
            ToolName::GetAudit => Self::GetAudit(bind(tool, args)?),
            ToolName::FetchEvidence => Self::FetchEvidence(bind(tool, args)?),
            ToolName::VerifyOnchain => Self::VerifyOnchain(bind(tool, args)?),
        })
    }

    pub fn tool(&self) -> ToolName {
        match self {
            Self::ListRecords(_) => ToolName::ListRecords,
            Self::GetRecord(_) => ToolName::GetRecord,
            Self::GetReceipt(_) => ToolName::GetReceipt,
            Self::GetAudit(_) => ToolName::GetAudit,
            Self::FetchEvidence(_) => ToolName::FetchEvidence,
            Self::VerifyOnchain(_) => ToolName::VerifyOnchain,
        }
    }
}

fn bind<T: DeserializeOwned>(tool: ToolName, args: JsonValue) -> Result<T, ScriptError> {
    serde_json::from_value(args)
        .map_err(|e| ScriptError::validation(format!("invalid arguments for {tool}: {e}")))
}

/// Accept identifiers given either as JSON strings or integers.
fn string_or_integer<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected a string or integer, found {other}"
        ))),
    }
}
