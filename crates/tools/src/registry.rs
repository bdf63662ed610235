//! Metered dispatch of catalog tools.
//!
//! [`ToolRegistry`] owns the per-run call counter. A call is counted once its
//! tool name and arguments are valid and before any network request is made,
//! so a call that later fails upstream still consumes budget.

use std::sync::Arc;

use genail_core::error::ScriptError;
use reqwest::Url;
use serde_json::{json, Map, Value as JsonValue};

use crate::egress::EgressPolicy;
use crate::ipfs::ipfs_to_gateway;
use crate::request::{
    FetchEvidenceArgs, ListRecordsArgs, TaskArgs, ToolName, ToolRequest, VerifyOnchainArgs,
};
use crate::shaping::{shape_receipt, shape_record_list};
use crate::transport::Transport;

/// Endpoints and egress rules the tools operate against.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Base URL of the record/receipt/audit service.
    pub api_base_url: String,
    /// Gateway used to resolve `ipfs://` URIs.
    pub ipfs_gateway: String,
    /// Default JSON-RPC endpoint for on-chain verification.
    pub rpc_url: Option<String>,
    pub egress: EgressPolicy,
}

/// The fixed tool catalog plus the shared call budget.
pub struct ToolRegistry<T> {
    context: ToolContext,
    transport: Arc<T>,
    max_calls: u32,
    calls: u32,
}

impl<T: Transport> ToolRegistry<T> {
    pub fn new(context: ToolContext, transport: Arc<T>, max_calls: u32) -> Self {
        Self {
            context,
            transport,
            max_calls,
            calls: 0,
        }
    }

    /// Number of calls that reached dispatch so far.
    pub fn tool_calls(&self) -> u32 {
        self.calls
    }

    /// Resolve `name`, bind `args`, charge the budget, then run the tool.
    pub async fn invoke(
        &mut self,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue, ScriptError> {
        let tool: ToolName = name.parse()?;
        let request = ToolRequest::from_args(tool, args)?;
        self.charge()?;
        tracing::debug!(tool = %request.tool(), call = self.calls, "Dispatching tool call");
        self.dispatch(request).await
    }

    fn charge(&mut self) -> Result<(), ScriptError> {
        self.calls += 1;
        if self.calls > self.max_calls {
            return Err(ScriptError::ToolBudgetExceeded {
                limit: self.max_calls,
            });
        }
        Ok(())
    }

    async fn dispatch(&self, request: ToolRequest) -> Result<JsonValue, ScriptError> {
        match request {
            ToolRequest::ListRecords(args) => self.list_records(args).await,
            ToolRequest::GetRecord(TaskArgs { task_id }) => {
                self.get(self.api_url(&["records", task_id.as_str()])?, vec![]).await
            }
            ToolRequest::GetReceipt(TaskArgs { task_id }) => {
                let payload = self
                    .get(self.api_url(&["receipts", task_id.as_str()])?, vec![])
                    .await?;
                Ok(shape_receipt(&payload, &task_id))
            }
            ToolRequest::GetAudit(TaskArgs { task_id }) => {
                self.get(self.api_url(&["audits", task_id.as_str()])?, vec![]).await
            }
            ToolRequest::FetchEvidence(args) => self.fetch_evidence(args).await,
            ToolRequest::VerifyOnchain(args) => self.verify_onchain(args).await,
        }
    }

    async fn list_records(&self, args: ListRecordsArgs) -> Result<JsonValue, ScriptError> {
        let mut query = vec![
            ("min_score_bps", args.min_score_bps.to_string()),
            ("limit", args.limit.to_string()),
            ("offset", args.offset.to_string()),
        ];
        if let Some(program_id) = args.program_id.filter(|p| !p.is_empty()) {
            query.push(("program_id", program_id));
        }
        let payload = self.get(self.api_url(&["records"])?, query).await?;
        Ok(shape_record_list(&payload, args.limit, args.offset))
    }

    async fn fetch_evidence(&self, args: FetchEvidenceArgs) -> Result<JsonValue, ScriptError> {
        let resolved = ipfs_to_gateway(&self.context.ipfs_gateway, &args.bundle_uri);
        let url = self.context.egress.validate(&resolved)?;
        Ok(self.transport.get_json(url, vec![]).await?)
    }

    async fn verify_onchain(&self, args: VerifyOnchainArgs) -> Result<JsonValue, ScriptError> {
        let non_empty = |url: &&str| !url.trim().is_empty();
        let target = args
            .rpc_url
            .as_deref()
            .filter(non_empty)
            .or(self.context.rpc_url.as_deref().filter(non_empty))
            .ok_or_else(|| ScriptError::configuration("rpc_url not configured"))?;
        let url = self.context.egress.validate(target)?;

        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                {"to": args.contract_address, "data": "0x"},
                "latest",
            ],
            "id": 1,
        });
        let rpc_result = self.transport.post_json(url, body, None).await?;

        Ok(json!({
            "task_id": args.task_id,
            "bundle_hash": args.bundle_hash,
            "chain_id": args.chain_id,
            "contract_address": args.contract_address,
            "rpc_result": rpc_result,
        }))
    }

    /// Validate and GET a record-service URL.
    async fn get(
        &self,
        url: Url,
        query: Vec<(&'static str, String)>,
    ) -> Result<JsonValue, ScriptError> {
        self.context.egress.check(&url)?;
        Ok(self.transport.get_json(url, query).await?)
    }

    /// `api_base_url` with `segments` appended as percent-encoded path parts.
    fn api_url(&self, segments: &[&str]) -> Result<Url, ScriptError> {
        let invalid = || {
            ScriptError::configuration(format!(
                "invalid api_base_url: {}",
                self.context.api_base_url
            ))
        };
        let mut url = Url::parse(self.context.api_base_url.trim()).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|()| invalid())?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}
