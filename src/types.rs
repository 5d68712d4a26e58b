use std::collections::BTreeMap;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Format identifier embedded in every generated report.
pub const REPORT_FORMAT_VERSION: u32 = 1;

/// Timing phases observed while resolving a name, in milliseconds.
///
/// Phases the transport cannot observe stay absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionTimings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tcp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_byte: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

/// Outcome of probing `https://{name}.{host}/` on a single gateway.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ArnsResolution {
    pub status_code: u16,
    pub resolved_id: Option<String>,
    pub ttl_seconds: Option<String>,
    pub content_type: Option<String>,
    pub content_length: Option<String>,
    pub data_hash_digest: Option<String>,
    pub timings: Option<ResolutionTimings>,
}

impl ArnsResolution {
    /// Shape returned when the upstream reports the name as unresolved.
    /// Every field other than the status code is absent.
    pub fn not_found() -> Self {
        Self {
            status_code: 404,
            resolved_id: None,
            ttl_seconds: None,
            content_type: None,
            content_length: None,
            data_hash_digest: None,
            timings: None,
        }
    }
}

/// Verdict on which wallet operates a gateway host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipAssessment {
    pub expected_wallets: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_wallet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub pass: bool,
}

/// Reference-versus-target comparison for one name on one gateway.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArnsNameAssessment {
    pub assessed_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_data_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_data_hash: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub pass: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timings: Option<ResolutionTimings>,
}

/// Name-audit results for one gateway, split by list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArnsAssessments {
    pub prescribed_names: BTreeMap<String, ArnsNameAssessment>,
    pub chosen_names: BTreeMap<String, ArnsNameAssessment>,
    pub pass: bool,
}

/// Complete audit verdict for one gateway host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayAssessment {
    pub ownership_assessment: OwnershipAssessment,
    pub arns_assessments: ArnsAssessments,
    pub pass: bool,
}

/// The audit artifact produced once per epoch, keyed by gateway FQDN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserverReport {
    pub format_version: u32,
    pub observer_address: String,
    pub epoch_start_height: u64,
    pub epoch_end_height: u64,
    pub generated_at: u64,
    pub gateway_assessments: BTreeMap<String, GatewayAssessment>,
}

/// Current wall-clock time as whole unix seconds.
pub(crate) fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
