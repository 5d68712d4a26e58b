use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::debug;

use crate::errors::ObserverResult;
use crate::interfaces::{ArnsResolver, OwnershipVerifier};
use crate::types::{
    unix_timestamp, ArnsAssessments, ArnsNameAssessment, ArnsResolution, GatewayAssessment,
};

/// Fraction of unique names that must pass for a gateway's name audit to pass.
pub const NAME_PASS_THRESHOLD: f64 = 0.8;

/// Longest failure reason carried into an assessment record.
const MAX_FAILURE_REASON_CHARS: usize = 512;

/// Cross-checks one name on a target gateway against the reference gateway.
pub struct NameAssessor {
    resolver: Arc<dyn ArnsResolver>,
    reference_host: String,
}

impl NameAssessor {
    pub fn new(resolver: Arc<dyn ArnsResolver>, reference_host: impl Into<String>) -> Self {
        Self {
            resolver,
            reference_host: reference_host.into(),
        }
    }

    /// Resolves `name` on the reference gateway and on `host`, then compares
    /// the canonical resolution fields. Probe failures become failed
    /// assessments; this method itself never errors.
    pub async fn assess(&self, host: &str, name: &str) -> ArnsNameAssessment {
        let outcome = self.resolve_pair(host, name).await;
        let assessed_at = unix_timestamp();
        match outcome {
            Ok((reference, target)) => compare_resolutions(assessed_at, &reference, &target),
            Err(err) => failed_assessment(assessed_at, &err.to_string()),
        }
    }

    async fn resolve_pair(
        &self,
        host: &str,
        name: &str,
    ) -> ObserverResult<(ArnsResolution, ArnsResolution)> {
        // Reference probe strictly precedes the target probe.
        let reference = self.resolver.resolve(&self.reference_host, name).await?;
        let target = self.resolver.resolve(host, name).await?;
        Ok((reference, target))
    }
}

/// Compares the canonical field set in declaration order. `contentLength`
/// and the status codes are recorded but excluded from the pass predicate.
fn compare_resolutions(
    assessed_at: u64,
    reference: &ArnsResolution,
    target: &ArnsResolution,
) -> ArnsNameAssessment {
    let mut mismatched = Vec::new();
    if reference.resolved_id != target.resolved_id {
        mismatched.push("resolvedId");
    }
    if reference.ttl_seconds != target.ttl_seconds {
        mismatched.push("ttlSeconds");
    }
    if reference.content_type != target.content_type {
        mismatched.push("contentType");
    }
    if reference.data_hash_digest != target.data_hash_digest {
        mismatched.push("dataHashDigest");
    }

    let pass = mismatched.is_empty();
    let failure_reason = if pass {
        None
    } else {
        Some(
            mismatched
                .iter()
                .map(|field| format!("{field} mismatch"))
                .collect::<Vec<_>>()
                .join(", "),
        )
    };

    ArnsNameAssessment {
        assessed_at,
        expected_status_code: Some(reference.status_code),
        resolved_status_code: Some(target.status_code),
        expected_id: reference.resolved_id.clone(),
        resolved_id: target.resolved_id.clone(),
        expected_data_hash: reference.data_hash_digest.clone(),
        resolved_data_hash: target.data_hash_digest.clone(),
        failure_reason,
        pass,
        timings: target.timings.clone(),
    }
}

fn failed_assessment(assessed_at: u64, reason: &str) -> ArnsNameAssessment {
    ArnsNameAssessment {
        assessed_at,
        expected_status_code: None,
        resolved_status_code: None,
        expected_id: None,
        resolved_id: None,
        expected_data_hash: None,
        resolved_data_hash: None,
        failure_reason: Some(reason.chars().take(MAX_FAILURE_REASON_CHARS).collect()),
        pass: false,
        timings: None,
    }
}

/// Audits one gateway: operator identity plus both name lists.
pub struct HostAssessor {
    names: NameAssessor,
    ownership: Arc<dyn OwnershipVerifier>,
    name_concurrency: usize,
}

impl HostAssessor {
    pub fn new(
        names: NameAssessor,
        ownership: Arc<dyn OwnershipVerifier>,
        name_concurrency: usize,
    ) -> Self {
        Self {
            names,
            ownership,
            name_concurrency: name_concurrency.max(1),
        }
    }

    /// Produces a complete assessment for `host`. The ownership check and
    /// the two name pools run concurrently; individual failures never
    /// short-circuit the host.
    pub async fn assess_host(
        &self,
        host: &str,
        prescribed_names: &[String],
        chosen_names: &[String],
        expected_wallets: &[String],
    ) -> GatewayAssessment {
        let (ownership_assessment, prescribed, chosen) = tokio::join!(
            self.ownership.assess(host, expected_wallets),
            self.assess_names(host, prescribed_names),
            self.assess_names(host, chosen_names),
        );

        // The threshold denominator counts unique names; the numerator counts
        // both lists' assessments, so a name in both lists counts twice.
        let unique: HashSet<&str> = prescribed_names
            .iter()
            .chain(chosen_names)
            .map(String::as_str)
            .collect();
        let passed = prescribed
            .values()
            .chain(chosen.values())
            .filter(|assessment| assessment.pass)
            .count();
        let names_pass = passed as f64 >= NAME_PASS_THRESHOLD * unique.len() as f64;
        let pass = ownership_assessment.pass && names_pass;
        debug!(
            host,
            passed,
            unique = unique.len(),
            ownership = ownership_assessment.pass,
            pass,
            "gateway assessed"
        );

        GatewayAssessment {
            ownership_assessment,
            arns_assessments: ArnsAssessments {
                prescribed_names: prescribed,
                chosen_names: chosen,
                pass: names_pass,
            },
            pass,
        }
    }

    async fn assess_names(
        &self,
        host: &str,
        names: &[String],
    ) -> BTreeMap<String, ArnsNameAssessment> {
        stream::iter(names)
            .map(|name| async move { (name.clone(), self.names.assess(host, name).await) })
            .buffer_unordered(self.name_concurrency)
            .collect()
            .await
    }
}
