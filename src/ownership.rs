use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::errors::{ObserverError, ObserverResult};
use crate::interfaces::OwnershipVerifier;
use crate::resolver::{probe_client, ProbeOrigin};
use crate::types::OwnershipAssessment;

/// Checks a gateway's `/ar-io/info` endpoint against the wallet set
/// claiming the host.
#[derive(Clone)]
pub struct GatewayInfoProbe {
    client: Client,
    origin: ProbeOrigin,
}

impl GatewayInfoProbe {
    pub fn new() -> ObserverResult<Self> {
        Ok(Self {
            client: probe_client()?,
            origin: ProbeOrigin::default(),
        })
    }

    /// Uses a caller-supplied client and origin override.
    pub fn with_client(client: Client, origin: ProbeOrigin) -> Self {
        Self { client, origin }
    }

    fn info_url(&self, host: &str) -> String {
        format!(
            "{}://{}/ar-io/info",
            self.origin.scheme,
            self.origin.authority(host)
        )
    }

    async fn observed_wallet(&self, host: &str) -> ObserverResult<Option<String>> {
        let response = self
            .client
            .get(self.info_url(host))
            .send()
            .await?
            .error_for_status()?;
        let info: Value = response
            .json()
            .await
            .map_err(|err| ObserverError::Protocol(format!("malformed gateway info: {err}")))?;
        if !info.is_object() {
            return Err(ObserverError::Protocol(
                "gateway info is not a JSON object".to_string(),
            ));
        }
        Ok(info.get("wallet").and_then(Value::as_str).map(str::to_owned))
    }
}

#[async_trait]
impl OwnershipVerifier for GatewayInfoProbe {
    async fn assess(&self, host: &str, expected_wallets: &[String]) -> OwnershipAssessment {
        let observed = self.observed_wallet(host).await;
        debug!(host, ?observed, "gateway ownership probed");
        ownership_assessment(expected_wallets, observed)
    }
}

/// Applies the wallet decision table. `expected_wallets` arrives sorted
/// ascending so the mismatch message is deterministic.
fn ownership_assessment(
    expected_wallets: &[String],
    observed: ObserverResult<Option<String>>,
) -> OwnershipAssessment {
    let expected_wallets = expected_wallets.to_vec();
    match observed {
        Ok(Some(wallet)) if expected_wallets.contains(&wallet) => OwnershipAssessment {
            expected_wallets,
            observed_wallet: Some(wallet),
            failure_reason: None,
            pass: true,
        },
        Ok(Some(wallet)) => {
            let failure_reason = format!(
                "Wallet mismatch: expected one of {} but found {}",
                expected_wallets.join(", "),
                wallet
            );
            OwnershipAssessment {
                expected_wallets,
                observed_wallet: Some(wallet),
                failure_reason: Some(failure_reason),
                pass: false,
            }
        }
        Ok(None) => OwnershipAssessment {
            expected_wallets,
            observed_wallet: None,
            failure_reason: Some("No wallet found".to_string()),
            pass: false,
        },
        Err(err) => OwnershipAssessment {
            expected_wallets,
            observed_wallet: None,
            failure_reason: Some(err.to_string()),
            pass: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallets(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|entry| entry.to_string()).collect()
    }

    #[test]
    fn passes_when_observed_wallet_is_expected() {
        let assessment =
            ownership_assessment(&wallets(&["A", "B"]), Ok(Some("B".to_string())));
        assert!(assessment.pass);
        assert_eq!(assessment.observed_wallet.as_deref(), Some("B"));
        assert_eq!(assessment.failure_reason, None);
    }

    #[test]
    fn mismatch_reason_lists_expected_wallets_in_order() {
        let assessment =
            ownership_assessment(&wallets(&["A", "B"]), Ok(Some("Z".to_string())));
        assert!(!assessment.pass);
        assert_eq!(
            assessment.failure_reason.as_deref(),
            Some("Wallet mismatch: expected one of A, B but found Z")
        );
        assert_eq!(assessment.observed_wallet.as_deref(), Some("Z"));
    }

    #[test]
    fn missing_wallet_field_fails_with_fixed_reason() {
        let assessment = ownership_assessment(&wallets(&["A"]), Ok(None));
        assert!(!assessment.pass);
        assert_eq!(assessment.failure_reason.as_deref(), Some("No wallet found"));
        assert_eq!(assessment.observed_wallet, None);
    }

    #[test]
    fn probe_error_becomes_failure_reason() {
        let assessment = ownership_assessment(
            &wallets(&["A"]),
            Err(ObserverError::Protocol("malformed gateway info".to_string())),
        );
        assert!(!assessment.pass);
        assert_eq!(
            assessment.failure_reason.as_deref(),
            Some("protocol error: malformed gateway info")
        );
    }

    #[test]
    fn info_url_uses_origin_override() {
        let origin = ProbeOrigin {
            scheme: "http",
            port: Some(9000),
        };
        let probe = GatewayInfoProbe::with_client(Client::new(), origin);
        assert_eq!(
            probe.info_url("gateway-one.test"),
            "http://gateway-one.test:9000/ar-io/info"
        );
    }
}
