use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::assessment::HostAssessor;
use crate::errors::{ObserverError, ObserverResult};
use crate::interfaces::{ArnsNamesSource, EpochHeightSource, GatewayHost, GatewayHostsSource};
use crate::types::{unix_timestamp, GatewayAssessment, ObserverReport, REPORT_FORMAT_VERSION};

/// External inputs consumed by the report builder.
pub struct ReportSources {
    pub epoch_heights: Arc<dyn EpochHeightSource>,
    pub prescribed_names: Arc<dyn ArnsNamesSource>,
    pub chosen_names: Arc<dyn ArnsNamesSource>,
    pub gateway_hosts: Arc<dyn GatewayHostsSource>,
}

/// Top-level orchestrator producing one [`ObserverReport`] per invocation.
///
/// Source failures abort the run; everything observed at the gateways,
/// including total unreachability, is recorded as report data instead.
pub struct ReportBuilder {
    observer_address: String,
    sources: ReportSources,
    host_assessor: HostAssessor,
    gateway_concurrency: usize,
}

impl ReportBuilder {
    pub fn new(
        observer_address: impl Into<String>,
        sources: ReportSources,
        host_assessor: HostAssessor,
        gateway_concurrency: usize,
    ) -> Self {
        Self {
            observer_address: observer_address.into(),
            sources,
            host_assessor,
            gateway_concurrency: gateway_concurrency.max(1),
        }
    }

    /// Runs the full audit. Cancelling the token drops all in-flight
    /// probes, schedules nothing further, and discards partial results.
    pub async fn generate_report(
        &self,
        cancel: &CancellationToken,
    ) -> ObserverResult<ObserverReport> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ObserverError::Cancelled),
            report = self.build_report() => report,
        }
    }

    async fn build_report(&self) -> ObserverResult<ObserverReport> {
        let epoch_start_height = self
            .sources
            .epoch_heights
            .epoch_start_height()
            .await
            .map_err(|err| ObserverError::Source("epoch start height", Box::new(err)))?;
        let epoch_end_height = self
            .sources
            .epoch_heights
            .epoch_end_height()
            .await
            .map_err(|err| ObserverError::Source("epoch end height", Box::new(err)))?;
        let prescribed_names = self
            .sources
            .prescribed_names
            .names(Some(epoch_start_height))
            .await
            .map_err(|err| ObserverError::Source("prescribed names", Box::new(err)))?;
        let chosen_names = self
            .sources
            .chosen_names
            .names(Some(epoch_start_height))
            .await
            .map_err(|err| ObserverError::Source("chosen names", Box::new(err)))?;
        let hosts = self
            .sources
            .gateway_hosts
            .hosts()
            .await
            .map_err(|err| ObserverError::Source("gateway hosts", Box::new(err)))?;

        let wallets_by_fqdn = group_hosts(hosts);
        info!(
            gateways = wallets_by_fqdn.len(),
            prescribed = prescribed_names.len(),
            chosen = chosen_names.len(),
            epoch_start_height,
            "assessing gateway fleet"
        );

        let prescribed_ref = &prescribed_names;
        let chosen_ref = &chosen_names;
        let gateway_assessments: BTreeMap<String, GatewayAssessment> =
            stream::iter(wallets_by_fqdn)
                .map(|(fqdn, wallets)| async move {
                    let assessment = self
                        .host_assessor
                        .assess_host(&fqdn, prescribed_ref, chosen_ref, &wallets)
                        .await;
                    (fqdn, assessment)
                })
                .buffer_unordered(self.gateway_concurrency)
                .collect()
                .await;

        Ok(ObserverReport {
            format_version: REPORT_FORMAT_VERSION,
            observer_address: self.observer_address.clone(),
            epoch_start_height,
            epoch_end_height,
            generated_at: unix_timestamp(),
            gateway_assessments,
        })
    }
}

/// Collapses duplicate FQDN entries into one ascending-sorted wallet union
/// per host, so each gateway is assessed exactly once.
fn group_hosts(hosts: Vec<GatewayHost>) -> BTreeMap<String, Vec<String>> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for host in hosts {
        grouped.entry(host.fqdn).or_default().insert(host.wallet);
    }
    grouped
        .into_iter()
        .map(|(fqdn, wallets)| (fqdn, wallets.into_iter().collect()))
        .collect()
}
