use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ObserverResult;
use crate::types::{ArnsResolution, OwnershipAssessment};

/// One gateway-list entry. Multiple entries may claim the same FQDN.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayHost {
    pub fqdn: String,
    pub wallet: String,
}

/// Provides the block-height bounds of the audited epoch.
#[async_trait]
pub trait EpochHeightSource: Send + Sync {
    async fn epoch_start_height(&self) -> ObserverResult<u64>;
    async fn epoch_end_height(&self) -> ObserverResult<u64>;
}

/// Provides a name list for the epoch, optionally pinned to a height.
#[async_trait]
pub trait ArnsNamesSource: Send + Sync {
    async fn names(&self, height: Option<u64>) -> ObserverResult<Vec<String>>;
}

/// Provides the gateway host list under audit.
#[async_trait]
pub trait GatewayHostsSource: Send + Sync {
    async fn hosts(&self) -> ObserverResult<Vec<GatewayHost>>;
}

/// Resolves one name against one gateway host.
#[async_trait]
pub trait ArnsResolver: Send + Sync {
    async fn resolve(&self, host: &str, name: &str) -> ObserverResult<ArnsResolution>;
}

/// Verifies which wallet a gateway host claims to be operated by.
///
/// Implementations never fail; transport problems become failed
/// assessments.
#[async_trait]
pub trait OwnershipVerifier: Send + Sync {
    async fn assess(&self, host: &str, expected_wallets: &[String]) -> OwnershipAssessment;
}

/// Fixed epoch bounds for statically configured runs.
#[derive(Clone, Debug)]
pub struct StaticEpochHeightSource {
    start_height: u64,
    end_height: u64,
}

impl StaticEpochHeightSource {
    pub fn new(start_height: u64, end_height: u64) -> Self {
        Self {
            start_height,
            end_height,
        }
    }
}

#[async_trait]
impl EpochHeightSource for StaticEpochHeightSource {
    async fn epoch_start_height(&self) -> ObserverResult<u64> {
        Ok(self.start_height)
    }

    async fn epoch_end_height(&self) -> ObserverResult<u64> {
        Ok(self.end_height)
    }
}

/// Fixed name list; the requested height is ignored.
#[derive(Clone, Debug)]
pub struct StaticArnsNamesSource {
    names: Vec<String>,
}

impl StaticArnsNamesSource {
    pub fn new(names: Vec<String>) -> Self {
        Self { names }
    }
}

#[async_trait]
impl ArnsNamesSource for StaticArnsNamesSource {
    async fn names(&self, _height: Option<u64>) -> ObserverResult<Vec<String>> {
        Ok(self.names.clone())
    }
}

/// Fixed gateway host list.
#[derive(Clone, Debug)]
pub struct StaticGatewayHostsSource {
    hosts: Vec<GatewayHost>,
}

impl StaticGatewayHostsSource {
    pub fn new(hosts: Vec<GatewayHost>) -> Self {
        Self { hosts }
    }
}

#[async_trait]
impl GatewayHostsSource for StaticGatewayHostsSource {
    async fn hosts(&self) -> ObserverResult<Vec<GatewayHost>> {
        Ok(self.hosts.clone())
    }
}
