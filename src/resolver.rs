use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use futures::{Stream, TryStreamExt};
use reqwest::header::{HeaderMap, CONTENT_LENGTH, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::errors::{ObserverError, ObserverResult};
use crate::interfaces::ArnsResolver;
use crate::types::{ArnsResolution, ResolutionTimings};

/// Upper bound on body bytes fed into the content digest.
pub const MAX_HASHED_BYTES: usize = 1_048_576;

/// Budget for DNS resolution during connection establishment.
pub const DNS_TIMEOUT: Duration = Duration::from_secs(5);
/// Budget for the TCP handshake.
pub const TCP_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
/// Budget for the TLS handshake.
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);
/// Idle timeout between socket reads; governs slow-drip responses.
pub const SOCKET_IDLE_TIMEOUT: Duration = Duration::from_secs(1);

const RESOLVED_ID_HEADER: &str = "x-arns-resolved-id";
const TTL_SECONDS_HEADER: &str = "x-arns-ttl-seconds";

/// Scheme and port used when building probe URLs.
///
/// Production probes use the default (HTTPS, no explicit port); the
/// override exists for non-TLS lab deployments and test fixtures.
#[derive(Clone, Debug)]
pub struct ProbeOrigin {
    pub scheme: &'static str,
    pub port: Option<u16>,
}

impl Default for ProbeOrigin {
    fn default() -> Self {
        Self {
            scheme: "https",
            port: None,
        }
    }
}

impl ProbeOrigin {
    pub(crate) fn authority(&self, host: &str) -> String {
        match self.port {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        }
    }
}

/// Builds the HTTP client shared by the probes, applying the timeout profile.
///
/// The transport enforces connection establishment as a single budget, so
/// the DNS, TCP, and TLS allowances are summed into the connect timeout.
pub fn probe_client() -> ObserverResult<Client> {
    let connect_budget = DNS_TIMEOUT + TCP_CONNECT_TIMEOUT + TLS_HANDSHAKE_TIMEOUT;
    Ok(Client::builder()
        .connect_timeout(connect_budget)
        .read_timeout(SOCKET_IDLE_TIMEOUT)
        .build()?)
}

/// One-shot streaming resolver for `https://{name}.{host}/` probes.
///
/// Bodies are hashed incrementally up to [`MAX_HASHED_BYTES`]; once the cap
/// is reached the transfer is terminated and the digest finalized, so large
/// responses never buffer in memory.
#[derive(Clone)]
pub struct RemoteGatewayResolver {
    client: Client,
    origin: ProbeOrigin,
}

impl RemoteGatewayResolver {
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

    fn resolution_url(&self, host: &str, name: &str) -> String {
        format!(
            "{}://{}.{}/",
            self.origin.scheme,
            name,
            self.origin.authority(host)
        )
    }
}

#[async_trait]
impl ArnsResolver for RemoteGatewayResolver {
    async fn resolve(&self, host: &str, name: &str) -> ObserverResult<ArnsResolution> {
        let url = self.resolution_url(host, name);
        debug!(%url, "probing name resolution");

        let started = Instant::now();
        let response = self.client.get(&url).send().await?;
        let request_ms = elapsed_ms(started);

        // Status is inspected before any body consumption so a 404 with a
        // payload never reaches the digest.
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(ArnsResolution::not_found());
        }
        if !status.is_success() {
            return Err(ObserverError::HttpStatus(status));
        }

        let headers = response.headers();
        let resolved_id = header_string(headers, RESOLVED_ID_HEADER);
        let ttl_seconds = header_string(headers, TTL_SECONDS_HEADER);
        let content_type = header_string(headers, CONTENT_TYPE.as_str());
        let content_length = header_string(headers, CONTENT_LENGTH.as_str());

        let stream = response.bytes_stream().map_err(ObserverError::from);
        let body = hash_body_stream(stream, started).await?;
        let total_ms = elapsed_ms(started);
        debug!(%url, hashed = body.hashed, "name resolution complete");

        Ok(ArnsResolution {
            status_code: status.as_u16(),
            resolved_id,
            ttl_seconds,
            content_type,
            content_length,
            data_hash_digest: Some(body.digest),
            timings: Some(ResolutionTimings {
                dns: None,
                tcp: None,
                tls: None,
                request: Some(request_ms),
                first_byte: body.first_byte_ms,
                total: Some(total_ms),
            }),
        })
    }
}

#[derive(Debug)]
struct BodyDigest {
    digest: String,
    hashed: usize,
    first_byte_ms: Option<u64>,
}

/// Feeds at most [`MAX_HASHED_BYTES`] body bytes into a SHA-256 digest.
///
/// Each chunk is sliced to the remaining cap. Reaching the cap drops the
/// stream, which terminates the underlying transfer before the digest is
/// finalized; bytes past the cap are neither hashed nor awaited.
async fn hash_body_stream<S, B>(stream: S, started: Instant) -> ObserverResult<BodyDigest>
where
    S: Stream<Item = ObserverResult<B>>,
    B: AsRef<[u8]>,
{
    let mut stream = Box::pin(stream);
    let mut hasher = Sha256::new();
    let mut hashed = 0usize;
    let mut first_byte_ms = None;

    while let Some(chunk) = stream.try_next().await? {
        let chunk = chunk.as_ref();
        if first_byte_ms.is_none() {
            first_byte_ms = Some(elapsed_ms(started));
        }
        let take = chunk.len().min(MAX_HASHED_BYTES - hashed);
        hasher.update(&chunk[..take]);
        hashed += take;
        if hashed == MAX_HASHED_BYTES {
            break;
        }
    }
    drop(stream);

    Ok(BodyDigest {
        digest: URL_SAFE_NO_PAD.encode(hasher.finalize()),
        hashed,
        first_byte_ms,
    })
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
