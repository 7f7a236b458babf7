//! Blocking HTTP fetcher.
//!
//! One `reqwest` client is kept per proxy endpoint and TLS policy, built on
//! first use.

use crate::{DownloadError, DownloadOptions};
use ahash::{AHashMap, AHashSet};
use bytes::Bytes;
use coda_config::{AuthConfig, ProxyRule};
use coda_repository::{ArtifactStream, FetchError, Metadata, RepositoryFetcher, resolve_url};
use parking_lot::Mutex;
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder, Response};
use sha1::{Digest, Sha1};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

/// Suffix of the checksum side file published next to each artifact.
pub const SHA1_SUFFIX: &str = ".sha1";

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ClientKey {
    proxy: Option<String>,
    insecure: bool,
}

/// Fetches metadata and artifacts over HTTP(S).
pub struct HttpFetcher {
    options: Arc<DownloadOptions>,
    auth: Option<Arc<AuthConfig>>,
    insecure_hosts: AHashSet<String>,
    clients: Mutex<AHashMap<ClientKey, Client>>,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("options", &self.options)
            .field("auth", &self.auth.is_some())
            .field("insecure_hosts", &self.insecure_hosts)
            .field("clients", &self.clients.lock().len())
            .finish()
    }
}

impl HttpFetcher {
    /// Create a fetcher. The direct (unproxied) client is built eagerly.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(options: DownloadOptions, auth: Option<AuthConfig>) -> Result<Self, DownloadError> {
        let fetcher = Self {
            options: Arc::new(options),
            auth: auth.filter(|a| !a.is_empty()).map(Arc::new),
            insecure_hosts: AHashSet::new(),
            clients: Mutex::new(AHashMap::new()),
        };
        let key = ClientKey {
            proxy: None,
            insecure: false,
        };
        let client = fetcher.build_client(&key, None)?;
        fetcher.clients.lock().insert(key, client);
        Ok(fetcher)
    }

    /// Create a fetcher with default options and no credentials.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn with_defaults() -> Result<Self, DownloadError> {
        Self::new(DownloadOptions::default(), None)
    }

    /// Skip TLS certificate verification for these hosts.
    #[must_use]
    pub fn with_insecure_hosts<I, S>(mut self, hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insecure_hosts
            .extend(hosts.into_iter().map(|h| h.into().to_ascii_lowercase()));
        self
    }

    /// Get the options.
    #[must_use]
    pub fn options(&self) -> &DownloadOptions {
        &self.options
    }

    fn build_client(&self, key: &ClientKey, proxy: Option<&ProxyRule>) -> Result<Client, DownloadError> {
        let mut builder = Client::builder()
            .connect_timeout(self.options.connect_timeout)
            .timeout(self.options.read_timeout)
            .user_agent(self.options.user_agent.clone())
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .danger_accept_invalid_certs(key.insecure)
            .redirect(reqwest::redirect::Policy::limited(10));

        builder = match proxy {
            Some(rule) => {
                let mut p = reqwest::Proxy::all(rule.endpoint()).map_err(|e| DownloadError::Proxy {
                    endpoint: rule.endpoint(),
                    message: e.to_string(),
                })?;
                if let Some(creds) = &rule.credentials {
                    p = p.basic_auth(&creds.username, &creds.password);
                }
                builder.proxy(p)
            }
            None => builder.no_proxy(),
        };

        builder.build().map_err(|e| DownloadError::Client(e.to_string()))
    }

    fn client_for(&self, url: &Url, proxy: Option<&ProxyRule>) -> Result<Client, FetchError> {
        let key = ClientKey {
            proxy: proxy.map(ProxyRule::endpoint),
            insecure: url
                .host_str()
                .is_some_and(|h| self.insecure_hosts.contains(&h.to_ascii_lowercase())),
        };
        let mut clients = self.clients.lock();
        if let Some(client) = clients.get(&key) {
            return Ok(client.clone());
        }
        let client = self
            .build_client(&key, proxy)
            .map_err(|e| FetchError::network(url.as_str(), e.to_string()))?;
        debug!(proxy = ?key.proxy, insecure = key.insecure, "built HTTP client");
        clients.insert(key, client.clone());
        Ok(client)
    }

    fn with_auth(&self, request: RequestBuilder, url: &Url) -> RequestBuilder {
        let (Some(auth), Some(host)) = (&self.auth, url.host_str()) else {
            return request;
        };
        if let Some(basic) = auth.get_http_basic(host) {
            return request.basic_auth(&basic.username, Some(&basic.password));
        }
        if let Some(token) = auth.get_bearer(host) {
            return request.bearer_auth(token);
        }
        request
    }

    /// GET `url`, retrying server errors and timeouts.
    fn get(&self, url: &Url, proxy: Option<&ProxyRule>) -> Result<Response, FetchError> {
        let client = self.client_for(url, proxy)?;
        let mut last_error = None;

        for attempt in 0..=self.options.retries {
            if attempt > 0 {
                debug!(attempt, url = %url, "retrying request");
                std::thread::sleep(Duration::from_millis(200 * u64::from(attempt)));
            }

            trace!(url = %url, "GET");
            let result = self
                .with_auth(client.get(url.clone()), url)
                .send()
                .map_err(|e| map_reqwest(url, &e))
                .and_then(|response| check_response(url, response));

            match result {
                Ok(response) => return Ok(response),
                Err(e) if is_retryable(&e) => {
                    debug!(error = %e, attempt, "request failed");
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| FetchError::network(url.as_str(), "request failed")))
    }

    fn get_bytes(&self, url: &Url, proxy: Option<&ProxyRule>) -> Result<Bytes, FetchError> {
        self.get(url, proxy)?
            .bytes()
            .map_err(|e| map_reqwest(url, &e))
    }

    fn verify_sha1(&self, url: &Url, bytes: &[u8], proxy: Option<&ProxyRule>) -> Result<(), FetchError> {
        let checksum_url = Url::parse(&format!("{url}{SHA1_SUFFIX}"))
            .map_err(|e| FetchError::network(url.as_str(), e.to_string()))?;
        let published = match self.get_bytes(&checksum_url, proxy) {
            Ok(body) => body,
            Err(e) if e.is_not_found() => {
                trace!(url = %url, "no checksum published");
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        let Some(expected) = parse_checksum(&String::from_utf8_lossy(&published)) else {
            debug!(url = %checksum_url, "unreadable checksum file");
            return Ok(());
        };
        let actual = hex::encode(Sha1::digest(bytes));
        if actual == expected {
            Ok(())
        } else {
            Err(FetchError::ChecksumMismatch {
                url: url.to_string(),
                expected,
                actual,
            })
        }
    }
}

impl RepositoryFetcher for HttpFetcher {
    fn fetch_metadata(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<Metadata, FetchError> {
        let url = resolve_url(repository, path)?;
        let body = self.get_bytes(&url, proxy)?;
        Metadata::from_xml(url.as_str(), &String::from_utf8_lossy(&body))
    }

    fn fetch_artifact(
        &self,
        repository: &Url,
        path: &str,
        proxy: Option<&ProxyRule>,
    ) -> Result<ArtifactStream, FetchError> {
        let url = resolve_url(repository, path)?;
        let body = self.get_bytes(&url, proxy)?;
        if self.options.verify_checksum {
            self.verify_sha1(&url, &body, proxy)?;
        }
        debug!(url = %url, size = body.len(), "downloaded artifact");
        Ok(Box::new(Cursor::new(body)))
    }
}

fn map_reqwest(url: &Url, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Network {
            url: url.to_string(),
            message: err.to_string(),
            status: err.status().map(|s| s.as_u16()),
        }
    }
}

fn check_response(url: &Url, response: Response) -> Result<Response, FetchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(classify_status(url, status))
}

/// Map a non-success status to a fetch error.
fn classify_status(url: &Url, status: StatusCode) -> FetchError {
    match status {
        StatusCode::NOT_FOUND | StatusCode::GONE => FetchError::not_found(url.as_str()),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::PROXY_AUTHENTICATION_REQUIRED => {
            FetchError::AuthFailed {
                url: url.to_string(),
                status: status.as_u16(),
            }
        }
        _ => FetchError::Network {
            url: url.to_string(),
            message: format!("HTTP {status}"),
            status: Some(status.as_u16()),
        },
    }
}

fn is_retryable(err: &FetchError) -> bool {
    match err {
        FetchError::Timeout { .. } => true,
        FetchError::Network { status, .. } => status.is_none_or(|s| s >= 500),
        _ => false,
    }
}

/// First hex token of a `.sha1` file, lowercased.
///
/// Files may hold just the digest or `digest  filename`.
#[must_use]
pub fn parse_checksum(content: &str) -> Option<String> {
    let token = content.split_whitespace().next()?;
    (token.len() == 40 && token.bytes().all(|b| b.is_ascii_hexdigit()))
        .then(|| token.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    /// Serve fixed responses for `count` connections, one request each.
    fn serve(routes: Vec<(&'static str, u16, Vec<u8>)>, count: usize) -> Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            for stream in listener.incoming().take(count) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    if line == "\r\n" || line.is_empty() {
                        break;
                    }
                }
                let path = request_line.split_whitespace().nth(1).unwrap_or("/");
                let (status, body) = routes
                    .iter()
                    .find(|(p, _, _)| *p == path)
                    .map_or((404, Vec::new()), |(_, s, b)| (*s, b.clone()));
                write!(
                    stream,
                    "HTTP/1.1 {status} X\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                )
                .unwrap();
                stream.write_all(&body).unwrap();
            }
        });
        Url::parse(&format!("http://{addr}/repo/")).unwrap()
    }

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(
            DownloadOptions {
                retries: 0,
                ..DownloadOptions::default()
            },
            None,
        )
        .unwrap()
    }

    #[test]
    fn parse_checksum_formats() {
        let digest = "2aae6c35c94fcfb415dbe95f408b9ce91ee846ed";
        assert_eq!(parse_checksum(digest).as_deref(), Some(digest));
        assert_eq!(
            parse_checksum(&format!("{}  a-1.0.jar\n", digest.to_uppercase())).as_deref(),
            Some(digest)
        );
        assert_eq!(parse_checksum("not-a-digest"), None);
        assert_eq!(parse_checksum(""), None);
    }

    #[test]
    fn status_mapping() {
        let url = Url::parse("https://r.example.com/a.jar").unwrap();
        assert!(classify_status(&url, StatusCode::NOT_FOUND).is_not_found());
        assert!(matches!(
            classify_status(&url, StatusCode::FORBIDDEN),
            FetchError::AuthFailed { status: 403, .. }
        ));
        let server = classify_status(&url, StatusCode::BAD_GATEWAY);
        assert!(is_retryable(&server));
        assert!(!is_retryable(&classify_status(&url, StatusCode::BAD_REQUEST)));
    }

    #[test]
    fn fetches_artifact_with_valid_checksum() {
        let body = b"hello world".to_vec();
        let digest = hex::encode(Sha1::digest(&body));
        let base = serve(
            vec![
                ("/repo/g/a/1.0/a-1.0.jar", 200, body.clone()),
                ("/repo/g/a/1.0/a-1.0.jar.sha1", 200, digest.into_bytes()),
            ],
            2,
        );
        let mut stream = fetcher().fetch_artifact(&base, "g/a/1.0/a-1.0.jar", None).unwrap();
        let mut received = Vec::new();
        stream.read_to_end(&mut received).unwrap();
        assert_eq!(received, body);
    }

    #[test]
    fn rejects_checksum_mismatch() {
        let base = serve(
            vec![
                ("/repo/a.jar", 200, b"tampered".to_vec()),
                ("/repo/a.jar.sha1", 200, b"2aae6c35c94fcfb415dbe95f408b9ce91ee846ed".to_vec()),
            ],
            2,
        );
        let Err(err) = fetcher().fetch_artifact(&base, "a.jar", None) else {
            panic!("checksum mismatch accepted");
        };
        assert!(matches!(err, FetchError::ChecksumMismatch { .. }));
    }

    #[test]
    fn missing_artifact_is_not_found() {
        let base = serve(Vec::new(), 1);
        let Err(err) = fetcher().fetch_artifact(&base, "missing.jar", None) else {
            panic!("missing artifact served");
        };
        assert!(err.is_not_found());
    }

    #[test]
    fn fetches_metadata() {
        let base = serve(
            vec![(
                "/repo/g/a/maven-metadata.xml",
                200,
                b"<metadata><versioning><versions><version>2.0</version></versions></versioning></metadata>".to_vec(),
            )],
            1,
        );
        let md = fetcher().fetch_metadata(&base, "g/a/maven-metadata.xml", None).unwrap();
        assert_eq!(md.latest_version(), Some("2.0"));
    }

    #[test]
    fn metadata_goes_through_proxy() {
        // The listener only answers the absolute-form request a proxy receives.
        let proxy_base = serve(
            vec![(
                "http://repo.invalid/m2/g/a/maven-metadata.xml",
                200,
                b"<metadata><versioning><latest>3.1</latest><versions><version>3.1</version></versions></versioning></metadata>".to_vec(),
            )],
            1,
        );
        let endpoint = format!(
            "http://{}:{}",
            proxy_base.host_str().unwrap(),
            proxy_base.port().unwrap()
        );
        let proxy = ProxyRule::from_url("p", None, &endpoint).unwrap();
        let repository = Url::parse("http://repo.invalid/m2/").unwrap();

        let md = fetcher()
            .fetch_metadata(&repository, "g/a/maven-metadata.xml", Some(&proxy))
            .unwrap();
        assert_eq!(md.latest_version(), Some("3.1"));
    }

    #[test]
    fn debug_hides_credentials() {
        let mut auth = AuthConfig::default();
        auth.set_http_basic("r.example.com", "u", "secret");
        let fetcher = HttpFetcher::new(DownloadOptions::default(), Some(auth)).unwrap();
        let debug = format!("{fetcher:?}");
        assert!(debug.contains("HttpFetcher"));
        assert!(!debug.contains("secret"));
    }
}
