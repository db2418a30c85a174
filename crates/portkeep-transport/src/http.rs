//! Real HTTP executor built on `reqwest`.

use std::time::Duration;

use crate::{RequestExecutor, TransportError, TransportOptions, WireReply, XML_CONTENT_TYPE};

/// [`RequestExecutor`] backed by a shared `reqwest` client.
///
/// Built once per keeper with redirect following *disabled*; see the crate
/// docs for why that is load-bearing. Cloning is cheap and shares the
/// underlying connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds the executor from [`TransportOptions`].
    ///
    /// # Errors
    ///
    /// [`TransportError::InvalidProxy`] for an unparseable proxy URL and
    /// [`TransportError::Build`] when the TLS or socket layer cannot be
    /// initialized. Both are construction-time failures: a keeper that
    /// cannot build its executor must not start.
    pub fn new(options: TransportOptions) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none());

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(url) = options.proxy_url.as_deref() {
            let proxy = reqwest::Proxy::all(url).map_err(|e| TransportError::InvalidProxy {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;
            builder = builder.proxy(proxy);
        }

        #[cfg(any(target_os = "android", target_os = "fuchsia", target_os = "linux"))]
        if let Some(device) = options.bind_interface.as_deref() {
            tracing::debug!(%device, "binding outgoing sockets to interface");
            builder = builder.interface(device);
        }
        #[cfg(not(any(target_os = "android", target_os = "fuchsia", target_os = "linux")))]
        if let Some(device) = options.bind_interface.as_deref() {
            tracing::warn!(%device, "interface binding is not supported on this platform, ignoring");
        }

        let client = builder.build().map_err(TransportError::Build)?;
        Ok(Self { client })
    }
}

/// Sorts a send failure into the engine-visible categories.
fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Request(err)
    }
}

/// Reduces a full response to the [`WireReply`] the engine reads.
async fn reply_from(resp: reqwest::Response) -> Result<WireReply, TransportError> {
    let status = resp.status().as_u16();
    let location = resp
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);
    let body = resp.bytes().await.map_err(classify)?.to_vec();
    Ok(WireReply {
        status,
        location,
        body,
    })
}

impl RequestExecutor for HttpTransport {
    async fn get(&self, url: &str) -> Result<WireReply, TransportError> {
        tracing::trace!(%url, "GET");
        let resp = self.client.get(url).send().await.map_err(classify)?;
        reply_from(resp).await
    }

    async fn post(&self, url: &str, body: &[u8]) -> Result<WireReply, TransportError> {
        tracing::trace!(%url, bytes = body.len(), "POST");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body.to_vec())
            .send()
            .await
            .map_err(classify)?;
        reply_from(resp).await
    }

    async fn post_with_timeout(
        &self,
        url: &str,
        body: &[u8],
        timeout: Duration,
    ) -> Result<WireReply, TransportError> {
        tracing::trace!(%url, bytes = body.len(), ?timeout, "POST (bounded)");
        let resp = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, XML_CONTENT_TYPE)
            .body(body.to_vec())
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;
        reply_from(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_with_default_options() {
        assert!(HttpTransport::new(TransportOptions::default()).is_ok());
    }

    #[test]
    fn test_new_rejects_malformed_proxy_url() {
        let options = TransportOptions {
            proxy_url: Some("::not a proxy::".into()),
            ..Default::default()
        };
        let err = HttpTransport::new(options).unwrap_err();
        assert!(matches!(err, TransportError::InvalidProxy { .. }));
    }

    #[test]
    fn test_new_accepts_socks_proxy_scheme() {
        let options = TransportOptions {
            proxy_url: Some("socks5://127.0.0.1:1080".into()),
            ..Default::default()
        };
        assert!(HttpTransport::new(options).is_ok());
    }
}
