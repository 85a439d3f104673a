//! TLS certificate inspection
//!
//! The handshake accepts any certificate: the point is to read expired or
//! otherwise invalid certificates too, never to trust the peer.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::ClientConfig;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::TlsConnector;
use tracing::{debug, instrument};
use url::Url;
use x509_parser::prelude::*;

use crate::CertificateInfo;

pub const DEFAULT_TLS_PORT: u16 = 443;

/// Something that can read the certificate a host presents
#[async_trait]
pub trait CertificateSource: Send + Sync {
    /// `None` on any connection, handshake or parse failure
    async fn inspect(&self, host: &str, port: u16, timeout: Duration) -> Option<CertificateInfo>;

    /// Whether a target should be inspected at all
    fn applies_to(&self, url: &Url) -> bool {
        url.scheme() == "https"
    }
}

/// Real TLS handshake against the target host
#[derive(Clone)]
pub struct TlsInspector {
    connector: TlsConnector,
}

impl TlsInspector {
    pub fn new() -> Result<Self, rustls::Error> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate))
            .with_no_client_auth();

        Ok(Self {
            connector: TlsConnector::from(Arc::new(config)),
        })
    }

    async fn peer_certificate(&self, host: &str, port: u16) -> Option<CertificateDer<'static>> {
        let server_name = ServerName::try_from(host.to_string()).ok()?;
        let stream = TcpStream::connect((host, port)).await.ok()?;
        let tls = self.connector.connect(server_name, stream).await.ok()?;

        let (_, connection) = tls.get_ref();
        connection
            .peer_certificates()
            .and_then(|chain| chain.first())
            .map(|cert| cert.clone().into_owned())
    }
}

#[async_trait]
impl CertificateSource for TlsInspector {
    #[instrument(skip(self))]
    async fn inspect(&self, host: &str, port: u16, limit: Duration) -> Option<CertificateInfo> {
        let Ok(der) = timeout(limit, self.peer_certificate(host, port)).await else {
            debug!("TLS handshake with {host}:{port} timed out");
            return None;
        };

        let Some(der) = der else {
            debug!("no certificate from {host}:{port}");
            return None;
        };

        let info = parse_certificate(der.as_ref());
        if info.is_none() {
            debug!("could not parse certificate of {host}:{port}");
        }
        info
    }
}

/// Extract validity and names from a DER encoded certificate
pub fn parse_certificate(der: &[u8]) -> Option<CertificateInfo> {
    let (_, cert) = X509Certificate::from_der(der).ok()?;
    let validity = cert.validity();

    Some(CertificateInfo {
        expiry: DateTime::<Utc>::from_timestamp(validity.not_after.timestamp(), 0)?,
        valid_from: DateTime::<Utc>::from_timestamp(validity.not_before.timestamp(), 0)?,
        issuer_name: display_name(cert.issuer()),
        subject_name: display_name(cert.subject()),
    })
}

/// Common name if there is one, the full distinguished name otherwise
fn display_name(name: &X509Name<'_>) -> String {
    name.iter_common_name()
        .next()
        .and_then(|cn| cn.as_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

#[derive(Debug)]
struct AcceptAnyCertificate;

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        vec![
            rustls::SignatureScheme::RSA_PKCS1_SHA256,
            rustls::SignatureScheme::ECDSA_NISTP256_SHA256,
            rustls::SignatureScheme::RSA_PKCS1_SHA384,
            rustls::SignatureScheme::ECDSA_NISTP384_SHA384,
            rustls::SignatureScheme::RSA_PKCS1_SHA512,
            rustls::SignatureScheme::RSA_PSS_SHA256,
            rustls::SignatureScheme::RSA_PSS_SHA384,
            rustls::SignatureScheme::RSA_PSS_SHA512,
            rustls::SignatureScheme::ED25519,
        ]
    }
}
