//! HTTP access to distribution mirrors.
//!
//! All remote reads go through one shared agent with a global timeout.
//! Listing pages and archives are pulled fully into memory; package
//! archives are bounded in size, so buffering beats staging them on disk.

use std::io::Read;
use std::sync::OnceLock;
use std::time::Duration;

use flate2::read::GzDecoder;
use log::{debug, warn};

use crate::catalog::PackagePair;
use crate::error::{BuilderError, Result};

/// Network timeout for mirror requests. Debug packages run to hundreds of
/// megabytes on slow mirrors, so this is deliberately generous.
const MIRROR_TIMEOUT: Duration = Duration::from_secs(600);

/// Shared `ureq` agent with request timeout configuration.
fn http_agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(MIRROR_TIMEOUT))
            .build();
        ureq::Agent::new_with_config(config)
    })
}

/// GET a URL and return the raw body bytes.
pub fn get_bytes(url: &str) -> Result<Vec<u8>> {
    debug!("GET {url}");
    let response = http_agent()
        .get(url)
        .call()
        .map_err(|e| BuilderError::fetch(url, e))?;
    let mut body = Vec::new();
    std::io::copy(&mut response.into_body().as_reader(), &mut body)
        .map_err(|e| BuilderError::fetch(url, e))?;
    Ok(body)
}

/// GET a URL and return the body as text.
///
/// Mirror listings are ASCII HTML; anything undecodable is replaced rather
/// than failing the whole listing.
pub fn get_text(url: &str) -> Result<String> {
    let body = get_bytes(url)?;
    Ok(String::from_utf8_lossy(&body).into_owned())
}

/// GET a gzip-compressed feed (e.g. `repodata/primary.xml.gz`) and return
/// the decompressed content as text.
pub fn get_gzipped_text(url: &str) -> Result<String> {
    let body = get_bytes(url)?;
    let mut decoder = GzDecoder::new(body.as_slice());
    let mut xml = Vec::new();
    decoder
        .read_to_end(&mut xml)
        .map_err(|e| BuilderError::fetch(url, format!("gzip feed decode: {e}")))?;
    Ok(String::from_utf8_lossy(&xml).into_owned())
}

/// HEAD a URL and return the observed status code.
///
/// Non-2xx statuses are an answer, not a transport failure.
pub fn head_status(url: &str) -> Result<u16> {
    debug!("HEAD {url}");
    match http_agent().head(url).call() {
        Ok(response) => Ok(response.status().as_u16()),
        Err(ureq::Error::StatusCode(code)) => Ok(code),
        Err(e) => Err(BuilderError::fetch(url, e)),
    }
}

/// Probe both halves of a pair for existence.
///
/// Both locators must independently answer 200; anything else marks the
/// pair invalid and logs the observed pair of status codes.
pub fn validate_links(pair: &PackagePair) -> Result<bool> {
    let kernel_status = head_status(&pair.kernel_url)?;
    let debug_status = head_status(&pair.debug_url)?;

    if kernel_status == 200 && debug_status == 200 {
        Ok(true)
    } else {
        warn!(
            "{}: kernel package returned {}, debug package returned {}",
            pair.kernel, kernel_status, debug_status
        );
        Ok(false)
    }
}
