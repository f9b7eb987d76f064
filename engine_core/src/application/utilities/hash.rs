use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use md5::{Digest, Md5};
use pipeline_flow_domain::{Checksum, PipelineError};
use sha1::Sha1;
use sha2::Sha256;

const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_RETRIES: u32 = 5;

/// Hex digest of `bytes` using `algo` (`md5`, `sha1`, or `sha256`), as needed
/// by [`RemoteFileSystem::hash`](pipeline_flow_domain::services::RemoteFileSystem::hash)
/// across every protocol implementation.
pub fn hash_bytes(bytes: &[u8], algo: &str) -> Result<String, PipelineError> {
    match algo {
        "md5" => Ok(hex::encode(Md5::digest(bytes))),
        "sha1" => Ok(hex::encode(Sha1::digest(bytes))),
        "sha256" => Ok(hex::encode(Sha256::digest(bytes))),
        other => Err(PipelineError::invalid_config(format!("unsupported hash algorithm \"{other}\""))),
    }
}

/// Content fingerprint for the processed-file ledger (§4.3). MD5 is not a
/// security choice here, only a trusted-ledger content match.
///
/// Reads the file in one pass per attempt; on I/O failure, retries with
/// backoff `base_delay * attempt^2` before surfacing the last error. This
/// backoff shape is specific to hashing and intentionally does not reuse
/// [`crate::application::utilities::retry::retry`], whose backoff is
/// multiplicative rather than quadratic.
pub async fn hash_file(path: &Path) -> Result<Checksum, PipelineError> {
    hash_file_with(path, DEFAULT_BASE_DELAY, DEFAULT_MAX_RETRIES).await
}

pub async fn hash_file_with(path: &Path, base_delay: Duration, max_retries: u32) -> Result<Checksum, PipelineError> {
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match tokio::fs::read(path).await {
            Ok(bytes) => {
                let digest = Md5::digest(&bytes);
                return Checksum::new(hex::encode(digest));
            }
            Err(err) if attempt <= max_retries => {
                let delay = base_delay * attempt.pow(2);
                tracing::warn!(attempt, delay_ms = delay.as_millis() as u64, error = %err, "hash_file read failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(PipelineError::from(err)),
        }
    }
}

/// Dedup decision (§4.3): a file is sent unless its checksum is already
/// present in the ledger's name map and not flagged for resend.
pub fn decide_send(checksum: &Checksum, name_map: &HashMap<Checksum, String>, resend_set: &HashSet<Checksum>) -> (bool, bool) {
    let match_found = name_map.contains_key(checksum);
    let should_send = !match_found || resend_set.contains(checksum);
    (match_found, should_send)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cs(hex: &str) -> Checksum {
        Checksum::new(hex).unwrap()
    }

    #[test]
    fn unknown_checksum_should_send() {
        let map = HashMap::new();
        let resend = HashSet::new();
        let (matched, send) = decide_send(&cs("0cc175b9c0f1b6a831c399e269772661"), &map, &resend);
        assert!(!matched);
        assert!(send);
    }

    #[test]
    fn known_checksum_without_resend_is_skipped() {
        let checksum = cs("d41d8cd98f00b204e9800998ecf8427e");
        let mut map = HashMap::new();
        map.insert(checksum.clone(), "a.edi".to_string());
        let resend = HashSet::new();
        let (matched, send) = decide_send(&checksum, &map, &resend);
        assert!(matched);
        assert!(!send);
    }

    #[test]
    fn known_checksum_with_resend_flag_still_sends() {
        let checksum = cs("d41d8cd98f00b204e9800998ecf8427e");
        let mut map = HashMap::new();
        map.insert(checksum.clone(), "a.edi".to_string());
        let mut resend = HashSet::new();
        resend.insert(checksum.clone());
        let (matched, send) = decide_send(&checksum, &map, &resend);
        assert!(matched);
        assert!(send);
    }

    #[tokio::test]
    async fn hash_file_hashes_known_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        tokio::fs::write(&path, b"").await.unwrap();
        let checksum = hash_file(&path).await.unwrap();
        assert_eq!(checksum.as_str(), "d41d8cd98f00b204e9800998ecf8427e");
    }
}
