//! `ipfs://` URI resolution.

/// URI prefix for content-addressed evidence bundles.
pub const IPFS_PREFIX: &str = "ipfs://";

/// Rewrite `ipfs://<cid>/<path>` to `<gateway>/ipfs/<cid>/<path>`.
///
/// Any other URI is returned unchanged.
pub fn ipfs_to_gateway(gateway: &str, uri: &str) -> String {
    match uri.strip_prefix(IPFS_PREFIX) {
        Some(rest) => format!("{}/ipfs/{rest}", gateway.trim_end_matches('/')),
        None => uri.to_string(),
    }
}
