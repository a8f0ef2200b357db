//! Response compression for the image serving path.

use tower_http::compression::CompressionLayer;
use tower_http::compression::predicate::SizeAbove;

/// Creates the gzip compression layer for file-serving responses.
///
/// The stock predicate exempts `image/*` bodies, which would leave every
/// stored file uncompressed, so compression is gated on size alone here.
/// The layer only encodes when the client's `Accept-Encoding` lists gzip,
/// passes other requests through untouched, and never re-encodes a
/// response that already carries a `Content-Encoding`.
#[must_use]
pub fn compression() -> CompressionLayer<SizeAbove> {
    CompressionLayer::new()
        .gzip(true)
        .compress_when(SizeAbove::new(1))
}
