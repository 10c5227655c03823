// BlockCodec: marshal/hash primitives, consumed (not implemented) by the
// core. Every byte-format and hashing decision lives here, so the core
// itself never hardcodes a signature scheme, digest width, or wire
// layout — including the worst-case placeholder signature width a
// header reserves before a real signature exists.
use crate::primitives::{Block, BlockMetadata, Hash, Transaction};

pub trait BlockCodec: Send + Sync {
    /// Working encoding a `SizeEstimator` mutates as it appends
    /// candidate transactions. Implementations may make this a cheap
    /// running tally or a real partial encoding — callers only ever
    /// observe it through `encoding_length`.
    type Encoding: Clone + Send;

    /// Native digest width of this codec's hash function, in bytes.
    const DIGEST_SIZE: usize;

    /// Worst-case signature length this codec's header placeholder
    /// reserves when a proposer public key is present. A protocol
    /// constant of the signature scheme, not a magic number — the
    /// placeholder width is codec-supplied so a codec swap never
    /// silently invalidates size bounds.
    const PLACEHOLDER_SIGNATURE_BYTES: usize;

    /// Builds the initial encoding for `metadata` with zero
    /// transactions, using a worst-case placeholder header shape.
    fn empty_encoding(&self, metadata: &BlockMetadata) -> Self::Encoding;

    /// Returns a new encoding with `tx` appended.
    fn append_tx(&self, encoding: &Self::Encoding, tx: &Transaction) -> Self::Encoding;

    fn encoding_length(&self, encoding: &Self::Encoding) -> u64;

    /// Hash covering `metadata` + `transactions` + `nonce`, as evaluated
    /// by a mining worker trying that nonce.
    fn pre_evaluation_hash(&self, metadata: &BlockMetadata, transactions: &[Transaction], nonce: u64) -> Hash;

    /// Whether `hash` satisfies the difficulty target.
    fn meets_target(&self, hash: &Hash, difficulty: u64) -> bool;

    /// Hash of a fully finalized block (covers the pre-evaluation hash,
    /// state root, and signature).
    fn block_hash(&self, block: &Block) -> Hash;
}
