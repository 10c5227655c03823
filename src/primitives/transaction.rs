// Data structures: staged transaction
//
// A transaction is opaque to the core: the payload is interpreted only by
// the ActionEvaluator. The core only ever looks at signer/nonce/id/size.

/// Fixed-width identifier derived from a public key by a collaborator
/// outside the core (address derivation is a signature-scheme concern).
pub type Address = [u8; 32];

/// Content hash of a transaction, assigned by whoever admitted it into
/// staging.
pub type TxId = [u8; 32];

/// A signed, staged transaction. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Transaction {
    pub id: TxId,
    pub signer: Address,
    pub nonce: u64,
    pub timestamp: u64,
    /// Encoded size in bytes, as reported by whoever admitted the tx into
    /// staging. The core trusts this value for size-cap accounting rather
    /// than re-encoding every candidate.
    pub size_bytes: u64,
    /// Opaque action payload. The core never inspects this; it is handed
    /// to the ActionEvaluator unchanged.
    pub payload: Vec<u8>,
}

impl Transaction {
    pub fn new(id: TxId, signer: Address, nonce: u64, timestamp: u64, payload: Vec<u8>) -> Self {
        let size_bytes = payload.len() as u64;
        Self { id, signer, nonce, timestamp, size_bytes, payload }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_derives_size_from_payload() {
        let tx = Transaction::new([1u8; 32], [2u8; 32], 0, 1_700_000_000, vec![0u8; 17]);
        assert_eq!(tx.size_bytes, 17);
    }
}
