use crate::codec::BlockCodec;
use crate::primitives::{BlockMetadata, Transaction};

/// Stateless wrapper around a codec's encoding primitives. Holds no
/// encoding of its own — callers thread the `Encoding` value through
/// `append`/`length` themselves, so probing a candidate append (size
/// gate) never commits it.
pub struct SizeEstimator<'c, C: BlockCodec> {
    codec: &'c C,
}

impl<'c, C: BlockCodec> SizeEstimator<'c, C> {
    pub fn new(codec: &'c C) -> Self {
        Self { codec }
    }

    pub fn empty(&self, metadata: &BlockMetadata) -> C::Encoding {
        self.codec.empty_encoding(metadata)
    }

    pub fn append(&self, encoding: &C::Encoding, tx: &Transaction) -> C::Encoding {
        self.codec.append_tx(encoding, tx)
    }

    pub fn length(&self, encoding: &C::Encoding) -> u64 {
        self.codec.encoding_length(encoding)
    }
}
