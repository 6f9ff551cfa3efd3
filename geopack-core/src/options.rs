//! Encoder configuration.

use crate::buffer::ByteOrder;

/// Which envelope, if any, the header of a non-empty geometry carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnvelopePolicy {
    /// Envelope with the geometry's own dimensionality.
    #[default]
    Auto,
    /// No envelope (indicator code 0).
    Omit,
    /// XY envelope only (indicator code 1), whatever the dimensionality.
    XyOnly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EncodeOptions {
    pub byte_order: ByteOrder,
    pub envelope: EnvelopePolicy,
}

impl EncodeOptions {
    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopePolicy) -> Self {
        self.envelope = envelope;
        self
    }
}
