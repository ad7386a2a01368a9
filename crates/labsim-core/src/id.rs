//! Identity types for lab sessions
//!
//! Identifiers are plain 64-bit counters allocated by their owning store.
//! They are never reused within a session.

use std::fmt;

/// Vessel identity - a test tube or beaker on the lab table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VesselId(pub u64);

impl VesselId {
    pub const ZERO: VesselId = VesselId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        VesselId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        VesselId(self.0 + 1)
    }
}

impl fmt::Debug for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vessel({})", self.0)
    }
}

impl fmt::Display for VesselId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vessel-{}", self.0)
    }
}

/// Attachment identity - one instrument bound to one vessel
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct AttachmentId(pub u64);

impl AttachmentId {
    pub const ZERO: AttachmentId = AttachmentId(0);

    #[inline]
    pub fn new(id: u64) -> Self {
        AttachmentId(id)
    }

    #[inline]
    pub fn next(self) -> Self {
        AttachmentId(self.0 + 1)
    }
}

impl fmt::Debug for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Attachment({})", self.0)
    }
}

impl fmt::Display for AttachmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attachment-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_ordered() {
        let a = AttachmentId::new(1);
        assert!(a.next() > a);
        assert_eq!(VesselId::ZERO.next(), VesselId::new(1));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(VesselId::new(7).to_string(), "vessel-7");
        assert_eq!(format!("{:?}", AttachmentId::new(3)), "Attachment(3)");
    }
}
