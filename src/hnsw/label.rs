//! Row identifier <-> node label mapping
//!
//! A label carries the six identifier bytes verbatim in its low-order bytes;
//! the two high-order bytes are always zero.

use crate::types::{ItemPointer, Label, ITEM_POINTER_BYTES};

/// Encode a row identifier as an engine label
#[inline]
pub fn get_label(tid: &ItemPointer) -> Label {
    let mut bytes = [0u8; 8];
    bytes[..ITEM_POINTER_BYTES].copy_from_slice(&tid.to_bytes());
    Label::from_le_bytes(bytes)
}

/// Recover the row identifier a label was encoded from
#[inline]
pub fn label_to_item_pointer(label: Label) -> ItemPointer {
    let bytes = label.to_le_bytes();
    let mut tid = [0u8; ITEM_POINTER_BYTES];
    tid.copy_from_slice(&bytes[..ITEM_POINTER_BYTES]);
    ItemPointer::from_bytes(tid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_label_layout() {
        let tid = ItemPointer::new(0x0102_0304, 0x0506);
        let label = get_label(&tid);
        assert_eq!(label >> 48, 0);
        assert_eq!(&label.to_le_bytes()[..6], &tid.to_bytes());
        assert_eq!(label_to_item_pointer(label), tid);
    }

    #[test]
    fn test_zero_and_max() {
        assert_eq!(get_label(&ItemPointer::new(0, 0)), 0);
        assert_eq!(get_label(&ItemPointer::new(u32::MAX, u16::MAX)), (1u64 << 48) - 1);
    }

    proptest! {
        #[test]
        fn label_high_bytes_are_zero(block in any::<u32>(), offset in any::<u16>()) {
            let tid = ItemPointer::new(block, offset);
            let label = get_label(&tid);
            prop_assert_eq!(label >> 48, 0);
            prop_assert_eq!(label_to_item_pointer(label), tid);
        }

        #[test]
        fn distinct_tids_give_distinct_labels(
            a in (any::<u32>(), any::<u16>()),
            b in (any::<u32>(), any::<u16>()),
        ) {
            let ta = ItemPointer::new(a.0, a.1);
            let tb = ItemPointer::new(b.0, b.1);
            prop_assume!(ta != tb);
            prop_assert_ne!(get_label(&ta), get_label(&tb));
        }
    }
}
