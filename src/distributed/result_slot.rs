/// What one node has validated so far.
///
/// Byte layout, little endian:
/// `[u32 trees_validated][u64 n_rows][u64; trees_validated errors]`,
/// where `errors[t]` is the number of rows the node's majority vote
/// got wrong after `t + 1` trees.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSlot {
    /// Number of trees the node has validated.
    pub trees_validated: u32,
    /// Number of validation rows of the node.
    pub n_rows: u64,
    /// Cumulative error counts, oldest first.
    pub errors: Vec<u64>,
}


const HEADER_BYTES: usize = 4 + 8;


impl ResultSlot {
    /// Encode the slot.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(HEADER_BYTES + 8 * self.errors.len());
        bytes.extend_from_slice(&self.trees_validated.to_le_bytes());
        bytes.extend_from_slice(&self.n_rows.to_le_bytes());
        for e in &self.errors {
            bytes.extend_from_slice(&e.to_le_bytes());
        }
        bytes
    }


    /// Decode a slot.
    /// Returns `None` if `bytes` is shorter than its header announces.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let trees_validated = u32::from_le_bytes(
            bytes.get(0..4)?.try_into().ok()?
        );
        let n_rows = u64::from_le_bytes(
            bytes.get(4..HEADER_BYTES)?.try_into().ok()?
        );
        let errors = bytes.get(HEADER_BYTES..)?
            .chunks_exact(8)
            .take(trees_validated as usize)
            .map(|chunk| {
                let mut word = [0u8; 8];
                word.copy_from_slice(chunk);
                u64::from_le_bytes(word)
            })
            .collect::<Vec<_>>();

        if errors.len() < trees_validated as usize {
            return None;
        }
        Some(Self { trees_validated, n_rows, errors })
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_01() {
        let slot = ResultSlot { trees_validated: 2, n_rows: 9, errors: vec![4, 3] };
        let bytes = slot.to_bytes();
        assert_eq!(bytes.len(), 4 + 8 + 16);
        assert_eq!(&bytes[..4], &[2, 0, 0, 0]);
        assert_eq!(&bytes[4..12], &[9, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(ResultSlot::from_bytes(&bytes), Some(slot));
    }

    #[test]
    fn test_truncated_02() {
        let slot = ResultSlot { trees_validated: 3, n_rows: 5, errors: vec![1, 1, 0] };
        let bytes = slot.to_bytes();
        assert_eq!(ResultSlot::from_bytes(&bytes[..bytes.len() - 1]), None);
        assert_eq!(ResultSlot::from_bytes(&bytes[..7]), None);
        assert_eq!(ResultSlot::from_bytes(&[]), None);
    }
}
