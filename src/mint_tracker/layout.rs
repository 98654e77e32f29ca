//! Mint Account Layout
//!
//! Fixed 82-byte little-endian layout of an SPL token mint:
//!
//! ```text
//! offset  size  field
//!      0     4  mint authority option (1 = present)
//!      4    32  mint authority
//!     36     8  supply
//!     44     1  decimals
//!     45     1  is_initialized
//!     46     4  freeze authority option
//!     50    32  freeze authority
//! ```
//!
//! Only the authority and the initialized flag matter for birth detection.

use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use super::types::{AccountRecord, MintState};

/// Size of a mint account
pub const MINT_ACCOUNT_LEN: usize = 82;

const AUTHORITY_OPTION_OFFSET: usize = 0;
const AUTHORITY_OFFSET: usize = 4;
const INITIALIZED_OFFSET: usize = 45;

/// Decode the initialized flag and mint authority.
///
/// Buffers shorter than [`MINT_ACCOUNT_LEN`] yield [`MintState::UNDECODABLE`].
pub fn decode_mint(data: &[u8]) -> MintState {
    if data.len() < MINT_ACCOUNT_LEN {
        return MintState::UNDECODABLE;
    }

    let option = u32::from_le_bytes([
        data[AUTHORITY_OPTION_OFFSET],
        data[AUTHORITY_OPTION_OFFSET + 1],
        data[AUTHORITY_OPTION_OFFSET + 2],
        data[AUTHORITY_OPTION_OFFSET + 3],
    ]);

    let authority = if option == 1 {
        let mut key = [0u8; 32];
        key.copy_from_slice(&data[AUTHORITY_OFFSET..AUTHORITY_OFFSET + 32]);
        Some(Pubkey::new_from_array(key))
    } else {
        None
    };

    MintState {
        initialized: data[INITIALIZED_OFFSET] == 1,
        authority,
    }
}

/// Build a mint account buffer (test fixtures and tooling)
pub fn encode_mint(authority: Option<&Pubkey>, initialized: bool) -> Vec<u8> {
    let mut data = vec![0u8; MINT_ACCOUNT_LEN];
    if let Some(key) = authority {
        data[AUTHORITY_OPTION_OFFSET..AUTHORITY_OPTION_OFFSET + 4]
            .copy_from_slice(&1u32.to_le_bytes());
        data[AUTHORITY_OFFSET..AUTHORITY_OFFSET + 32].copy_from_slice(key.as_ref());
    }
    data[INITIALIZED_OFFSET] = u8::from(initialized);
    data
}

/// Counts over one ledger snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SnapshotSummary {
    /// Slot the snapshot was taken at; `None` for an empty snapshot
    pub slot: Option<u64>,
    pub accounts: usize,
    pub initialized: usize,
}

pub fn summarize_snapshot(records: &[AccountRecord]) -> SnapshotSummary {
    SnapshotSummary {
        slot: records.iter().map(|record| record.slot).max(),
        accounts: records.len(),
        initialized: records
            .iter()
            .filter(|record| decode_mint(&record.data).initialized)
            .count(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_initialized_with_authority() {
        let authority = Pubkey::new_unique();
        let mut data = encode_mint(Some(&authority), true);
        // supply / decimals / freeze authority are ignored
        data[36..44].copy_from_slice(&1_000_000u64.to_le_bytes());
        data[44] = 9;
        data[46] = 1;

        let state = decode_mint(&data);
        assert!(state.initialized);
        assert_eq!(state.authority, Some(authority));
        assert_eq!(decode_mint(&data), state);
    }

    #[test]
    fn test_absent_authority_ignores_key_bytes() {
        let mut data = encode_mint(None, true);
        data[4..36].fill(0xAB);

        let state = decode_mint(&data);
        assert!(state.initialized);
        assert_eq!(state.authority, None);
        assert_eq!(state.authority_label(), "unknown");
    }

    #[test]
    fn test_uninitialized_flag() {
        let data = encode_mint(Some(&Pubkey::new_unique()), false);
        assert!(!decode_mint(&data).initialized);

        let mut data = encode_mint(None, true);
        data[45] = 2;
        assert!(!decode_mint(&data).initialized);
    }

    #[test]
    fn test_undersized_buffers() {
        assert_eq!(decode_mint(&[]), MintState::UNDECODABLE);
        assert_eq!(decode_mint(&[1, 0, 0, 0]), MintState::UNDECODABLE);

        let data = encode_mint(Some(&Pubkey::new_unique()), true);
        assert_eq!(decode_mint(&data[..81]), MintState::UNDECODABLE);
    }

    #[test]
    fn test_oversized_buffer_uses_prefix() {
        let authority = Pubkey::new_unique();
        let mut data = encode_mint(Some(&authority), true);
        data.extend_from_slice(&[7u8; 83]);

        let state = decode_mint(&data);
        assert!(state.initialized);
        assert_eq!(state.authority, Some(authority));
    }

    #[test]
    fn test_snapshot_summary() {
        let records = vec![
            AccountRecord::new(Pubkey::new_unique(), encode_mint(None, true), 310),
            AccountRecord::new(Pubkey::new_unique(), encode_mint(None, false), 310),
            AccountRecord::new(Pubkey::new_unique(), vec![0; 10], 310),
        ];

        let summary = summarize_snapshot(&records);
        assert_eq!(summary.slot, Some(310));
        assert_eq!(summary.accounts, 3);
        assert_eq!(summary.initialized, 1);

        assert_eq!(summarize_snapshot(&[]), SnapshotSummary::default());
    }
}
