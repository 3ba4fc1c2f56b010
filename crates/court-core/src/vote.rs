//! # Sealed Votes
//!
//! Commit/reveal hashing as performed by the voting contract. A juror commits
//! `seal(outcome, salt)` and later reveals `(outcome, salt)`; the contract
//! accepts the reveal only if it hashes back to the stored commitment.
//!
//! Jurors supply a password rather than a raw salt. The salt is the keccak
//! hash of the password's UTF-8 bytes, so the same password always yields
//! the same salt and can be re-derived at reveal time.

use alloy_primitives::{keccak256, Address, B256, U256};

use crate::identity::{Outcome, VoteId};

/// Storage slot of the vote records mapping in the voting contract.
const VOTE_RECORDS_SLOT: u64 = 1;

/// Derive a vote salt from a juror password.
pub fn salt(password: &str) -> B256 {
    keccak256(password.as_bytes())
}

/// Seal an outcome: `keccak256(uint8(outcome) ‖ salt)`, packed encoding.
pub fn seal(outcome: Outcome, salt: B256) -> B256 {
    let mut buf = [0u8; 33];
    buf[0] = outcome.0;
    buf[1..].copy_from_slice(salt.as_slice());
    keccak256(buf)
}

/// Storage slot holding `voter`'s sealed commitment for `vote`.
///
/// The vote records mapping sits at slot 1 and is keyed by vote id. Each
/// record's second member is the cast-vote mapping keyed by voter, and the
/// commitment is the first member of a cast vote.
pub fn commitment_slot(vote: VoteId, voter: Address) -> B256 {
    let vote_slot = mapping_slot(
        vote.as_u256().to_be_bytes::<32>(),
        U256::from(VOTE_RECORDS_SLOT),
    );
    let cast_votes_slot = vote_slot + U256::from(1u64);

    let mut voter_key = [0u8; 32];
    voter_key[12..].copy_from_slice(voter.as_slice());
    B256::from(mapping_slot(voter_key, cast_votes_slot).to_be_bytes::<32>())
}

/// Solidity mapping slot: `keccak256(key ‖ pad32(base_slot))`.
fn mapping_slot(key: [u8; 32], base_slot: U256) -> U256 {
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(&key);
    buf[32..].copy_from_slice(&base_slot.to_be_bytes::<32>());
    U256::from_be_bytes(keccak256(buf).0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{DisputeId, RoundId};

    #[test]
    fn salt_of_empty_password_is_keccak_of_empty_input() {
        let expected: B256 = "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
            .parse()
            .unwrap();
        assert_eq!(salt(""), expected);
    }

    #[test]
    fn seal_is_deterministic() {
        let s = salt("hunter2");
        assert_eq!(seal(Outcome(3), s), seal(Outcome(3), s));
    }

    #[test]
    fn seal_binds_outcome_and_salt() {
        let s = salt("hunter2");
        assert_ne!(seal(Outcome(3), s), seal(Outcome(4), s));
        assert_ne!(seal(Outcome(3), s), seal(Outcome(3), salt("hunter3")));
    }

    #[test]
    fn seal_hashes_packed_outcome_then_salt() {
        let s = salt("pw");
        let mut packed = vec![4u8];
        packed.extend_from_slice(s.as_slice());
        assert_eq!(seal(Outcome(4), s), keccak256(&packed));
    }

    #[test]
    fn commitment_slot_is_per_voter_and_per_vote() {
        let vote = VoteId::new(DisputeId(3), RoundId(0));
        let other_vote = VoteId::new(DisputeId(3), RoundId(1));
        let a = Address::repeat_byte(0xaa);
        let b = Address::repeat_byte(0xbb);
        assert_ne!(commitment_slot(vote, a), commitment_slot(vote, b));
        assert_ne!(commitment_slot(vote, a), commitment_slot(other_vote, a));
    }

    #[test]
    fn commitment_slot_follows_nested_mapping_layout() {
        let vote = VoteId::new(DisputeId(1), RoundId(0));
        let voter = Address::repeat_byte(0x11);

        let mut outer = [0u8; 64];
        outer[..32].copy_from_slice(&vote.as_u256().to_be_bytes::<32>());
        outer[63] = 1;
        let record = U256::from_be_bytes(keccak256(outer).0) + U256::from(1u64);

        let mut inner = [0u8; 64];
        inner[12..32].copy_from_slice(voter.as_slice());
        inner[32..].copy_from_slice(&record.to_be_bytes::<32>());

        assert_eq!(commitment_slot(vote, voter), keccak256(inner));
    }
}
