//! Transaction energy: a deterministic value derived from the canonical
//! serialization of a transaction.
//!
//! `energy = si_value(L) + binary_value(L) + frac`, where `L` is the serialized
//! length and `frac` comes from the last eight bytes of the SHA-256 of the same
//! bytes. Both size values are the raw length, so the result is `2L + frac`.

use crate::crypto::sha256;
use crate::transaction::Transaction;
use crate::units::{binary_byte_value, si_byte_value};

const FRACTION_MODULUS: u64 = 1_000_000_000;

/// Fractional component in `[0, 1)` taken from a transaction's serialized bytes.
pub fn energy_fraction(serialized: &[u8]) -> f64 {
    let digest = sha256(serialized);
    let mut tail = [0u8; 8];
    tail.copy_from_slice(&digest[24..]);
    let value = u64::from_be_bytes(tail);
    (value % FRACTION_MODULUS) as f64 / FRACTION_MODULUS as f64
}

pub fn transaction_energy(tx: &Transaction) -> f64 {
    let bytes = tx.canonical_bytes();
    let len = bytes.len();
    si_byte_value(len) + binary_byte_value(len) + energy_fraction(&bytes)
}

impl Transaction {
    pub fn energy(&self) -> f64 {
        transaction_energy(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::TxKind;

    #[test]
    fn test_reference_transfer_energy() {
        let tx = Transaction::transfer("alice", "bob", 10.0, 0);
        let frac = energy_fraction(&tx.canonical_bytes());
        assert!((frac - 0.094828902).abs() < 1e-12);
        assert!((tx.energy() - 54.094828902).abs() < 1e-9);
    }

    #[test]
    fn test_energy_is_deterministic_and_bounded() {
        let txs = [
            Transaction::transfer("alice", "bob", 10.0, 0),
            Transaction::mint("treasury", 1e12, 2),
            Transaction::new("x", "y", 0.0, 63, TxKind::GovernanceProposal)
                .with_memo("vote yes")
                .unwrap(),
        ];
        for tx in &txs {
            let first = transaction_energy(tx);
            assert_eq!(first, transaction_energy(tx));
            let two_l = 2.0 * tx.serialized_len() as f64;
            assert!(first >= two_l && first < two_l + 1.0, "{first} vs {two_l}");
        }
    }

    #[test]
    fn test_energy_ignores_unit_table_magnitudes() {
        let tx = Transaction::transfer("a", "b", 1.0, 0);
        let len = tx.serialized_len();
        let floor = (tx.energy() - energy_fraction(&tx.canonical_bytes())).round();
        assert_eq!(floor, (2 * len) as f64);
    }
}
