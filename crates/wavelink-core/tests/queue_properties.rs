//! Property-based tests for the send queue.
//!
//! Quantify over entry states instead of fixed scenarios: the capacity
//! bound, sweep's removal/selection split, and ACK idempotence.

use bytes::Bytes;
use proptest::prelude::*;
use wavelink_core::{PendingMessage, SendQueue};
use wavelink_proto::{MacAddr, MsgId};

const PEER: MacAddr = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);

fn entry(index: usize, retry_count: u8, last_send_us: i64, acked: bool) -> PendingMessage {
    PendingMessage {
        peer: PEER,
        msg_id: MsgId([index as u8, (index >> 8) as u8, 0]),
        retry_count,
        last_send_us,
        acked,
        peer_add_attempts: 0,
        encoded: Bytes::from_static(b"\x00frame"),
    }
}

/// Strategy for one entry's variable state.
fn arbitrary_state() -> impl Strategy<Value = (u8, i64, bool)> {
    (0u8..8, 0i64..1_000_000, any::<bool>())
}

#[test]
fn prop_len_never_exceeds_capacity() {
    proptest!(|(capacity in 1usize..16, pushes in 1usize..48)| {
        let mut queue = SendQueue::new(capacity);

        let mut accepted = 0usize;
        for i in 0..pushes {
            if queue.push(entry(i, 0, 0, false)).is_ok() {
                accepted += 1;
            }
        }

        prop_assert_eq!(accepted, pushes.min(capacity));
        prop_assert!(queue.len() <= capacity);
    });
}

#[test]
fn prop_sweep_selects_exactly_the_due_entries() {
    proptest!(|(
        states in prop::collection::vec(arbitrary_state(), 0..24),
        now in 0i64..2_000_000,
        timeout_us in 1i64..500_000,
        max_retries in 0u8..6,
    )| {
        let mut queue = SendQueue::new(64);
        for (i, (retry_count, last_send_us, acked)) in states.iter().copied().enumerate() {
            queue.push(entry(i, retry_count, last_send_us, acked)).expect("under capacity");
        }

        let candidates = queue.sweep(now, timeout_us, max_retries);

        // PROPERTY: a candidate is exactly a surviving entry past its
        // timeout with retries remaining, in insertion order
        let expected: Vec<MsgId> = states
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, (retry_count, last_send_us, acked))| {
                let removable = acked
                    || (now - last_send_us > timeout_us && retry_count >= max_retries);
                !removable && now - last_send_us > timeout_us && retry_count < max_retries
            })
            .map(|(i, _)| MsgId([i as u8, (i >> 8) as u8, 0]))
            .collect();

        let selected: Vec<MsgId> = candidates.iter().map(|c| c.msg_id).collect();
        prop_assert_eq!(selected, expected);

        // PROPERTY: nothing acked survives a sweep
        let survivors = queue.len();
        let not_removed = states
            .iter()
            .filter(|&&(retry_count, last_send_us, acked)| {
                !(acked || (now - last_send_us > timeout_us && retry_count >= max_retries))
            })
            .count();
        prop_assert_eq!(survivors, not_removed);
    });
}

#[test]
fn prop_mark_acked_flips_at_most_once() {
    proptest!(|(attempts in 1usize..8)| {
        let mut queue = SendQueue::new(8);
        queue.push(entry(1, 0, 0, false)).expect("under capacity");

        let flips = (0..attempts)
            .filter(|_| queue.mark_acked(PEER, MsgId([1, 0, 0])))
            .count();

        prop_assert_eq!(flips, 1);
    });
}
