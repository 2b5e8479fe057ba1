//! End-to-end engine scenarios over the simulated short-range PHY.
//!
//! Each test drives one concrete exchange: frames the engine transmits are
//! read back from the [`SimPhy`] transcript, and inbound frames are pumped
//! through the [`PhyBinding`] exactly as a radio runtime would.

use std::sync::Arc;

use wavelink_core::{CommandOutcome, Engine, EngineConfig, PhyBinding};
use wavelink_harness::{Event, EventLog, SimEnv, SimPhy};
use wavelink_proto::MacAddr;

type SimEngine = Engine<SimPhy, SimEnv>;

struct Rig {
    engine: Arc<SimEngine>,
    binding: PhyBinding<SimPhy, SimEnv>,
    phy: SimPhy,
    env: SimEnv,
    log: EventLog,
}

fn rig(config: EngineConfig) -> Rig {
    let phy = SimPhy::direct();
    let env = SimEnv::seeded(7);
    let engine = Arc::new(Engine::new(phy.clone(), env.clone(), config).unwrap());

    let log = EventLog::new();
    log.attach(&engine);

    let binding = PhyBinding::new(Arc::clone(&engine));
    Rig { engine, binding, phy, env, log }
}

fn peer() -> MacAddr {
    "AA:BB:CC:DD:EE:01".parse().unwrap()
}

#[test]
fn happy_path_data_is_acked_and_swept() {
    let r = rig(EngineConfig::default());
    let peer = peer();

    let msg_id = r.engine.send(&b"hi"[..], peer).unwrap();

    // Exactly one frame on air: [00 id0 id1 id2 'h' 'i']
    let sent = r.phy.take_sent();
    assert_eq!(sent.len(), 1);
    let (dest, frame) = &sent[0];
    assert_eq!(*dest, peer);
    let [id0, id1, id2] = *msg_id.as_bytes();
    assert_eq!(frame.as_slice(), &[0x00, id0, id1, id2, b'h', b'i']);

    // Peer acknowledges
    r.binding.deliver(peer, &[0x01, id0, id1, id2]);
    assert_eq!(r.log.acks(), vec![(peer, msg_id)]);

    // Queue drains on the next sweep, with no further transmissions
    r.env.advance_ms(500);
    r.engine.tick();
    assert_eq!(r.engine.pending_len(), 0);
    assert!(r.phy.take_sent().is_empty());
}

#[test]
fn lost_first_frame_is_retried_with_identical_bytes() {
    let r = rig(EngineConfig::default());
    let peer = peer();

    let msg_id = r.engine.send(&b"hi"[..], peer).unwrap();

    // The radio transmitted it, but the air ate it: drop the transcript
    let lost = r.phy.take_sent();
    assert_eq!(lost.len(), 1);

    // Nothing happens before the timeout elapses
    r.env.advance_ms(150);
    r.engine.tick();
    assert!(r.phy.take_sent().is_empty());

    // Past the timeout: one retry, byte-identical to the original
    r.env.advance_ms(51);
    r.engine.tick();
    let retried = r.phy.take_sent();
    assert_eq!(retried.len(), 1);
    assert_eq!(retried[0], lost[0]);

    // The ACK lands this time
    let [id0, id1, id2] = *msg_id.as_bytes();
    r.binding.deliver(peer, &[0x01, id0, id1, id2]);
    assert_eq!(r.log.acks().len(), 1);

    r.env.advance_ms(500);
    r.engine.tick();
    assert_eq!(r.engine.pending_len(), 0);
    assert_eq!(r.phy.sent_total(), 2);
}

#[test]
fn duplicate_inbound_is_acked_twice_but_dispatched_once() {
    let r = rig(EngineConfig::default());
    let sender: MacAddr = "11:22:33:44:55:66".parse().unwrap();
    let frame = [0x00, 0xAB, 0xCD, 0xEF, b'x'];

    r.binding.deliver(sender, &frame);
    r.binding.deliver(sender, &frame);

    // Both deliveries elicited the same ACK
    let sent = r.phy.take_sent();
    assert_eq!(sent.len(), 2);
    for (dest, bytes) in sent {
        assert_eq!(dest, sender);
        assert_eq!(bytes, vec![0x01, 0xAB, 0xCD, 0xEF]);
    }

    // One dispatch only
    assert_eq!(r.log.data(), vec![(sender, vec![0x78])]);
    assert_eq!(r.log.messages(), vec![(sender, "x".to_string())]);
    assert!(r.log.commands().is_empty());
}

#[test]
fn repeated_command_coalesces_into_the_pending_entry() {
    let r = rig(EngineConfig::default());
    let peer = peer();

    let first = r.engine.send_command(0x1234, peer).unwrap();
    let CommandOutcome::Enqueued(msg_id) = first else {
        panic!("first command should enqueue");
    };
    let original = r.phy.take_sent();
    assert_eq!(original.len(), 1);

    // 10 ms later, same command again, before any ACK
    r.env.advance_ms(10);
    assert_eq!(r.engine.send_command(0x1234, peer).unwrap(), CommandOutcome::Coalesced);
    assert_eq!(r.engine.pending_len(), 1);
    assert!(r.phy.take_sent().is_empty());

    // The coalesce reset the retry clock: at t=205 ms the entry is not due
    // (its timer restarted at t=10 ms)...
    r.env.advance_ms(195);
    r.engine.tick();
    assert!(r.phy.take_sent().is_empty());

    // ...but it is shortly after, and the payload is the original bytes
    r.env.advance_ms(10);
    r.engine.tick();
    let retried = r.phy.take_sent();
    assert_eq!(retried, original);

    // One ACK settles the single entry
    let [id0, id1, id2] = *msg_id.as_bytes();
    r.binding.deliver(peer, &[0x01, id0, id1, id2]);
    assert_eq!(r.log.acks().len(), 1);

    r.env.advance_ms(500);
    r.engine.tick();
    assert_eq!(r.engine.pending_len(), 0);
}

#[test]
fn offline_peer_exhausts_retries_and_is_dropped() {
    let config = EngineConfig { max_retries: 2, timeout_ms: 100, ..Default::default() };
    let r = rig(config);
    let peer = peer();

    r.engine.send(&b"hello?"[..], peer).unwrap();

    // Initial transmission plus two retries, then silence
    for _ in 0..5 {
        r.env.advance_ms(101);
        r.engine.tick();
    }

    assert_eq!(r.phy.sent_total(), 3);
    assert!(r.log.acks().is_empty());
    assert_eq!(r.engine.pending_len(), 0);
}

#[test]
fn command_payload_dispatches_all_three_ways_in_order() {
    let r = rig(EngineConfig::default());
    let sender: MacAddr = "77:88:99:AA:BB:CC".parse().unwrap();

    r.binding.deliver(sender, &[0x00, 0x01, 0x02, 0x03, 0x12, 0x34, 0x12, 0x34]);

    let payload = vec![0x12, 0x34, 0x12, 0x34];
    let text = String::from_utf8_lossy(&payload).to_string();

    assert_eq!(
        r.log.events(),
        vec![
            Event::Command(sender, 0x1234),
            Event::Data(sender, payload),
            Event::Message(sender, text),
        ]
    );
}

#[test]
fn empty_payload_is_acked_and_dispatched_without_text() {
    let r = rig(EngineConfig::default());
    let sender: MacAddr = "11:22:33:44:55:66".parse().unwrap();

    r.binding.deliver(sender, &[0x00, 0x0A, 0x0B, 0x0C]);

    let sent = r.phy.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].1, vec![0x01, 0x0A, 0x0B, 0x0C]);

    assert_eq!(r.log.data(), vec![(sender, Vec::new())]);
    assert!(r.log.messages().is_empty());
}

#[test]
fn clear_pending_discards_everything_and_late_acks_match_nothing() {
    let r = rig(EngineConfig::default());
    let peer = peer();

    let msg_id = r.engine.send(&b"one"[..], peer).unwrap();
    r.engine.send(&b"two"[..], peer).unwrap();
    assert_eq!(r.engine.pending_len(), 2);

    r.engine.clear_pending();
    assert_eq!(r.engine.pending_len(), 0);

    // A late ACK for a cleared message is silent
    let [id0, id1, id2] = *msg_id.as_bytes();
    r.binding.deliver(peer, &[0x01, id0, id1, id2]);
    assert!(r.log.acks().is_empty());
}

#[test]
fn default_peer_routes_convenience_sends() {
    let r = rig(EngineConfig::default());
    let peer = peer();

    r.engine.set_peer(peer);
    assert_eq!(r.engine.peer(), peer);

    r.engine.send_to_peer_str("hello").unwrap();
    let sent = r.phy.take_sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].0, peer);
    assert_eq!(&sent[0].1[4..], b"hello");

    // Broadcast text goes to the all-ones address and is never queued
    r.engine.send_broadcast_str("all").unwrap();
    let sent = r.phy.take_sent();
    assert_eq!(sent[0].0, MacAddr::BROADCAST);
    assert_eq!(&sent[0].1[4..], b"all");
    assert_eq!(r.engine.pending_len(), 1);

    // Transmit-done notifications are log-only
    r.binding.tx_done(peer, true);
}

#[test]
fn subscriber_may_reply_from_inside_the_callback() {
    let r = rig(EngineConfig::default());
    let sender: MacAddr = "11:22:33:44:55:66".parse().unwrap();

    {
        let engine = Arc::clone(&r.engine);
        r.engine.on_message(move |from, _| {
            // Reentry: dispatch runs outside the engine's locks
            engine.send(&b"pong"[..], from).unwrap();
        });
    }

    r.binding.deliver(sender, &[0x00, 0x01, 0x02, 0x03, b'p', b'i', b'n', b'g']);

    let sent = r.phy.take_sent();
    // ACK for the ping, then the reply's first transmission
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].1, vec![0x01, 0x01, 0x02, 0x03]);
    assert_eq!(sent[1].0, sender);
    assert_eq!(&sent[1].1[4..], b"pong");
    assert_eq!(r.engine.pending_len(), 1);
}
