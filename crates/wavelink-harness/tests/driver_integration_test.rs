//! The retry driver against the simulated PHY, on a paused tokio clock.

use std::{sync::Arc, time::Duration};

use wavelink_core::{Engine, EngineConfig, RetryDriver};
use wavelink_harness::{EventLog, SimEnv, SimPhy};
use wavelink_proto::MacAddr;

const PEER: MacAddr = MacAddr([0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0x01]);

#[tokio::test(start_paused = true)]
async fn driver_drives_an_offline_message_to_exhaustion() {
    let phy = SimPhy::direct();
    let env = SimEnv::seeded(11);
    let config = EngineConfig { max_retries: 2, timeout_ms: 100, ..Default::default() };
    let engine = Arc::new(Engine::new(phy.clone(), env.clone(), config).unwrap());

    let log = EventLog::new();
    log.attach(&engine);

    engine.send(&b"anyone?"[..], PEER).unwrap();
    assert_eq!(phy.sent_total(), 1);

    let driver = RetryDriver::with_period(Arc::clone(&engine), Duration::from_millis(100));
    let task = tokio::spawn(driver.run());

    // Walk both clocks forward in lockstep until well past exhaustion
    for _ in 0..6 {
        env.advance_ms(101);
        tokio::time::advance(Duration::from_millis(100)).await;
        tokio::task::yield_now().await;
    }

    // Initial transmission plus exactly max_retries retries, then dropped
    assert_eq!(phy.sent_total(), 3);
    assert_eq!(engine.pending_len(), 0);
    assert!(log.acks().is_empty());

    task.abort();
}
