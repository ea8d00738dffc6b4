//! Consumer -> router -> producer, where the router reaches the producer over
//! three parallel links of different quality.
//!
//! Run with `RUST_LOG=qfwd=debug` to see every decision and update.

mod common;

use common::{init_logging, LinkProfile, SimRouter};
use qfwd::{Config, FaceId, Request, Strategy};
use std::collections::BTreeMap;

const CONSUMER_FACE: u64 = 100;
const REQUESTS: u64 = 3_000;
const INTERVAL_MS: u64 = 5;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut router = SimRouter::new(42);
    router.route("/prefix", &[1, 2, 3]);
    router.link(1, LinkProfile::new(80, 0.0, 0.0)); // slow but reliable
    router.link(2, LinkProfile::new(15, 0.02, 0.0)); // fast, rarely lossy
    router.link(3, LinkProfile::new(10, 0.30, 0.30)); // congested

    let cfg = Config::default()
        .with_seed(7)
        .with_pending_timeout_ms(400);
    let mut strategy = Strategy::new(cfg)?;

    let mut window: BTreeMap<FaceId, u64> = BTreeMap::new();
    for i in 0..REQUESTS {
        let now = i * INTERVAL_MS;
        router.set_now(now);
        for (at, outcome) in router.due(now) {
            strategy.on_outcome(&mut router, &outcome, at);
        }
        strategy.expire_stale(now);

        let name = format!("/prefix/video/seg={}", i % 100);
        let v = strategy.after_receive_request(&mut router, &Request::new(i, name, CONSUMER_FACE), now);
        if let Some(face) = v.action() {
            *window.entry(face).or_default() += 1;
        }

        if (i + 1) % 500 == 0 {
            println!("requests {:>5}: picks {:?}", i + 1, window);
            window.clear();
        }
    }

    let end = REQUESTS * INTERVAL_MS;
    for (at, outcome) in router.drain() {
        strategy.on_outcome(&mut router, &outcome, at);
    }
    strategy.expire_stale(end + 1_000);

    println!();
    println!("stats: {:?}", strategy.stats());
    println!(
        "router: delivered={} nacked={} rejected={}",
        router.delivered, router.nacked, router.rejected
    );

    let probe = Request::new(0, "/prefix/video/seg=0", CONSUMER_FACE);
    let state = strategy.state_for(&router, &probe, &[]);
    println!("learned values for {state}:");
    for (face, q) in strategy.table().actions(&state) {
        println!("  {face}: {q:.3}");
    }
    Ok(())
}
