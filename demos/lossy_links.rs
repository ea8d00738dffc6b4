//! Two consumers, two prefixes, and a link that goes bad halfway through.
//!
//! `/video` is best served over face 1 until t=10s, when face 1 starts losing
//! most requests; the strategy should drift to face 2. `/news` is only routed
//! over faces 2 and 3, so its state never sees face 1 at all. Exploration decays
//! to a floor so the change can still be noticed.

mod common;

use common::{init_logging, LinkProfile, SimRouter};
use qfwd::{Config, FaceId, Request, StateDetail, Strategy};
use std::collections::BTreeMap;

const CONSUMERS: [u64; 2] = [100, 101];
const STEPS: u64 = 4_000;
const INTERVAL_MS: u64 = 5;
const DEGRADE_AT_MS: u64 = 10_000;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let mut router = SimRouter::new(2024);
    router.route("/video", &[1, 2]);
    router.route("/news", &[2, 3]);
    router.link(1, LinkProfile::new(10, 0.01, 0.0));
    router.link(2, LinkProfile::new(40, 0.01, 0.0));
    router.link(3, LinkProfile::new(60, 0.05, 0.05));

    let cfg = Config::default()
        .with_seed(3)
        .with_epsilon(0.3)
        .with_epsilon_schedule(0.999, 0.05)
        .with_state_detail(StateDetail::WithActions)
        .with_pending_timeout_ms(300);
    let mut strategy = Strategy::new(cfg)?;

    let mut picks: BTreeMap<(&str, FaceId), u64> = BTreeMap::new();
    let mut degraded = false;
    for i in 0..STEPS {
        let now = i * INTERVAL_MS;
        if !degraded && now >= DEGRADE_AT_MS {
            degraded = true;
            router.link(1, LinkProfile::new(10, 0.85, 0.0));
            println!("t={now}ms: face1 degraded (epsilon now {:.3})", strategy.epsilon());
        }

        router.set_now(now);
        for (at, outcome) in router.due(now) {
            strategy.on_outcome(&mut router, &outcome, at);
        }
        strategy.expire_stale(now);

        let prefix = if i % 3 == 0 { "/news" } else { "/video" };
        let consumer = CONSUMERS[(i % 2) as usize];
        let name = format!("{prefix}/item{}/seg={}", i % 7, i % 20);
        let v = strategy.after_receive_request(&mut router, &Request::new(i, name, consumer), now);
        if let Some(face) = v.action() {
            *picks.entry((prefix, face)).or_default() += 1;
        }

        if (i + 1) % 800 == 0 {
            println!("t={:>6}ms picks {:?}", now, picks);
            picks.clear();
        }
    }

    for (at, outcome) in router.drain() {
        strategy.on_outcome(&mut router, &outcome, at);
    }
    strategy.expire_stale(STEPS * INTERVAL_MS + 1_000);

    println!();
    println!("stats: {:?}", strategy.stats());
    println!("final epsilon: {:.3}", strategy.epsilon());
    println!(
        "states={} entries={} sends={:?}",
        strategy.table().state_count(),
        strategy.table().entry_count(),
        router.sends
    );
    for consumer in CONSUMERS {
        for (prefix, faces) in [("/video/item0", [1u64, 2]), ("/news/item0", [2, 3])] {
            let faces: Vec<FaceId> = faces.into_iter().map(FaceId).collect();
            let state = strategy.state_for(&router, &Request::new(0, prefix, consumer), &faces);
            let best = strategy.table().best_action(&state, &faces);
            println!("{state}: best {best:?}");
        }
    }
    Ok(())
}
