use dtnsim::network::{ContactDetector, Node, Role};
use dtnsim::prelude::*;
use proptest::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Runs a seeded simulation and returns every event plus the final snapshot
fn run(config: SimConfig, ticks: u64, inject_every: u64) -> (Vec<SimEvent>, SimSnapshot) {
    let injecting = config.scenario.allows_injection();
    let mut sim = Simulation::initialize(config).unwrap();
    sim.start().unwrap();

    let mut events = Vec::new();
    for tick in 0..ticks {
        if injecting && tick % inject_every == 0 {
            sim.inject_random_message().unwrap();
        }
        if sim.state() != ClockState::Running {
            break;
        }
        events.extend(sim.tick().unwrap().events);
    }
    (events, sim.snapshot())
}

fn scenario() -> impl Strategy<Value = Scenario> {
    prop_oneof![Just(Scenario::Flooding), Just(Scenario::SingleTarget)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn nodes_stay_inside_the_area(
        seed in any::<u64>(),
        nodes in 2u32..30,
        speed in 0.2f64..8.0,
        width in 100u32..600,
        height in 100u32..600,
        ticks in 1u64..150,
    ) {
        let config = SimConfig::flooding()
            .with_nodes(nodes)
            .with_speed(speed)
            .with_area(width, height)
            .with_seed(seed);
        let mut sim = Simulation::initialize(config).unwrap();
        sim.start().unwrap();

        for _ in 0..ticks {
            sim.tick().unwrap();
            for node in sim.snapshot().nodes {
                prop_assert!(node.x >= node.radius && node.x <= width as f64 - node.radius);
                prop_assert!(node.y >= node.radius && node.y <= height as f64 - node.radius);
            }
        }
    }

    #[test]
    fn contacts_are_symmetric_and_unique(
        points in prop::collection::vec((0.0f64..500.0, 0.0f64..500.0), 2..40),
        range in 1.0f64..300.0,
    ) {
        let nodes: Vec<Node> = points
            .iter()
            .enumerate()
            .map(|(id, &(x, y))| Node::new(id as u32, x, y, 5.0, Role::Ordinary))
            .collect();
        let contacts = ContactDetector::new(range).detect(&nodes);

        let mut seen = HashSet::new();
        for contact in contacts.iter() {
            prop_assert!(contact.a < contact.b);
            prop_assert!(seen.insert((contact.a, contact.b)));
            prop_assert!(contacts.contains(contact.b, contact.a));
        }

        for a in &nodes {
            for b in &nodes {
                if a.id == b.id {
                    continue;
                }
                prop_assert_eq!(contacts.contains(a.id, b.id), a.distance_to(b) < range);
            }
        }
    }

    #[test]
    fn delivery_happens_at_most_once(
        seed in any::<u64>(),
        scenario in scenario(),
        nodes in 2u32..20,
        range in 30.0f64..250.0,
    ) {
        let config = SimConfig::for_scenario(scenario)
            .with_nodes(nodes)
            .with_range(range)
            .with_seed(seed);
        let (events, snapshot) = run(config, 400, 20);

        let mut deliveries: BTreeMap<MessageId, u64> = BTreeMap::new();
        for event in events.iter().filter(|e| e.is_delivery()) {
            *deliveries.entry(event.message).or_default() += 1;
        }

        for message in &snapshot.messages {
            let count = deliveries.get(&message.id).copied().unwrap_or(0);
            prop_assert!(count <= 1);
            prop_assert_eq!(count == 1, message.delivered);
            if let Some(at) = message.delivered_at {
                prop_assert!(at >= message.created_at);
                prop_assert_eq!(message.path.first(), Some(&message.source));
                prop_assert_eq!(message.path.last(), Some(&message.destination));
            }
        }
        prop_assert_eq!(snapshot.stats.messages_delivered, deliveries.len() as u64);
    }

    #[test]
    fn every_transfer_is_counted_once(
        seed in any::<u64>(),
        scenario in scenario(),
        nodes in 2u32..20,
    ) {
        let config = SimConfig::for_scenario(scenario).with_nodes(nodes).with_seed(seed);
        let (events, snapshot) = run(config, 300, 25);

        let mut per_message: BTreeMap<MessageId, u32> = BTreeMap::new();
        let mut receivers: BTreeMap<MessageId, BTreeSet<NodeId>> = BTreeMap::new();
        for event in events.iter().filter(|e| e.is_transfer()) {
            *per_message.entry(event.message).or_default() += 1;
            // a node never receives the same message twice
            prop_assert!(receivers.entry(event.message).or_default().insert(event.to_node()));
        }

        for message in &snapshot.messages {
            let transfers = per_message.get(&message.id).copied().unwrap_or(0);
            prop_assert_eq!(transfers, message.transfers);
            prop_assert!(message.transfers < nodes);
            if message.delivered {
                prop_assert!(message.path.len() as u32 - 1 <= message.transfers);
            }
        }
        prop_assert_eq!(snapshot.stats.transfers, per_message.values().map(|&t| t as u64).sum::<u64>());
    }

    #[test]
    fn single_target_carriers_hand_off_one_copy_per_tick(
        seed in any::<u64>(),
        nodes in 3u32..25,
    ) {
        let config = SimConfig::single_target().with_nodes(nodes).with_seed(seed);
        let (events, _) = run(config, 500, 1);

        let mut per_tick: HashSet<(u64, NodeId)> = HashSet::new();
        for event in events.iter().filter(|e| e.is_transfer()) {
            prop_assert!(per_tick.insert((event.tick, event.from_node())));
        }
    }
}
