//! Property-based tests for the calculator invariants.

use std::net::Ipv4Addr;

use proptest::prelude::*;

use calc_engine::calculators::investment::{Frequency, Projection, Timing};
use calc_engine::calculators::vlsm::{allocate, Requirement};
use calc_engine::units::{convert_rate, DataRateUnit};
use calc_engine::{Engine, EngineSettings, EvaluationRequest};

fn rate_unit() -> impl Strategy<Value = DataRateUnit> {
    proptest::sample::select(DataRateUnit::ALL.to_vec())
}

fn projection(initial: f64, contribution: f64, annual_return: f64, years: u32) -> Projection {
    Projection {
        initial,
        contribution,
        contribution_frequency: Frequency::Monthly,
        annual_return,
        compounding: Frequency::Monthly,
        years,
        timing: Timing::End,
        contribution_increase: 0.0,
        annual_fee: 0.0,
        inflation: 0.0,
    }
}

fn requirements(hosts: &[u64]) -> Vec<Requirement> {
    hosts
        .iter()
        .enumerate()
        .map(|(i, &hosts)| Requirement {
            name: format!("net{}", i),
            hosts,
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn rate_conversion_round_trips(value in 1e-3f64..1e9, from in rate_unit(), to in rate_unit()) {
        let there = convert_rate(value, from.symbol(), to.symbol());
        let back = convert_rate(there, to.symbol(), from.symbol());
        prop_assert!((back - value).abs() <= value * 1e-12);
    }

    #[test]
    fn vlsm_allocates_largest_first(hosts in proptest::collection::vec(1u64..2000, 1..6)) {
        let network = Ipv4Addr::new(10, 0, 0, 0);
        if let Ok(subnets) = allocate(network, 16, &requirements(&hosts)) {
            for pair in subnets.windows(2) {
                prop_assert!(pair[0].hosts_needed >= pair[1].hosts_needed);
            }
        }
    }

    #[test]
    fn vlsm_blocks_are_aligned_and_disjoint(hosts in proptest::collection::vec(1u64..2000, 1..6)) {
        let network = Ipv4Addr::new(10, 0, 0, 0);
        let Ok(subnets) = allocate(network, 16, &requirements(&hosts)) else {
            return Ok(());
        };
        let mut previous_end: Option<u32> = None;
        for subnet in &subnets {
            let start = u32::from(subnet.network);
            prop_assert_eq!(u64::from(start) % subnet.block_size, 0);
            prop_assert!(subnet.usable >= subnet.hosts_needed);
            if let Some(end) = previous_end {
                prop_assert!(start > end);
            }
            previous_end = Some(u32::from(subnet.broadcast));
        }
    }

    #[test]
    fn vlsm_conserves_capacity(hosts in proptest::collection::vec(1u64..300, 1..5)) {
        let Ok(subnets) = allocate(Ipv4Addr::new(192, 168, 0, 0), 22, &requirements(&hosts)) else {
            return Ok(());
        };
        let allocated: u64 = subnets.iter().map(|s| s.block_size).sum();
        prop_assert!(allocated <= 1024);
        for subnet in &subnets {
            prop_assert_eq!(subnet.usable + 2, subnet.block_size);
            prop_assert_eq!(subnet.wasted, subnet.usable - subnet.hosts_needed);
        }
    }

    #[test]
    fn vlsm_fits_exactly_when_blocks_fit(hosts in proptest::collection::vec(1u64..600, 1..6)) {
        let needed: u64 = hosts.iter().map(|h| (h + 2).next_power_of_two()).sum();
        let result = allocate(Ipv4Addr::new(172, 16, 0, 0), 22, &requirements(&hosts));
        prop_assert_eq!(result.is_ok(), needed <= 1024, "hosts {:?} need {}", hosts, needed);
    }

    #[test]
    fn investment_grows_with_rate(
        initial in 0f64..100_000.0,
        contribution in 0f64..2_000.0,
        rate in 0f64..15.0,
        bump in 0.1f64..5.0,
        years in 1u32..40,
    ) {
        let low = projection(initial, contribution, rate, years).run();
        let high = projection(initial, contribution, rate + bump, years).run();
        prop_assert!(high.balance >= low.balance - 1e-6);
    }

    #[test]
    fn investment_grows_with_time(
        initial in 1f64..100_000.0,
        contribution in 0f64..2_000.0,
        rate in 0f64..15.0,
        years in 1u32..40,
    ) {
        let shorter = projection(initial, contribution, rate, years).run();
        let longer = projection(initial, contribution, rate, years + 1).run();
        prop_assert!(longer.balance >= shorter.balance);
        prop_assert!(shorter.balance >= shorter.total_contributions - 1e-6);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn evaluation_is_deterministic(drives in 4u32..24, capacity in 1u32..20) {
        let engine = Engine::new(EngineSettings::default()).unwrap();
        let request = EvaluationRequest::new("raid")
            .with_value("raidLevel", "6")
            .with_value("driveCount", drives)
            .with_value("driveCapacity", capacity);
        let first = engine.evaluate(&request).unwrap();
        let second = engine.evaluate(&request).unwrap();
        prop_assert!(first.is_valid);
        prop_assert_eq!(first, second);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn vlsm_total_matches_subnet_blocks(hosts in proptest::array::uniform4(0u32..200)) {
        let engine = Engine::new(EngineSettings::default()).unwrap();
        let mut request = EvaluationRequest::new("vlsm")
            .with_value("networkAddress", "10.20.0.0")
            .with_value("prefix", 24);
        for (slot, count) in hosts.iter().enumerate() {
            request = request.with_value(&format!("subnet{}Hosts", slot + 1), *count);
        }
        let results = engine.evaluate(&request).unwrap();
        if !results.is_valid {
            return Ok(());
        }
        let metadata = results.metadata.as_ref().unwrap();
        let subnets = metadata["subnets"].as_array().unwrap();
        let blocks: f64 = subnets.iter().map(|s| s["blockSize"].as_f64().unwrap()).sum();
        prop_assert_eq!(results.number("totalAllocated"), Some(blocks));
        prop_assert_eq!(subnets.len(), hosts.iter().filter(|&&h| h > 0).count());
    }
}
