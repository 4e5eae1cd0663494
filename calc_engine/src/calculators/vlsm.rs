//! # VLSM Subnet Allocator
//!
//! Splits one IPv4 block into subnets sized for up to four host
//! requirements.
//!
//! ## Algorithm
//!
//! 1. Parse and mask the base address (`a.b.c.d` plus `prefix`, or the
//!    `a.b.c.d/nn` shorthand which wins over `prefix`)
//! 2. Sort requirements by host count, largest first (stable, so equal
//!    counts keep their input order)
//! 3. For each requirement take the smallest power-of-two block holding
//!    `hosts + 2` addresses, align the cursor up to a multiple of that block,
//!    and fail if the block leaves the parent network
//!
//! Largest-first is what keeps every block naturally aligned without gaps.
//!
//! ## Example
//!
//! ```rust
//! use calc_engine::calculators::vlsm::compute;
//! use calc_engine::input::ComputeInput;
//!
//! let input = ComputeInput::default()
//!     .with("networkAddress", "192.168.1.0")
//!     .with("prefix", 24)
//!     .with("subnet1Hosts", 100)
//!     .with("subnet2Hosts", 50);
//!
//! let results = compute(&input);
//! assert_eq!(results.text("subnet1"), Some("192.168.1.0/25"));
//! assert_eq!(results.text("subnet2"), Some("192.168.1.128/26"));
//! ```

use std::net::Ipv4Addr;

use serde::Serialize;
use serde_json::json;

use crate::errors::CalcResult;
use crate::format::{format_number, format_percent};
use crate::input::ComputeInput;
use crate::locale::LocaleCatalog;
use crate::results::{CalculatorResults, ResultBuilder};
use crate::schema::{CalculatorConfig, Category, ChartType, InputField, Preset, ResultField, ResultFormat};

pub const ID: &str = "vlsm";

/// Number of requirement slots (`subnet1Hosts` .. `subnet4Hosts`)
pub const MAX_SUBNETS: usize = 4;

pub const ERROR_INVALID_ADDRESS: &str = "invalid_address";
pub const ERROR_DOES_NOT_FIT: &str = "does_not_fit";

const DEFAULT_NETWORK: &str = "192.168.1.0";
const DEFAULT_PREFIX: f64 = 24.0;
const DEFAULT_HOSTS: [f64; MAX_SUBNETS] = [100.0, 50.0, 20.0, 2.0];
const DEFAULT_NAMES: [&str; MAX_SUBNETS] = ["Subnet A", "Subnet B", "Subnet C", "Subnet D"];

/// Smallest and largest parent prefix accepted; /31 and /32 hold no hosts
const MIN_PREFIX: u32 = 1;
const MAX_PREFIX: u32 = 30;

pub fn config() -> CalcResult<CalculatorConfig> {
    let mut config = CalculatorConfig::new(ID, "1.1.0", Category::Networking, "network")
        .with_input(InputField::text("networkAddress", DEFAULT_NETWORK).required())
        .with_input(
            InputField::stepper("prefix", DEFAULT_PREFIX)
                .range(MIN_PREFIX as f64, MAX_PREFIX as f64)
                .step(1.0),
        );

    for slot in 0..MAX_SUBNETS {
        let n = slot + 1;
        config = config
            .with_input(InputField::text(&format!("subnet{}Name", n), DEFAULT_NAMES[slot]))
            .with_input(InputField::number(&format!("subnet{}Hosts", n), DEFAULT_HOSTS[slot]).min(0.0).step(1.0));
    }

    config = config
        .with_preset(
            Preset::new("smallOffice", "building")
                .set("networkAddress", "192.168.10.0")
                .set("prefix", 24.0)
                .set("subnet1Hosts", 60.0)
                .set("subnet2Hosts", 30.0)
                .set("subnet3Hosts", 12.0)
                .set("subnet4Hosts", 2.0),
        )
        .with_preset(
            Preset::new("campus", "school")
                .set("networkAddress", "172.16.0.0")
                .set("prefix", 20.0)
                .set("subnet1Hosts", 1000.0)
                .set("subnet2Hosts", 500.0)
                .set("subnet3Hosts", 250.0)
                .set("subnet4Hosts", 100.0),
        )
        .with_preset(
            Preset::new("pointToPoint", "link")
                .set("networkAddress", "10.0.0.0")
                .set("prefix", 28.0)
                .set("subnet1Hosts", 2.0)
                .set("subnet2Hosts", 2.0)
                .set("subnet3Hosts", 2.0)
                .set("subnet4Hosts", 2.0),
        )
        .with_result(ResultField::primary("subnetCount").format(ResultFormat::Number))
        .with_result(ResultField::primary("efficiency").format(ResultFormat::Percent))
        .with_result(ResultField::secondary("networkRange"))
        .with_result(ResultField::secondary("totalHostsNeeded").format(ResultFormat::Number))
        .with_result(ResultField::secondary("totalAvailable").format(ResultFormat::Number))
        .with_result(ResultField::secondary("totalAllocated").format(ResultFormat::Number))
        .with_result(ResultField::secondary("totalUsable").format(ResultFormat::Number))
        .with_result(ResultField::secondary("totalWasted").format(ResultFormat::Number))
        .with_result(ResultField::secondary("remainingAddresses").format(ResultFormat::Number));

    for n in 1..=MAX_SUBNETS {
        config = config.with_result(ResultField::secondary(&format!("subnet{}", n)));
    }

    let config = config
        .with_chart(ChartType::Bar, "subnets", "name", &["hostsNeeded", "usable"])
        .with_table(
            "subnets",
            &["name", "hostsNeeded", "cidr", "mask", "firstHost", "lastHost", "broadcast", "usable", "wasted"],
        )
        .with_info_card("largestFirst", "sort")
        .with_info_card("reservedAddresses", "lock")
        .with_education("howVlsmWorks")
        .with_education("alignment")
        .with_faq("whyPowerOfTwo")
        .with_faq("doesNotFit")
        .with_reference("RFC 950: Internet Standard Subnetting Procedure", "https://www.rfc-editor.org/rfc/rfc950")
        .with_reference(
            "RFC 4632: Classless Inter-domain Routing (CIDR)",
            "https://www.rfc-editor.org/rfc/rfc4632",
        );

    Ok(config.with_locales(LocaleCatalog::load_embedded(ID)?))
}

/// One host-count requirement, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct Requirement {
    pub name: String,
    pub hosts: u64,
}

/// One allocated subnet
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subnet {
    pub name: String,
    pub hosts_needed: u64,
    pub network: Ipv4Addr,
    pub prefix: u32,
    pub cidr: String,
    pub mask: Ipv4Addr,
    pub broadcast: Ipv4Addr,
    pub first_host: Ipv4Addr,
    pub last_host: Ipv4Addr,
    pub block_size: u64,
    pub usable: u64,
    pub wasted: u64,
}

/// Why an allocation failed
#[derive(Debug, Clone, PartialEq)]
pub enum AllocationError {
    /// A single requirement needs a bigger block than the parent network
    TooLarge { name: String, hosts: u64 },
    /// The requirements together overflow the parent network
    Exhausted { name: String },
}

fn mask_for(prefix: u32) -> u32 {
    if prefix == 0 {
        0
    } else {
        u32::MAX << (32 - prefix)
    }
}

/// Parse `a.b.c.d` or `a.b.c.d/nn`; the shorthand's prefix, when present,
/// replaces `default_prefix`.
pub fn parse_network(text: &str, default_prefix: u32) -> Option<(Ipv4Addr, u32)> {
    let text = text.trim();
    let (address, prefix) = match text.split_once('/') {
        Some((address, prefix)) => (address, prefix.trim().parse::<u32>().ok()?),
        None => (text, default_prefix),
    };
    if !(MIN_PREFIX..=MAX_PREFIX).contains(&prefix) {
        return None;
    }
    let address: Ipv4Addr = address.trim().parse().ok()?;
    Some((Ipv4Addr::from(u32::from(address) & mask_for(prefix)), prefix))
}

/// Smallest power-of-two block holding `hosts` plus network and broadcast
fn block_for(hosts: u64) -> u64 {
    (hosts + 2).next_power_of_two()
}

/// Allocate subnets largest first inside `network/prefix`.
///
/// The returned subnets are in allocation order.
pub fn allocate(network: Ipv4Addr, prefix: u32, requirements: &[Requirement]) -> Result<Vec<Subnet>, AllocationError> {
    let base = u64::from(u32::from(network) & mask_for(prefix));
    let available = 1u64 << (32 - prefix);

    let mut sorted: Vec<&Requirement> = requirements.iter().collect();
    // sort_by is stable: equal host counts keep their input order
    sorted.sort_by(|a, b| b.hosts.cmp(&a.hosts));

    let mut cursor = 0u64;
    let mut subnets = Vec::with_capacity(sorted.len());
    for requirement in sorted {
        let block = block_for(requirement.hosts);
        if block > available {
            return Err(AllocationError::TooLarge {
                name: requirement.name.clone(),
                hosts: requirement.hosts,
            });
        }
        let sub_prefix = 32 - block.trailing_zeros();

        let aligned = cursor.div_ceil(block) * block;
        if aligned + block > available {
            return Err(AllocationError::Exhausted {
                name: requirement.name.clone(),
            });
        }

        // base + aligned + block <= base + available <= 2^32
        let start = (base + aligned) as u32;
        let end = (base + aligned + block - 1) as u32;
        subnets.push(Subnet {
            name: requirement.name.clone(),
            hosts_needed: requirement.hosts,
            network: Ipv4Addr::from(start),
            prefix: sub_prefix,
            cidr: format!("{}/{}", Ipv4Addr::from(start), sub_prefix),
            mask: Ipv4Addr::from(mask_for(sub_prefix)),
            broadcast: Ipv4Addr::from(end),
            first_host: Ipv4Addr::from(start + 1),
            last_host: Ipv4Addr::from(end - 1),
            block_size: block,
            usable: block - 2,
            wasted: block - 2 - requirement.hosts,
        });
        cursor = aligned + block;
    }
    Ok(subnets)
}

fn requirements(input: &ComputeInput) -> Vec<Requirement> {
    (1..=MAX_SUBNETS)
        .filter_map(|n| {
            let hosts = input.number(&format!("subnet{}Hosts", n), 0.0);
            if hosts <= 0.0 {
                return None;
            }
            let name = input.text(&format!("subnet{}Name", n), DEFAULT_NAMES[n - 1]);
            let name = if name.trim().is_empty() {
                DEFAULT_NAMES[n - 1].to_string()
            } else {
                name.trim().to_string()
            };
            // partial hosts still need a whole address
            Some(Requirement {
                name,
                hosts: hosts.ceil().min(u32::MAX as f64) as u64,
            })
        })
        .collect()
}

/// Result ids `subnet1..4` follow allocation order (largest first), not the
/// order of the `subnetNHosts` inputs.
pub fn compute(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();
    let address = input.text("networkAddress", DEFAULT_NETWORK);
    let default_prefix = input.number("prefix", DEFAULT_PREFIX).round() as u32;

    let Some((network, prefix)) = parse_network(&address, default_prefix) else {
        return CalculatorResults::invalid_with(
            ERROR_INVALID_ADDRESS,
            input.t.value("invalidAddress", "Enter a valid IPv4 network address"),
        );
    };

    let requirements = requirements(input);
    if requirements.is_empty() {
        return CalculatorResults::invalid();
    }

    let subnets = match allocate(network, prefix, &requirements) {
        Ok(subnets) => subnets,
        Err(error) => {
            tracing::debug!(?error, %network, prefix, "vlsm allocation failed");
            return CalculatorResults::invalid_with(
                ERROR_DOES_NOT_FIT,
                input.t.value("doesNotFit", "The requested subnets do not fit in this network"),
            );
        }
    };

    let available = 1u64 << (32 - prefix);
    let hosts_needed: u64 = subnets.iter().map(|s| s.hosts_needed).sum();
    let allocated: u64 = subnets.iter().map(|s| s.block_size).sum();
    let usable: u64 = subnets.iter().map(|s| s.usable).sum();
    let wasted: u64 = subnets.iter().map(|s| s.wasted).sum();
    let remaining = available - allocated;
    let efficiency = if usable > 0 {
        hosts_needed as f64 / usable as f64 * 100.0
    } else {
        0.0
    };

    let count = |v: u64| format_number(v as f64, 0, &nf);
    let mut builder = ResultBuilder::new()
        .entry("subnetCount", subnets.len() as f64, count(subnets.len() as u64))
        .entry("efficiency", efficiency, format_percent(efficiency, 1, &nf))
        .entry("networkRange", prefix as f64, format!("{}/{}", network, prefix))
        .entry("totalHostsNeeded", hosts_needed as f64, count(hosts_needed))
        .entry("totalAvailable", available as f64, count(available))
        .entry("totalAllocated", allocated as f64, count(allocated))
        .entry("totalUsable", usable as f64, count(usable))
        .entry("totalWasted", wasted as f64, count(wasted))
        .entry("remainingAddresses", remaining as f64, count(remaining));

    for (slot, subnet) in subnets.iter().enumerate() {
        builder = builder.entry(&format!("subnet{}", slot + 1), subnet.usable as f64, subnet.cidr.clone());
    }

    builder
        .summary(input.t.format(
            "summary",
            "{subnetCount} subnets allocated in {networkRange}: {totalAllocated} of {totalAvailable} addresses used, {efficiency} efficiency",
        ))
        .metadata(json!({ "subnets": subnets }))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(network: &str, prefix: u32, hosts: &[f64]) -> ComputeInput {
        let mut input = ComputeInput::default()
            .with("networkAddress", network)
            .with("prefix", prefix);
        for n in 1..=MAX_SUBNETS {
            let value = hosts.get(n - 1).copied().unwrap_or(0.0);
            input = input.with(&format!("subnet{}Hosts", n), value);
        }
        input
    }

    fn req(name: &str, hosts: u64) -> Requirement {
        Requirement {
            name: name.to_string(),
            hosts,
        }
    }

    #[test]
    fn test_classic_allocation() {
        let results = compute(&request("192.168.1.0", 24, &[100.0, 50.0, 20.0, 2.0]));
        assert!(results.is_valid);
        assert_eq!(results.text("subnet1"), Some("192.168.1.0/25"));
        assert_eq!(results.text("subnet2"), Some("192.168.1.128/26"));
        assert_eq!(results.text("subnet3"), Some("192.168.1.192/27"));
        assert_eq!(results.text("subnet4"), Some("192.168.1.224/30"));
        assert_eq!(results.number("subnet1"), Some(126.0));
        assert_eq!(results.number("subnet4"), Some(2.0));
        assert_eq!(results.number("totalAllocated"), Some(228.0));
        assert_eq!(results.number("totalUsable"), Some(220.0));
        assert_eq!(results.number("totalWasted"), Some(48.0));
        assert_eq!(results.number("remainingAddresses"), Some(28.0));
        assert!((results.number("efficiency").unwrap() - 78.18).abs() < 0.01);
        assert_eq!(results.text("efficiency"), Some("78.2%"));
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let results = compute(&request("192.168.1.0", 24, &[2.0, 20.0, 50.0, 100.0]));
        assert_eq!(results.text("subnet1"), Some("192.168.1.0/25"));
        assert_eq!(results.text("subnet4"), Some("192.168.1.224/30"));

        // ids are packed in allocation order, skipped slots leave no gap
        let sparse = compute(&request("10.0.0.0", 24, &[0.0, 10.0, 0.0, 60.0]));
        assert_eq!(sparse.text("subnet1"), Some("10.0.0.0/26"));
        assert_eq!(sparse.text("subnet2"), Some("10.0.0.64/28"));
        assert_eq!(sparse.text("subnet3"), None);
        assert_eq!(sparse.text("subnet4"), None);
    }

    #[test]
    fn test_subnet_details() {
        let subnets = allocate(Ipv4Addr::new(10, 0, 0, 0), 24, &[req("LAN", 50)]).unwrap();
        let lan = &subnets[0];
        assert_eq!(lan.prefix, 26);
        assert_eq!(lan.mask, Ipv4Addr::new(255, 255, 255, 192));
        assert_eq!(lan.first_host, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(lan.last_host, Ipv4Addr::new(10, 0, 0, 62));
        assert_eq!(lan.broadcast, Ipv4Addr::new(10, 0, 0, 63));
        assert_eq!(lan.wasted, 12);
    }

    #[test]
    fn test_equal_hosts_keep_input_order() {
        let subnets = allocate(Ipv4Addr::new(10, 0, 0, 0), 24, &[req("first", 10), req("second", 10)]).unwrap();
        assert_eq!(subnets[0].name, "first");
        assert_eq!(subnets[1].name, "second");
        assert!(subnets[0].network < subnets[1].network);
    }

    #[test]
    fn test_does_not_fit() {
        let results = compute(&request("192.168.1.0", 28, &[100.0]));
        assert!(!results.is_valid);
        assert!(results.values.is_empty());
        assert_eq!(results.error.as_deref(), Some(ERROR_DOES_NOT_FIT));
        assert!(!results.summary.is_empty());
    }

    #[test]
    fn test_aggregate_exhaustion() {
        // four /26 blocks fill the /24, leaving nothing for "e"
        let err = allocate(
            Ipv4Addr::new(10, 0, 0, 0),
            24,
            &[req("a", 60), req("b", 60), req("c", 60), req("d", 60), req("e", 2)],
        )
        .unwrap_err();
        assert_eq!(err, AllocationError::Exhausted { name: "e".into() });
    }

    #[test]
    fn test_cidr_shorthand_overrides_prefix() {
        let results = compute(&request("10.1.2.3/16", 24, &[1000.0]));
        assert!(results.is_valid);
        assert_eq!(results.text("networkRange"), Some("10.1.0.0/16"));
        assert_eq!(results.text("subnet1"), Some("10.1.0.0/22"));
    }

    #[test]
    fn test_malformed_addresses() {
        for bad in ["192.168.1", "192.168.1.256", "a.b.c.d", "10.0.0.0/31", "10.0.0.0/x"] {
            let results = compute(&request(bad, 24, &[10.0]));
            assert!(!results.is_valid, "{} should be rejected", bad);
            assert_eq!(results.error.as_deref(), Some(ERROR_INVALID_ADDRESS));
        }
    }

    #[test]
    fn test_no_requirements_invalid() {
        let results = compute(&request("10.0.0.0", 24, &[]));
        assert!(!results.is_valid);
        assert_eq!(results.error, None);
    }

    #[test]
    fn test_metadata_rows() {
        let results = compute(&request("192.168.1.0", 24, &[100.0, 50.0]));
        let rows = results.metadata.as_ref().unwrap()["subnets"].as_array().unwrap().clone();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["cidr"], "192.168.1.0/25");
        assert_eq!(rows[0]["firstHost"], "192.168.1.1");
        assert_eq!(rows[1]["broadcast"], "192.168.1.191");
    }
}
