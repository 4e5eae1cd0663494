//! # RAID Planner
//!
//! Capacity, performance and rebuild risk of a drive array for ten RAID
//! levels.
//!
//! ## Capacity
//!
//! | Level | Min drives | Usable | Failures tolerated | Write penalty |
//! |-------|-----------:|--------|-------------------:|--------------:|
//! | 0     | 2          | N x C           | 0 | 1 |
//! | 1     | 2 (even)   | N/2 x C         | 1 | 2 |
//! | 1E    | 3          | N/2 x C         | 1 | 2 |
//! | 5     | 3          | (N-1) x C       | 1 | 4 |
//! | 5E    | 4          | (N-2) x C       | 1 | 4 |
//! | 5EE   | 4          | (N-2) x C       | 1 | 4 |
//! | 6     | 4          | (N-2) x C       | 2 | 6 |
//! | 10    | 4 (even)   | N/2 x C         | 1 | 2 |
//! | 50    | 6          | G x (D-1) x C   | 1 | 4 |
//! | 60    | 8          | G x (D-2) x C   | 2 | 6 |
//!
//! For 50 and 60, `D` is `drivesPerGroup` and `G = N / D` (at least two
//! whole groups).
//!
//! ## Rebuild risk
//!
//! Rebuild time is one drive's capacity over the rebuild speed. The URE
//! ratio is the number of bits read from surviving drives during a rebuild
//! divided by the drive's unrecoverable-read-error interval (`10^ureRate`
//! bits). Dual parity lowers the resulting risk category by one step since a
//! single URE no longer fails the rebuild.
//!
//! Drive counts that a level cannot use yield an invalid result with error
//! code `below_minimum_drives`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::errors::CalcResult;
use crate::format::{
    format_bytes_human, format_currency, format_duration_hours, format_number, format_percent, NOT_AVAILABLE,
};
use crate::input::ComputeInput;
use crate::locale::LocaleCatalog;
use crate::results::{CalculatorResults, ResultBuilder};
use crate::schema::{
    CalculatorConfig, Category, ChartType, InputField, Preset, ResultField, ResultFormat, UnitType,
};
use crate::template;
use crate::units::{currency_codes, DataSizeUnit};

pub const ID: &str = "raid";

pub const ERROR_BELOW_MINIMUM: &str = "below_minimum_drives";

const DEFAULT_LEVEL: &str = "5";
const DEFAULT_DRIVE_COUNT: f64 = 4.0;
const DEFAULT_CAPACITY: f64 = 4.0;
const DEFAULT_CAPACITY_UNIT: &str = "TB";
const DEFAULT_DRIVE_TYPE: &str = "hdd";
const DEFAULT_DRIVES_PER_GROUP: f64 = 3.0;
const DEFAULT_COST: f64 = 100.0;
const DEFAULT_CURRENCY: &str = "USD";
/// MB/s
const DEFAULT_REBUILD_SPEED: f64 = 100.0;
const DEFAULT_URE_EXPONENT: &str = "14";

// ============================================================================
// RAID Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RaidLevel {
    #[serde(rename = "0")]
    Raid0,
    #[serde(rename = "1")]
    Raid1,
    #[serde(rename = "1E")]
    Raid1E,
    #[serde(rename = "5")]
    Raid5,
    #[serde(rename = "5E")]
    Raid5E,
    #[serde(rename = "5EE")]
    Raid5EE,
    #[serde(rename = "6")]
    Raid6,
    #[serde(rename = "10")]
    Raid10,
    #[serde(rename = "50")]
    Raid50,
    #[serde(rename = "60")]
    Raid60,
}

impl RaidLevel {
    pub const ALL: [RaidLevel; 10] = [
        RaidLevel::Raid0,
        RaidLevel::Raid1,
        RaidLevel::Raid1E,
        RaidLevel::Raid5,
        RaidLevel::Raid5E,
        RaidLevel::Raid5EE,
        RaidLevel::Raid6,
        RaidLevel::Raid10,
        RaidLevel::Raid50,
        RaidLevel::Raid60,
    ];

    /// Select option value ("5", "1E", ...)
    pub fn code(&self) -> &'static str {
        match self {
            RaidLevel::Raid0 => "0",
            RaidLevel::Raid1 => "1",
            RaidLevel::Raid1E => "1E",
            RaidLevel::Raid5 => "5",
            RaidLevel::Raid5E => "5E",
            RaidLevel::Raid5EE => "5EE",
            RaidLevel::Raid6 => "6",
            RaidLevel::Raid10 => "10",
            RaidLevel::Raid50 => "50",
            RaidLevel::Raid60 => "60",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        let code = code.trim();
        RaidLevel::ALL
            .into_iter()
            .find(|level| level.code().eq_ignore_ascii_case(code))
    }

    pub fn min_drives(&self) -> u32 {
        match self {
            RaidLevel::Raid0 | RaidLevel::Raid1 => 2,
            RaidLevel::Raid1E | RaidLevel::Raid5 => 3,
            RaidLevel::Raid5E | RaidLevel::Raid5EE | RaidLevel::Raid6 | RaidLevel::Raid10 => 4,
            RaidLevel::Raid50 => 6,
            RaidLevel::Raid60 => 8,
        }
    }

    /// Drive failures survived in the worst case
    pub fn fault_tolerance(&self) -> u32 {
        match self {
            RaidLevel::Raid0 => 0,
            RaidLevel::Raid6 | RaidLevel::Raid60 => 2,
            _ => 1,
        }
    }

    /// Back-end I/Os per front-end write
    pub fn write_penalty(&self) -> u32 {
        match self {
            RaidLevel::Raid0 => 1,
            RaidLevel::Raid1 | RaidLevel::Raid1E | RaidLevel::Raid10 => 2,
            RaidLevel::Raid5 | RaidLevel::Raid5E | RaidLevel::Raid5EE | RaidLevel::Raid50 => 4,
            RaidLevel::Raid6 | RaidLevel::Raid60 => 6,
        }
    }

    fn is_mirror(&self) -> bool {
        matches!(self, RaidLevel::Raid1 | RaidLevel::Raid1E | RaidLevel::Raid10)
    }

    /// Stripe sets of RAID 5/6 groups
    pub fn is_nested(&self) -> bool {
        matches!(self, RaidLevel::Raid50 | RaidLevel::Raid60)
    }

    /// Parity drives per group for RAID 50/60
    fn group_parity(&self) -> u32 {
        match self {
            RaidLevel::Raid60 => 2,
            _ => 1,
        }
    }

    /// Check a drive layout and work out how many drives' worth of capacity
    /// hold data.
    pub fn layout(&self, drives: u32, drives_per_group: u32) -> Result<Layout, LayoutError> {
        let min = self.min_drives();
        if drives < min {
            return Err(LayoutError::TooFewDrives { min });
        }
        let data_drives = match self {
            RaidLevel::Raid0 => drives as f64,
            RaidLevel::Raid1 | RaidLevel::Raid10 => {
                if drives % 2 != 0 {
                    return Err(LayoutError::OddDriveCount);
                }
                (drives / 2) as f64
            }
            RaidLevel::Raid1E => drives as f64 / 2.0,
            RaidLevel::Raid5 => (drives - 1) as f64,
            RaidLevel::Raid5E | RaidLevel::Raid5EE | RaidLevel::Raid6 => (drives - 2) as f64,
            RaidLevel::Raid50 | RaidLevel::Raid60 => {
                let parity = self.group_parity();
                let min_group = parity + 2;
                if drives_per_group < min_group || drives % drives_per_group != 0 || drives / drives_per_group < 2 {
                    return Err(LayoutError::IncompleteGroups { drives_per_group });
                }
                let groups = drives / drives_per_group;
                (groups * (drives_per_group - parity)) as f64
            }
        };
        Ok(Layout {
            drives,
            data_drives,
            groups: if self.is_nested() { drives / drives_per_group.max(1) } else { 1 },
        })
    }

    /// Drives read to rebuild one failed drive
    fn rebuild_sources(&self, layout: &Layout, drives_per_group: u32) -> u32 {
        match self {
            RaidLevel::Raid0 => 0,
            _ if self.is_mirror() => 1,
            RaidLevel::Raid50 | RaidLevel::Raid60 => drives_per_group - 1,
            RaidLevel::Raid5E | RaidLevel::Raid5EE => layout.drives - 2,
            _ => layout.drives - 1,
        }
    }
}

impl std::fmt::Display for RaidLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "RAID {}", self.code())
    }
}

/// A valid drive arrangement for one level
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Layout {
    pub drives: u32,
    /// Drives' worth of capacity available for data
    pub data_drives: f64,
    pub groups: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    TooFewDrives { min: u32 },
    OddDriveCount,
    IncompleteGroups { drives_per_group: u32 },
}

// ============================================================================
// Drive Types & Risk
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DriveType {
    Hdd,
    Ssd,
    Nvme,
}

impl DriveType {
    pub const ALL: [DriveType; 3] = [DriveType::Hdd, DriveType::Ssd, DriveType::Nvme];

    pub fn code(&self) -> &'static str {
        match self {
            DriveType::Hdd => "hdd",
            DriveType::Ssd => "ssd",
            DriveType::Nvme => "nvme",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        DriveType::ALL.into_iter().find(|t| t.code().eq_ignore_ascii_case(code.trim()))
    }

    /// Random 4K IOPS of a single drive
    pub fn iops(&self) -> f64 {
        match self {
            DriveType::Hdd => 150.0,
            DriveType::Ssd => 50_000.0,
            DriveType::Nvme => 500_000.0,
        }
    }

    /// Sequential throughput of a single drive in MB/s
    pub fn throughput_mbs(&self) -> f64 {
        match self {
            DriveType::Hdd => 200.0,
            DriveType::Ssd => 550.0,
            DriveType::Nvme => 3_500.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum UreRisk {
    None,
    Low,
    Moderate,
    High,
    VeryHigh,
}

impl UreRisk {
    /// Locale value key and serialized name
    pub fn code(&self) -> &'static str {
        match self {
            UreRisk::None => "none",
            UreRisk::Low => "low",
            UreRisk::Moderate => "moderate",
            UreRisk::High => "high",
            UreRisk::VeryHigh => "veryHigh",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            UreRisk::None => "None",
            UreRisk::Low => "Low",
            UreRisk::Moderate => "Moderate",
            UreRisk::High => "High",
            UreRisk::VeryHigh => "Very high",
        }
    }

    /// Category for an expected URE count during one rebuild
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.1 {
            UreRisk::Low
        } else if ratio < 0.5 {
            UreRisk::Moderate
        } else if ratio < 1.0 {
            UreRisk::High
        } else {
            UreRisk::VeryHigh
        }
    }

    /// One step lower, never below `Low`
    fn downgrade(self) -> Self {
        match self {
            UreRisk::VeryHigh => UreRisk::High,
            UreRisk::High => UreRisk::Moderate,
            UreRisk::Moderate | UreRisk::Low => UreRisk::Low,
            UreRisk::None => UreRisk::None,
        }
    }
}

// ============================================================================
// Calculator
// ============================================================================

pub fn config() -> CalcResult<CalculatorConfig> {
    let levels: Vec<&str> = RaidLevel::ALL.iter().map(|l| l.code()).collect();
    let drive_types: Vec<&str> = DriveType::ALL.iter().map(|t| t.code()).collect();

    let config = CalculatorConfig::new(ID, "2.0.1", Category::Storage, "hard-drive")
        .with_input(InputField::select("raidLevel", DEFAULT_LEVEL, &levels))
        .with_input(InputField::stepper("driveCount", DEFAULT_DRIVE_COUNT).range(2.0, 64.0).step(1.0))
        .with_input(
            InputField::number("driveCapacity", DEFAULT_CAPACITY)
                .min(0.0)
                .with_unit(UnitType::DataSize, DEFAULT_CAPACITY_UNIT, &["GB", "TB"]),
        )
        .with_input(InputField::radio("driveType", DEFAULT_DRIVE_TYPE, &drive_types))
        .with_input(
            InputField::stepper("drivesPerGroup", DEFAULT_DRIVES_PER_GROUP)
                .range(3.0, 32.0)
                .step(1.0)
                .show_when_any("raidLevel", &["50", "60"]),
        )
        .with_input(
            InputField::number("costPerDrive", DEFAULT_COST)
                .min(0.0)
                .with_unit(UnitType::Currency, DEFAULT_CURRENCY, &currency_codes()),
        )
        .with_input(InputField::number("rebuildSpeed", DEFAULT_REBUILD_SPEED).range(1.0, 10_000.0))
        .with_input(InputField::select("ureRate", DEFAULT_URE_EXPONENT, &["14", "15", "16", "17"]))
        .with_preset(
            Preset::new("homeNas", "home")
                .set("raidLevel", "5")
                .set("driveCount", 4.0)
                .set("driveCapacity", 8.0)
                .set("driveType", "hdd")
                .set("costPerDrive", 180.0)
                .set("ureRate", "14"),
        )
        .with_preset(
            Preset::new("database", "database")
                .set("raidLevel", "10")
                .set("driveCount", 8.0)
                .set("driveCapacity", 2.0)
                .set("driveType", "nvme")
                .set("costPerDrive", 250.0)
                .set("rebuildSpeed", 1000.0)
                .set("ureRate", "17"),
        )
        .with_preset(
            Preset::new("archive", "archive")
                .set("raidLevel", "60")
                .set("driveCount", 16.0)
                .set("drivesPerGroup", 8.0)
                .set("driveCapacity", 20.0)
                .set("driveType", "hdd")
                .set("costPerDrive", 400.0)
                .set("ureRate", "15"),
        )
        .with_result(ResultField::primary("usableCapacity"))
        .with_result(ResultField::primary("faultTolerance").format(ResultFormat::Number))
        .with_result(ResultField::primary("ureRisk"))
        .with_result(ResultField::secondary("rawCapacity"))
        .with_result(ResultField::secondary("redundancyOverhead"))
        .with_result(ResultField::secondary("storageEfficiency").format(ResultFormat::Percent))
        .with_result(ResultField::secondary("readIops").format(ResultFormat::Number))
        .with_result(ResultField::secondary("writeIops").format(ResultFormat::Number))
        .with_result(ResultField::secondary("readThroughput"))
        .with_result(ResultField::secondary("writeThroughput"))
        .with_result(ResultField::secondary("rebuildTime"))
        .with_result(ResultField::secondary("ureProbability").format(ResultFormat::Percent))
        .with_result(ResultField::secondary("totalCost").format(ResultFormat::Currency))
        .with_result(ResultField::secondary("costPerTb").format(ResultFormat::Currency))
        .with_chart(ChartType::Pie, "capacity", "segment", &["bytes"])
        .with_table("levels", &["level", "usableCapacity", "storageEfficiency", "faultTolerance", "writePenalty"])
        .with_info_card("parity", "shield")
        .with_info_card("notBackup", "alert")
        .with_education("writePenalty")
        .with_education("ureRisk")
        .with_faq("raid5Large")
        .with_faq("raid10VsRaid6")
        .with_faq("hotSpare")
        .with_reference(
            "Patterson, Gibson, Katz: A Case for Redundant Arrays of Inexpensive Disks (RAID)",
            "https://www2.eecs.berkeley.edu/Pubs/TechRpts/1987/CSD-87-391.pdf",
        )
        .with_reference(
            "SNIA Common RAID Disk Data Format Specification",
            "https://www.snia.org/tech_activities/standards/curr_standards/ddf",
        );

    Ok(config.with_locales(LocaleCatalog::load_embedded(ID)?))
}

fn layout_message(input: &ComputeInput, level: RaidLevel, error: LayoutError) -> String {
    let (key, fallback) = match error {
        LayoutError::TooFewDrives { .. } => ("belowMinimum", "RAID {level} needs at least {minDrives} drives"),
        LayoutError::OddDriveCount => ("evenDrives", "RAID {level} needs an even number of drives"),
        LayoutError::IncompleteGroups { .. } => (
            "wholeGroups",
            "RAID {level} needs at least two whole groups of {drivesPerGroup} drives",
        ),
    };
    let mut vars = BTreeMap::new();
    vars.insert("level".to_string(), level.code().to_string());
    match error {
        LayoutError::TooFewDrives { min } => {
            vars.insert("minDrives".to_string(), min.to_string());
        }
        LayoutError::IncompleteGroups { drives_per_group } => {
            vars.insert("drivesPerGroup".to_string(), drives_per_group.to_string());
        }
        LayoutError::OddDriveCount => {}
    }
    template::render(input.t.value(key, fallback), &vars)
}

pub fn compute(input: &ComputeInput) -> CalculatorResults {
    let nf = input.number_format();

    let Some(level) = RaidLevel::from_code(&input.text("raidLevel", DEFAULT_LEVEL)) else {
        return CalculatorResults::invalid();
    };
    let drive_type = DriveType::from_code(&input.text("driveType", DEFAULT_DRIVE_TYPE)).unwrap_or(DriveType::Hdd);

    let drive_count = input.number("driveCount", DEFAULT_DRIVE_COUNT).floor();
    let capacity = input.number("driveCapacity", DEFAULT_CAPACITY);
    let drives_per_group = input.number("drivesPerGroup", DEFAULT_DRIVES_PER_GROUP).floor();
    let cost_per_drive = input.number("costPerDrive", DEFAULT_COST);
    let rebuild_speed = input.number("rebuildSpeed", DEFAULT_REBUILD_SPEED);
    let ure_exponent = input.number("ureRate", 14.0);
    if drive_count < 1.0 || capacity <= 0.0 || rebuild_speed <= 0.0 || cost_per_drive < 0.0 || drives_per_group < 1.0 {
        return CalculatorResults::invalid();
    }
    let drives = drive_count.min(u32::MAX as f64) as u32;
    let drives_per_group = drives_per_group.min(u32::MAX as f64) as u32;

    let layout = match level.layout(drives, drives_per_group) {
        Ok(layout) => layout,
        Err(error) => {
            return CalculatorResults::invalid_with(ERROR_BELOW_MINIMUM, layout_message(input, level, error));
        }
    };

    let capacity_unit_symbol = input.unit("driveCapacity", DEFAULT_CAPACITY_UNIT);
    let capacity_unit = DataSizeUnit::from_symbol(capacity_unit_symbol).unwrap_or_else(|| {
        tracing::debug!(unit = capacity_unit_symbol, "unknown capacity unit, assuming TB");
        DataSizeUnit::TB
    });
    let drive_bytes = capacity_unit.to_bytes(capacity).value();

    // Capacity
    let raw_bytes = drive_bytes * drives as f64;
    let usable_bytes = drive_bytes * layout.data_drives;
    let overhead_bytes = raw_bytes - usable_bytes;
    let usable_in_unit = capacity * layout.data_drives;
    let efficiency = usable_bytes / raw_bytes * 100.0;

    // Performance
    let penalty = level.write_penalty() as f64;
    let read_iops = drive_type.iops() * drives as f64;
    let write_iops = read_iops / penalty;
    let read_throughput = drive_type.throughput_mbs() * drives as f64;
    let write_throughput = read_throughput / penalty;

    // Rebuild
    let currency = input.unit("costPerDrive", DEFAULT_CURRENCY);
    let total_cost = cost_per_drive * drives as f64;
    let usable_tb = usable_bytes / DataSizeUnit::TB.bytes();
    let cost_per_tb = total_cost / usable_tb;

    let mut builder = ResultBuilder::new();
    if level.fault_tolerance() == 0 {
        builder = builder
            .entry("rebuildTime", 0.0, NOT_AVAILABLE)
            .entry("ureRisk", 0.0, input.t.value(UreRisk::None.code(), UreRisk::None.display_name()))
            .entry("ureProbability", 0.0, NOT_AVAILABLE);
    } else {
        let rebuild_hours = drive_bytes / (rebuild_speed * 1e6) / 3600.0;
        let bits_read = level.rebuild_sources(&layout, drives_per_group) as f64 * drive_bytes * 8.0;
        let ratio = bits_read / 10f64.powf(ure_exponent);
        let probability = (1.0 - (-ratio).exp()) * 100.0;
        let mut risk = UreRisk::from_ratio(ratio);
        if level.fault_tolerance() >= 2 {
            risk = risk.downgrade();
        }
        builder = builder
            .entry("rebuildTime", rebuild_hours, format_duration_hours(rebuild_hours, &nf))
            .entry("ureRisk", ratio, input.t.value(risk.code(), risk.display_name()))
            .entry("ureProbability", probability, format_percent(probability, 1, &nf));
    }

    let tolerance = level.fault_tolerance() as f64;
    builder
        .entry("usableCapacity", usable_in_unit, format_bytes_human(usable_bytes))
        .value("usableBytes", usable_bytes)
        .entry("rawCapacity", capacity * drives as f64, format_bytes_human(raw_bytes))
        .entry("redundancyOverhead", overhead_bytes, format_bytes_human(overhead_bytes))
        .entry("storageEfficiency", efficiency, format_percent(efficiency, 1, &nf))
        .entry("faultTolerance", tolerance, format_number(tolerance, 0, &nf))
        .entry("readIops", read_iops, format_number(read_iops, 0, &nf))
        .entry("writeIops", write_iops, format_number(write_iops, 0, &nf))
        .entry("readThroughput", read_throughput, format!("{} MB/s", format_number(read_throughput, 0, &nf)))
        .entry("writeThroughput", write_throughput, format!("{} MB/s", format_number(write_throughput, 0, &nf)))
        .entry("totalCost", total_cost, format_currency(total_cost, 2, currency, &nf))
        .entry("costPerTb", cost_per_tb, format_currency(cost_per_tb, 2, currency, &nf))
        .value("writePenalty", penalty)
        .value("minDrives", level.min_drives() as f64)
        .var("raidLevel", level.code())
        .var("driveCount", drives.to_string())
        .summary(input.t.format(
            "summary",
            "RAID {raidLevel} with {driveCount} drives: {usableCapacity} usable of {rawCapacity} ({storageEfficiency}), survives {faultTolerance} drive failure(s)",
        ))
        .metadata(json!({
            "capacity": [
                { "segment": "usable", "bytes": usable_bytes },
                { "segment": "redundancy", "bytes": overhead_bytes },
            ],
            "levels": comparison_rows(drives, drives_per_group, drive_bytes),
        }))
        .build()
}

/// Every level the same drives could form, for side-by-side comparison
fn comparison_rows(drives: u32, drives_per_group: u32, drive_bytes: f64) -> Vec<serde_json::Value> {
    RaidLevel::ALL
        .iter()
        .filter_map(|level| {
            let layout = level.layout(drives, drives_per_group).ok()?;
            Some(json!({
                "level": level.code(),
                "usableCapacity": drive_bytes * layout.data_drives,
                "storageEfficiency": layout.data_drives / drives as f64 * 100.0,
                "faultTolerance": level.fault_tolerance(),
                "writePenalty": level.write_penalty(),
            }))
        })
        .collect()
}
