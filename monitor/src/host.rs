//! Host readings not covered by `sysinfo`
//!
//! Filesystem usage comes from `statvfs(3)`. Block I/O counters and battery
//! state are read from procfs/sysfs on Linux; other platforms report zero
//! counters and no battery.

use std::fs;
use std::path::Path;

use crate::error::{CaptureError, CaptureResult};
use crate::snapshot::{percent_of, BatteryStatus};

/// Sector size used by `/proc/diskstats`, independent of the device
const DISKSTATS_SECTOR_BYTES: u64 = 512;

/// Filesystem usage of the filesystem holding a path
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FsUsage {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,
}

impl FsUsage {
    /// Build usage from raw block counts.
    ///
    /// `free` is what an unprivileged user can still allocate, so
    /// `used + free` can be less than `total` on filesystems with reserved
    /// blocks. The percentage is taken over `used + free`, the way `df` does.
    pub fn from_blocks(blocks: u64, blocks_free: u64, blocks_available: u64, fragment_size: u64) -> Self {
        let total = blocks.saturating_mul(fragment_size);
        let free = blocks_available.saturating_mul(fragment_size);
        let used = blocks.saturating_sub(blocks_free).saturating_mul(fragment_size);
        Self {
            total,
            used,
            free,
            percent: percent_of(used, used.saturating_add(free)),
        }
    }
}

/// Usage of the filesystem holding `path`
#[allow(clippy::unnecessary_cast)]
pub fn filesystem_usage(path: &Path) -> CaptureResult<FsUsage> {
    let stat = nix::sys::statvfs::statvfs(path).map_err(|e| CaptureError::Disk {
        reason: format!("statvfs({}) failed: {}", path.display(), e),
    })?;

    Ok(FsUsage::from_blocks(
        stat.blocks() as u64,
        stat.blocks_free() as u64,
        stat.blocks_available() as u64,
        stat.fragment_size() as u64,
    ))
}

/// Cumulative block I/O since boot
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DiskIo {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// Sum sector counters over whole disks in `/proc/diskstats` content.
///
/// Partitions are skipped so their traffic is not counted twice; `is_whole_disk`
/// decides which device names qualify.
pub fn parse_diskstats(content: &str, is_whole_disk: impl Fn(&str) -> bool) -> DiskIo {
    let mut io = DiskIo::default();

    for line in content.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.len() < 10 {
            continue;
        }
        let name = parts[2];
        if name.starts_with("loop") || name.starts_with("ram") || !is_whole_disk(name) {
            continue;
        }
        // fields: major minor name reads merged sectors_read ms writes merged sectors_written ...
        let (Ok(sectors_read), Ok(sectors_written)) = (parts[5].parse::<u64>(), parts[9].parse::<u64>()) else {
            continue;
        };
        io.read_bytes = io.read_bytes.saturating_add(sectors_read.saturating_mul(DISKSTATS_SECTOR_BYTES));
        io.write_bytes = io.write_bytes.saturating_add(sectors_written.saturating_mul(DISKSTATS_SECTOR_BYTES));
    }

    io
}

/// Block I/O counters of the running host
#[cfg(target_os = "linux")]
pub fn disk_io() -> CaptureResult<DiskIo> {
    let content = fs::read_to_string("/proc/diskstats").map_err(|e| CaptureError::Disk {
        reason: format!("cannot read /proc/diskstats: {e}"),
    })?;
    let sys_block = Path::new("/sys/block");
    Ok(parse_diskstats(&content, |name| sys_block.join(name).exists()))
}

#[cfg(not(target_os = "linux"))]
pub fn disk_io() -> CaptureResult<DiskIo> {
    Ok(DiskIo::default())
}

/// Battery state of the running host, `None` when there is no battery
#[cfg(target_os = "linux")]
pub fn battery() -> Option<BatteryStatus> {
    battery_from(Path::new("/sys/class/power_supply"))
}

#[cfg(not(target_os = "linux"))]
pub fn battery() -> Option<BatteryStatus> {
    None
}

/// Read battery state from a `power_supply` class directory.
///
/// The first supply of type `Battery` with a readable capacity wins. The host
/// counts as plugged in when any mains/USB supply is online, or failing that,
/// when the battery reports that it is charging or full.
pub fn battery_from(root: &Path) -> Option<BatteryStatus> {
    let entries = fs::read_dir(root).ok()?;

    let mut capacity = None;
    let mut battery_status = None;
    let mut external_online = None;

    let mut dirs: Vec<_> = entries.flatten().map(|entry| entry.path()).collect();
    dirs.sort();

    for dir in dirs {
        let Some(kind) = read_trimmed(&dir.join("type")) else {
            continue;
        };
        match kind.as_str() {
            "Battery" if capacity.is_none() => {
                if let Some(value) = read_trimmed(&dir.join("capacity")).and_then(|v| v.parse::<f64>().ok()) {
                    capacity = Some(value);
                    battery_status = read_trimmed(&dir.join("status"));
                }
            }
            "Mains" | "USB" => {
                if let Some(online) = read_trimmed(&dir.join("online")) {
                    let online = online == "1";
                    external_online = Some(external_online.unwrap_or(false) || online);
                }
            }
            _ => {}
        }
    }

    let percent = capacity?;
    let power_plugged = external_online.unwrap_or_else(|| {
        matches!(battery_status.as_deref(), Some("Charging") | Some("Full"))
    });

    Some(BatteryStatus { percent, power_plugged })
}

fn read_trimmed(path: &Path) -> Option<String> {
    fs::read_to_string(path).ok().map(|s| s.trim().to_string())
}
