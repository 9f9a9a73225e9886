//! System introspection over `sysinfo`
//!
//! Each call takes a fresh, bounded snapshot; nothing is held between calls.

use serde::{Deserialize, Serialize};
use sysinfo::{Disks, System};

/// Human readable size, one decimal: `1.5 KB`, `3.0 GB`
pub fn format_size(bytes: u64) -> String {
    let mut size = bytes as f64;
    for unit in ["B", "KB", "MB", "GB", "TB"] {
        if size < 1024.0 {
            return format!("{:.1} {}", size, unit);
        }
        size /= 1024.0;
    }
    format!("{:.1} PB", size)
}

fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub memory_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInfo {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub free: u64,
    pub swap_total: u64,
    pub swap_used: u64,
    pub swap_free: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuInfo {
    pub usage_percent: f32,
    pub cores: usize,
    /// MHz of the first core, when reported
    pub frequency_mhz: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiskInfo {
    pub device: String,
    pub mount_point: String,
    pub total: u64,
    pub available: u64,
}

impl DiskInfo {
    pub fn used(&self) -> u64 {
        self.total.saturating_sub(self.available)
    }
}

/// Snapshot the process table. CPU figures need two samples, so this waits
/// one minimum update interval.
pub fn processes() -> Vec<ProcessInfo> {
    let mut sys = System::new();
    sys.refresh_memory();
    sys.refresh_processes();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_processes();

    let total_memory = sys.total_memory();
    let mut list: Vec<ProcessInfo> = sys
        .processes()
        .iter()
        .map(|(pid, process)| ProcessInfo {
            pid: pid.as_u32(),
            name: process.name().to_string(),
            cpu_percent: process.cpu_usage(),
            memory_percent: percent(process.memory(), total_memory),
        })
        .collect();

    list.sort_by_key(|p| p.pid);
    list
}

pub fn memory() -> MemoryInfo {
    let mut sys = System::new();
    sys.refresh_memory();

    MemoryInfo {
        total: sys.total_memory(),
        available: sys.available_memory(),
        used: sys.used_memory(),
        free: sys.free_memory(),
        swap_total: sys.total_swap(),
        swap_used: sys.used_swap(),
        swap_free: sys.free_swap(),
    }
}

pub fn cpu() -> CpuInfo {
    let mut sys = System::new();
    sys.refresh_cpu();
    std::thread::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL);
    sys.refresh_cpu();

    let frequency = sys.cpus().first().map(|c| c.frequency()).filter(|f| *f > 0);

    CpuInfo {
        usage_percent: sys.global_cpu_info().cpu_usage(),
        cores: sys.cpus().len(),
        frequency_mhz: frequency,
    }
}

pub fn disks() -> Vec<DiskInfo> {
    Disks::new_with_refreshed_list()
        .list()
        .iter()
        .filter(|disk| disk.total_space() > 0)
        .map(|disk| DiskInfo {
            device: disk.name().to_string_lossy().replace('\\', "/"),
            mount_point: disk.mount_point().display().to_string().replace('\\', "/"),
            total: disk.total_space(),
            available: disk.available_space(),
        })
        .collect()
}

/// Header shared by `ps` and `top`
pub fn process_header() -> String {
    format!("{:>6} {:<20} {:>6} {:>6}", "PID", "NAME", "CPU%", "MEM%")
}

pub fn format_process(p: &ProcessInfo) -> String {
    format!(
        "{:>6} {:<20} {:>6.1}% {:>6.1}%",
        p.pid, p.name, p.cpu_percent, p.memory_percent
    )
}

pub fn format_memory(m: &MemoryInfo) -> String {
    [
        "Memory Usage:".to_string(),
        format!("  Total: {}", format_size(m.total)),
        format!("  Available: {}", format_size(m.available)),
        format!("  Used: {} ({:.1}%)", format_size(m.used), percent(m.used, m.total)),
        format!("  Free: {}", format_size(m.free)),
        String::new(),
        "Swap Usage:".to_string(),
        format!("  Total: {}", format_size(m.swap_total)),
        format!(
            "  Used: {} ({:.1}%)",
            format_size(m.swap_used),
            percent(m.swap_used, m.swap_total)
        ),
        format!("  Free: {}", format_size(m.swap_free)),
    ]
    .join("\n")
}

pub fn format_cpu(c: &CpuInfo) -> String {
    let frequency = match c.frequency_mhz {
        Some(mhz) => format!("CPU Frequency: {} MHz", mhz),
        None => "CPU Frequency: N/A".to_string(),
    };
    [
        format!("CPU Usage: {:.1}%", c.usage_percent),
        format!("CPU Cores: {}", c.cores),
        frequency,
    ]
    .join("\n")
}

pub fn format_disks(disks: &[DiskInfo]) -> String {
    let mut lines = vec!["Filesystem Usage:".to_string()];
    for disk in disks {
        lines.push(format!(
            "  {:<20} {:>8} {:>8} {:>8} {:>5} {}",
            disk.device,
            format_size(disk.total),
            format_size(disk.used()),
            format_size(disk.available),
            format!("{:.1}%", percent(disk.used(), disk.total)),
            disk.mount_point
        ));
    }
    lines.join("\n")
}
