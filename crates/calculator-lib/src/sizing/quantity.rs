//! Kubernetes quantity formatting
//!
//! Byte counts are rendered with binary suffixes and always rounded up so a
//! displayed quantity never under-provisions. CPU is rendered as whole cores
//! when integral and as floored millicores otherwise.

use crate::error::{SizingError, SizingResult};
use crate::models::ResourceKind;
use regex::Regex;
use std::sync::OnceLock;

/// Rendering of zero or negative byte counts
pub const ZERO_QUANTITY: &str = "0Gi";

/// Smallest CPU quantity ever emitted
pub const MIN_CPU_QUANTITY: &str = "100m";

/// CPU values at or below this are rendered as [`MIN_CPU_QUANTITY`]
pub const CPU_CLAMP_THRESHOLD_CORES: f64 = 0.1;

const KIB: f64 = 1024.0;
const MIB: f64 = KIB * 1024.0;
const GIB: f64 = MIB * 1024.0;

static BYTES_PATTERN: OnceLock<Regex> = OnceLock::new();
static CPU_PATTERN: OnceLock<Regex> = OnceLock::new();

fn bytes_pattern() -> &'static Regex {
    BYTES_PATTERN.get_or_init(|| Regex::new(r"^[0-9]+[KMG]i$").expect("valid bytes pattern"))
}

fn cpu_pattern() -> &'static Regex {
    CPU_PATTERN.get_or_init(|| Regex::new(r"^([0-9]+)m?$").expect("valid cpu pattern"))
}

/// Format a byte count as `Ki` below 1 MiB, `Mi` below 1 GiB and `Gi` otherwise
pub fn format_bytes(bytes: f64) -> String {
    if bytes.is_nan() {
        return bytes.to_string();
    }
    if bytes <= 0.0 {
        return ZERO_QUANTITY.to_string();
    }

    if bytes < MIB {
        format!("{}Ki", (bytes / KIB).ceil() as u64)
    } else if bytes < GIB {
        format!("{}Mi", (bytes / MIB).ceil() as u64)
    } else {
        format!("{}Gi", (bytes / GIB).ceil() as u64)
    }
}

/// Format a core count as whole cores or millicores
pub fn format_cores(cores: f64) -> String {
    if cores.is_nan() {
        return cores.to_string();
    }
    if cores <= CPU_CLAMP_THRESHOLD_CORES {
        return MIN_CPU_QUANTITY.to_string();
    }

    let whole = cores as u64;
    if whole as f64 == cores {
        whole.to_string()
    } else {
        format!("{}m", (cores * 1000.0).floor() as u64)
    }
}

/// Check a rendered quantity against its canonical pattern
pub fn validate_quantity(kind: ResourceKind, value: &str) -> SizingResult<()> {
    let pattern = match kind {
        ResourceKind::Cpu => cpu_pattern(),
        ResourceKind::Memory => bytes_pattern(),
    };

    if pattern.is_match(value) {
        Ok(())
    } else {
        Err(SizingError::MalformedQuantity {
            kind,
            value: value.to_string(),
        })
    }
}

/// Format and validate a byte count
pub fn render_bytes(bytes: f64) -> SizingResult<String> {
    let quantity = format_bytes(bytes);
    validate_quantity(ResourceKind::Memory, &quantity)?;
    Ok(quantity)
}

/// Format and validate a core count
pub fn render_cores(cores: f64) -> SizingResult<String> {
    let quantity = format_cores(cores);
    validate_quantity(ResourceKind::Cpu, &quantity)?;
    Ok(quantity)
}
