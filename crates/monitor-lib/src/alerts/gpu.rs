//! Accelerator alert checks
//!
//! Only the first device in the snapshot is evaluated. Memory pressure
//! and temperature are independent checks and may both fire for the
//! same device in one evaluation. Temperature deliberately has no
//! minor tier.

use super::threshold::classify_percent;
use crate::models::{Alert, AlertBundle, GpuDevice, Tier};

const SERIOUS_TEMP_C: i64 = 75;
const CRITICAL_TEMP_C: i64 = 85;

pub(crate) fn gpu_alerts(bundle: &mut AlertBundle, gpus: &[GpuDevice]) {
    let Some(gpu) = gpus.first() else {
        return;
    };

    if gpu.memory_total_mb > 0 {
        let percent = gpu.memory_used_mb as f64 / gpu.memory_total_mb as f64 * 100.0;
        if let Some(tier) = classify_percent(Some(percent)) {
            bundle.push(tier, memory_alert(tier, gpu, percent));
        }
    }

    if gpu.temperature_c > CRITICAL_TEMP_C {
        bundle.push(Tier::Critical, temperature_alert(Tier::Critical, gpu));
    } else if gpu.temperature_c > SERIOUS_TEMP_C {
        bundle.push(Tier::Serious, temperature_alert(Tier::Serious, gpu));
    }
}

fn memory_alert(tier: Tier, gpu: &GpuDevice, percent: f64) -> Alert {
    let desc = format!(
        "GPU memory {}/{} MB ({percent:.1}%)",
        gpu.memory_used_mb, gpu.memory_total_mb
    );
    match tier {
        Tier::Critical => Alert::new(
            "GPU memory nearly exhausted",
            desc,
            "1. Reduce batch size 2. Quantize the model 3. Add GPUs or shard across cards",
        ),
        Tier::Serious => Alert::new(
            "GPU memory usage high",
            desc,
            "Watch inference throughput and trim memory use",
        ),
        Tier::Minor => Alert::new(
            "GPU memory usage elevated",
            desc,
            "Keep monitoring GPU memory",
        ),
    }
}

fn temperature_alert(tier: Tier, gpu: &GpuDevice) -> Alert {
    let desc = format!("GPU temperature {}°C", gpu.temperature_c);
    match tier {
        Tier::Critical => Alert::new(
            "GPU temperature too high",
            desc,
            "1. Check the GPU fans 2. Shed compute load 3. Improve room cooling",
        ),
        _ => Alert::new(
            "GPU temperature high",
            desc,
            "Watch the temperature trend and inspect cooling",
        ),
    }
}
