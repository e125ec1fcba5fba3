use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

pub fn env_timeout_ms() -> u64 {
    std::env::var("GENDRIVE_HWPROF_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&v| v >= 200)
        .unwrap_or(2000)
}

fn env_flag(key: &str) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

pub fn hwprof_debug() -> bool {
    env_flag("GENDRIVE_HWPROF_DEBUG")
}

pub fn disabled(name: &str) -> bool {
    env_flag(&format!(
        "GENDRIVE_HWPROF_DISABLE_{}",
        name.to_ascii_uppercase()
    ))
}

/// Run a closure on a worker thread and join with timeout.
/// Returns (result, maybe_reason, elapsed_ms). A timed-out worker is left detached.
pub fn with_timeout<T: Send + 'static, F: FnOnce() -> T + Send + 'static>(
    label: &str,
    dur: Duration,
    f: F,
) -> (Option<T>, Option<String>, u64) {
    let (tx, rx) = mpsc::channel();
    let start = Instant::now();
    thread::spawn(move || {
        let out = f();
        let _ = tx.send(out);
    });
    let res = rx.recv_timeout(dur).ok();
    let ms = start.elapsed().as_millis() as u64;
    if res.is_none() {
        (None, Some(format!("{label}_timeout")), ms)
    } else {
        (res, None, ms)
    }
}

/// Name-based software rasterizer check (llvmpipe, SwiftShader, ...).
pub fn software_renderer_by_name(name: &str) -> Option<&'static str> {
    let lower = name.to_ascii_lowercase();
    ["llvmpipe", "softpipe", "swrast", "swiftshader"]
        .into_iter()
        .find(|s| lower.contains(s))
}

/// CUDA/HIP style packed driver version (12040 → "12.4").
pub fn packed_version_string(v: i32) -> Option<String> {
    if v <= 0 {
        return None;
    }
    let major = v / 1000;
    let minor = (v % 1000) / 10;
    Some(format!("{major}.{minor}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_reports_label() {
        let (out, reason, _) = with_timeout("slow", Duration::from_millis(20), || {
            thread::sleep(Duration::from_millis(500));
            1
        });
        assert!(out.is_none());
        assert_eq!(reason.as_deref(), Some("slow_timeout"));
    }

    #[test]
    fn fast_probe_returns_value() {
        let (out, reason, _) = with_timeout("fast", Duration::from_secs(2), || 7);
        assert_eq!(out, Some(7));
        assert!(reason.is_none());
    }

    #[test]
    fn detects_software_renderers() {
        assert_eq!(
            software_renderer_by_name("llvmpipe (LLVM 15.0.7, 256 bits)"),
            Some("llvmpipe")
        );
        assert_eq!(
            software_renderer_by_name("SwiftShader Device"),
            Some("swiftshader")
        );
        assert_eq!(software_renderer_by_name("Intel(R) Arc(TM) A770"), None);
    }

    #[test]
    fn packed_versions() {
        assert_eq!(packed_version_string(12040).as_deref(), Some("12.4"));
        assert_eq!(packed_version_string(0), None);
    }
}
