use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Frames-per-second counter, logged once per second when `--show-fps` is on.
#[derive(Debug)]
pub struct FrameStats {
    window_start: Instant,
    frames: u32,
}

impl FrameStats {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    fn starting_at(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
        }
    }

    /// Count one presented frame. Returns the FPS when a report is due.
    pub fn record(&mut self) -> Option<f64> {
        self.record_at(Instant::now())
    }

    fn record_at(&mut self, now: Instant) -> Option<f64> {
        self.frames += 1;
        let elapsed = now.duration_since(self.window_start);
        if elapsed < REPORT_INTERVAL {
            return None;
        }
        let fps = f64::from(self.frames) / elapsed.as_secs_f64();
        log::info!("FPS: {:.1} ({:.2} ms/frame)", fps, 1000.0 / fps);
        *self = Self::starting_at(now);
        Some(fps)
    }
}

impl Default for FrameStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_once_per_interval() {
        let start = Instant::now();
        let mut stats = FrameStats::starting_at(start);
        for i in 1..60 {
            assert_eq!(stats.record_at(start + Duration::from_millis(i * 16)), None);
        }
        let fps = stats.record_at(start + Duration::from_secs(1)).unwrap();
        assert!((fps - 60.0).abs() < 1e-9);
        assert_eq!(stats.frames, 0);
        assert_eq!(stats.window_start, start + Duration::from_secs(1));
    }
}
