// Orchestration constants (no magic values)
use std::time::Duration;

/// Memory load (percent) above which a pre-flight reclaim is offered
pub const PREFLIGHT_MEMORY_ADVISORY: f32 = 75.0;

/// Cooldown progress is reported at this cadence (30s)
pub const COOLDOWN_REPORT_INTERVAL: Duration = Duration::from_secs(30);

/// Default rest between batch jobs (3 minutes); failures rest half as long
pub const DEFAULT_REST_DURATION: Duration = Duration::from_secs(180);

/// Pause after a reclaim before re-reading memory (1s)
pub const RECLAIM_SETTLE_DURATION: Duration = Duration::from_secs(1);

/// Number of jobs shown in the ordering preview
pub const ORDERING_PREVIEW_LEN: usize = 10;

/// Frame rate used when the source rate is not kept or cannot be detected
pub const DEFAULT_FPS: f64 = 30.0;

/// Batch output file name suffix: `<stem>-swapped.mp4`
pub const BATCH_OUTPUT_SUFFIX: &str = "-swapped";

/// Batch output container
pub const BATCH_OUTPUT_EXTENSION: &str = "mp4";

/// Upper bound for one resource sample (5s)
pub const SAMPLE_TIMEOUT: Duration = Duration::from_secs(5);

/// Window over which CPU load is measured (1s)
pub const CPU_SAMPLE_WINDOW: Duration = Duration::from_secs(1);
