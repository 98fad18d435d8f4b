/// Constants used by the synthetic record generator.
pub mod generator {
    /// Prefix of every generated record id.
    pub const RECORD_ID_PREFIX: &str = "PIL";
    /// Number of records between progress log lines.
    pub const PROGRESS_INTERVAL: usize = 10_000;
    /// Inclusive lower bound of generated ages.
    pub const MIN_AGE: u8 = 18;
    /// Inclusive upper bound of generated ages.
    pub const MAX_AGE: u8 = 80;
    /// Arrival is drawn from this many days back (inclusive range start).
    pub const ARRIVAL_MIN_DAYS_AGO: i64 = 1;
    /// Arrival is drawn from this many days back (inclusive range end).
    pub const ARRIVAL_MAX_DAYS_AGO: i64 = 30;
    /// Shortest stay in days.
    pub const MIN_STAY_DAYS: i64 = 5;
    /// Longest stay in days.
    pub const MAX_STAY_DAYS: i64 = 15;
    /// Bounded pool of display names.
    pub const NAME_POOL: [&str; 8] = [
        "محمد", "أحمد", "فاطمة", "عائشة", "عبدالله", "سارة", "خالد", "مريم",
    ];
    /// Dialing prefix used for generated phone numbers.
    pub const PHONE_PREFIX: &str = "+966";
}

/// Constants used by privacy redaction.
pub mod redaction {
    /// Field names replaced by a digest before the wrapped operation runs.
    pub const SENSITIVE_FIELDS: [&str; 3] = ["national_id", "passport_number", "phone"];
    /// Number of hex characters kept from the SHA-256 digest.
    pub const DIGEST_HEX_LEN: usize = 16;
}

/// Constants used by the parallel aggregator and its built-in tasks.
pub mod aggregation {
    /// Task name for the nationality distribution.
    pub const TASK_NATIONALITY: &str = "nationality";
    /// Task name for the age-group distribution.
    pub const TASK_AGE_GROUPS: &str = "age_groups";
    /// Task name for daily arrival counts.
    pub const TASK_PEAK_PERIODS: &str = "peak_periods";
    /// Age buckets as `(label, inclusive upper bound)`; the last bucket is open-ended.
    pub const AGE_BUCKETS: [(&str, u8); 4] = [
        ("18-30", 30),
        ("31-45", 45),
        ("46-60", 60),
        ("60+", u8::MAX),
    ];
    /// Calendar-day key format for arrival buckets.
    pub const DAY_KEY_FORMAT: &str = "%Y-%m-%d";
    /// Thread name prefix for aggregator workers.
    pub const WORKER_THREAD_PREFIX: &str = "pilgrim-aggregator";
    /// Upper bound on how long shutdown waits for worker threads to exit.
    pub const SHUTDOWN_WAIT_MS: u64 = 5_000;
}

/// Constants used by the orchestrating platform.
pub mod platform {
    /// Number of entries kept in the top-nationalities view.
    pub const TOP_NATIONALITIES: usize = 5;
    /// Status reported when a field mapping carries no health status.
    pub const UNKNOWN_HEALTH_STATUS: &str = "غير محدد";
    /// Default file name used by report export in the demo.
    pub const DEFAULT_REPORT_FILENAME: &str = "report.json";
}

/// Defaults for the caller-supplied configuration surface.
pub mod defaults {
    /// Default streaming window size.
    pub const CHUNK_SIZE: usize = 5_000;
    /// Default aggregator worker count.
    pub const WORKERS: usize = 4;
    /// Default cache time-to-live in seconds.
    pub const CACHE_TTL_SECS: u64 = 300;
    /// Default total attempts for retried operations.
    pub const RETRY_ATTEMPTS: usize = 3;
    /// Default delay between retry attempts in milliseconds.
    pub const RETRY_DELAY_MS: u64 = 1_000;
}
