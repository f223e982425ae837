//! Engine configuration, read from the environment at first touch of
//! the global instance.

pub const ENV_BUFFER_CHUNKS: &str = "TRACE_BUFFER_CHUNKS";
pub const ENV_CHUNK_EVENTS: &str = "TRACE_CHUNK_EVENTS";
pub const ENV_STARTUP_FILTER: &str = "TRACE_STARTUP_FILTER";

pub const DEFAULT_BUFFER_CHUNKS: usize = 1024;
pub const DEFAULT_CHUNK_EVENTS: usize = 64;

#[derive(Debug, Clone)]
pub struct TraceConfig {
    /// Ring capacity in chunks.
    pub buffer_chunks: usize,
    /// Events per chunk.
    pub chunk_events: usize,
    /// Filter to enable at process start, if any.
    pub startup_filter: Option<String>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        TraceConfig {
            buffer_chunks: DEFAULT_BUFFER_CHUNKS,
            chunk_events: DEFAULT_CHUNK_EVENTS,
            startup_filter: None,
        }
    }
}

impl TraceConfig {
    pub fn from_env() -> Self {
        TraceConfig {
            buffer_chunks: env_usize(ENV_BUFFER_CHUNKS, DEFAULT_BUFFER_CHUNKS),
            chunk_events: env_usize(ENV_CHUNK_EVENTS, DEFAULT_CHUNK_EVENTS),
            startup_filter: std::env::var(ENV_STARTUP_FILTER)
                .ok()
                .filter(|v| !v.is_empty()),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<usize>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(default)
}
