//! Application state management

use rettam_core::config::AppConfig;
use rettam_core::Result;
use rettam_extractor::MetadataExtractor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Extraction pipeline shared by every request
    pub extractor: Arc<MetadataExtractor>,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Successful extractions
    pub extraction_count: AtomicU64,
    /// Ready status
    pub is_ready: AtomicBool,
}

impl AppState {
    /// Create new application state around an extractor
    pub fn new(config: AppConfig, extractor: Arc<MetadataExtractor>) -> Self {
        Self {
            config,
            extractor,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            extraction_count: AtomicU64::new(0),
            is_ready: AtomicBool::new(true),
        }
    }

    /// Create state with HTTP model clients built from config
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let extractor = MetadataExtractor::from_config(&config.models)?;
        Ok(Self::new(config, Arc::new(extractor)))
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    pub fn record_extraction(&self) {
        self.extraction_count.fetch_add(1, Ordering::SeqCst);
    }

    pub fn get_extraction_count(&self) -> u64 {
        self.extraction_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    /// Check if service is ready
    pub fn is_ready(&self) -> bool {
        self.is_ready.load(Ordering::SeqCst)
    }

    /// Set ready status
    pub fn set_ready(&self, ready: bool) {
        self.is_ready.store(ready, Ordering::SeqCst);
    }
}
