//! Generic Cleanup Interface
//!
//! Lets the orchestrator release transient resources without knowing how the
//! owner lays them out on disk.

/// Generic trait for cleanup operations
pub trait Cleanup {
    /// Clean up all resources managed by this instance
    fn cleanup(&self);
}
