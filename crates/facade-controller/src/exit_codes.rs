//! Standard exit codes for the controller process
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// Success - the controller shut down cleanly
pub const SUCCESS: i32 = 0;

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Configuration error - unreadable or invalid config file
pub const CONFIG_ERROR: i32 = 2;

/// Kubernetes error - no client, or the Facade type is not served
pub const KUBE_ERROR: i32 = 3;

/// Usage error - invalid arguments or options (following sysexits.h convention)
pub const USAGE_ERROR: i32 = 64;
