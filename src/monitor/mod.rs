/*!
 * Monitor Module
 * Periodic spike detection over captured snapshots
 */

mod alerts;
mod spike_monitor;

pub use alerts::SpikeAlert;
pub use spike_monitor::SpikeMonitor;
