//! SensorDriver trait - concrete sensor extension point
//!
//! A driver owns the sensor-specific representation of the latest raw
//! measurement plus a snapshot of the previous one. The shared bookkeeping
//! (timestamps, activity, rate-limited diagnostics) lives in the sensor base,
//! which is the only caller of these hooks.

/// Concrete sensor hooks
///
/// # Call order
///
/// After the transport layer has stored a new raw value in the driver, the
/// sensor base calls, in this order:
///
/// 1. [`has_valid_data`](SensorDriver::has_valid_data) - when false, nothing else runs
/// 2. [`has_different_data`](SensorDriver::has_different_data)
/// 3. [`set_prev_state`](SensorDriver::set_prev_state)
/// 4. [`reading`](SensorDriver::reading) - the value published to consumers
///
/// # Example
///
/// ```
/// use contracts::SensorDriver;
///
/// #[derive(Default)]
/// struct Counter { value: u32, prev: u32 }
///
/// impl SensorDriver for Counter {
///     fn kind(&self) -> &'static str { "counter" }
///     fn set_prev_state(&mut self) { self.prev = self.value; }
///     fn has_different_data(&self) -> bool { self.value != self.prev }
///     fn has_valid_data(&self) -> bool { self.value < 1000 }
///     fn reading(&self) -> f64 { self.value as f64 }
/// }
/// ```
pub trait SensorDriver: Send {
    /// Short driver name for diagnostics (e.g. "depth", "dvl")
    fn kind(&self) -> &'static str;

    /// Copy the current fields into the previous-state snapshot.
    ///
    /// Must be idempotent and touch nothing but the snapshot.
    fn set_prev_state(&mut self);

    /// Whether the current fields differ from the snapshot.
    ///
    /// Uses the sensor's own equality/tolerance rule. Must not mutate state.
    fn has_different_data(&self) -> bool;

    /// Whether the current fields pass the sensor's acceptance test.
    ///
    /// Range bounds, NaN rejection, status flags, transform availability.
    /// Must not mutate state.
    fn has_valid_data(&self) -> bool;

    /// Depth-like scalar carried by the current fields
    fn reading(&self) -> f64;
}
