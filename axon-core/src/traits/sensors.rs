//! Sensor input trait

/// Raw digital reads of the limit and home inputs
///
/// Implementations return plain logic levels; trigger polarity is applied
/// by the safety monitor from the committed settings.
pub trait SensorInputs {
    /// Limit switch 1 level
    fn limit_1(&mut self) -> bool;

    /// Limit switch 2 level
    fn limit_2(&mut self) -> bool;

    /// Home sensor level
    fn home(&mut self) -> bool;
}
