mod control_state;
mod telemetry_record;

pub use control_state::{ControlState, ControlStateTable};
pub use telemetry_record::{TelemetryRecord, TelemetryRecordTable};

pub trait Table {
    /// The name of the table
    fn name(&self) -> &'static str;

    /// The SQL statement to create the table
    fn create(&self) -> String;

    /// The SQL statement to dispose the table
    fn dispose(&self) -> String;

    /// The dependencies of the table
    fn dependencies(&self) -> Vec<&'static str>;
}
