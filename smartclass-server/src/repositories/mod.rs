mod control_state;
mod telemetry_record;

pub use control_state::ControlStateRepository;
pub use telemetry_record::TelemetryRecordRepository;
