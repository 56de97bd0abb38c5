pub mod backward_pass;
pub mod cpm;
pub mod earned_value;
pub mod forward_pass;
pub mod monte_carlo;
pub mod resource_leveling;

pub use cpm::CpmResult;
pub use earned_value::{
    EacMethod, EvmAnalysis, EvmMetrics, MetricHealth, ScheduleForecast, VarianceReportEntry,
};
pub use monte_carlo::{
    SimulationConfig, SimulationHandle, SimulationOutcome, SimulationRunner, simulate,
};
pub use resource_leveling::{ResourceAnalysis, ResourceUtilization, analyze_resources};
