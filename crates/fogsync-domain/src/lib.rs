pub mod analytics;
pub mod camunda;
pub mod messages;

pub use analytics::{
    AnalyticsRecord, ControlCommand, DeviceEventAnalyticsRecord, FogConfig,
    GroupEventAnalyticsRecord, InputTopic, OperatorJob, TopicMapping,
};
pub use camunda::{
    Count, Deployment, EngineIncident, HistoricProcessInstance, Incident,
    ProcessDefinition, ProcessInstance, Variable,
};
pub use messages::{
    DeploymentMessage, DeploymentMetadata, Diagram, EventDescriptionsUpdate,
    EventDescriptor, IncidentHandling, StartMessage,
};

/// Tenant id stamped on every engine call and event descriptor.
/// The agent serves a single logical tenant.
pub const USER_ID: &str = "senergy";

/// Worker id recorded on agent-generated incidents.
pub const WORKER_ID: &str = "fogsync-agent";
