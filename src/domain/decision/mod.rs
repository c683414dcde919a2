//! Decision module - The decision aggregate and its workflow.
//!
//! A Decision records a single choice made by an organisation: who drives it,
//! which stakeholders take part, how it will be made, the chosen option and
//! whether it has been published. Status and workflow step are derived.

mod aggregate;
mod errors;
mod status;
mod update;
mod values;
mod workflow;

pub use aggregate::{Decision, DecisionProps, MAX_TITLE_LENGTH};
pub use errors::{DecisionError, DecisionStateError, StakeholderError};
pub use status::DecisionStatus;
pub use update::DecisionUpdate;
pub use values::{
    Cost, DecisionMethod, DecisionStakeholder, Reversibility, StakeholderRole, SupportingMaterial,
};
pub use workflow::{WorkflowNavigator, WorkflowStep};
