pub mod agent;
pub mod report;
pub mod task;

pub use agent::{AgentConfig, DocumentRef, Persona, UpdateRule};
pub use report::{TaskReport, TaskRunStatus};
pub use task::{Frequency, Task, TaskKind, TaskType};
