pub mod patch;
pub mod subtask;
pub mod task;

pub use patch::Patch;
pub use subtask::{NewSubtaskRequest, Subtask, UpdateSubtaskRequest};
pub use task::{
    NewTask, NewTaskRequest, Priority, Status, StoryPoints, Task, TaskQueryParams,
    UpdateTaskRequest,
};
