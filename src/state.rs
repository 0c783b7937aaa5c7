use crate::services::TaskService;

#[derive(Clone)]
pub struct AppState {
    pub tasks: TaskService,
}
