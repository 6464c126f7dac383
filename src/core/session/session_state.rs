#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Finished,
    Cancelled,
    Error,
}

impl SessionState {
    pub fn is_terminal(&self) -> bool {
        return matches!(
            self,
            SessionState::Finished | SessionState::Cancelled | SessionState::Error
        );
    }
}
