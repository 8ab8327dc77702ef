/// Tuning parameters for the playback controller.
#[derive(Clone, Debug)]
pub struct PlayerConfig {
    /// Max continuation entries kept per play request; extras are dropped.
    pub continuation_limit: usize,
    /// Capacity of the status broadcast channel.
    pub status_capacity: usize,
}

impl Default for PlayerConfig {
    /// Defaults sized for a conversation view with a long voice thread.
    fn default() -> Self {
        Self {
            continuation_limit: 256,
            status_capacity: 64,
        }
    }
}
