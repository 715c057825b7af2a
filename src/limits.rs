use crate::model::Minutes;

/// Minutes in one day bucket. A block may end exactly at 24:00.
pub const MINUTES_PER_DAY: Minutes = 24 * 60;

/// Shortest block the planner accepts.
pub const MIN_BLOCK_MINUTES: Minutes = 15;

/// Length of a block created by a single click on an empty slot.
pub const DEFAULT_BLOCK_MINUTES: Minutes = 60;

/// The most minimum-length blocks a day can hold.
pub const MAX_BLOCKS_PER_DAY: usize = (MINUTES_PER_DAY / MIN_BLOCK_MINUTES) as usize;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_NOTES_LEN: usize = 4000;
pub const MAX_COLOR_LEN: usize = 32;
pub const MAX_LINKED_TASK_LEN: usize = 256;
pub const MAX_USER_NAME_LEN: usize = 256;
