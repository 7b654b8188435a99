pub mod inbox;
pub mod read_state;
pub mod unread;

pub use inbox::NotificationInbox;
pub use read_state::{MarkOutcome, ReadStateReconciler};
pub use unread::{PollHandle, UnreadCountTracker, UnreadCountView};
