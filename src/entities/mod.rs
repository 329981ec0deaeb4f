pub mod pending_note;
pub mod task;

pub use pending_note::Entity as PendingNote;
pub use task::Entity as Task;
