mod controller;
mod messages;
mod persistence;
mod policy;
mod rendering;

pub use controller::{PageContent, PageController};
pub use messages::FormMessageStore;
pub use persistence::RecordStore;
pub use policy::RecordPolicy;
pub use rendering::TemplateRenderer;
