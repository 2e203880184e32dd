pub mod contact;
pub mod message;
pub mod node;

pub use contact::{Contact, ContactDetector, ContactSet};
pub use message::{Message, MessageId};
pub use node::{Node, NodeId, Role};
