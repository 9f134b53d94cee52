pub mod config;
pub mod deserialize;
pub mod document;
pub mod editor;
pub mod error;
pub mod markup;
pub mod serialize;
pub mod session;

pub use config::EditorConfig;
pub use deserialize::{deserialize, deserialize_markup};
pub use document::{ListKind, Mark, Marks, Node, Path, Point, Range, TextLeaf};
pub use editor::{BlockFormat, ClipboardData, DocumentEditor};
pub use error::{EditorError, Result};
pub use markup::MarkupError;
pub use serialize::{serialize, serialize_document};
pub use session::EditorSession;
