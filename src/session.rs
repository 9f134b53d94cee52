use log::{debug, warn};

use crate::config::EditorConfig;
use crate::deserialize::deserialize_markup;
use crate::editor::DocumentEditor;

type ChangeCallback = Box<dyn FnMut(&str)>;

/// Host-facing wrapper around a [`DocumentEditor`].
///
/// The host hands over markup and a change callback. The first document is
/// held back until [`mount`](Self::mount) signals that the editing surface is
/// ready; until then every edit is refused. Later external content replaces
/// the document wholesale, and the newest string wins. After each edit that
/// changes the document the callback receives the serialized markup.
pub struct EditorSession {
    editor: DocumentEditor,
    pending: Option<String>,
    ready: bool,
    synced_version: u64,
    on_change: ChangeCallback,
}

impl EditorSession {
    pub fn new(markup: impl Into<String>, on_change: impl FnMut(&str) + 'static) -> Self {
        Self::with_config(markup, EditorConfig::default(), on_change)
    }

    pub fn with_config(
        markup: impl Into<String>,
        config: EditorConfig,
        on_change: impl FnMut(&str) + 'static,
    ) -> Self {
        let editor = DocumentEditor::with_config(Vec::new(), config);
        let synced_version = editor.version();
        Self {
            editor,
            pending: Some(markup.into()),
            ready: false,
            synced_version,
            on_change: Box::new(on_change),
        }
    }

    /// Marks the editing surface as ready and loads the pending content.
    pub fn mount(&mut self) {
        self.ready = true;
        if let Some(markup) = self.pending.take() {
            self.hydrate(&markup);
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Replaces the document with externally supplied markup. Before the
    /// session is mounted only the latest string is kept.
    pub fn set_external_content(&mut self, markup: impl Into<String>) {
        let markup = markup.into();
        if !self.ready {
            self.pending = Some(markup);
            return;
        }
        self.hydrate(&markup);
    }

    fn hydrate(&mut self, markup: &str) {
        let nodes = deserialize_markup(markup).unwrap_or_else(|err| {
            warn!("external content could not be parsed, starting empty: {err}");
            Vec::new()
        });
        self.editor.replace_document_silently(nodes);
        self.synced_version = self.editor.version();
        debug!("hydrated editor with {} top-level nodes", self.editor.children().len());
    }

    pub fn editor(&self) -> &DocumentEditor {
        &self.editor
    }

    pub fn markup(&self) -> String {
        self.editor.markup()
    }

    /// Runs `edit` against the editor and reports the new markup if the
    /// document changed. Returns `None` while the session is not mounted.
    pub fn edit<R>(&mut self, edit: impl FnOnce(&mut DocumentEditor) -> R) -> Option<R> {
        if !self.ready {
            warn!("ignoring edit before the editor is mounted");
            return None;
        }
        let result = edit(&mut self.editor);
        if self.editor.version() != self.synced_version {
            self.synced_version = self.editor.version();
            let markup = self.editor.markup();
            (self.on_change)(&markup);
        }
        Some(result)
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
