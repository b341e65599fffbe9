//! Session history entries.
//!
//! [§ 7.4.1.1 Session history entries](https://html.spec.whatwg.org/multipage/browsing-the-web.html#session-history-entries)
//!
//! "A session history entry is a struct with the following items: step,
//! URL, document state, classic history API state, navigation API state,
//! navigation API key, navigation API ID, scroll restoration mode, scroll
//! position data, persisted user state."
//!
//! Entries are owned by their navigable's history list; documents only keep
//! the entry's id as their "latest entry". Both history API states are
//! stored serialized (JSON), the way the structured-serialize steps keep
//! them out of any realm.

use koala_dom::{DocumentId, HistoryEntryId, NavigableId};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};
use url::Url;

/// [§ 7.2.6.1 NavigationType](https://html.spec.whatwg.org/multipage/nav-history-apis.html#navigationtype)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NavigationType {
    /// A new entry was appended after the current one.
    Push,
    /// The current entry was replaced.
    Replace,
    /// The current entry was reloaded.
    Reload,
    /// The session history was traversed to an existing entry.
    Traverse,
}

/// [§ 7.4.1.2 Document state](https://html.spec.whatwg.org/multipage/browsing-the-web.html#document-state-2)
///
/// "Document state holds state inside a session history entry regarding how
/// to present and, if necessary, recreate a Document."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    /// "document, a Document or null, initially null"
    pub document: Option<DocumentId>,
    /// "ever populated, a boolean, initially false"
    pub ever_populated: bool,
    /// "reload pending, a boolean, initially false"
    pub reload_pending: bool,
}

/// A session history entry.
#[derive(Debug, Clone)]
pub struct SessionHistoryEntry {
    id: HistoryEntryId,
    navigable: NavigableId,
    url: Url,

    /// "document state"
    pub document_state: DocumentState,

    /// "classic history API state, which is serialized state, initially
    /// StructuredSerializeForStorage(null)"
    classic_history_api_state: String,

    /// "navigation API state, which is a serialized state, initially
    /// StructuredSerializeForStorage(undefined)"
    navigation_api_state: String,

    /// "navigation API key, which is a string, initially set to the result of
    /// generating a random UUID"
    navigation_api_key: String,
}

impl SessionHistoryEntry {
    /// Create an entry for `url`, owned by `navigable`.
    #[must_use]
    pub fn new(id: HistoryEntryId, navigable: NavigableId, url: Url) -> Self {
        Self {
            id,
            navigable,
            url,
            document_state: DocumentState::default(),
            classic_history_api_state: Value::Null.to_string(),
            navigation_api_state: Value::Null.to_string(),
            navigation_api_key: format!("{}-{}", navigable.0, id.0),
        }
    }

    /// This entry's id.
    #[must_use]
    pub const fn id(&self) -> HistoryEntryId {
        self.id
    }

    /// The navigable whose history list owns this entry.
    #[must_use]
    pub const fn navigable(&self) -> NavigableId {
        self.navigable
    }

    /// "URL, a URL"
    #[must_use]
    pub const fn url(&self) -> &Url {
        &self.url
    }

    /// Replace the entry's URL.
    pub fn set_url(&mut self, url: Url) {
        self.url = url;
    }

    /// The navigation API key.
    #[must_use]
    pub fn navigation_api_key(&self) -> &str {
        &self.navigation_api_key
    }

    /// Serialize `state` into the classic history API state.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if `state` cannot be represented.
    pub fn set_classic_history_api_state<T: Serialize>(
        &mut self,
        state: &T,
    ) -> Result<(), serde_json::Error> {
        self.classic_history_api_state = serde_json::to_string(state)?;
        Ok(())
    }

    /// Deserialize the classic history API state.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the stored state is not a `T`.
    pub fn classic_history_api_state<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.classic_history_api_state)
    }

    /// Serialize `state` into the navigation API state.
    ///
    /// # Errors
    ///
    /// Returns the serializer's error if `state` cannot be represented.
    pub fn set_navigation_api_state<T: Serialize>(
        &mut self,
        state: &T,
    ) -> Result<(), serde_json::Error> {
        self.navigation_api_state = serde_json::to_string(state)?;
        Ok(())
    }

    /// Deserialize the navigation API state.
    ///
    /// # Errors
    ///
    /// Returns the deserializer's error if the stored state is not a `T`.
    pub fn navigation_api_state<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.navigation_api_state)
    }
}
