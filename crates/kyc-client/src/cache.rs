//! # Client Cache
//!
//! Latest fetched [`ClientResponse`] per client id, shared by everything
//! that derives state from it (section status, form defaults).
//!
//! ## Invariants
//!
//! - Entries change only by whole-object replacement or by splicing in a
//!   full party object returned by the server. A failed mutation leaves
//!   the entry untouched.
//! - Cloning shares the underlying map. The `parking_lot` lock is never
//!   held across an `.await`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use kyc_core::{ClientId, ClientResponse, PartyResponse};

use crate::clients::ClientApi;
use crate::error::ApiClientError;

/// Shared cache of fetched clients.
#[derive(Debug, Clone, Default)]
pub struct ClientCache {
    clients: Arc<RwLock<HashMap<ClientId, ClientResponse>>>,
}

impl ClientCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ClientId) -> Option<ClientResponse> {
        self.clients.read().get(id).cloned()
    }

    /// Store a full client, replacing any previous entry.
    pub fn replace(&self, client: ClientResponse) -> Option<ClientResponse> {
        self.clients.write().insert(client.id.clone(), client)
    }

    /// Replace the party with `party.id` inside the cached client.
    ///
    /// Returns `false` when the client is not cached or has no such
    /// party; the cache is then unchanged.
    pub fn splice_party(&self, client_id: &ClientId, party: PartyResponse) -> bool {
        let mut clients = self.clients.write();
        let Some(client) = clients.get_mut(client_id) else {
            return false;
        };
        match client.parties.iter_mut().find(|p| p.id == party.id) {
            Some(slot) => {
                tracing::debug!(client_id = %client_id, party_id = %party.id, "spliced party into cache");
                *slot = party;
                true
            }
            None => false,
        }
    }

    pub fn invalidate(&self, id: &ClientId) -> Option<ClientResponse> {
        self.clients.write().remove(id)
    }

    /// Fetch the client and store it.
    ///
    /// On failure the previous entry, if any, is kept.
    pub async fn refresh(
        &self,
        api: &ClientApi,
        id: &ClientId,
    ) -> Result<ClientResponse, ApiClientError> {
        let client = api.get_client(id).await?;
        self.replace(client.clone());
        Ok(client)
    }

    /// The cached client, fetching it first when absent.
    pub async fn get_or_fetch(
        &self,
        api: &ClientApi,
        id: &ClientId,
    ) -> Result<ClientResponse, ApiClientError> {
        if let Some(client) = self.get(id) {
            return Ok(client);
        }
        self.refresh(api, id).await
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
