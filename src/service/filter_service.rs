//! Filter actions: create, delete, modify, and reload saved filters.

use std::sync::Arc;

use crate::client::ResourceClient;
use crate::domain::{DomainStore, Filter, FilterDraft, FilterPk, Transition};
use crate::error::ActionError;

/// Two-phase filter operations.
///
/// Every method follows the pattern: remote call → on success, one store
/// transition → return the result. A rejected remote call propagates
/// unchanged and leaves the store untouched.
#[derive(Debug)]
pub struct FilterService<C> {
    client: Arc<C>,
    store: Arc<DomainStore>,
}

impl<C> Clone for FilterService<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            store: Arc::clone(&self.store),
        }
    }
}

impl<C: ResourceClient> FilterService<C> {
    /// Creates a new `FilterService`.
    #[must_use]
    pub fn new(client: Arc<C>, store: Arc<DomainStore>) -> Self {
        Self { client, store }
    }

    /// Persists a draft and inserts the finalized filter.
    ///
    /// The stored filter is the draft's criteria with the `pk` and `name`
    /// assigned by the server.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects the draft.
    pub async fn create_filter(&self, draft: FilterDraft) -> Result<Filter, ActionError> {
        let created = self
            .client
            .create_filter(&draft)
            .await
            .inspect_err(|err| tracing::warn!(name = %draft.name, %err, "create filter failed"))?;

        let filter = draft.into_filter(created.pk, created.name);
        self.store
            .apply(Transition::CreateFilter(filter.clone()))
            .await;

        tracing::info!(pk = %filter.pk, name = %filter.name, "filter created");
        Ok(filter)
    }

    /// Deletes a filter remotely, then locally.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects the delete.
    pub async fn delete_filter(&self, pk: FilterPk) -> Result<(), ActionError> {
        self.client
            .delete_filter(pk)
            .await
            .inspect_err(|err| tracing::warn!(%pk, %err, "delete filter failed"))?;

        self.store.apply(Transition::DeleteFilter(pk)).await;
        tracing::info!(%pk, "filter deleted");
        Ok(())
    }

    /// Persists the full filter and stores exactly the object passed in.
    ///
    /// The server's echo is ignored, so callers must pass an already
    /// normalized filter.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the backend rejects the update.
    pub async fn modify_filter(&self, filter: Filter) -> Result<Filter, ActionError> {
        self.client
            .update_filter(&filter)
            .await
            .inspect_err(|err| tracing::warn!(pk = %filter.pk, %err, "modify filter failed"))?;

        self.store
            .apply(Transition::UpdateFilter(filter.clone()))
            .await;
        tracing::info!(pk = %filter.pk, "filter modified");
        Ok(filter)
    }

    /// Fetches every filter and replaces the filter slice wholesale.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError::Client`] if the listing fails.
    pub async fn load_all_filters(&self) -> Result<Vec<Filter>, ActionError> {
        let filters = self
            .client
            .list_filters()
            .await
            .inspect_err(|err| tracing::warn!(%err, "load filters failed"))?;

        self.store
            .apply(Transition::ReplaceFilters(filters.clone()))
            .await;
        tracing::info!(count = filters.len(), "filters loaded");
        Ok(filters)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use crate::client::scripted::ScriptedClient;
    use crate::domain::{EventBus, FilterCriteria, Tag};

    fn make_service(client: ScriptedClient) -> (FilterService<ScriptedClient>, Arc<DomainStore>) {
        let store = Arc::new(DomainStore::new(EventBus::new(64)));
        let service = FilterService::new(Arc::new(client), Arc::clone(&store));
        (service, store)
    }

    fn criteria() -> FilterCriteria {
        FilterCriteria {
            open: Some(true),
            acked: Some(false),
            source_system_ids: vec![3],
            tags: vec![Tag::new("host", "db1")],
        }
    }

    fn filter(pk: i64, name: &str) -> Filter {
        Filter {
            pk: FilterPk::new(pk),
            name: name.to_string(),
            criteria: FilterCriteria::default(),
        }
    }

    #[tokio::test]
    async fn create_filter_stores_draft_with_assigned_identity() {
        let (service, store) = make_service(ScriptedClient::new());
        let draft = FilterDraft::new("  my open db incidents ", criteria());

        let Ok(created) = service.create_filter(draft.clone()).await else {
            panic!("create should succeed");
        };
        assert_eq!(created.name, "my open db incidents");
        assert_eq!(created.criteria, draft.criteria);

        let stored = store.filters().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.first(), Some(&created));
    }

    #[tokio::test]
    async fn rejected_create_leaves_store_untouched() {
        let client = ScriptedClient::new();
        client.fail_filter_calls();
        let (service, store) = make_service(client);

        let result = service
            .create_filter(FilterDraft::new("x", criteria()))
            .await;
        assert!(matches!(result, Err(ActionError::Client(_))));
        assert!(store.filters().await.is_empty());
    }

    #[tokio::test]
    async fn delete_filter_removes_it() {
        let client = ScriptedClient::new().with_filters(vec![filter(1, "a"), filter(2, "b")]);
        let (service, store) = make_service(client);
        tokio_test::assert_ok!(service.load_all_filters().await);

        tokio_test::assert_ok!(service.delete_filter(FilterPk::new(1)).await);
        assert!(store.filter(FilterPk::new(1)).await.is_none());
        assert!(store.filter(FilterPk::new(2)).await.is_some());
    }

    #[tokio::test]
    async fn modify_filter_stores_passed_object_not_echo() {
        let (service, store) = make_service(ScriptedClient::new());
        let edited = Filter {
            criteria: criteria(),
            ..filter(4, "edited")
        };

        let Ok(returned) = service.modify_filter(edited.clone()).await else {
            panic!("modify should succeed");
        };
        assert_eq!(returned, edited);
        assert_eq!(store.filter(FilterPk::new(4)).await, Some(edited));
    }

    #[tokio::test]
    async fn rejected_modify_keeps_previous_version() {
        let client = ScriptedClient::new().with_filters(vec![filter(1, "before")]);
        let (service, store) = make_service(client);
        tokio_test::assert_ok!(service.load_all_filters().await);
        service.client.fail_filter_calls();

        tokio_test::assert_err!(service.modify_filter(filter(1, "after")).await);
        assert_eq!(store.filter(FilterPk::new(1)).await, Some(filter(1, "before")));
    }

    #[tokio::test]
    async fn load_all_replaces_wholesale() {
        let client = ScriptedClient::new().with_filters(vec![filter(7, "server")]);
        let (service, store) = make_service(client);
        store
            .apply(Transition::CreateFilter(filter(1, "stale")))
            .await;

        let Ok(loaded) = service.load_all_filters().await else {
            panic!("load should succeed");
        };
        assert_eq!(loaded.len(), 1);
        assert_eq!(store.filters().await, vec![filter(7, "server")]);
    }
}
