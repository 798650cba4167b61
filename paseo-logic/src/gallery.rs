use crate::{catalog::PlaceCatalog, ledger::UnlockLedger, place::Place, store::KeyValueStore};

/// Look up the place whose content the user wants to view. Only places
/// that exist in the catalog and have been unlocked are viewable, unknown
/// or still-locked ids yield [None].
pub async fn viewable_place<K: KeyValueStore>(
    catalog: &PlaceCatalog<K>,
    ledger: &UnlockLedger<K>,
    place_id: &str,
) -> Option<Place> {
    let place = catalog.get(place_id).await?;
    ledger.is_unlocked(&place.id).await.then_some(place)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::MemoryStore;
    use tokio::test;

    fn setup() -> (PlaceCatalog<MemoryStore>, UnlockLedger<MemoryStore>) {
        let store = MemoryStore::default();
        (PlaceCatalog::load(store.clone()), UnlockLedger::load(store))
    }

    #[test]
    async fn test_unknown_place_is_not_viewable() {
        let (catalog, ledger) = setup();

        assert!(viewable_place(&catalog, &ledger, "nope").await.is_none());

        // Even an unlock entry doesn't make a missing place viewable
        ledger.unlock("nope").await;
        assert!(viewable_place(&catalog, &ledger, "nope").await.is_none());
    }

    #[test]
    async fn test_locked_place_is_not_viewable() {
        let (catalog, ledger) = setup();

        assert!(catalog.get("museo-aeronautico").await.is_some());
        assert!(
            viewable_place(&catalog, &ledger, "museo-aeronautico")
                .await
                .is_none()
        );
    }

    #[test]
    async fn test_unlocked_place_is_viewable() {
        let (catalog, ledger) = setup();
        ledger.unlock("museo-aeronautico").await;

        let place = viewable_place(&catalog, &ledger, "museo-aeronautico").await;
        assert_eq!(
            place.expect("Place was not viewable").id,
            "museo-aeronautico"
        );
    }
}
