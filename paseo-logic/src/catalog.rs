use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    location::Coordinate,
    place::{Place, PlaceDraft, qr_image_url},
    store::KeyValueStore,
};

const PLACES_KEY: &str = "places";

/// Prefix for generated unlock codes, the rest is random hex
const QR_TOKEN_PREFIX: &str = "PASEO360";

/// The full list of places the app knows about, persisted as one document
/// and editable through the admin flow.
pub struct PlaceCatalog<K: KeyValueStore> {
    store: K,
    places: RwLock<Vec<Place>>,
}

impl<K: KeyValueStore> PlaceCatalog<K> {
    /// Load the catalog from `store`. A store that has never held places is
    /// seeded with the built-in ones (and the seed is persisted). Stored
    /// data that fails to parse also falls back to the built-in places, but
    /// the stored value is left alone in that case.
    pub fn load(store: K) -> Self {
        let places = match store.get(PLACES_KEY) {
            Some(raw) => {
                serde_json::from_str::<Vec<Place>>(&raw).unwrap_or_else(|_| default_places())
            }
            None => {
                let seeded = default_places();
                persist(&store, &seeded);
                seeded
            }
        };

        Self {
            store,
            places: RwLock::new(places),
        }
    }

    /// Every place in the catalog, in stored order
    pub async fn list(&self) -> Vec<Place> {
        self.places.read().await.clone()
    }

    pub async fn get(&self, id: &str) -> Option<Place> {
        self.places.read().await.iter().find(|p| p.id == id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.places.read().await.len()
    }

    /// Create a new place from `draft`, generating its id, unlock code, and
    /// QR image. The catalog is persisted before the place is returned.
    pub async fn add(&self, draft: PlaceDraft) -> Place {
        let qr_token = format!("{QR_TOKEN_PREFIX}_{}", Uuid::new_v4().simple());

        let place = Place {
            id: Uuid::new_v4().to_string(),
            name: draft.name,
            description: draft.description,
            coordinate: draft.coordinate,
            qr_image_url: qr_image_url(&qr_token),
            qr_token,
            content_url: draft.content_url,
        };

        let mut places = self.places.write().await;
        places.push(place.clone());
        persist(&self.store, &places);

        place
    }

    /// Rewrite the operator-editable fields of the place with `id`, keeping
    /// its unlock code stable so already-printed QR codes stay valid.
    /// Returns the updated place, [None] if the id is unknown.
    pub async fn update(&self, id: &str, draft: PlaceDraft) -> Option<Place> {
        let mut places = self.places.write().await;
        let place = places.iter_mut().find(|p| p.id == id)?;

        place.name = draft.name;
        place.description = draft.description;
        place.coordinate = draft.coordinate;
        place.content_url = draft.content_url;
        place.qr_image_url = qr_image_url(&place.qr_token);
        let updated = place.clone();

        persist(&self.store, &places);

        Some(updated)
    }

    /// Remove the place with `id`, unknown ids do nothing.
    /// Returns whether anything was removed.
    pub async fn delete(&self, id: &str) -> bool {
        let mut places = self.places.write().await;
        let before = places.len();
        places.retain(|p| p.id != id);

        let removed = places.len() != before;
        if removed {
            persist(&self.store, &places);
        }

        removed
    }
}

fn persist<K: KeyValueStore>(store: &K, places: &[Place]) {
    let serialized = serde_json::to_string(places).expect("Failed to serialize places");
    store.set(PLACES_KEY, serialized);
}

fn seed_place(
    id: &str,
    name: &str,
    description: &str,
    coordinate: Coordinate,
    content_url: &str,
) -> Place {
    let qr_token = format!("{QR_TOKEN_PREFIX}_{}", id.to_uppercase().replace('-', "_"));

    Place {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        coordinate,
        qr_image_url: qr_image_url(&qr_token),
        qr_token,
        content_url: content_url.to_string(),
    }
}

/// The points of interest a fresh install starts with
fn default_places() -> Vec<Place> {
    vec![
        seed_place(
            "museo-aeronautico",
            "Museo Aeronáutico de Maracay",
            "A museum dedicated to the history of Venezuelan aviation, with restored aircraft on open-air display.",
            Coordinate { lat: 10.237, long: -67.61 },
            "https://picsum.photos/seed/aeronautico/1920/1080",
        ),
        seed_place(
            "parque-henri-pittier",
            "Parque Nacional Henri Pittier",
            "The oldest national park in the country, cloud forest trails running from the mountains down to the coast.",
            Coordinate { lat: 10.4, long: -67.68 },
            "https://picsum.photos/seed/pittier/1920/1080",
        ),
        seed_place(
            "colonia-tovar",
            "Colonia Tovar",
            "A mountain town founded by German settlers, known for its architecture, strawberries, and cold weather.",
            Coordinate { lat: 10.408, long: -67.291 },
            "https://picsum.photos/seed/tovar/1920/1080",
        ),
        seed_place(
            "choroni",
            "Choroní y Puerto Colombia",
            "Colonial coastal towns across the park, with a malecón famous for drum music at sunset.",
            Coordinate { lat: 10.505, long: -67.604 },
            "https://picsum.photos/seed/choroni/1920/1080",
        ),
        seed_place(
            "bahia-cata",
            "Bahía de Cata",
            "A wide bay with calm water and palm groves, reachable by boat or the mountain road.",
            Coordinate { lat: 10.51, long: -67.738 },
            "https://picsum.photos/seed/cata/1920/1080",
        ),
    ]
}
