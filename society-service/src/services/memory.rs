use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::store::{SocietyStore, StoreError, UniqueField};
use crate::models::{Amenity, Society};

/// Process-local store with the same uniqueness rules as the MongoDB indexes.
#[derive(Default)]
pub struct InMemorySocietyStore {
    societies: RwLock<HashMap<String, Society>>,
    amenities: RwLock<Vec<Amenity>>,
}

impl InMemorySocietyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn conflict(
        societies: &HashMap<String, Society>,
        society: &Society,
    ) -> Option<UniqueField> {
        societies
            .values()
            .filter(|existing| existing.society_id != society.society_id)
            .find_map(|existing| {
                if existing.email == society.email {
                    Some(UniqueField::Email)
                } else if existing.admin_secret_key == society.admin_secret_key {
                    Some(UniqueField::SecretKey)
                } else {
                    None
                }
            })
    }
}

#[async_trait]
impl SocietyStore for InMemorySocietyStore {
    async fn insert_society(&self, society: &Society) -> Result<(), StoreError> {
        let mut societies = self.societies.write().await;
        if societies.contains_key(&society.society_id) {
            return Err(StoreError::Duplicate(UniqueField::SocietyId));
        }
        if let Some(field) = Self::conflict(&societies, society) {
            return Err(StoreError::Duplicate(field));
        }
        societies.insert(society.society_id.clone(), society.clone());
        Ok(())
    }

    async fn find_society(&self, society_id: &str) -> Result<Option<Society>, StoreError> {
        Ok(self.societies.read().await.get(society_id).cloned())
    }

    async fn find_society_by_email(&self, email: &str) -> Result<Option<Society>, StoreError> {
        Ok(self
            .societies
            .read()
            .await
            .values()
            .find(|s| s.email == email)
            .cloned())
    }

    async fn find_society_by_secret_key(
        &self,
        key: &str,
    ) -> Result<Option<Society>, StoreError> {
        Ok(self
            .societies
            .read()
            .await
            .values()
            .find(|s| s.admin_secret_key == key)
            .cloned())
    }

    async fn save_society(&self, society: &Society) -> Result<(), StoreError> {
        let mut societies = self.societies.write().await;
        if let Some(field) = Self::conflict(&societies, society) {
            return Err(StoreError::Duplicate(field));
        }
        societies.insert(society.society_id.clone(), society.clone());
        Ok(())
    }

    async fn insert_amenities(&self, amenities: &[Amenity]) -> Result<(), StoreError> {
        self.amenities.write().await.extend_from_slice(amenities);
        Ok(())
    }

    async fn amenities_for(&self, society_id: &str) -> Result<Vec<Amenity>, StoreError> {
        Ok(self
            .amenities
            .read()
            .await
            .iter()
            .filter(|a| a.society_id == society_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SocietyDetails;
    use crate::services::secret_key::SecretKey;
    use chrono::{Duration, Utc};

    fn society(email: &str, key: &str) -> Society {
        Society::new(
            SocietyDetails {
                society_name: "Oak Residency".to_string(),
                city: "Pune".to_string(),
                address: "12 MG Road".to_string(),
                email: email.to_string(),
                contact_number: "9999999999".to_string(),
            },
            SecretKey {
                value: key.to_string(),
                expires_at: Utc::now() + Duration::days(7),
            },
            vec![],
        )
    }

    #[tokio::test]
    async fn test_email_is_unique() {
        let store = InMemorySocietyStore::new();
        store.insert_society(&society("a@x.com", "k1")).await.unwrap();

        let err = store
            .insert_society(&society("a@x.com", "k2"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::Email)));
    }

    #[tokio::test]
    async fn test_secret_key_is_unique_on_save() {
        let store = InMemorySocietyStore::new();
        store.insert_society(&society("a@x.com", "k1")).await.unwrap();
        let mut other = society("b@x.com", "k2");
        store.insert_society(&other).await.unwrap();

        other.admin_secret_key = "k1".to_string();
        let err = store.save_society(&other).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(UniqueField::SecretKey)));
    }

    #[tokio::test]
    async fn test_lookup_by_unique_fields() {
        let store = InMemorySocietyStore::new();
        let s = society("a@x.com", "k1");
        store.insert_society(&s).await.unwrap();

        let by_id = store.find_society(&s.society_id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "a@x.com");
        assert!(store.find_society_by_email("a@x.com").await.unwrap().is_some());
        assert!(store.find_society_by_secret_key("k1").await.unwrap().is_some());
        assert!(store.find_society_by_secret_key("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_amenities_filtered_by_society() {
        let store = InMemorySocietyStore::new();
        store
            .insert_amenities(&[
                Amenity::new("s1".to_string(), "Pool".to_string(), None),
                Amenity::new("s2".to_string(), "Gym".to_string(), None),
                Amenity::new("s1".to_string(), "Garden".to_string(), None),
            ])
            .await
            .unwrap();

        let names: Vec<String> = store
            .amenities_for("s1")
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.amenity_name)
            .collect();
        assert_eq!(names, vec!["Pool", "Garden"]);
    }
}
