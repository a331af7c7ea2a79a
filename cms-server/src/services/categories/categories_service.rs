use anyhow::Result;
use cms_core::{bail_cms, CmsError, DuplicateKey, Filter, Page, PageRequest};
use cms_store::{new_id, Repository};
use tracing::{debug, info, warn};

use crate::services::contacts::contacts_shared::{CATEGORY_IDS_FIELD, CONTACT_NAME_FIELD, PHONE_FIELD};
use crate::services::contacts::Contact;
use crate::services::types::{active_tenant, filter_text};
use crate::utils::validator::trimmed;

use super::categories_schema::{CategoryContactsQuery, CreateCategory, PatchCategory};
use super::categories_shared::{Category, CATEGORY_NAME_FIELD};

#[derive(Clone)]
pub struct CategoriesService {
    categories: Repository<Category>,
    contacts: Repository<Contact>,
}

impl CategoriesService {
    pub fn new(categories: Repository<Category>, contacts: Repository<Contact>) -> Self {
        Self {
            categories,
            contacts,
        }
    }

    pub async fn list(&self, category_name: Option<&str>, page: &PageRequest) -> Result<Page<Category>> {
        let filter = match category_name.filter(|n| !n.is_empty()) {
            Some(name) => {
                debug!(tenant = %active_tenant(), category_name = name, "searching categories by name");
                Filter::new().contains_ignore_case(CATEGORY_NAME_FIELD, name)
            }
            None => Filter::new(),
        };
        self.categories.find_page(filter, page).await
    }

    pub async fn get(&self, id: &str) -> Result<Category> {
        match self.categories.find_by_id(id).await? {
            Some(category) => Ok(category),
            None => {
                warn!(tenant = %active_tenant(), id, "category not found");
                bail_cms!(not_found, "Category not found with id: {}", id)
            }
        }
    }

    pub async fn create(&self, input: CreateCategory) -> Result<Category> {
        let tenant = active_tenant();
        let name = input.categoryName.trim().to_string();

        if self.name_owner(&name).await?.is_some() {
            warn!(%tenant, category_name = %name, "category name already exists");
            bail_cms!(conflict, "Category with name: {} already exists", name);
        }

        let category = Category {
            id: new_id(),
            category_name: name,
            description: trimmed(input.description),
        };
        if let Err(err) = self.categories.insert(&category).await {
            return Err(name_conflict(err, &category.category_name));
        }
        info!(%tenant, id = %category.id, "created category");
        Ok(category)
    }

    pub async fn update(&self, id: &str, patch: PatchCategory) -> Result<Category> {
        let tenant = active_tenant();
        let mut category = self.get(id).await?;

        if let Some(name) = patch.categoryName.map(|n| n.trim().to_string()) {
            if !name.eq_ignore_ascii_case(&category.category_name) {
                if let Some(owner) = self.name_owner(&name).await? {
                    if owner.id != category.id {
                        warn!(%tenant, category_name = %name, "category name already exists");
                        bail_cms!(conflict, "Category with name: {} already exists", name);
                    }
                }
            }
            category.category_name = name;
        }
        if patch.description.is_some() {
            category.description = trimmed(patch.description);
        }

        let saved = self
            .categories
            .save(&category)
            .await
            .map_err(|err| name_conflict(err, &category.category_name))?;
        if !saved {
            bail_cms!(not_found, "Category not found with id: {}", id);
        }
        info!(%tenant, id, "updated category");
        Ok(category)
    }

    /// Delete a category and unlink it from every contact that carries it.
    pub async fn delete(&self, id: &str) -> Result<Category> {
        let tenant = active_tenant();
        let category = self.get(id).await?;

        let linked = self
            .contacts
            .find_all(Filter::new().has_any(CATEGORY_IDS_FIELD, [id]))
            .await?;
        for mut contact in linked {
            contact.category_ids.retain(|c| c != id);
            self.contacts.save(&contact).await?;
        }

        self.categories.delete_by_id(id).await?;
        info!(%tenant, id, "deleted category");
        Ok(category)
    }

    /// Contacts filed under a category.
    pub async fn contacts(
        &self,
        category_id: &str,
        query: &CategoryContactsQuery,
        page: &PageRequest,
    ) -> Result<Page<Contact>> {
        self.get(category_id).await?;

        let mut filter = Filter::new().has_any(CATEGORY_IDS_FIELD, [category_id]);
        if let Some(name) = filter_text(&query.contact_name) {
            filter = filter.contains_ignore_case(CONTACT_NAME_FIELD, name);
        } else if let Some(phone) = filter_text(&query.phone) {
            filter = filter.contains(PHONE_FIELD, phone);
        }

        let found = self.contacts.find_page(filter, page).await?;
        debug!(tenant = %active_tenant(), category_id, total = found.total_elements, "contacts in category");
        Ok(found)
    }

    /// Category whose name equals `name`, ignoring case.
    async fn name_owner(&self, name: &str) -> Result<Option<Category>> {
        let candidates = self
            .categories
            .find_all(Filter::new().contains_ignore_case(CATEGORY_NAME_FIELD, name))
            .await?;
        Ok(candidates
            .into_iter()
            .find(|c| c.category_name.to_lowercase() == name.to_lowercase()))
    }
}

fn name_conflict(err: anyhow::Error, name: &str) -> anyhow::Error {
    if DuplicateKey::find(&err).is_none() {
        return err;
    }
    warn!(tenant = %active_tenant(), category_name = %name, "category name already exists");
    CmsError::conflict(format!("Category with name: {name} already exists")).into_anyhow()
}
