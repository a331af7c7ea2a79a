use anyhow::Result;
use cms_core::{bail_cms, CmsError, DuplicateKey, Filter, Page, PageRequest, ID_FIELD};
use cms_store::{new_id, Repository};
use tracing::{debug, info, warn};

use crate::services::categories::{Category, CATEGORY_NAME_FIELD};
use crate::services::types::{active_tenant, filter_text};
use crate::utils::validator::trimmed;

use super::contacts_schema::{ContactQuery, CreateContact, PatchContact};
use super::contacts_shared::{dedup_ids, Contact, CATEGORY_IDS_FIELD, CONTACT_NAME_FIELD, PHONE_FIELD};

/// Contacts of the tenant bound to the current request.
#[derive(Clone)]
pub struct ContactsService {
    contacts: Repository<Contact>,
    categories: Repository<Category>,
}

impl ContactsService {
    pub fn new(contacts: Repository<Contact>, categories: Repository<Category>) -> Self {
        Self {
            contacts,
            categories,
        }
    }

    pub async fn list(&self, query: &ContactQuery, page: &PageRequest) -> Result<Page<Contact>> {
        let tenant = active_tenant();

        let filter = if let Some(name) = filter_text(&query.contact_name) {
            debug!(%tenant, contact_name = name, "searching contacts by name");
            Filter::new().contains_ignore_case(CONTACT_NAME_FIELD, name)
        } else if let Some(phone) = filter_text(&query.phone) {
            debug!(%tenant, phone, "searching contacts by phone");
            Filter::new().contains(PHONE_FIELD, phone)
        } else if let Some(category_name) = filter_text(&query.category_name) {
            debug!(%tenant, category_name, "searching contacts by category name");
            let ids: Vec<String> = self
                .categories
                .find_all(Filter::new().contains_ignore_case(CATEGORY_NAME_FIELD, category_name))
                .await?
                .into_iter()
                .map(|c| c.id)
                .collect();
            if ids.is_empty() {
                return Ok(Page::empty(page));
            }
            Filter::new().has_any(CATEGORY_IDS_FIELD, ids)
        } else {
            Filter::new()
        };

        let found = self.contacts.find_page(filter, page).await?;
        debug!(%tenant, total = found.total_elements, "contacts found");
        Ok(found)
    }

    pub async fn get(&self, id: &str) -> Result<Contact> {
        match self.contacts.find_by_id(id).await? {
            Some(contact) => Ok(contact),
            None => {
                warn!(tenant = %active_tenant(), id, "contact not found");
                bail_cms!(not_found, "Contact not found with id: {}", id)
            }
        }
    }

    pub async fn create(&self, input: CreateContact) -> Result<Contact> {
        let tenant = active_tenant();
        let phone = input.phone.trim().to_string();

        if self.phone_owner(&phone).await?.is_some() {
            warn!(%tenant, %phone, "contact already exists with phone");
            bail_cms!(conflict, "Contact with phone number {} already exists", phone);
        }
        let category_ids = dedup_ids(input.categoryIds);
        self.ensure_categories(&category_ids).await?;

        let contact = Contact {
            id: new_id(),
            contact_name: input.contactName.trim().to_string(),
            phone,
            email: trimmed(input.email),
            category_ids,
        };
        if let Err(err) = self.contacts.insert(&contact).await {
            return Err(phone_conflict(err, &contact.phone));
        }
        info!(%tenant, id = %contact.id, "created contact");
        Ok(contact)
    }

    pub async fn update(&self, id: &str, patch: PatchContact) -> Result<Contact> {
        let tenant = active_tenant();
        let mut contact = self.get(id).await?;

        if let Some(phone) = patch.phone.map(|p| p.trim().to_string()) {
            if phone != contact.phone {
                if let Some(owner) = self.phone_owner(&phone).await? {
                    if owner.id != contact.id {
                        warn!(%tenant, %phone, "phone number already in use");
                        bail_cms!(conflict, "Contact with phone number {} already exists", phone);
                    }
                }
            }
            contact.phone = phone;
        }
        if let Some(ids) = patch.categoryIds {
            let ids = dedup_ids(ids);
            self.ensure_categories(&ids).await?;
            contact.category_ids = ids;
        }
        if let Some(name) = patch.contactName {
            contact.contact_name = name.trim().to_string();
        }
        if patch.email.is_some() {
            contact.email = trimmed(patch.email);
        }

        self.store(&contact).await?;
        info!(%tenant, id, "updated contact");
        Ok(contact)
    }

    pub async fn delete(&self, id: &str) -> Result<Contact> {
        let contact = self.get(id).await?;
        self.contacts.delete_by_id(id).await?;
        info!(tenant = %active_tenant(), id, "deleted contact");
        Ok(contact)
    }

    /// Categories assigned to a contact, optionally narrowed by name.
    pub async fn categories(
        &self,
        contact_id: &str,
        category_name: Option<&str>,
        page: &PageRequest,
    ) -> Result<Page<Category>> {
        let contact = self.get(contact_id).await?;
        if contact.category_ids.is_empty() {
            debug!(tenant = %active_tenant(), contact_id, "contact has no categories");
            return Ok(Page::empty(page));
        }

        let mut filter = Filter::new().one_of(ID_FIELD, contact.category_ids);
        if let Some(name) = category_name.filter(|n| !n.trim().is_empty()) {
            filter = filter.contains_ignore_case(CATEGORY_NAME_FIELD, name);
        }
        self.categories.find_page(filter, page).await
    }

    pub async fn add_category(&self, contact_id: &str, category_id: &str) -> Result<Contact> {
        let tenant = active_tenant();
        let mut contact = self.get(contact_id).await?;

        if self.categories.find_by_id(category_id).await?.is_none() {
            warn!(%tenant, category_id, "category not found");
            bail_cms!(not_found, "Category not found");
        }
        if contact.has_category(category_id) {
            debug!(%tenant, contact_id, category_id, "category already assigned");
            bail_cms!(conflict, "Category already assigned to contact");
        }

        contact.category_ids.push(category_id.to_string());
        self.store(&contact).await?;
        info!(%tenant, contact_id, category_id, "added category to contact");
        Ok(contact)
    }

    pub async fn remove_category(&self, contact_id: &str, category_id: &str) -> Result<Contact> {
        let tenant = active_tenant();
        let mut contact = self.get(contact_id).await?;

        if !contact.has_category(category_id) {
            warn!(%tenant, contact_id, category_id, "category not associated with contact");
            bail_cms!(not_found, "Category not associated with this contact");
        }

        contact.category_ids.retain(|id| id != category_id);
        self.store(&contact).await?;
        info!(%tenant, contact_id, category_id, "removed category from contact");
        Ok(contact)
    }

    async fn phone_owner(&self, phone: &str) -> Result<Option<Contact>> {
        self.contacts.find_one(Filter::new().eq(PHONE_FIELD, phone)).await
    }

    async fn ensure_categories(&self, ids: &[String]) -> Result<()> {
        for id in ids {
            if self.categories.find_by_id(id).await?.is_none() {
                warn!(tenant = %active_tenant(), category_id = %id, "category not found");
                bail_cms!(not_found, "Category not found with id: {}", id);
            }
        }
        Ok(())
    }

    async fn store(&self, contact: &Contact) -> Result<()> {
        let saved = self
            .contacts
            .save(contact)
            .await
            .map_err(|err| phone_conflict(err, &contact.phone))?;
        if !saved {
            return Err(CmsError::not_found(format!("Contact not found with id: {}", contact.id)).into_anyhow());
        }
        Ok(())
    }
}

/// A unique index refusal on the phone becomes `Conflict`.
fn phone_conflict(err: anyhow::Error, phone: &str) -> anyhow::Error {
    if DuplicateKey::find(&err).is_none() {
        return err;
    }
    warn!(tenant = %active_tenant(), %phone, "contact already exists with phone");
    CmsError::conflict(format!("Contact with phone number {phone} already exists")).into_anyhow()
}
