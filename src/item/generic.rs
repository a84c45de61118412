//! Generic password items, keyed by service and account.

use serde::{Deserialize, Serialize};

use crate::attributes::{AttrKey, Attributes, ItemClass};
use crate::error::{KeychainError, KeychainResult};

use super::{ItemCommon, PasswordItem, SecretData};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericPassword {
    /// Service name; empty means unspecified
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub common: ItemCommon,
}

impl GenericPassword {
    /// Concrete item ready to be added
    pub fn new(
        service: impl Into<String>,
        account: impl Into<String>,
        secret: impl Into<SecretData>,
    ) -> Self {
        let mut common = ItemCommon::with_account(account);
        common.secret = Some(secret.into());
        Self {
            service: service.into(),
            common,
        }
    }

    /// Secret-less item for narrowing a search, delete, or update.
    /// Empty strings leave the attribute unspecified.
    pub fn matching(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            common: ItemCommon::with_account(account),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.common.label = Some(label.into());
        self
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.common.comment = Some(comment.into());
        self
    }

    pub fn synchronizable(mut self, synchronizable: bool) -> Self {
        self.common.synchronizable = synchronizable;
        self
    }
}

impl PasswordItem for GenericPassword {
    const CLASS: ItemClass = ItemClass::Generic;

    fn common(&self) -> &ItemCommon {
        &self.common
    }

    fn common_mut(&mut self) -> &mut ItemCommon {
        &mut self.common
    }

    fn write_identity(&self, attrs: &mut Attributes) {
        attrs.insert_text(AttrKey::Service, &self.service);
    }

    fn has_natural_key(&self) -> bool {
        !self.service.is_empty() && !self.common.account.is_empty()
    }

    fn from_identity(attrs: &Attributes, common: ItemCommon) -> KeychainResult<Self> {
        let service = attrs
            .text(AttrKey::Service)?
            .filter(|s| !s.is_empty())
            .ok_or_else(|| KeychainError::invalid("generic password record has no service"))?;
        if common.account.is_empty() {
            return Err(KeychainError::invalid("generic password record has no account"));
        }

        Ok(Self {
            service: service.to_string(),
            common,
        })
    }
}
