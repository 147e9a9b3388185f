//! Address slice.
//!
//! A plain CRUD slice over `/user/address/*`. Two views sit on top of it:
//!
//! - [`AddressBook`] (address management) keeps at most one default
//!   address: saving an address flagged default first demotes the current
//!   default
//! - [`AddressSelection`] (checkout) only selects, whatever the flags say

use crate::types::{Address, AddressDraft};
use storefront_core::crud::{CrudAction, CrudMessages, CrudReducer, EntityState};

/// Address slice state
pub type AddressState = EntityState<Address>;

/// Address slice actions
pub type AddressAction = CrudAction<Address, AddressDraft>;

/// Address slice reducer over gateway `G`
pub type AddressReducer<G> = CrudReducer<Address, G>;

/// Messages of the address slice
pub const ADDRESS_MESSAGES: CrudMessages = CrudMessages {
    listed: "Addresses loaded",
    fetched: "Address loaded",
    created: "Address created successfully",
    updated: "Address updated successfully",
    deleted: "Address deleted successfully",
    fallback: "Something went wrong with your address request",
};

/// Reducer of the address slice
#[must_use]
pub const fn address_reducer<G>() -> AddressReducer<G> {
    CrudReducer::new("address", ADDRESS_MESSAGES)
}

/// Address management view.
///
/// Computes the requests needed to keep a single default address. The
/// returned actions must be dispatched in order, each one settling before
/// the next is sent.
#[derive(Debug, Clone, Copy)]
pub struct AddressBook<'a> {
    state: &'a AddressState,
}

impl<'a> AddressBook<'a> {
    /// View over the loaded addresses
    #[must_use]
    pub const fn new(state: &'a AddressState) -> Self {
        Self { state }
    }

    /// The current default address
    #[must_use]
    pub fn default_address(&self) -> Option<&'a Address> {
        self.state.entities.iter().find(|a| a.is_default)
    }

    /// Requests saving `draft`, as a new address when `id` is `None`.
    pub fn save(&self, id: Option<String>, draft: AddressDraft) -> Vec<AddressAction> {
        let mut actions = Vec::with_capacity(2);
        if draft.is_default {
            actions.extend(self.demote_default_except(id.as_deref()));
        }
        actions.push(match id {
            Some(id) => AddressAction::Update { id, draft },
            None => AddressAction::Create { draft },
        });
        actions
    }

    /// Requests making the loaded address `id` the default one.
    ///
    /// Empty when the address is unknown or already the default.
    pub fn make_default(&self, id: &str) -> Vec<AddressAction> {
        match self.state.entities.iter().find(|a| a.id == id) {
            Some(address) if !address.is_default => {
                self.save(Some(address.id.clone()), address.to_draft().with_default(true))
            },
            _ => Vec::new(),
        }
    }

    fn demote_default_except(&self, keep: Option<&str>) -> Option<AddressAction> {
        let current = self.default_address()?;
        if keep == Some(current.id.as_str()) {
            return None;
        }
        Some(AddressAction::Update {
            id: current.id.clone(),
            draft: current.to_draft().with_default(false),
        })
    }
}

/// Checkout address selection view.
#[derive(Debug, Clone, Copy)]
pub struct AddressSelection<'a> {
    state: &'a AddressState,
}

impl<'a> AddressSelection<'a> {
    /// View over the loaded addresses
    #[must_use]
    pub const fn new(state: &'a AddressState) -> Self {
        Self { state }
    }

    /// Address used for checkout: the selected one, else the default, else the first.
    #[must_use]
    pub fn current(&self) -> Option<&'a Address> {
        self.state
            .selected
            .as_ref()
            .or_else(|| self.state.entities.iter().find(|a| a.is_default))
            .or_else(|| self.state.entities.first())
    }

    /// Selects a loaded address. Default flags are left untouched.
    #[must_use]
    pub fn choose(&self, id: &str) -> Option<AddressAction> {
        self.state.find(&id.to_string()).map(|address| AddressAction::Select {
            id: Some(address.id.clone()),
        })
    }
}
