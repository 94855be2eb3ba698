//! Account permission bits and their resolution against the chain-wide defaults.

use crate::consts::GLOBAL_PERMISSIONS_ADDRESS;
use crate::error::{ErrorCode, Exception};
use crate::storage::Reader;
use crate::types::Address;

use bitflags::bitflags;

bitflags! {
    /// Permission flags. Chain permissions come first, then the moderator permissions that
    /// guard changes to them.
    #[derive(Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct PermFlag: u64 {
        /// Reserved super-user permission.
        const ROOT = 1 << 0;
        /// Transfer value between accounts.
        const SEND = 1 << 1;
        /// Call the code of an existing account.
        const CALL = 1 << 2;
        /// Create contracts, from a transaction or from `CREATE`/`CREATE2`.
        const CREATE_CONTRACT = 1 << 3;
        /// Create plain accounts by funding unknown addresses.
        const CREATE_ACCOUNT = 1 << 4;
        /// Change the validator set.
        const BOND = 1 << 5;
        /// Use the name registry.
        const NAME = 1 << 6;
        /// Query base permissions.
        const HAS_BASE = 1 << 7;
        /// Set base permissions.
        const SET_BASE = 1 << 8;
        /// Unset base permissions.
        const UNSET_BASE = 1 << 9;
        /// Set the global permissions.
        const SET_GLOBAL = 1 << 10;
        /// Query roles.
        const HAS_ROLE = 1 << 11;
        /// Grant roles.
        const ADD_ROLE = 1 << 12;
        /// Revoke roles.
        const REMOVE_ROLE = 1 << 13;
    }
}

/// Permissions granted to accounts that don't override them.
pub const DEFAULT_PERM_FLAGS: PermFlag = PermFlag::SEND
    .union(PermFlag::CALL)
    .union(PermFlag::CREATE_CONTRACT)
    .union(PermFlag::CREATE_ACCOUNT)
    .union(PermFlag::BOND)
    .union(PermFlag::NAME)
    .union(PermFlag::HAS_BASE)
    .union(PermFlag::HAS_ROLE);

/// Permission values along with the mask of which values are set.
///
/// An unset permission falls through to the global permissions when composed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BasePermissions {
    perms: PermFlag,
    set_bit: PermFlag,
}

impl BasePermissions {
    /// Permissions with `perms` as values and `set_bit` as the set mask.
    pub const fn new(perms: PermFlag, set_bit: PermFlag) -> Self {
        Self {
            perms: perms.intersection(set_bit),
            set_bit,
        }
    }

    /// Every flag set, with `perms` granted.
    pub const fn with_all_set(perms: PermFlag) -> Self {
        Self::new(perms, PermFlag::all())
    }

    /// Granted values.
    pub const fn perms(&self) -> PermFlag {
        self.perms
    }

    /// Set mask.
    pub const fn set_bit(&self) -> PermFlag {
        self.set_bit
    }

    /// Value of `flag` if every bit of it is set. Empty flags are never set.
    pub fn get(&self, flag: PermFlag) -> Option<bool> {
        self.is_set(flag).then(|| self.perms.contains(flag))
    }

    /// Set `flag` to `value`.
    pub fn set(&mut self, flag: PermFlag, value: bool) {
        self.set_bit.insert(flag);
        self.perms.set(flag, value);
    }

    /// Clear `flag` so that it falls through.
    pub fn unset(&mut self, flag: PermFlag) {
        self.set_bit.remove(flag);
        self.perms.remove(flag);
    }

    /// `true` if every bit of `flag` is set.
    pub fn is_set(&self, flag: PermFlag) -> bool {
        !flag.is_empty() && self.set_bit.contains(flag)
    }

    /// Values of `self` where set, else the values of `fallthrough`.
    pub fn compose(&self, fallthrough: &BasePermissions) -> BasePermissions {
        BasePermissions {
            perms: (self.perms & self.set_bit)
                | (fallthrough.perms & fallthrough.set_bit & !self.set_bit),
            set_bit: self.set_bit | fallthrough.set_bit,
        }
    }
}

/// Base permissions plus named roles of an account.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccountPermissions {
    /// Base permission bits.
    pub base: BasePermissions,
    /// Roles held by the account.
    pub roles: Vec<String>,
}

impl AccountPermissions {
    /// Permissions with `base` and no roles.
    pub const fn new(base: BasePermissions) -> Self {
        Self {
            base,
            roles: Vec::new(),
        }
    }

    /// The chain defaults: every flag set, [`DEFAULT_PERM_FLAGS`] granted.
    pub const fn defaults() -> Self {
        Self::new(BasePermissions::with_all_set(DEFAULT_PERM_FLAGS))
    }

    /// `true` if the account holds `role`.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Grant `role`. Returns `false` if already held.
    pub fn add_role(&mut self, role: &str) -> bool {
        if self.has_role(role) {
            return false;
        }

        self.roles.push(role.to_owned());
        true
    }

    /// Revoke `role`. Returns `false` if not held.
    pub fn remove_role(&mut self, role: &str) -> bool {
        let len = self.roles.len();
        self.roles.retain(|r| r != role);
        len != self.roles.len()
    }
}

/// Permissions of the global permissions account, or none if it does not exist.
pub fn global_permissions(st: &dyn Reader) -> Result<AccountPermissions, Exception> {
    Ok(st
        .get_account(&GLOBAL_PERMISSIONS_ADDRESS)?
        .map(|account| account.permissions)
        .unwrap_or_default())
}

/// Whether `address` holds `flag`, composing its own bits over the global permissions.
///
/// Flags unset in both resolve to `false`.
pub fn has_permission(
    st: &dyn Reader,
    address: &Address,
    flag: PermFlag,
) -> Result<bool, Exception> {
    let account = st.get_account(address)?.ok_or_else(|| {
        Exception::with_context(
            ErrorCode::NonExistentAccount,
            format_args!("cannot check permission {:?} of {}", flag, address),
        )
    })?;

    let global = global_permissions(st)?;
    let perms = account.permissions.base.compose(&global.base);

    Ok(perms.get(flag).unwrap_or(false))
}

/// Fail with `PermissionDenied` unless `address` holds `flag`.
pub fn ensure_permission(
    st: &dyn Reader,
    address: &Address,
    flag: PermFlag,
) -> Result<(), Exception> {
    if has_permission(st, address, flag)? {
        Ok(())
    } else {
        Err(Exception::permission_denied(address, flag))
    }
}
