use crate::account::Account;
use crate::error::{ErrorCode, Exception};
use crate::native::Natives;
use crate::storage::{Reader, ReaderWriter, Writer};
use crate::types::{Address, Word256};

/// State where native functions and contracts appear as accounts.
///
/// Native addresses read as accounts carrying the registered name and no code. Writing to them
/// fails with `ReservedAddress`.
pub struct NativesState<'a> {
    natives: &'a Natives,
    backend: &'a mut dyn ReaderWriter,
}

impl<'a> NativesState<'a> {
    /// Overlay `natives` on `backend`.
    pub fn new(natives: &'a Natives, backend: &'a mut dyn ReaderWriter) -> Self {
        Self { natives, backend }
    }

    fn ensure_not_native(&self, address: &Address) -> Result<(), Exception> {
        match self.natives.get_by_address(address) {
            Some(native) => Err(Exception::with_context(
                ErrorCode::ReservedAddress,
                format_args!("{} belongs to native {}", address, native.name()),
            )),
            None => Ok(()),
        }
    }
}

impl Reader for NativesState<'_> {
    fn get_account(&self, address: &Address) -> Result<Option<Account>, Exception> {
        match self.natives.get_by_address(address) {
            Some(native) => Ok(Some(Account {
                native_name: Some(native.name().to_owned()),
                ..Account::new(*address)
            })),
            None => self.backend.get_account(address),
        }
    }

    fn get_storage(&self, address: &Address, key: &Word256) -> Result<Vec<u8>, Exception> {
        self.backend.get_storage(address, key)
    }
}

impl Writer for NativesState<'_> {
    fn update_account(&mut self, account: Account) -> Result<(), Exception> {
        self.ensure_not_native(&account.address)?;
        self.backend.update_account(account)
    }

    fn remove_account(&mut self, address: &Address) -> Result<(), Exception> {
        self.ensure_not_native(address)?;
        self.backend.remove_account(address)
    }

    fn set_storage(
        &mut self,
        address: &Address,
        key: Word256,
        value: Vec<u8>,
    ) -> Result<(), Exception> {
        self.ensure_not_native(address)?;
        self.backend.set_storage(address, key, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::native::{precompiles, Context, Function, NativeContract};
    use crate::permission::PermFlag;
    use crate::storage::MemoryStorage;

    #[test]
    fn natives_read_as_accounts() {
        let natives = precompiles();
        let mut backend = MemoryStorage::new();
        let st = NativesState::new(&natives, &mut backend);

        let account = st
            .get_account(&Address::left_pad(&[2]))
            .expect("readable")
            .expect("native account");

        assert_eq!(account.native_name.as_deref(), Some("sha256"));
        assert!(account.is_native());
        assert!(account.code().is_empty());
        assert!(st.get_account(&Address::left_pad(&[9])).expect("readable").is_none());
    }

    #[test]
    fn native_addresses_are_reserved() {
        let natives = precompiles();
        let mut backend = MemoryStorage::new();
        let mut st = NativesState::new(&natives, &mut backend);
        let native = Address::left_pad(&[4]);

        let errors = [
            st.update_account(Account::new(native)),
            st.remove_account(&native),
            st.set_storage(&native, Word256::zeroed(), vec![1]),
        ];

        for err in errors {
            assert_eq!(err.expect_err("reserved").code(), ErrorCode::ReservedAddress);
        }

        st.update_account(Account::new(Address::left_pad(&[9])))
            .expect("ordinary address");
        assert_eq!(backend.accounts_len(), 1);
    }

    #[test]
    fn contracts_read_as_accounts() {
        fn noop(_: Context<'_, '_>) -> Result<Vec<u8>, Exception> {
            Ok(Vec::new())
        }

        let natives = Natives::new()
            .contract(
                "Registry",
                "Names accounts",
                vec![Function::member("noop()", "Does nothing", PermFlag::empty(), noop)],
            )
            .expect("valid contract");
        let mut backend = MemoryStorage::new();
        let mut st = NativesState::new(&natives, &mut backend);
        let address = NativeContract::address_of("Registry");

        let account = st.get_account(&address).expect("readable").expect("native account");
        assert_eq!(account.native_name.as_deref(), Some("Registry"));

        let err = st.update_account(Account::new(address)).expect_err("reserved");
        assert_eq!(err.code(), ErrorCode::ReservedAddress);
    }
}
